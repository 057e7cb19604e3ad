//! Linear objective assembly.
//!
//! Same traversal as the bounds pass; fills the cost of every column that
//! carries one. In simple water-value mode hydro generation is priced at
//! the weekly water value (and pumping credited at the pumping ratio); in
//! accurate mode the water layers carry the values instead and the hourly
//! variables stay free.

use adeq_core::lp::LpProblem;
use adeq_core::{ReserveDirection, WaterValueMode};

use crate::context::EntityView;
use crate::indexing::{slot, VariableCorrespondence};

pub fn set_linear_costs(
    view: &EntityView,
    vars: &VariableCorrespondence,
    lp: &mut LpProblem,
    water_value_mode: WaterValueMode,
    interval_offset: usize,
) {
    let mut set = |index: i32, cost: f64| {
        if let Some(column) = slot(index) {
            lp.linear_cost[column] = cost;
        }
    };

    for hour in 0..view.horizon {
        let gh = interval_offset + hour;
        let map = &vars.hourly[hour];

        for (l, link) in view.links.iter().enumerate() {
            set(map.link_flow[l], 0.0);
            if link.transfer_costs.with_hurdle_costs {
                set(map.link_flow_direct_cost[l], link.transfer_costs.direct[gh]);
                set(
                    map.link_flow_indirect_cost[l],
                    link.transfer_costs.indirect[gh],
                );
            }
        }

        for (a, area) in view.areas.iter().enumerate() {
            set(map.unsupplied[a], area.unsupplied_energy_cost);
            set(map.spilled[a], area.spilled_energy_cost);

            for cluster in &view.thermal[a].clusters {
                let g = cluster.global_index;
                set(map.thermal_production[g], cluster.production_cost[gh]);
                set(map.units_on[g], cluster.fixed_cost);
                set(map.units_starting[g], cluster.startup_cost);
                set(map.units_stopping[g], cluster.shutdown_cost);
                set(map.units_failing[g], 0.0);
            }

            let hydro = &view.hydro[a];
            let (generation_cost, pumping_cost) = match water_value_mode {
                WaterValueMode::Simple => (
                    hydro.weekly_water_value,
                    -hydro.pumping_ratio * hydro.weekly_water_value,
                ),
                WaterValueMode::Accurate => (0.0, 0.0),
            };
            set(map.hydro_generation[a], generation_cost);
            set(map.pumping[a], pumping_cost);
            set(map.hydro_level[a], 0.0);
            set(map.overflow[a], 0.0);

            for cluster in &view.storage[a] {
                let g = cluster.global_index;
                set(map.storage_injection[g], 0.0);
                set(map.storage_withdrawal[g], 0.0);
                set(map.storage_level[g], 0.0);
            }

            let reserves = &view.reserves[a];
            for direction in [ReserveDirection::Up, ReserveDirection::Down] {
                for reservation in reserves.for_direction(direction) {
                    let r = reservation.global_index;
                    set(map.reserve_unsatisfied[r], reservation.failure_cost);
                    set(map.reserve_excess[r], reservation.spillage_cost);
                    for p in &reservation.thermal_participations {
                        let g = p.global_participation_index;
                        set(map.thermal_reserve_participation_on[g], 0.0);
                        set(map.thermal_reserve_participation_off[g], 0.0);
                        set(map.thermal_reserve_participation[g], p.participation_cost);
                    }
                    for p in &reservation.st_storage_participations {
                        let g = p.global_participation_index;
                        set(map.st_reserve_turbining[g], 0.0);
                        set(map.st_reserve_pumping[g], 0.0);
                        set(map.st_reserve_participation[g], p.participation_cost);
                    }
                    for p in &reservation.lt_storage_participations {
                        let g = p.global_participation_index;
                        set(map.lt_reserve_turbining[g], 0.0);
                        set(map.lt_reserve_pumping[g], 0.0);
                        set(map.lt_reserve_participation[g], p.participation_cost);
                    }
                }
            }
        }
    }

    // The water layers price the stored energy left at the end of the
    // week: keeping water is worth its layer value, so each layer carries
    // the opposite of it.
    for (a, hydro) in view.hydro.iter().enumerate() {
        set(vars.extra.final_level[a], 0.0);
        for (layer, value) in hydro.water_layer_values.iter().enumerate() {
            set(vars.extra.water_layers[a][layer], -value);
        }
    }
}
