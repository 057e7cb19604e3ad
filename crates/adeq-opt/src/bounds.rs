//! Variable bounds and primal back-pointers.
//!
//! Walks every (entity, timestep) pair in the canonical traversal order
//! and fills `xmin`, `xmax` and the typed result target of each column.
//! Series are indexed by the global hour (`interval_offset + hour`), which
//! is also the hour the result target points at: on a daily horizon the
//! same column serves a different hour of the week in every interval.
//!
//! Unreached upper bounds use the large finite [`INFINITE_BOUND`], never
//! an actual infinity. Lower bounds default to zero. Columns without a
//! user-visible value keep [`PrimalTarget::None`].

use adeq_core::lp::{LpProblem, INFINITE_BOUND};
use adeq_core::{PrimalTarget, ReserveDirection};

use crate::context::EntityView;
use crate::indexing::{slot, VariableCorrespondence};

pub fn set_variable_bounds(
    view: &EntityView,
    vars: &VariableCorrespondence,
    lp: &mut LpProblem,
    primal_targets: &mut [PrimalTarget],
    interval_offset: usize,
) {
    let mut set = |index: i32, lower: f64, upper: f64, target: PrimalTarget| {
        if let Some(column) = slot(index) {
            lp.lower_bound[column] = lower;
            lp.upper_bound[column] = upper.min(INFINITE_BOUND);
            primal_targets[column] = target;
        }
    };

    for hour in 0..view.horizon {
        let gh = interval_offset + hour;
        let map = &vars.hourly[hour];

        for (l, link) in view.links.iter().enumerate() {
            let ntc = &view.ntc[gh];
            let shift = if link.transfer_costs.with_loop_flow {
                ntc.loop_flow[l]
            } else {
                0.0
            };
            set(
                map.link_flow[l],
                -ntc.indirect[l] + shift,
                ntc.direct[l] + shift,
                PrimalTarget::LinkFlow { link: l, hour: gh },
            );
            set(map.link_flow_direct_cost[l], 0.0, INFINITE_BOUND, PrimalTarget::None);
            set(map.link_flow_indirect_cost[l], 0.0, INFINITE_BOUND, PrimalTarget::None);
        }

        for (a, _area) in view.areas.iter().enumerate() {
            set(
                map.unsupplied[a],
                0.0,
                INFINITE_BOUND,
                PrimalTarget::Unsupplied { area: a, hour: gh },
            );
            set(
                map.spilled[a],
                0.0,
                INFINITE_BOUND,
                PrimalTarget::Spilled { area: a, hour: gh },
            );

            for (c, cluster) in view.thermal[a].clusters.iter().enumerate() {
                let g = cluster.global_index;
                let available = cluster.available_power[gh];
                let (lower, upper) = if cluster.must_run {
                    (available, available)
                } else {
                    (cluster.min_power[gh].min(available), available)
                };
                set(
                    map.thermal_production[g],
                    lower,
                    upper,
                    PrimalTarget::ThermalProduction { area: a, hour: gh, cluster: c },
                );
                let max_units = cluster.max_units_on[gh] as f64;
                set(
                    map.units_on[g],
                    cluster.min_units_on[gh] as f64,
                    max_units,
                    PrimalTarget::UnitsOn { area: a, hour: gh, cluster: c },
                );
                set(
                    map.units_starting[g],
                    0.0,
                    max_units,
                    PrimalTarget::UnitsStarting { area: a, hour: gh, cluster: c },
                );
                set(
                    map.units_stopping[g],
                    0.0,
                    max_units,
                    PrimalTarget::UnitsStopping { area: a, hour: gh, cluster: c },
                );
                set(
                    map.units_failing[g],
                    0.0,
                    max_units,
                    PrimalTarget::UnitsFailing { area: a, hour: gh, cluster: c },
                );
            }

            let hydro = &view.hydro[a];
            set(
                map.hydro_generation[a],
                hydro
                    .hourly_min_generation
                    .get(gh)
                    .copied()
                    .unwrap_or(0.0),
                hydro.hourly_max_generation.get(gh).copied().unwrap_or(0.0),
                PrimalTarget::HydroGeneration { area: a, hour: gh },
            );
            set(
                map.pumping[a],
                0.0,
                hydro.hourly_max_pumping.get(gh).copied().unwrap_or(0.0),
                PrimalTarget::Pumping { area: a, hour: gh },
            );
            set(
                map.hydro_level[a],
                hydro.level_floor.get(gh).copied().unwrap_or(0.0),
                hydro
                    .level_ceiling
                    .get(gh)
                    .copied()
                    .unwrap_or(hydro.reservoir_capacity),
                PrimalTarget::HydroLevel { area: a, hour: gh },
            );
            set(
                map.overflow[a],
                0.0,
                INFINITE_BOUND,
                PrimalTarget::Overflow { area: a, hour: gh },
            );

            for (c, cluster) in view.storage[a].iter().enumerate() {
                let g = cluster.global_index;
                let series = &cluster.series;
                set(
                    map.storage_injection[g],
                    0.0,
                    cluster.injection_nominal_capacity * series.max_injection_modulation[gh],
                    PrimalTarget::StorageInjection { area: a, hour: gh, cluster: c },
                );
                set(
                    map.storage_withdrawal[g],
                    0.0,
                    cluster.withdrawal_nominal_capacity * series.max_withdrawal_modulation[gh],
                    PrimalTarget::StorageWithdrawal { area: a, hour: gh, cluster: c },
                );
                set(
                    map.storage_level[g],
                    cluster.reservoir_capacity * series.lower_rule_curve[gh],
                    cluster.reservoir_capacity * series.upper_rule_curve[gh],
                    PrimalTarget::StorageLevel { area: a, hour: gh, cluster: c },
                );
            }

            let reserves = &view.reserves[a];
            for direction in [ReserveDirection::Up, ReserveDirection::Down] {
                for reservation in reserves.for_direction(direction) {
                    let r = reservation.global_index;
                    let in_area = reservation.index_in_area;
                    set(
                        map.reserve_unsatisfied[r],
                        0.0,
                        INFINITE_BOUND,
                        PrimalTarget::ReserveUnsatisfied { area: a, hour: gh, reserve: in_area },
                    );
                    set(
                        map.reserve_excess[r],
                        0.0,
                        INFINITE_BOUND,
                        PrimalTarget::ReserveExcess { area: a, hour: gh, reserve: in_area },
                    );

                    for p in &reservation.thermal_participations {
                        let g = p.global_participation_index;
                        let in_area = p.area_participation_index;
                        set(
                            map.thermal_reserve_participation_on[g],
                            0.0,
                            p.max_power_on,
                            PrimalTarget::ThermalReserveParticipationOn {
                                area: a,
                                hour: gh,
                                participation: in_area,
                            },
                        );
                        set(
                            map.thermal_reserve_participation_off[g],
                            0.0,
                            p.max_power_off,
                            PrimalTarget::ThermalReserveParticipationOff {
                                area: a,
                                hour: gh,
                                participation: in_area,
                            },
                        );
                        set(
                            map.thermal_reserve_participation[g],
                            0.0,
                            INFINITE_BOUND,
                            PrimalTarget::ThermalReserveParticipation {
                                area: a,
                                hour: gh,
                                participation: in_area,
                            },
                        );
                    }
                    for p in &reservation.st_storage_participations {
                        let g = p.global_participation_index;
                        let in_area = p.area_participation_index;
                        set(map.st_reserve_turbining[g], 0.0, p.max_turbining, PrimalTarget::None);
                        set(map.st_reserve_pumping[g], 0.0, p.max_pumping, PrimalTarget::None);
                        set(
                            map.st_reserve_participation[g],
                            0.0,
                            INFINITE_BOUND,
                            PrimalTarget::StorageReserveParticipation {
                                area: a,
                                hour: gh,
                                participation: in_area,
                            },
                        );
                    }
                    for p in &reservation.lt_storage_participations {
                        let g = p.global_participation_index;
                        let in_area = p.area_participation_index;
                        set(map.lt_reserve_turbining[g], 0.0, p.max_turbining, PrimalTarget::None);
                        set(map.lt_reserve_pumping[g], 0.0, p.max_pumping, PrimalTarget::None);
                        set(
                            map.lt_reserve_participation[g],
                            0.0,
                            INFINITE_BOUND,
                            PrimalTarget::HydroReserveParticipation {
                                area: a,
                                hour: gh,
                                participation: in_area,
                            },
                        );
                    }
                }
            }
        }
    }

    for (a, hydro) in view.hydro.iter().enumerate() {
        set(
            vars.extra.final_level[a],
            0.0,
            hydro.reservoir_capacity,
            PrimalTarget::None,
        );
        let layer_count = hydro.water_layer_values.len();
        for layer in 0..layer_count {
            set(
                vars.extra.water_layers[a][layer],
                0.0,
                hydro.reservoir_capacity / layer_count.max(1) as f64,
                PrimalTarget::None,
            );
        }
    }
}
