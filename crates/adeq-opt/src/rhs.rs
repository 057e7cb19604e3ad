//! Right-hand-side assembly and dual back-pointers.
//!
//! Walks the constraint tables in the same order the groups emitted them
//! and fills the RHS of every registered row, plus the dual target of the
//! rows whose marginal value is user-visible (area balances, reserve
//! needs, binding constraints). Rows the tables never registered (sentinel
//! entries) are skipped, exactly as the groups skipped emitting them.

use adeq_core::lp::LpProblem;
use adeq_core::{DualTarget, ReserveDirection};

use crate::context::EntityView;
use crate::indexing::{slot, ConstraintCorrespondence};

pub fn set_right_hand_sides(
    view: &EntityView,
    rows: &ConstraintCorrespondence,
    lp: &mut LpProblem,
    dual_targets: &mut [DualTarget],
    interval_offset: usize,
) {
    let mut set = |index: i32, rhs: f64, target: DualTarget| {
        if let Some(row) = slot(index) {
            lp.rhs[row] = rhs;
            dual_targets[row] = target;
        }
    };

    let interval = interval_offset / view.horizon.max(1);

    for hour in 0..view.horizon {
        let gh = interval_offset + hour;
        let map = &rows.hourly[hour];

        for (a, area) in view.areas.iter().enumerate() {
            set(
                map.area_balance[a],
                area.net_demand[gh],
                DualTarget::AreaBalance { area: a, hour: gh },
            );

            for cluster in &view.thermal[a].clusters {
                let g = cluster.global_index;
                if view.with_startup_costs {
                    set(map.thermal_pmax[g], 0.0, DualTarget::None);
                    set(map.thermal_pmin[g], 0.0, DualTarget::None);
                } else {
                    set(map.thermal_pmax[g], cluster.available_power[gh], DualTarget::None);
                    set(map.thermal_pmin[g], cluster.min_power[gh], DualTarget::None);
                }
                set(map.unit_consistency[g], 0.0, DualTarget::None);
                set(map.unit_outage[g], 0.0, DualTarget::None);
                set(map.unit_min_up[g], 0.0, DualTarget::None);
                set(
                    map.unit_min_down[g],
                    cluster.max_units_on[gh] as f64,
                    DualTarget::None,
                );
            }

            let hydro = &view.hydro[a];
            if hydro.has_dispatchable_hydro && hydro.follow_hourly_level {
                let mut inflow = hydro.inflows[gh];
                if hour == 0 {
                    inflow += hydro.initial_level;
                }
                set(map.hydro_level[a], inflow, DualTarget::None);
            }

            for cluster in &view.storage[a] {
                let g = cluster.global_index;
                let mut inflow = cluster.series.inflows[gh];
                if hour == 0 && !cluster.initial_level_optim {
                    inflow += cluster.initial_level;
                }
                set(map.storage_level[g], inflow, DualTarget::None);
            }

            let reserves = &view.reserves[a];
            for direction in [ReserveDirection::Up, ReserveDirection::Down] {
                for reservation in reserves.for_direction(direction) {
                    set(
                        map.reserve_need[reservation.global_index],
                        reservation.need[gh],
                        DualTarget::ReserveNeed {
                            area: a,
                            hour: gh,
                            reserve: reservation.index_in_area,
                        },
                    );

                    for p in &reservation.thermal_participations {
                        let cluster = &view.thermal[a].clusters[p.cluster_index];
                        let g = p.global_participation_index;
                        set(map.thermal_participation[g], 0.0, DualTarget::None);
                        let max_on_rhs = if view.with_startup_costs {
                            0.0
                        } else {
                            cluster.available_power[gh]
                        };
                        set(map.thermal_participation_max_on[g], max_on_rhs, DualTarget::None);
                        set(
                            map.thermal_participation_max_off[g],
                            p.max_power_off * cluster.max_units_on[gh] as f64,
                            DualTarget::None,
                        );
                    }
                    for p in &reservation.st_storage_participations {
                        set(map.st_participation[p.global_participation_index], 0.0, DualTarget::None);
                    }
                    for p in &reservation.lt_storage_participations {
                        set(map.lt_participation[p.global_participation_index], 0.0, DualTarget::None);
                    }
                }
            }

            for (c, cluster) in view.storage[a].iter().enumerate() {
                let g = cluster.global_index;
                let series = &cluster.series;
                let level_max = cluster.reservoir_capacity * series.upper_rule_curve[gh];
                let level_min = cluster.reservoir_capacity * series.lower_rule_curve[gh];
                set(
                    map.st_turbining_max[g],
                    cluster.withdrawal_nominal_capacity * series.max_withdrawal_modulation[gh],
                    DualTarget::None,
                );
                set(
                    map.st_turbining_min[g],
                    cluster.withdrawal_nominal_capacity * series.lower_rule_curve[gh],
                    DualTarget::None,
                );
                set(
                    map.st_pumping_max[g],
                    cluster.injection_nominal_capacity * series.max_injection_modulation[gh],
                    DualTarget::None,
                );
                set(map.st_stock_level_down[g], level_max, DualTarget::None);
                set(map.st_stock_level_up[g], level_min, DualTarget::None);
                set(
                    map.st_global_energy_down[g],
                    reserves.max_global_activation_duration_down as f64 * level_max,
                    DualTarget::None,
                );
                set(
                    map.st_global_energy_up[g],
                    -(reserves.max_global_activation_duration_up as f64) * level_min,
                    DualTarget::None,
                );
                for direction in [ReserveDirection::Up, ReserveDirection::Down] {
                    for reservation in reserves.for_direction(direction) {
                        if let Some(p) = reservation.st_participation_for(c) {
                            let duration = reservation.max_activation_duration as f64;
                            let rhs = match direction {
                                ReserveDirection::Down => duration * level_max,
                                ReserveDirection::Up => -duration * level_min,
                            };
                            set(map.st_energy_level[p.global_participation_index], rhs, DualTarget::None);
                        }
                    }
                }
            }

            if hydro.has_dispatchable_hydro {
                let level_max = hydro
                    .level_ceiling
                    .get(gh)
                    .copied()
                    .unwrap_or(hydro.reservoir_capacity);
                let level_min = hydro.level_floor.get(gh).copied().unwrap_or(0.0);
                set(
                    map.lt_turbining_max[a],
                    hydro.hourly_max_generation[gh],
                    DualTarget::None,
                );
                if hydro.has_pumping {
                    set(
                        map.lt_pumping_max[a],
                        hydro.hourly_max_pumping[gh],
                        DualTarget::None,
                    );
                }
                set(map.lt_stock_level_down[a], level_max, DualTarget::None);
                set(map.lt_stock_level_up[a], level_min, DualTarget::None);
                set(
                    map.lt_global_energy_down[a],
                    reserves.max_global_activation_duration_down as f64 * level_max,
                    DualTarget::None,
                );
                set(
                    map.lt_global_energy_up[a],
                    -(reserves.max_global_activation_duration_up as f64) * level_min,
                    DualTarget::None,
                );
                for direction in [ReserveDirection::Up, ReserveDirection::Down] {
                    for reservation in reserves.for_direction(direction) {
                        for p in &reservation.lt_storage_participations {
                            let duration = reservation.max_activation_duration as f64;
                            let rhs = match direction {
                                ReserveDirection::Down => duration * level_max,
                                ReserveDirection::Up => -duration * level_min,
                            };
                            set(map.lt_energy_level[p.global_participation_index], rhs, DualTarget::None);
                        }
                    }
                }
            }
        }

        for (l, link) in view.links.iter().enumerate() {
            let rhs = if link.transfer_costs.with_loop_flow {
                view.ntc[gh].loop_flow[l]
            } else {
                0.0
            };
            set(map.flow_dissociation[l], rhs, DualTarget::None);
        }

        for (bc, constraint) in view.binding_constraints.iter().enumerate() {
            set(
                map.hourly_binding[bc],
                constraint.rhs.get(gh).copied().unwrap_or(0.0),
                DualTarget::Binding { constraint: bc, row: gh },
            );
        }
    }

    for day in 0..view.days_per_optimization() {
        let day_global = interval_offset / view.timesteps_per_day.max(1) + day;
        let map = &rows.daily[day];
        for (a, _) in view.areas.iter().enumerate() {
            set(
                map.hydro_daily_energy[a],
                view.hydro[a].daily_energy.get(day_global).copied().unwrap_or(0.0),
                DualTarget::None,
            );
        }
        for (bc, constraint) in view.binding_constraints.iter().enumerate() {
            set(
                map.daily_binding[bc],
                constraint.rhs.get(day_global).copied().unwrap_or(0.0),
                DualTarget::Binding { constraint: bc, row: day_global },
            );
        }
    }

    let weekly = &rows.weekly;
    for (a, hydro) in view.hydro.iter().enumerate() {
        set(
            weekly.hydro_energy_fixed[a],
            hydro.fixed_energy_per_interval.get(interval).copied().unwrap_or(0.0),
            DualTarget::None,
        );
        set(
            weekly.hydro_energy_min[a],
            hydro.min_energy_per_interval.get(interval).copied().unwrap_or(0.0),
            DualTarget::None,
        );
        set(
            weekly.hydro_energy_max[a],
            hydro.max_energy_per_interval.get(interval).copied().unwrap_or(0.0),
            DualTarget::None,
        );
        set(
            weekly.pumping_energy_max[a],
            hydro
                .max_pumping_energy_per_interval
                .get(interval)
                .copied()
                .unwrap_or(0.0),
            DualTarget::None,
        );
        let expression_rhs = if hydro.follow_hourly_level {
            0.0
        } else {
            let inflow_sum: f64 = (0..view.horizon)
                .map(|h| hydro.inflows.get(interval_offset + h).copied().unwrap_or(0.0))
                .sum();
            hydro.initial_level + inflow_sum
        };
        set(weekly.final_level_equation[a], expression_rhs, DualTarget::None);
        set(weekly.final_level_layers[a], 0.0, DualTarget::None);
    }

    for clusters in view.storage.iter() {
        for cluster in clusters {
            for block in &cluster.additional_constraints {
                for group in &block.constraints {
                    set(
                        weekly.storage_cumulation[group.global_index],
                        block.rhs.get(group.local_index).copied().unwrap_or(0.0),
                        DualTarget::None,
                    );
                }
            }
        }
    }

    for (bc, constraint) in view.binding_constraints.iter().enumerate() {
        set(
            weekly.weekly_binding[bc],
            constraint.rhs.first().copied().unwrap_or(0.0),
            DualTarget::Binding { constraint: bc, row: 0 },
        );
    }
}
