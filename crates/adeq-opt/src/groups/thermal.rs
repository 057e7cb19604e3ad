//! Thermal unit-commitment rows.
//!
//! Two regimes per cluster and hour:
//!
//! - With startup costs, dispatch is tied to the number of running units:
//!   `P - Pmax·N <= 0`, `P - Pmin·N >= 0`, the unit-count consistency
//!   `N(t) - N(t-1) - S(t) + A(t) + F(t) = 0`, the outage bound
//!   `F(t) <= cumulated starts`, and the min-up / min-down windows.
//! - Without startup costs, the Pmin/Pmax coupling degenerates to plain
//!   bounds; the rows are still emitted when reserve participations need
//!   headroom accounting, with the availability on the right-hand side.
//!
//! Up participations consume headroom in the Pmax row, down participations
//! consume margin in the Pmin row. Unit-count windows wrap cyclically
//! around the optimization horizon.

use crate::builder::ConstraintBuilder;
use crate::context::EntityView;
use crate::indexing::ConstraintCorrespondence;
use crate::naming::NameTagger;

/// Global participation indices of one cluster, per direction.
pub(crate) fn cluster_participations(
    view: &EntityView,
    area: usize,
    cluster_index: usize,
) -> (Vec<usize>, Vec<usize>) {
    let reserves = &view.reserves[area];
    let collect = |list: &[adeq_core::CapacityReservation]| {
        list.iter()
            .filter_map(|r| {
                r.thermal_participation_for(cluster_index)
                    .map(|p| p.global_participation_index)
            })
            .collect::<Vec<_>>()
    };
    (collect(&reserves.up), collect(&reserves.down))
}

pub fn add_all(
    view: &EntityView,
    rows: &mut ConstraintCorrespondence,
    builder: &mut ConstraintBuilder,
    tagger: &mut NameTagger,
) {
    let horizon = view.horizon;
    for hour in 0..horizon {
        tagger.update_time_step(view.hour_in_year + hour as u32);
        builder.set_hour(hour);

        for (a, area) in view.areas.iter().enumerate() {
            tagger.update_area(&area.name);

            for (c, cluster) in view.thermal[a].clusters.iter().enumerate() {
                let g = cluster.global_index;
                let qualifier = [("cluster", cluster.name.as_str())];
                let (ups, downs) = cluster_participations(view, a, c);

                if view.with_startup_costs || !ups.is_empty() {
                    builder.thermal_production(g, 1.0);
                    for &p in &ups {
                        builder.running_thermal_reserve_participation(p, 1.0);
                    }
                    if view.with_startup_costs {
                        builder.units_on(g, -cluster.unit_size);
                    }
                    if let Some(row) = builder.less_than() {
                        rows.hourly[hour].thermal_pmax[g] = row as i32;
                        tagger.tag(row, "PMaxDispatchableGeneration", &qualifier);
                    }
                }

                if view.with_startup_costs || !downs.is_empty() {
                    builder.thermal_production(g, 1.0);
                    for &p in &downs {
                        builder.running_thermal_reserve_participation(p, -1.0);
                    }
                    if view.with_startup_costs {
                        builder.units_on(g, -cluster.unit_min_power);
                    }
                    if let Some(row) = builder.greater_than() {
                        rows.hourly[hour].thermal_pmin[g] = row as i32;
                        tagger.tag(row, "PMinDispatchableGeneration", &qualifier);
                    }
                }

                if !view.with_startup_costs {
                    continue;
                }

                // N(t) - N(t-1) - S(t) + A(t) + F(t) = 0, cyclic over the
                // horizon.
                let previous = (hour + horizon - 1) % horizon;
                builder
                    .units_on(g, 1.0)
                    .units_on_at(g, -1.0, previous)
                    .units_starting(g, -1.0)
                    .units_stopping(g, 1.0)
                    .units_failing(g, 1.0);
                if let Some(row) = builder.equal_to() {
                    rows.hourly[hour].unit_consistency[g] = row as i32;
                    tagger.tag(row, "ConsistenceNumberOfDispatchableUnits", &qualifier);
                }

                // F(t) never exceeds the units started so far this horizon.
                builder.units_failing(g, 1.0);
                for past in 0..=hour {
                    builder.units_starting_at(g, -1.0, past);
                }
                if let Some(row) = builder.less_than() {
                    rows.hourly[hour].unit_outage[g] = row as i32;
                    tagger.tag(row, "NbUnitsOutageLessThanNbUnitsStop", &qualifier);
                }

                if cluster.min_up_time > 0 {
                    builder.units_on(g, 1.0);
                    for back in 0..cluster.min_up_time {
                        let tau = (hour + horizon - back) % horizon;
                        builder.units_starting_at(g, -1.0, tau);
                    }
                    if let Some(row) = builder.greater_than() {
                        rows.hourly[hour].unit_min_up[g] = row as i32;
                        tagger.tag(row, "NbDispUnitsMinBoundSinceMinUpTime", &qualifier);
                    }
                }

                if cluster.min_down_time > 0 {
                    builder.units_on(g, 1.0);
                    for back in 0..cluster.min_down_time {
                        let tau = (hour + horizon - back) % horizon;
                        builder.units_stopping_at(g, 1.0, tau);
                    }
                    if let Some(row) = builder.less_than() {
                        rows.hourly[hour].unit_min_down[g] = row as i32;
                        tagger.tag(row, "MinDownTime", &qualifier);
                    }
                }
            }
        }
    }
}
