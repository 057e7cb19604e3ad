//! Thermal heuristic run between the two optimization passes.
//!
//! The first pass leaves fractional commitment figures. Before the second
//! continuous pass, each cluster's minimum dispatchable power is tightened
//! so the relaxation cannot walk back below what the first pass committed:
//!
//! - With startup costs, the fractional number of running units is rounded
//!   up into the minimum unit count, and the Pmin series follows.
//! - Without startup costs, the units needed to carry the first-pass
//!   dispatch are expanded over a sliding min-up/down-time window, so a
//!   unit started for a load step stays on for its minimum duration.

use adeq_core::WeeklyProblem;

const ROUNDING_TOLERANCE: f64 = 1e-6;

/// Entry point: dispatches on the startup-cost mode.
pub fn run_thermal_heuristic(problem: &mut WeeklyProblem) {
    if problem.with_startup_costs {
        adjust_committed_units(problem);
    } else {
        expand_min_power_over_up_down_windows(problem);
    }
}

/// Startup-cost mode: lift the minimum running-unit count to the rounded
/// first-pass commitment, and the Pmin series with it.
fn adjust_committed_units(problem: &mut WeeklyProblem) {
    for (a, park) in problem.thermal.iter_mut().enumerate() {
        let results = &problem.results[a];
        for (c, cluster) in park.clusters.iter_mut().enumerate() {
            for hour in 0..problem.timestep_count {
                let committed = results.thermal[hour].units_on[c];
                let units = (committed - ROUNDING_TOLERANCE).ceil().max(0.0) as i32;
                if units > cluster.min_units_on[hour] {
                    cluster.min_units_on[hour] = units;
                }
                let floor = cluster.unit_min_power * cluster.min_units_on[hour] as f64;
                cluster.min_power[hour] = cluster
                    .min_power_ref[hour]
                    .max(floor)
                    .min(cluster.available_power[hour]);
            }
        }
    }
}

/// No-startup-cost mode: derive the units needed from the first-pass
/// production, take the running maximum over a trailing window of the
/// min-up/down time, and rebuild the Pmin series from it.
fn expand_min_power_over_up_down_windows(problem: &mut WeeklyProblem) {
    let hours = problem.timestep_count;
    for (a, park) in problem.thermal.iter_mut().enumerate() {
        let results = &problem.results[a];
        for (c, cluster) in park.clusters.iter_mut().enumerate() {
            if cluster.unit_size <= 0.0 {
                continue;
            }
            let window = cluster.min_up_down_time.max(1);

            let needed: Vec<f64> = (0..hours)
                .map(|hour| {
                    let production = results.thermal[hour].production[c];
                    (production / cluster.unit_size - ROUNDING_TOLERANCE).ceil().max(0.0)
                })
                .collect();

            for hour in 0..hours {
                let mut running = 0.0f64;
                for back in 0..window.min(hour + 1) {
                    running = running.max(needed[hour - back]);
                }
                let floor = cluster.unit_min_power * running;
                cluster.min_power[hour] = cluster
                    .min_power_ref[hour]
                    .max(floor)
                    .min(cluster.available_power[hour]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adeq_core::{AreaResults, ThermalCluster, ThermalPark};

    fn problem_with_production(production: Vec<f64>) -> WeeklyProblem {
        let hours = production.len();
        let mut results = AreaResults::sized(hours, 1, 0, 0, 0, 0, 0);
        for (hour, p) in production.iter().enumerate() {
            results.thermal[hour].production[0] = *p;
        }
        WeeklyProblem {
            timestep_count: hours,
            thermal: vec![ThermalPark {
                clusters: vec![ThermalCluster {
                    unit_size: 50.0,
                    unit_min_power: 20.0,
                    min_up_time: 3,
                    min_down_time: 2,
                    min_up_down_time: 3,
                    available_power: vec![200.0; hours],
                    available_power_ref: vec![200.0; hours],
                    min_power: vec![0.0; hours],
                    min_power_ref: vec![0.0; hours],
                    production_cost: vec![10.0; hours],
                    max_units_on: vec![4; hours],
                    min_units_on: vec![0; hours],
                    ..Default::default()
                }],
            }],
            results: vec![results],
            ..Default::default()
        }
    }

    /// A demand step at t = 2 keeps the committed floor up for the whole
    /// min-up window, at the smallest count covering the step.
    #[test]
    fn min_up_expansion_keeps_units_on_after_a_step() {
        let mut problem = problem_with_production(vec![0.0, 0.0, 100.0, 100.0, 100.0, 0.0, 0.0]);
        run_thermal_heuristic(&mut problem);

        let min_power = &problem.thermal[0].clusters[0].min_power;
        // 100 MW needs ceil(100/50) = 2 units; floor = 2 * 20 MW.
        assert_eq!(&min_power[2..5], &[40.0, 40.0, 40.0]);
        // The window extends past the step's end for min-up-time hours.
        assert_eq!(min_power[5], 40.0);
        assert_eq!(min_power[6], 40.0);
        assert_eq!(min_power[0], 0.0);
        // Non-decreasing across the committed stretch.
        assert!(min_power[2] <= min_power[3] && min_power[3] <= min_power[4]);
    }

    #[test]
    fn startup_cost_mode_rounds_fractional_units_up() {
        let mut problem = problem_with_production(vec![0.0; 3]);
        problem.with_startup_costs = true;
        problem.results[0].thermal[1].units_on[0] = 1.4;
        run_thermal_heuristic(&mut problem);

        let cluster = &problem.thermal[0].clusters[0];
        assert_eq!(cluster.min_units_on[1], 2);
        assert_eq!(cluster.min_power[1], 40.0);
        assert_eq!(cluster.min_units_on[0], 0);
    }

    #[test]
    fn min_power_never_exceeds_availability() {
        let mut problem = problem_with_production(vec![200.0; 3]);
        problem.thermal[0].clusters[0].available_power = vec![30.0; 3];
        run_thermal_heuristic(&mut problem);
        let cluster = &problem.thermal[0].clusters[0];
        assert!(cluster.min_power.iter().all(|&p| p <= 30.0));
    }
}
