//! The long-lived weekly problem container.
//!
//! One [`WeeklyProblem`] is created per worker at study load and reused for
//! every simulated week. Entity data is borrowed from the study and copied
//! in; per-week state (the LP, back-pointer vectors, results, objective
//! costs) is reset by [`WeeklyProblem::reinit`].

use serde::{Deserialize, Serialize};

use crate::area::{Area, Link, NtcValues};
use crate::binding::BindingConstraint;
use crate::hydro::HydroReservoir;
use crate::lp::LpProblem;
use crate::reserves::AreaReserves;
use crate::results::{AreaResults, DualTarget, PrimalTarget};
use crate::storage::StorageCluster;
use crate::thermal::ThermalPark;

pub const HOURS_PER_WEEK: usize = 168;
pub const HOURS_PER_DAY: usize = 24;

/// Wall-clock figures of one optimization pass, in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TimeMeasure {
    pub solve_time_ms: u128,
    pub update_time_ms: u128,
}

/// Weekly state of the optimization core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyProblem {
    pub year: u32,
    pub week_in_year: u32,
    /// Hour of the year at which this week starts; used by name tagging.
    pub hour_in_year: u32,
    pub first_week_of_simulation: bool,

    /// Number of timesteps of the week (168) and of one optimization pass
    /// (24 for daily, 168 for weekly).
    pub timestep_count: usize,
    pub timesteps_per_optimization: usize,
    pub day_count: usize,
    pub timesteps_per_day: usize,

    pub weekly_optimization: bool,
    pub with_startup_costs: bool,
    pub with_integer_variables: bool,
    pub accurate_water_value: bool,
    pub expansion: bool,

    // Entities, indexed by area except where noted.
    pub areas: Vec<Area>,
    pub links: Vec<Link>,
    /// NTC and loop-flow values, by hour then by link.
    pub ntc: Vec<NtcValues>,
    pub thermal: Vec<ThermalPark>,
    pub hydro: Vec<HydroReservoir>,
    /// Short-term storage clusters, by area then by cluster.
    pub storage: Vec<Vec<StorageCluster>>,
    pub reserves: Vec<AreaReserves>,
    pub binding_constraints: Vec<BindingConstraint>,

    /// The in-assembly linear problem, reused across weeks.
    pub lp: LpProblem,
    /// Where each column's optimum lands, parallel to the LP variables.
    pub primal_targets: Vec<PrimalTarget>,
    /// Where each row's dual lands, parallel to the LP constraints.
    pub dual_targets: Vec<DualTarget>,
    /// Reduced costs of the last solve, parallel to the LP variables.
    pub reduced_costs: Vec<f64>,

    pub results: Vec<AreaResults>,
    /// Duals of binding constraints, by constraint then by emitted row.
    pub binding_constraint_duals: Vec<Vec<f64>>,

    /// Optimal objective of each optimization interval, per pass.
    pub first_pass_cost: Vec<f64>,
    pub second_pass_cost: Vec<f64>,
    pub time_measures: [TimeMeasure; 2],

    pub problem_already_instantiated: bool,
    pub reinit_requested: bool,
}

impl WeeklyProblem {
    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Number of optimization intervals in the week (7 when optimizing day
    /// by day, 1 when optimizing the whole week at once).
    pub fn interval_count(&self) -> usize {
        if self.timesteps_per_optimization == 0 {
            return 0;
        }
        self.timestep_count / self.timesteps_per_optimization
    }

    /// Day of the week a timestep belongs to.
    pub fn day_of_timestep(&self, timestep: usize) -> usize {
        timestep / self.timesteps_per_day.max(1)
    }

    /// Reset per-week state before assembling a new week. Entity series
    /// edited by the thermal heuristic are restored from their reference
    /// copies; counters and objective trackers are cleared.
    pub fn reinit(&mut self) {
        for park in &mut self.thermal {
            for cluster in &mut park.clusters {
                cluster.restore_reference_series();
            }
        }
        for hydro in &mut self.hydro {
            hydro
                .hourly_max_generation
                .clone_from(&hydro.hourly_max_generation_ref);
        }
        for link in &mut self.links {
            let costs = &mut link.transfer_costs;
            costs.direct.clone_from(&costs.direct_ref);
            costs.indirect.clone_from(&costs.indirect_ref);
        }
        self.first_pass_cost.clear();
        self.second_pass_cost.clear();
        self.time_measures = [TimeMeasure::default(); 2];
        self.reinit_requested = false;
    }

    /// Allocate the per-area result containers for the current entity
    /// shapes. Called once the global numbering is known.
    pub fn allocate_results(&mut self) {
        let hours = self.timestep_count;
        self.results = (0..self.area_count())
            .map(|area| {
                let thermal_participations = self.reserves[area]
                    .up
                    .iter()
                    .chain(&self.reserves[area].down)
                    .map(|r| r.thermal_participations.len())
                    .sum();
                let storage_participations = self.reserves[area]
                    .up
                    .iter()
                    .chain(&self.reserves[area].down)
                    .map(|r| r.st_storage_participations.len())
                    .sum();
                let lt_participations = self.reserves[area]
                    .up
                    .iter()
                    .chain(&self.reserves[area].down)
                    .map(|r| r.lt_storage_participations.len())
                    .sum();
                let reserve_count = self.reserves[area].up.len() + self.reserves[area].down.len();
                AreaResults::sized(
                    hours,
                    self.thermal[area].cluster_count(),
                    thermal_participations,
                    self.storage[area].len(),
                    storage_participations,
                    lt_participations,
                    reserve_count,
                )
            })
            .collect();
        self.binding_constraint_duals = self
            .binding_constraints
            .iter()
            .map(|bc| vec![0.0; bc.rhs.len()])
            .collect();
    }

    /// Route the primal and dual vectors of a finished solve into the
    /// result containers.
    pub fn store_solution(&mut self, primal: &[f64], duals: &[f64]) {
        for (target, &value) in self.primal_targets.iter().zip(primal) {
            target.store(value, &mut self.results, &mut self.ntc);
        }
        for (target, &value) in self.dual_targets.iter().zip(duals) {
            target.store(value, &mut self.results, &mut self.binding_constraint_duals);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermal::ThermalCluster;

    #[test]
    fn interval_count_matches_horizon() {
        let mut p = WeeklyProblem {
            timestep_count: HOURS_PER_WEEK,
            timesteps_per_optimization: HOURS_PER_DAY,
            timesteps_per_day: HOURS_PER_DAY,
            ..Default::default()
        };
        assert_eq!(p.interval_count(), 7);
        p.timesteps_per_optimization = HOURS_PER_WEEK;
        assert_eq!(p.interval_count(), 1);
    }

    #[test]
    fn reinit_restores_heuristic_edits() {
        let mut p = WeeklyProblem {
            thermal: vec![ThermalPark {
                clusters: vec![ThermalCluster {
                    min_power: vec![7.0],
                    min_power_ref: vec![0.0],
                    available_power: vec![10.0],
                    available_power_ref: vec![10.0],
                    ..Default::default()
                }],
            }],
            first_pass_cost: vec![1.0],
            ..Default::default()
        };
        p.reinit();
        assert_eq!(p.thermal[0].clusters[0].min_power, vec![0.0]);
        assert!(p.first_pass_cost.is_empty());
    }
}
