//! Typed views over the weekly problem handed to the assembly passes.
//!
//! The groups never hold the whole `WeeklyProblem`: they receive an
//! immutable [`EntityView`] over the entity catalog while the builder holds
//! the only mutable borrow of the matrix. [`split_problem`] performs the
//! disjoint field split.

use adeq_core::{
    Area, AreaReserves, BindingConstraint, DualTarget, HydroReservoir, Link, LpProblem, NtcValues,
    PrimalTarget, StorageCluster, ThermalPark, WeeklyProblem,
};

/// Read-only slice of the weekly problem visible to assembly passes.
#[derive(Clone, Copy)]
pub struct EntityView<'a> {
    pub year: u32,
    pub week: u32,
    pub hour_in_year: u32,
    /// Timesteps of one optimization pass (24 or 168).
    pub horizon: usize,
    pub timesteps_per_day: usize,
    pub weekly_optimization: bool,
    pub with_startup_costs: bool,
    pub with_integer_variables: bool,
    pub accurate_water_value: bool,

    pub areas: &'a [Area],
    pub links: &'a [Link],
    pub ntc: &'a [NtcValues],
    pub thermal: &'a [ThermalPark],
    pub hydro: &'a [HydroReservoir],
    pub storage: &'a [Vec<StorageCluster>],
    pub reserves: &'a [AreaReserves],
    pub binding_constraints: &'a [BindingConstraint],
}

impl<'a> EntityView<'a> {
    /// Days covered by one optimization pass.
    pub fn days_per_optimization(&self) -> usize {
        (self.horizon / self.timesteps_per_day.max(1)).max(1)
    }
}

/// Split the weekly problem into the entity view and the mutable vectors
/// the passes write.
pub fn split_problem(
    problem: &mut WeeklyProblem,
) -> (
    EntityView<'_>,
    &mut LpProblem,
    &mut Vec<PrimalTarget>,
    &mut Vec<DualTarget>,
) {
    let view = EntityView {
        year: problem.year,
        week: problem.week_in_year,
        hour_in_year: problem.hour_in_year,
        horizon: problem.timesteps_per_optimization,
        timesteps_per_day: problem.timesteps_per_day,
        weekly_optimization: problem.weekly_optimization,
        with_startup_costs: problem.with_startup_costs,
        with_integer_variables: problem.with_integer_variables,
        accurate_water_value: problem.accurate_water_value,
        areas: &problem.areas,
        links: &problem.links,
        ntc: &problem.ntc,
        thermal: &problem.thermal,
        hydro: &problem.hydro,
        storage: &problem.storage,
        reserves: &problem.reserves,
        binding_constraints: &problem.binding_constraints,
    };
    (
        view,
        &mut problem.lp,
        &mut problem.primal_targets,
        &mut problem.dual_targets,
    )
}
