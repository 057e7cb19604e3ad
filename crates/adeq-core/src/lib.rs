//! # adeq-core: Entity Model and Weekly State
//!
//! Data structures shared by the weekly optimization core of the adeq
//! adequacy and economic simulator:
//!
//! - The entity catalog borrowed from the study: [`Area`], [`Link`],
//!   [`ThermalCluster`], [`HydroReservoir`], [`StorageCluster`],
//!   [`CapacityReservation`], [`BindingConstraint`].
//! - The long-lived [`WeeklyProblem`] holding per-week state, reused across
//!   weeks with `reinit` semantics.
//! - The CSR-like [`LpProblem`] the assembly passes fill and the solver
//!   driver consumes.
//! - Typed back-pointers ([`PrimalTarget`], [`DualTarget`]) routing solver
//!   output into the hourly result containers.
//! - The unified [`CoreError`] with structural context for assembly errors.
//!
//! Ownership is strictly top-down: the weekly problem owns everything, the
//! constraint groups borrow typed context structs, and the builder borrows
//! the matrix alone for the duration of one assembly pass.

pub mod area;
pub mod binding;
pub mod error;
pub mod hydro;
pub mod ids;
pub mod lp;
pub mod options;
pub mod problem;
pub mod reserves;
pub mod results;
pub mod storage;
pub mod thermal;

pub use area::{Area, Link, NtcValues, TransferCosts};
pub use binding::{BindingConstraint, ConstraintScope, LinkTerm, ThermalTerm};
pub use error::{CoreError, CoreResult, ProblemContext};
pub use hydro::{HydroReservoir, LevelTracker, WATER_LAYER_COUNT};
pub use ids::transform_name_into_id;
pub use lp::{AnnouncedSizes, LpProblem, RowSense, INFINITE_BOUND};
pub use options::{
    MpsExport, OptimizationHorizon, RunOptions, SolverOptions, Toggle, WaterValueMode,
};
pub use problem::{TimeMeasure, WeeklyProblem, HOURS_PER_DAY, HOURS_PER_WEEK};
pub use reserves::{
    AreaReserves, CapacityReservation, ReserveDirection, StorageParticipation,
    ThermalParticipation,
};
pub use results::{
    AreaResults, DualTarget, PrimalTarget, ReserveHourResults, StorageHourResults,
    ThermalHourResults,
};
pub use storage::{
    AdditionalConstraints, ConstraintOperator, ConstraintVariable, SingleAdditionalConstraint,
    StorageCluster, StorageSeries,
};
pub use thermal::{ThermalCluster, ThermalPark};
