//! # adeq-opt: Weekly LP Construction and Solution Loop
//!
//! The optimization core of the adeq simulator. For each simulated week it
//! formulates a large linear program co-scheduling thermal unit
//! commitment, hydro reservoirs, short-term storage, operating reserves,
//! cross-area transfers and binding constraints, solves it twice around a
//! thermal tightening heuristic, and redispatches hydro in memory
//! afterwards.
//!
//! ## Architecture
//!
//! | Piece | Module |
//! |-------|--------|
//! | Index tables (entity, timestep) -> column/row | [`indexing`] |
//! | Stable variable/constraint names | [`naming`] |
//! | Fluent row builder with sizing + emission modes | [`builder`] |
//! | Variable registration | [`variables`] |
//! | The six constraint families | [`groups`] |
//! | Bounds / costs / RHS assembly | [`bounds`], [`costs`], [`rhs`] |
//! | Two-pass weekly loop | [`driver`] |
//! | Thermal floor tightening between passes | [`heuristic`] |
//! | Post-solve hydro redispatch | [`remix`] |
//!
//! The sizing and emission passes execute the same group code under
//! different builder modes, which makes the announced and emitted counts
//! equal by construction; the driver still cross-checks them and treats a
//! mismatch as fatal.

pub mod bounds;
pub mod builder;
pub mod context;
pub mod costs;
pub mod driver;
pub mod groups;
pub mod heuristic;
pub mod indexing;
pub mod naming;
pub mod remix;
pub mod rhs;
pub mod variables;

pub use builder::{ConstraintBuilder, PassMode, SizingCounters};
pub use context::{split_problem, EntityView};
pub use driver::{
    dump_raw_results, InMemoryWriter, NullObserver, OptimizationPass, ResultWriter,
    SimulationObserver, WeekStatus, WeeklyLoopDriver,
};
pub use heuristic::run_thermal_heuristic;
pub use indexing::{
    assign_global_indices, ConstraintCorrespondence, GlobalCounts, VariableCorrespondence,
    NO_INDEX,
};
pub use naming::NameTagger;
pub use remix::{remix_hydro, RemixInput, RemixOutput};
pub use variables::register_variables;
