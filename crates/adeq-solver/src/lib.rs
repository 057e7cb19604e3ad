//! # adeq-solver: LP Solver Driver
//!
//! Ships the weekly [`adeq_core::LpProblem`] to the Clarabel interior-point
//! solver and reads the answer back: primal values, duals re-oriented as
//! marginal values, reduced costs, objective and wall-clock.
//!
//! Also provides the textual exports used for post-mortems: an MPS
//! rendition of the matrix, the CSR structure dump, and the one-line
//! criterion record.

pub mod driver;
pub mod error;
pub mod export;
pub mod solution;

pub use driver::{SolverDriver, SolverSettings};
pub use error::{SolverError, SolverResult};
pub use export::{criterion_line, write_column_structure, write_mps, write_row_structure};
pub use solution::{LpSolution, SolveStatus};
