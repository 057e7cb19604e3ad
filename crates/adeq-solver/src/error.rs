//! Error types for the solver driver.

use thiserror::Error;

/// Errors that can occur while shipping a problem to the solver or reading
/// its answer back. Solve outcomes that are answers rather than failures
/// (infeasible, unbounded, time limit) are reported through
/// [`crate::SolveStatus`], not through this type.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The problem container violates its structural invariants.
    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    /// The solver rejected the problem at setup.
    #[error("solver setup failed: {0}")]
    Setup(String),

    /// Generic IO error (matrix dumps).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;
