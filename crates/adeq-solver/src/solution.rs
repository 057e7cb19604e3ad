//! Solution representation returned by the solver driver.

use serde::{Deserialize, Serialize};

/// Outcome of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Optimal solution found.
    Optimal,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// Solver hit its time limit.
    TimeLimit,
    /// Solver hit its iteration limit.
    IterationLimit,
    /// Numerical difficulties.
    NumericalError,
    /// Solution status unknown.
    Unknown,
}

impl SolveStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unbounded => write!(f, "unbounded"),
            SolveStatus::TimeLimit => write!(f, "time_limit"),
            SolveStatus::IterationLimit => write!(f, "iteration_limit"),
            SolveStatus::NumericalError => write!(f, "numerical_error"),
            SolveStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Numeric answer of one solve.
///
/// `marginal_values[row]` is the derivative of the objective with respect to
/// the row's right-hand side, in the row's original orientation (so the dual
/// of an area balance is directly the marginal price of demand).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LpSolution {
    pub status: SolveStatus,
    pub objective: f64,
    pub primal: Vec<f64>,
    pub marginal_values: Vec<f64>,
    pub reduced_costs: Vec<f64>,
    pub iterations: u32,
    pub solve_time_ms: u128,
}

impl Default for SolveStatus {
    fn default() -> Self {
        SolveStatus::Unknown
    }
}

impl LpSolution {
    pub fn is_optimal(&self) -> bool {
        self.status.is_success()
    }
}
