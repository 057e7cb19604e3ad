//! Clarabel-backed solver driver.
//!
//! Owns the conversion from the row-wise [`LpProblem`] to the conic form
//! Clarabel consumes, and the mapping of the answer back into an
//! [`LpSolution`]:
//!
//! ```text
//! minimize    q'x
//! subject to  Ax + s = b,   s ∈ ZeroCone(eq) × NonnegativeCone(ineq + bounds)
//! ```
//!
//! Equality rows go to the zero cone; `>=` rows are negated into `<=` form;
//! finite variable bounds become extra nonnegative-cone rows. Integer
//! markers are accepted but relaxed: the driver solves the continuous
//! relaxation, which is what the second optimization pass consumes anyway.

use std::time::Instant;

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use tracing::{debug, warn};

use adeq_core::lp::{LpProblem, RowSense, INFINITE_BOUND};

use crate::error::{SolverError, SolverResult};
use crate::solution::{LpSolution, SolveStatus};

/// Knobs of the solver driver.
#[derive(Debug, Clone)]
pub struct SolverSettings {
    pub verbose: bool,
    /// Wall-clock limit, in seconds. `None` means no limit.
    pub time_limit_seconds: Option<f64>,
    pub max_iterations: Option<u32>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            verbose: false,
            time_limit_seconds: None,
            max_iterations: None,
        }
    }
}

/// The driver. One instance per worker; holds only settings, the external
/// solver state lives for the duration of one `solve` call.
#[derive(Debug, Clone, Default)]
pub struct SolverDriver {
    pub settings: SolverSettings,
}

impl SolverDriver {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Solve the given problem and read primal, duals and reduced costs
    /// back. Non-optimal outcomes are reported in the solution status;
    /// `Err` is reserved for malformed input and setup failures.
    pub fn solve(&self, lp: &LpProblem) -> SolverResult<LpSolution> {
        lp.check_consistency().map_err(SolverError::InvalidProblem)?;

        let start = Instant::now();
        let n = lp.variable_count;
        let m = lp.constraint_count;

        // Conic row layout: equalities first, inequalities next, bound rows
        // last. `cone_row_of` maps an original row to its conic position.
        let mut cone_row_of = vec![0usize; m];
        let eq_count = lp.sense.iter().filter(|s| **s == RowSense::Equal).count();
        let mut next_eq = 0usize;
        let mut next_ineq = eq_count;
        for row in 0..m {
            if lp.sense[row] == RowSense::Equal {
                cone_row_of[row] = next_eq;
                next_eq += 1;
            } else {
                cone_row_of[row] = next_ineq;
                next_ineq += 1;
            }
        }

        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut b = vec![0.0; m];

        for row in 0..m {
            let flip = if lp.sense[row] == RowSense::GreaterOrEqual {
                -1.0
            } else {
                1.0
            };
            let conic = cone_row_of[row];
            b[conic] = flip * lp.rhs[row];
            let span = lp.row_start[row]..lp.row_start[row] + lp.row_len[row];
            for k in span {
                columns[lp.column_index[k]].push((conic, flip * lp.coefficient[k]));
            }
        }

        // Finite bounds become nonnegative-cone rows appended after the
        // structural inequalities.
        let mut bound_rows = 0usize;
        for j in 0..n {
            if lp.upper_bound[j] < INFINITE_BOUND {
                columns[j].push((m + bound_rows, 1.0));
                b.push(lp.upper_bound[j]);
                bound_rows += 1;
            }
            if lp.lower_bound[j] > -INFINITE_BOUND {
                columns[j].push((m + bound_rows, -1.0));
                b.push(-lp.lower_bound[j]);
                bound_rows += 1;
            }
        }

        // CSC assembly: sort each column by conic row and merge duplicates.
        let mut col_ptr = Vec::with_capacity(n + 1);
        let mut row_idx = Vec::new();
        let mut values = Vec::new();
        for column in &mut columns {
            let column_start = row_idx.len();
            col_ptr.push(column_start);
            column.sort_by_key(|(r, _)| *r);
            for &(r, v) in column.iter() {
                if row_idx.len() > column_start && *row_idx.last().unwrap() == r {
                    *values.last_mut().unwrap() += v;
                } else {
                    row_idx.push(r);
                    values.push(v);
                }
            }
        }
        col_ptr.push(row_idx.len());

        let total_rows = m + bound_rows;
        let a_mat = CscMatrix::new(total_rows, n, col_ptr, row_idx, values);
        let p_mat = CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());

        let mut cones: Vec<SupportedConeT<f64>> = Vec::new();
        if eq_count > 0 {
            cones.push(SupportedConeT::ZeroConeT(eq_count));
        }
        if total_rows > eq_count {
            cones.push(SupportedConeT::NonnegativeConeT(total_rows - eq_count));
        }

        if lp.is_integer.iter().any(|&flag| flag) {
            debug!("integer markers present, solving the continuous relaxation");
        }
        debug!(
            variables = n,
            constraints = m,
            bound_rows,
            nonzeros = lp.nonzero_count(),
            "shipping problem to the solver"
        );

        let mut builder = DefaultSettingsBuilder::default();
        builder.verbose(self.settings.verbose);
        if let Some(limit) = self.settings.time_limit_seconds {
            builder.time_limit(limit);
        }
        if let Some(max_iter) = self.settings.max_iterations {
            builder.max_iter(max_iter);
        }
        let settings = builder
            .build()
            .map_err(|e| SolverError::Setup(format!("settings: {e:?}")))?;

        let mut solver = DefaultSolver::new(&p_mat, &lp.linear_cost, &a_mat, &b, &cones, settings)
            .map_err(|e| SolverError::Setup(format!("{e:?}")))?;
        solver.solve();
        let sol = &solver.solution;

        let status = map_status(sol.status);
        if !status.is_success() {
            warn!(%status, "solver did not reach an optimum");
        }

        // Duals, re-oriented so each value is d(objective)/d(rhs) in the
        // row's original sense.
        let mut marginal_values = vec![0.0; m];
        for row in 0..m {
            let z = sol.z[cone_row_of[row]];
            marginal_values[row] = match lp.sense[row] {
                RowSense::GreaterOrEqual => z,
                _ => -z,
            };
        }

        // Reduced cost of a column: its cost minus what the structural row
        // duals already pay for it.
        let mut reduced_costs = lp.linear_cost.clone();
        for row in 0..m {
            let span = lp.row_start[row]..lp.row_start[row] + lp.row_len[row];
            for k in span {
                reduced_costs[lp.column_index[k]] -= lp.coefficient[k] * marginal_values[row];
            }
        }

        Ok(LpSolution {
            status,
            objective: sol.obj_val,
            primal: sol.x.clone(),
            marginal_values,
            reduced_costs,
            iterations: sol.iterations,
            solve_time_ms: start.elapsed().as_millis(),
        })
    }
}

fn map_status(status: SolverStatus) -> SolveStatus {
    match status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => SolveStatus::Optimal,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            SolveStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => SolveStatus::Unbounded,
        SolverStatus::MaxTime => SolveStatus::TimeLimit,
        SolverStatus::MaxIterations => SolveStatus::IterationLimit,
        SolverStatus::NumericalError | SolverStatus::InsufficientProgress => {
            SolveStatus::NumericalError
        }
        _ => SolveStatus::Unknown,
    }
}
