//! In-memory linear problem container.
//!
//! [`LpProblem`] is the CSR-like matrix the weekly assembly passes write
//! into and the solver driver reads from. It is owned by the weekly problem
//! and reused across weeks: the sizing pass announces the final variable and
//! constraint counts, `resize` allocates every parallel vector once, and the
//! emission passes fill them in place.
//!
//! Layout mirrors the classic simplex input format: one row per constraint
//! described by `(row_start, row_len)` into the shared `column_index` /
//! `coefficient` arrays, plus parallel sense and right-hand-side vectors.

use serde::{Deserialize, Serialize};

/// Stand-in for an unreached bound. A large finite constant rather than
/// `f64::INFINITY` so the solver interface never sees non-finite input.
pub const INFINITE_BOUND: f64 = 1.0e80;

/// Sense of a constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSense {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

impl RowSense {
    /// One-character tag used by textual exports (`<`, `=`, `>`).
    pub fn tag(&self) -> char {
        match self {
            RowSense::LessOrEqual => '<',
            RowSense::Equal => '=',
            RowSense::GreaterOrEqual => '>',
        }
    }
}

/// Announced sizes produced by a sizing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnouncedSizes {
    pub variables: usize,
    pub constraints: usize,
    pub nonzeros: usize,
}

/// The weekly linear (or mixed-integer) problem in CSR-like form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LpProblem {
    pub variable_count: usize,
    pub constraint_count: usize,

    // Per-variable vectors.
    pub linear_cost: Vec<f64>,
    pub lower_bound: Vec<f64>,
    pub upper_bound: Vec<f64>,
    pub is_integer: Vec<bool>,
    pub variable_name: Vec<String>,

    // Per-constraint vectors.
    pub row_start: Vec<usize>,
    pub row_len: Vec<usize>,
    pub sense: Vec<RowSense>,
    pub rhs: Vec<f64>,
    pub constraint_name: Vec<String>,

    // Shared term arrays.
    pub column_index: Vec<usize>,
    pub coefficient: Vec<f64>,
}

impl LpProblem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate every parallel vector to the announced sizes and reset the
    /// running counters. Called once per week, after the sizing pass.
    pub fn resize(&mut self, sizes: AnnouncedSizes) {
        self.variable_count = 0;
        self.constraint_count = 0;

        self.linear_cost.clear();
        self.linear_cost.resize(sizes.variables, 0.0);
        self.lower_bound.clear();
        self.lower_bound.resize(sizes.variables, 0.0);
        self.upper_bound.clear();
        self.upper_bound.resize(sizes.variables, INFINITE_BOUND);
        self.is_integer.clear();
        self.is_integer.resize(sizes.variables, false);
        self.variable_name.clear();
        self.variable_name.resize(sizes.variables, String::new());

        self.row_start.clear();
        self.row_start.resize(sizes.constraints, 0);
        self.row_len.clear();
        self.row_len.resize(sizes.constraints, 0);
        self.sense.clear();
        self.sense.resize(sizes.constraints, RowSense::Equal);
        self.rhs.clear();
        self.rhs.resize(sizes.constraints, 0.0);
        self.constraint_name.clear();
        self.constraint_name.resize(sizes.constraints, String::new());

        self.column_index.clear();
        self.column_index.reserve(sizes.nonzeros);
        self.coefficient.clear();
        self.coefficient.reserve(sizes.nonzeros);
    }

    pub fn nonzero_count(&self) -> usize {
        self.coefficient.len()
    }

    /// Check the structural invariants every finished assembly must satisfy:
    /// parallel vector lengths, `xmin <= xmax`, and at least one term per row.
    pub fn check_consistency(&self) -> Result<(), String> {
        let n = self.variable_count;
        let m = self.constraint_count;
        if self.linear_cost.len() != n
            || self.lower_bound.len() != n
            || self.upper_bound.len() != n
            || self.is_integer.len() != n
            || self.variable_name.len() != n
        {
            return Err(format!("variable vectors do not all have length {n}"));
        }
        if self.row_start.len() != m
            || self.row_len.len() != m
            || self.sense.len() != m
            || self.rhs.len() != m
            || self.constraint_name.len() != m
        {
            return Err(format!("constraint vectors do not all have length {m}"));
        }
        for (v, (lo, hi)) in self.lower_bound.iter().zip(&self.upper_bound).enumerate() {
            if lo > hi {
                return Err(format!("variable {v}: xmin {lo} > xmax {hi}"));
            }
        }
        for row in 0..m {
            if self.row_len[row] == 0 {
                return Err(format!("constraint {row} has no coefficient"));
            }
            let end = self.row_start[row] + self.row_len[row];
            if end > self.column_index.len() {
                return Err(format!("constraint {row} overruns the term arrays"));
            }
            for &col in &self.column_index[self.row_start[row]..end] {
                if col >= n {
                    return Err(format!("constraint {row} references column {col} >= {n}"));
                }
            }
        }
        Ok(())
    }
}
