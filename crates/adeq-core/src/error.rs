//! Unified error types for the adeq ecosystem
//!
//! This module provides a common error type [`CoreError`] that can represent
//! errors from any part of the system: input validation, problem assembly,
//! solver failures and I/O. Assembly errors carry a [`ProblemContext`] with
//! enough structural information (year, week, area, cluster, reserve,
//! timestep) to re-locate the offending row in a matrix dump.

use thiserror::Error;

/// Structural location of an assembly error inside a weekly problem.
///
/// Every field is optional; `Display` only prints the parts that are set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemContext {
    pub year: Option<u32>,
    pub week: Option<u32>,
    pub area: Option<String>,
    pub cluster: Option<String>,
    pub reserve: Option<String>,
    pub timestep: Option<usize>,
}

impl ProblemContext {
    pub fn week(year: u32, week: u32) -> Self {
        Self {
            year: Some(year),
            week: Some(week),
            ..Default::default()
        }
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    pub fn with_reserve(mut self, reserve: impl Into<String>) -> Self {
        self.reserve = Some(reserve.into());
        self
    }

    pub fn with_timestep(mut self, timestep: usize) -> Self {
        self.timestep = Some(timestep);
        self
    }
}

impl std::fmt::Display for ProblemContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let (Some(y), Some(w)) = (self.year, self.week) {
            parts.push(format!("year {y} week {w}"));
        }
        if let Some(a) = &self.area {
            parts.push(format!("area `{a}`"));
        }
        if let Some(c) = &self.cluster {
            parts.push(format!("cluster `{c}`"));
        }
        if let Some(r) = &self.reserve {
            parts.push(format!("reserve `{r}`"));
        }
        if let Some(t) = self.timestep {
            parts.push(format!("timestep {t}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Unified error type for all adeq operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration that cannot make a model (unknown cluster referenced,
    /// hour out of range, conflicting bound).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The sizing pass and the emission pass disagree on the number of rows
    /// or non-zeros. Always fatal.
    #[error("inconsistent sizing ({context}): {detail}")]
    InconsistentSizing {
        context: ProblemContext,
        detail: String,
    },

    /// The solver reported the problem infeasible.
    #[error("solver reported infeasible problem ({0})")]
    SolverInfeasible(ProblemContext),

    /// The solver reported the problem unbounded.
    #[error("solver reported unbounded problem ({0})")]
    SolverUnbounded(ProblemContext),

    /// The solver hit its time limit.
    #[error("solver time limit exceeded ({0})")]
    SolverTimeLimit(ProblemContext),

    /// The solver failed for numerical reasons.
    #[error("solver numerical failure ({0}): {1}")]
    SolverNumerical(ProblemContext, String),

    /// The result writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sentinel for unreachable paths.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        CoreError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_display_prints_only_set_fields() {
        let ctx = ProblemContext::week(2030, 12)
            .with_area("fr")
            .with_timestep(42);
        let s = ctx.to_string();
        assert!(s.contains("year 2030 week 12"));
        assert!(s.contains("area `fr`"));
        assert!(s.contains("timestep 42"));
        assert!(!s.contains("cluster"));
    }

    #[test]
    fn invalid_input_display() {
        let err = CoreError::InvalidInput("H not smaller than Pmax everywhere".into());
        assert!(err.to_string().contains("invalid input"));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CoreError = io_err.into();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
