//! User-defined binding constraints coupling flows and thermal dispatch.

use serde::{Deserialize, Serialize};

use crate::lp::RowSense;

/// Time scope of a binding constraint. Hourly constraints are emitted once
/// per hour of the horizon; daily and weekly ones once per day or week, with
/// every hour of the period summed into the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintScope {
    Hourly,
    Daily,
    Weekly,
}

/// One weighted interconnection term, with an optional time offset relative
/// to the constraint's hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTerm {
    pub link_index: usize,
    pub weight: f64,
    pub offset: i32,
}

/// One weighted thermal-dispatch term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermalTerm {
    pub area_index: usize,
    /// Index of the cluster inside its area's thermal park.
    pub cluster_index: usize,
    pub weight: f64,
    pub offset: i32,
}

/// One binding constraint. The RHS series has one entry per emitted row
/// (hour for hourly, day for daily, single entry for weekly).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConstraint {
    pub name: String,
    pub scope: ConstraintScope,
    pub sense: RowSense,
    pub rhs: Vec<f64>,
    pub link_terms: Vec<LinkTerm>,
    pub thermal_terms: Vec<ThermalTerm>,
}

impl BindingConstraint {
    pub fn term_count(&self) -> usize {
        self.link_terms.len() + self.thermal_terms.len()
    }
}
