//! Thermal clusters and their unit-commitment data.

use serde::{Deserialize, Serialize};

/// One dispatchable thermal cluster of an area.
///
/// Hourly series (`available_power`, `min_power`, `production_cost`,
/// `max_units_on`, `min_units_on`) span the week. The `*_ref` copies hold
/// the values loaded from the study; the working copies are what the
/// thermal heuristic rewrites between the two optimization passes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThermalCluster {
    pub name: String,
    /// Normalized identifier derived from the name.
    pub id: String,
    /// Position of this cluster in the study-wide cluster numbering.
    pub global_index: usize,

    /// Nominal capacity of one unit (MW), spinning loss already applied.
    pub unit_size: f64,
    /// Minimum stable power of one unit (MW).
    pub unit_min_power: f64,
    pub min_up_time: usize,
    pub min_down_time: usize,
    /// max(min_up_time, min_down_time), used by the no-startup-cost heuristic.
    pub min_up_down_time: usize,

    pub startup_cost: f64,
    pub shutdown_cost: f64,
    pub fixed_cost: f64,
    pub must_run: bool,

    pub available_power: Vec<f64>,
    pub available_power_ref: Vec<f64>,
    pub min_power: Vec<f64>,
    pub min_power_ref: Vec<f64>,
    pub production_cost: Vec<f64>,
    pub max_units_on: Vec<i32>,
    pub min_units_on: Vec<i32>,
}

impl ThermalCluster {
    /// Restore the working series from the reference copies. Called by the
    /// weekly reinit so heuristic adjustments never leak across weeks.
    pub fn restore_reference_series(&mut self) {
        self.available_power.clone_from(&self.available_power_ref);
        self.min_power.clone_from(&self.min_power_ref);
    }
}

/// The thermal clusters of one area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThermalPark {
    pub clusters: Vec<ThermalCluster>,
}

impl ThermalPark {
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }
}
