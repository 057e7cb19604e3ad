//! Hydro reservoirs: stock dynamics, rule curves and water values.

use serde::{Deserialize, Serialize};

/// Number of stacked water layers used to express the final reservoir level
/// when the accurate water-value mode is active.
pub const WATER_LAYER_COUNT: usize = 100;

/// Hydro characteristics of one area.
///
/// An area without a reservoir keeps `has_dispatchable_hydro == false` and
/// the assembly passes skip every hydro variable and row for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HydroReservoir {
    pub has_dispatchable_hydro: bool,
    pub has_pumping: bool,

    /// Energy budgets per optimization interval (MWh).
    pub min_energy_per_interval: Vec<f64>,
    pub max_energy_per_interval: Vec<f64>,
    pub fixed_energy_per_interval: Vec<f64>,
    pub max_pumping_energy_per_interval: Vec<f64>,
    /// Daily energy budget (MWh), used when optimizing at the weekly step.
    pub daily_energy: Vec<f64>,

    /// Hourly generation/pumping capacity (MW).
    pub hourly_max_generation: Vec<f64>,
    pub hourly_max_generation_ref: Vec<f64>,
    pub hourly_max_pumping: Vec<f64>,
    pub hourly_min_generation: Vec<f64>,

    /// Natural inflows per hour (MWh).
    pub inflows: Vec<f64>,
    /// Rule curves: hourly bounds on the stored energy (MWh).
    pub level_ceiling: Vec<f64>,
    pub level_floor: Vec<f64>,

    pub initial_level: f64,
    pub reservoir_capacity: f64,
    pub pumping_ratio: f64,

    /// When true the stock level is tracked hour by hour in the LP.
    pub follow_hourly_level: bool,
    /// When true the weekly energy is bounded instead of fixed.
    pub generation_between_bounds: bool,

    /// Water-value data. `accurate_water_value` switches the final-level
    /// expression over [`WATER_LAYER_COUNT`] layers on.
    pub accurate_water_value: bool,
    pub weekly_water_value: f64,
    pub water_layer_values: Vec<f64>,
    pub inflow_for_time_interval: Vec<f64>,
    pub level_for_time_interval: f64,

    /// Position of this reservoir in the study-wide long-term-storage
    /// numbering, used by reserve participations.
    pub global_index: usize,
}

/// Step-by-step reservoir level tracker used after a solve.
///
/// Applies `level += inflow - generation + ratio * pumping`, clamping
/// overflow at capacity and carrying any deficit below zero into the next
/// step's inflows.
#[derive(Debug)]
pub struct LevelTracker {
    level: f64,
    capacity: f64,
    pumping_ratio: f64,
    deficit: f64,
}

impl LevelTracker {
    pub fn new(initial_level: f64, capacity: f64, pumping_ratio: f64) -> Self {
        Self {
            level: initial_level,
            capacity,
            pumping_ratio,
            deficit: 0.0,
        }
    }

    /// Advance one step. Returns `(level, overflow)` after clamping.
    pub fn step(&mut self, inflow: f64, generation: f64, pumping: f64) -> (f64, f64) {
        let inflow = inflow - self.deficit;
        self.deficit = 0.0;
        self.level = self.level + inflow - generation + self.pumping_ratio * pumping;

        let mut overflow = 0.0;
        if self.level > self.capacity {
            overflow = self.level - self.capacity;
            self.level = self.capacity;
        }
        if self.level < 0.0 {
            self.deficit = -self.level;
            self.level = 0.0;
        }
        (self.level, overflow)
    }

    pub fn level(&self) -> f64 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_clamps_overflow_at_capacity() {
        let mut tracker = LevelTracker::new(90.0, 100.0, 1.0);
        let (level, overflow) = tracker.step(20.0, 0.0, 0.0);
        assert_eq!(level, 100.0);
        assert_eq!(overflow, 10.0);
    }

    #[test]
    fn tracker_carries_deficit_into_next_step() {
        let mut tracker = LevelTracker::new(5.0, 100.0, 1.0);
        let (level, _) = tracker.step(0.0, 15.0, 0.0);
        assert_eq!(level, 0.0);
        // The 10 MWh deficit is paid back out of the next inflow.
        let (level, _) = tracker.step(30.0, 0.0, 0.0);
        assert_eq!(level, 20.0);
    }

    #[test]
    fn tracker_applies_pumping_ratio() {
        let mut tracker = LevelTracker::new(0.0, 100.0, 0.8);
        let (level, _) = tracker.step(0.0, 0.0, 10.0);
        assert!((level - 8.0).abs() < 1e-12);
    }
}
