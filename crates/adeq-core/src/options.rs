//! Run options of the weekly optimization, as exposed to callers and to
//! the `parameters.yml` loader.

use serde::{Deserialize, Serialize};

/// Number of timesteps covered by one optimization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationHorizon {
    Daily,
    #[default]
    Weekly,
}

/// A plain on/off switch, spelled `on`/`off` in parameter files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    On,
    #[default]
    Off,
}

impl Toggle {
    pub fn is_on(&self) -> bool {
        matches!(self, Toggle::On)
    }
}

/// Water-value modelling of the final reservoir level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterValueMode {
    #[default]
    Simple,
    Accurate,
}

/// When to write the MPS rendition of the weekly matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MpsExport {
    #[default]
    None,
    OnError,
    Always,
}

/// Solver-facing knobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub time_limit_seconds: Option<f64>,
    pub verbose: bool,
}

/// The full option set of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub optimization_horizon: OptimizationHorizon,
    pub startup_costs: Toggle,
    pub integer_variables: Toggle,
    pub water_value_mode: WaterValueMode,
    pub export_mps: MpsExport,
    pub export_structure: Toggle,
    pub export_raw_results: Toggle,
    pub adequacy_patch: Toggle,
    /// When true a failed week is marked missing instead of halting the run.
    pub best_effort: bool,
    /// Emit stable variable and constraint names into the problem.
    pub named_problems: bool,
    pub solver: SolverOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let options = RunOptions::default();
        assert_eq!(options.optimization_horizon, OptimizationHorizon::Weekly);
        assert!(!options.startup_costs.is_on());
        assert_eq!(options.export_mps, MpsExport::None);
        assert!(!options.best_effort);
    }

    #[test]
    fn options_round_trip_through_serde() {
        let options = RunOptions {
            optimization_horizon: OptimizationHorizon::Daily,
            startup_costs: Toggle::On,
            export_mps: MpsExport::OnError,
            ..Default::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("\"on_error\""));
        let back: RunOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.optimization_horizon, OptimizationHorizon::Daily);
        assert!(back.startup_costs.is_on());
    }
}
