//! Loader for the run parameters file (`parameters.yml`).

use std::fs;
use std::path::Path;

use tracing::error;

use adeq_core::{CoreError, CoreResult, RunOptions};

/// Parse run options from YAML text.
pub fn parse_parameters(content: &str) -> CoreResult<RunOptions> {
    serde_yaml::from_str(content).map_err(|e| {
        let location = e
            .location()
            .map(|l| format!(" (line {} column {})", l.line(), l.column()))
            .unwrap_or_default();
        error!("error while parsing the yaml parameters file{location}: {e}");
        CoreError::InvalidInput(format!("parameters.yml{location}: {e}"))
    })
}

/// Read `parameters.yml` from a study folder. A missing file yields the
/// defaults.
pub fn load_parameters(study_path: &Path) -> CoreResult<RunOptions> {
    let path = study_path.join("parameters.yml");
    if !path.exists() {
        return Ok(RunOptions::default());
    }
    parse_parameters(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adeq_core::{MpsExport, OptimizationHorizon, WaterValueMode};

    #[test]
    fn parses_the_full_option_set() {
        let options = parse_parameters(
            "optimization_horizon: daily\n\
             startup_costs: on\n\
             integer_variables: off\n\
             water_value_mode: accurate\n\
             export_mps: on_error\n\
             export_structure: on\n\
             export_raw_results: off\n\
             adequacy_patch: off\n\
             best_effort: true\n\
             solver:\n  time_limit_seconds: 120.0\n  verbose: false\n",
        )
        .unwrap();
        assert_eq!(options.optimization_horizon, OptimizationHorizon::Daily);
        assert!(options.startup_costs.is_on());
        assert_eq!(options.water_value_mode, WaterValueMode::Accurate);
        assert_eq!(options.export_mps, MpsExport::OnError);
        assert!(options.best_effort);
        assert_eq!(options.solver.time_limit_seconds, Some(120.0));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let options = parse_parameters("startup_costs: on\n").unwrap();
        assert!(options.startup_costs.is_on());
        assert_eq!(options.optimization_horizon, OptimizationHorizon::Weekly);
    }

    #[test]
    fn malformed_yaml_is_reported_with_location() {
        let err = parse_parameters("optimization_horizon: [oops\n").unwrap_err();
        assert!(err.to_string().contains("parameters.yml"));
    }

    #[test]
    fn unknown_enum_value_is_rejected() {
        assert!(parse_parameters("export_mps: sometimes\n").is_err());
    }
}
