//! Areas and interconnections.

use serde::{Deserialize, Serialize};

/// One bidding/adequacy area of the simulated system.
///
/// Per-timestep series span the whole week (one entry per hour). Demand is
/// net of must-run generation, which is tracked separately so exports can
/// reconstruct gross load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Area {
    pub name: String,
    /// Net demand per hour of the week (MW), must-run already subtracted.
    pub net_demand: Vec<f64>,
    /// Must-run generation per hour (MW), for reporting only.
    pub must_run_generation: Vec<f64>,
    /// Cost of one MWh of unsupplied energy.
    pub unsupplied_energy_cost: f64,
    /// Cost of one MWh of spilled energy.
    pub spilled_energy_cost: f64,
}

/// Hurdle-cost data of one interconnection, with the reference copies used
/// by the second optimization pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferCosts {
    pub with_hurdle_costs: bool,
    pub with_loop_flow: bool,
    pub direct: Vec<f64>,
    pub indirect: Vec<f64>,
    pub direct_ref: Vec<f64>,
    pub indirect_ref: Vec<f64>,
}

/// One interconnection between two areas.
///
/// The flow variable is signed: positive from origin to extremity. NTC and
/// loop-flow series are stored per hour in [`NtcValues`], indexed by link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub origin_area: usize,
    pub extremity_area: usize,
    pub transfer_costs: TransferCosts,
}

/// Per-hour transfer capacities and loop flows, one entry per link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NtcValues {
    /// NTC in the origin -> extremity direction (MW).
    pub direct: Vec<f64>,
    /// NTC in the extremity -> origin direction (MW).
    pub indirect: Vec<f64>,
    pub loop_flow: Vec<f64>,
    pub apparent_resistance: Vec<f64>,
    /// Flow observed at the previous solve, kept for exports.
    pub flow: Vec<f64>,
}

impl NtcValues {
    pub fn zeroed(link_count: usize) -> Self {
        Self {
            direct: vec![0.0; link_count],
            indirect: vec![0.0; link_count],
            loop_flow: vec![0.0; link_count],
            apparent_resistance: vec![0.0; link_count],
            flow: vec![0.0; link_count],
        }
    }
}
