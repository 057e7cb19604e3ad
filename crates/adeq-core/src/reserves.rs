//! Operating reserves: capacity reservations and cluster participations.
//!
//! Each area carries two lists of capacity reservations (up and down). A
//! reservation names the clusters allowed to serve it, by kind: thermal,
//! short-term storage, long-term storage. Participation records carry the
//! per-cluster limits and the position of the participation in the
//! study-wide numbering used for variable indexation.

use serde::{Deserialize, Serialize};

/// Direction of a reserve: `Up` increases net generation on activation,
/// `Down` decreases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReserveDirection {
    Up,
    Down,
}

/// Participation of a thermal cluster in one reservation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThermalParticipation {
    /// Index of the cluster inside its area's thermal park.
    pub cluster_index: usize,
    pub cluster_name: String,
    /// Maximum participation power of running units (MW).
    pub max_power_on: f64,
    /// Maximum participation power of off units (MW); up reserves only.
    pub max_power_off: f64,
    pub participation_cost: f64,
    pub global_participation_index: usize,
    pub area_participation_index: usize,
}

/// Participation of a short-term or long-term storage cluster in one
/// reservation. For long-term storage `cluster_index` is unused (one
/// reservoir per area).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageParticipation {
    pub cluster_index: usize,
    pub cluster_name: String,
    /// Maximum participation served by turbining/withdrawal (MW).
    pub max_turbining: f64,
    /// Maximum participation served by pumping/injection (MW).
    pub max_pumping: f64,
    pub participation_cost: f64,
    pub global_participation_index: usize,
    pub area_participation_index: usize,
}

/// One capacity reservation of an area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacityReservation {
    pub name: String,
    /// Required reserve per hour of the week (MW).
    pub need: Vec<f64>,
    pub failure_cost: f64,
    pub spillage_cost: f64,
    /// Length of the activation window, in hours. Zero disables every
    /// stock-level coupling row for this reservation.
    pub max_activation_duration: usize,
    /// Fraction of the participation power the stock must back over the
    /// activation window.
    pub max_activation_ratio: f64,
    /// Fraction of the stored energy available to the activation.
    pub max_energy_activation_ratio: f64,

    pub index_in_area: usize,
    pub global_index: usize,

    pub thermal_participations: Vec<ThermalParticipation>,
    pub st_storage_participations: Vec<StorageParticipation>,
    pub lt_storage_participations: Vec<StorageParticipation>,
}

impl CapacityReservation {
    pub fn thermal_participation_for(&self, cluster_index: usize) -> Option<&ThermalParticipation> {
        self.thermal_participations
            .iter()
            .find(|p| p.cluster_index == cluster_index)
    }

    pub fn st_participation_for(&self, cluster_index: usize) -> Option<&StorageParticipation> {
        self.st_storage_participations
            .iter()
            .find(|p| p.cluster_index == cluster_index)
    }
}

/// All reservations of one area, split by direction, plus the global
/// activation figures used by the stock-energy coupling rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaReserves {
    pub up: Vec<CapacityReservation>,
    pub down: Vec<CapacityReservation>,
    pub max_global_activation_duration_up: usize,
    pub max_global_activation_duration_down: usize,
    pub max_global_energy_activation_ratio_up: f64,
    pub max_global_energy_activation_ratio_down: f64,
}

impl AreaReserves {
    pub fn for_direction(&self, direction: ReserveDirection) -> &[CapacityReservation] {
        match direction {
            ReserveDirection::Up => &self.up,
            ReserveDirection::Down => &self.down,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.up.is_empty() && self.down.is_empty()
    }
}
