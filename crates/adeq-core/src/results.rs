//! Hourly result containers and the typed back-pointers that route solver
//! output into them.
//!
//! The assembly passes register, for every column and row of the LP, where
//! its optimal value (or dual value) must land once the solver returns.
//! Instead of raw pointers these are the [`PrimalTarget`] and [`DualTarget`]
//! enums, applied in one dispatch pass after each solve. A column whose
//! value is purely internal keeps [`PrimalTarget::None`].

use serde::{Deserialize, Serialize};

use crate::area::NtcValues;

/// Unit-commitment results of the thermal clusters of one area, for one
/// hour. Inner vectors are indexed by cluster (participation vectors by the
/// participation's index in the area).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThermalHourResults {
    pub production: Vec<f64>,
    pub units_on: Vec<f64>,
    pub units_starting: Vec<f64>,
    pub units_stopping: Vec<f64>,
    pub units_failing: Vec<f64>,
    pub reserve_participation: Vec<f64>,
    pub reserve_participation_on: Vec<f64>,
    pub reserve_participation_off: Vec<f64>,
}

/// Short-term storage results of one area, for one hour; indexed by cluster
/// (participation vector by participation-in-area index).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageHourResults {
    pub level: Vec<f64>,
    pub injection: Vec<f64>,
    pub withdrawal: Vec<f64>,
    pub reserve_participation: Vec<f64>,
}

/// Reserve results of one area, for one hour; indexed by the reservation's
/// index in the area (up reservations first, then down).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReserveHourResults {
    pub unsatisfied: Vec<f64>,
    pub excess: Vec<f64>,
    pub marginal_cost: Vec<f64>,
}

/// All hourly results of one area for one week.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaResults {
    pub unsupplied: Vec<f64>,
    pub spilled: Vec<f64>,
    pub hydro_generation: Vec<f64>,
    pub pumping: Vec<f64>,
    pub hydro_level: Vec<f64>,
    pub overflow: Vec<f64>,
    pub hourly_water_value: Vec<f64>,
    /// Dual of the area balance (€/MWh).
    pub marginal_price: Vec<f64>,
    /// Long-term storage reserve participation, by hour then by
    /// participation-in-area index.
    pub hydro_reserve_participation: Vec<Vec<f64>>,
    pub thermal: Vec<ThermalHourResults>,
    pub storage: Vec<StorageHourResults>,
    pub reserves: Vec<ReserveHourResults>,
}

impl AreaResults {
    /// Allocate every vector for the given shapes, zero-filled.
    pub fn sized(
        hours: usize,
        thermal_clusters: usize,
        thermal_participations: usize,
        storage_clusters: usize,
        storage_participations: usize,
        lt_participations: usize,
        reserve_count: usize,
    ) -> Self {
        Self {
            unsupplied: vec![0.0; hours],
            spilled: vec![0.0; hours],
            hydro_generation: vec![0.0; hours],
            pumping: vec![0.0; hours],
            hydro_level: vec![0.0; hours],
            overflow: vec![0.0; hours],
            hourly_water_value: vec![0.0; hours],
            marginal_price: vec![0.0; hours],
            hydro_reserve_participation: vec![vec![0.0; lt_participations]; hours],
            thermal: (0..hours)
                .map(|_| ThermalHourResults {
                    production: vec![0.0; thermal_clusters],
                    units_on: vec![0.0; thermal_clusters],
                    units_starting: vec![0.0; thermal_clusters],
                    units_stopping: vec![0.0; thermal_clusters],
                    units_failing: vec![0.0; thermal_clusters],
                    reserve_participation: vec![0.0; thermal_participations],
                    reserve_participation_on: vec![0.0; thermal_participations],
                    reserve_participation_off: vec![0.0; thermal_participations],
                })
                .collect(),
            storage: (0..hours)
                .map(|_| StorageHourResults {
                    level: vec![0.0; storage_clusters],
                    injection: vec![0.0; storage_clusters],
                    withdrawal: vec![0.0; storage_clusters],
                    reserve_participation: vec![0.0; storage_participations],
                })
                .collect(),
            reserves: (0..hours)
                .map(|_| ReserveHourResults {
                    unsatisfied: vec![0.0; reserve_count],
                    excess: vec![0.0; reserve_count],
                    marginal_cost: vec![0.0; reserve_count],
                })
                .collect(),
        }
    }
}

/// Destination of one optimized variable value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PrimalTarget {
    /// Internal variable, no user-visible output.
    #[default]
    None,
    Unsupplied { area: usize, hour: usize },
    Spilled { area: usize, hour: usize },
    ThermalProduction { area: usize, hour: usize, cluster: usize },
    UnitsOn { area: usize, hour: usize, cluster: usize },
    UnitsStarting { area: usize, hour: usize, cluster: usize },
    UnitsStopping { area: usize, hour: usize, cluster: usize },
    UnitsFailing { area: usize, hour: usize, cluster: usize },
    HydroGeneration { area: usize, hour: usize },
    Pumping { area: usize, hour: usize },
    HydroLevel { area: usize, hour: usize },
    Overflow { area: usize, hour: usize },
    LinkFlow { link: usize, hour: usize },
    StorageInjection { area: usize, hour: usize, cluster: usize },
    StorageWithdrawal { area: usize, hour: usize, cluster: usize },
    StorageLevel { area: usize, hour: usize, cluster: usize },
    ReserveUnsatisfied { area: usize, hour: usize, reserve: usize },
    ReserveExcess { area: usize, hour: usize, reserve: usize },
    ThermalReserveParticipation { area: usize, hour: usize, participation: usize },
    ThermalReserveParticipationOn { area: usize, hour: usize, participation: usize },
    ThermalReserveParticipationOff { area: usize, hour: usize, participation: usize },
    StorageReserveParticipation { area: usize, hour: usize, participation: usize },
    HydroReserveParticipation { area: usize, hour: usize, participation: usize },
}

impl PrimalTarget {
    /// Route one primal value into the result containers.
    pub fn store(&self, value: f64, results: &mut [AreaResults], ntc: &mut [NtcValues]) {
        match *self {
            PrimalTarget::None => {}
            PrimalTarget::Unsupplied { area, hour } => results[area].unsupplied[hour] = value,
            PrimalTarget::Spilled { area, hour } => results[area].spilled[hour] = value,
            PrimalTarget::ThermalProduction { area, hour, cluster } => {
                results[area].thermal[hour].production[cluster] = value;
            }
            PrimalTarget::UnitsOn { area, hour, cluster } => {
                results[area].thermal[hour].units_on[cluster] = value;
            }
            PrimalTarget::UnitsStarting { area, hour, cluster } => {
                results[area].thermal[hour].units_starting[cluster] = value;
            }
            PrimalTarget::UnitsStopping { area, hour, cluster } => {
                results[area].thermal[hour].units_stopping[cluster] = value;
            }
            PrimalTarget::UnitsFailing { area, hour, cluster } => {
                results[area].thermal[hour].units_failing[cluster] = value;
            }
            PrimalTarget::HydroGeneration { area, hour } => {
                results[area].hydro_generation[hour] = value;
            }
            PrimalTarget::Pumping { area, hour } => results[area].pumping[hour] = value,
            PrimalTarget::HydroLevel { area, hour } => results[area].hydro_level[hour] = value,
            PrimalTarget::Overflow { area, hour } => results[area].overflow[hour] = value,
            PrimalTarget::LinkFlow { link, hour } => ntc[hour].flow[link] = value,
            PrimalTarget::StorageInjection { area, hour, cluster } => {
                results[area].storage[hour].injection[cluster] = value;
            }
            PrimalTarget::StorageWithdrawal { area, hour, cluster } => {
                results[area].storage[hour].withdrawal[cluster] = value;
            }
            PrimalTarget::StorageLevel { area, hour, cluster } => {
                results[area].storage[hour].level[cluster] = value;
            }
            PrimalTarget::ReserveUnsatisfied { area, hour, reserve } => {
                results[area].reserves[hour].unsatisfied[reserve] = value;
            }
            PrimalTarget::ReserveExcess { area, hour, reserve } => {
                results[area].reserves[hour].excess[reserve] = value;
            }
            PrimalTarget::ThermalReserveParticipation { area, hour, participation } => {
                results[area].thermal[hour].reserve_participation[participation] = value;
            }
            PrimalTarget::ThermalReserveParticipationOn { area, hour, participation } => {
                results[area].thermal[hour].reserve_participation_on[participation] = value;
            }
            PrimalTarget::ThermalReserveParticipationOff { area, hour, participation } => {
                results[area].thermal[hour].reserve_participation_off[participation] = value;
            }
            PrimalTarget::StorageReserveParticipation { area, hour, participation } => {
                results[area].storage[hour].reserve_participation[participation] = value;
            }
            PrimalTarget::HydroReserveParticipation { area, hour, participation } => {
                results[area].hydro_reserve_participation[hour][participation] = value;
            }
        }
    }
}

/// Destination of one constraint's dual value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum DualTarget {
    #[default]
    None,
    AreaBalance { area: usize, hour: usize },
    ReserveNeed { area: usize, hour: usize, reserve: usize },
    /// Duals of binding constraints land in a per-constraint series, one
    /// entry per emitted row.
    Binding { constraint: usize, row: usize },
}

impl DualTarget {
    pub fn store(&self, value: f64, results: &mut [AreaResults], binding_duals: &mut [Vec<f64>]) {
        match *self {
            DualTarget::None => {}
            DualTarget::AreaBalance { area, hour } => results[area].marginal_price[hour] = value,
            DualTarget::ReserveNeed { area, hour, reserve } => {
                results[area].reserves[hour].marginal_cost[reserve] = value;
            }
            DualTarget::Binding { constraint, row } => binding_duals[constraint][row] = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primal_target_routes_into_the_right_cell() {
        let mut results = vec![AreaResults::sized(2, 1, 0, 0, 0, 0, 0)];
        let mut ntc = vec![NtcValues::zeroed(1), NtcValues::zeroed(1)];

        PrimalTarget::ThermalProduction {
            area: 0,
            hour: 1,
            cluster: 0,
        }
        .store(42.0, &mut results, &mut ntc);
        PrimalTarget::LinkFlow { link: 0, hour: 0 }.store(-7.0, &mut results, &mut ntc);
        PrimalTarget::None.store(99.0, &mut results, &mut ntc);

        assert_eq!(results[0].thermal[1].production[0], 42.0);
        assert_eq!(ntc[0].flow[0], -7.0);
    }

    #[test]
    fn dual_target_routes_marginal_prices() {
        let mut results = vec![AreaResults::sized(1, 0, 0, 0, 0, 0, 1)];
        let mut binding = vec![vec![0.0; 3]];

        DualTarget::AreaBalance { area: 0, hour: 0 }.store(50.0, &mut results, &mut binding);
        DualTarget::Binding { constraint: 0, row: 2 }.store(1.5, &mut results, &mut binding);

        assert_eq!(results[0].marginal_price[0], 50.0);
        assert_eq!(binding[0][2], 1.5);
    }
}
