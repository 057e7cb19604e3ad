//! Dense index tables mapping (entity, timestep) pairs to LP columns and
//! rows.
//!
//! Every table is a flat `Vec<i32>` keyed by a study-wide entity index,
//! one table instance per timestep of the optimization horizon. Unset
//! entries hold [`NO_INDEX`]; readers go through [`slot`] and must handle
//! `None` — a variable or row that only exists for one reserve direction is
//! simply never registered for the other.
//!
//! The tables have two lives per week: the sizing pass leaves them
//! untouched (only counters run), then the binding pass fixes every index.
//! Reading an entry that the binding pass never wrote is a programmer
//! error.

use adeq_core::{ReserveDirection, WeeklyProblem};

/// Sentinel for "not present this pass".
pub const NO_INDEX: i32 = -1;

/// Decode a table entry.
#[inline]
pub fn slot(value: i32) -> Option<usize> {
    (value >= 0).then(|| value as usize)
}

/// Study-wide entity counts, computed once the global numbering is fixed.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalCounts {
    pub areas: usize,
    pub links: usize,
    pub thermal_clusters: usize,
    pub storage_clusters: usize,
    pub reserves: usize,
    pub thermal_participations: usize,
    pub st_participations: usize,
    pub lt_participations: usize,
    pub additional_constraint_groups: usize,
    pub binding_constraints: usize,
}

/// Assign the study-wide indices every table is keyed by. The traversal
/// order here is THE canonical order: every assembly pass walks entities
/// the same way so that columns and rows line up.
pub fn assign_global_indices(problem: &mut WeeklyProblem) -> GlobalCounts {
    let mut counts = GlobalCounts {
        areas: problem.areas.len(),
        links: problem.links.len(),
        binding_constraints: problem.binding_constraints.len(),
        ..Default::default()
    };

    for park in &mut problem.thermal {
        for cluster in &mut park.clusters {
            cluster.global_index = counts.thermal_clusters;
            counts.thermal_clusters += 1;
        }
    }
    for clusters in problem.storage.iter_mut() {
        for cluster in clusters.iter_mut() {
            cluster.global_index = counts.storage_clusters;
            counts.storage_clusters += 1;
            for block in &mut cluster.additional_constraints {
                for group in &mut block.constraints {
                    group.global_index = counts.additional_constraint_groups;
                    counts.additional_constraint_groups += 1;
                }
            }
        }
    }
    for (area, hydro) in problem.hydro.iter_mut().enumerate() {
        hydro.global_index = area;
    }

    for reserves in &mut problem.reserves {
        let mut index_in_area = 0usize;
        let mut thermal_in_area = 0usize;
        let mut st_in_area = 0usize;
        let mut lt_in_area = 0usize;
        for reservation in reserves.up.iter_mut().chain(reserves.down.iter_mut()) {
            reservation.index_in_area = index_in_area;
            index_in_area += 1;
            reservation.global_index = counts.reserves;
            counts.reserves += 1;
            for p in &mut reservation.thermal_participations {
                p.global_participation_index = counts.thermal_participations;
                counts.thermal_participations += 1;
                p.area_participation_index = thermal_in_area;
                thermal_in_area += 1;
            }
            for p in &mut reservation.st_storage_participations {
                p.global_participation_index = counts.st_participations;
                counts.st_participations += 1;
                p.area_participation_index = st_in_area;
                st_in_area += 1;
            }
            for p in &mut reservation.lt_storage_participations {
                p.global_participation_index = counts.lt_participations;
                counts.lt_participations += 1;
                p.area_participation_index = lt_in_area;
                lt_in_area += 1;
            }
        }
    }
    counts
}

/// Column numbers of one timestep.
#[derive(Debug, Clone, Default)]
pub struct VariableMap {
    // Interconnections.
    pub link_flow: Vec<i32>,
    pub link_flow_direct_cost: Vec<i32>,
    pub link_flow_indirect_cost: Vec<i32>,

    // Areas.
    pub unsupplied: Vec<i32>,
    pub spilled: Vec<i32>,
    pub hydro_generation: Vec<i32>,
    pub pumping: Vec<i32>,
    pub hydro_level: Vec<i32>,
    pub overflow: Vec<i32>,

    // Thermal clusters, keyed by global cluster index.
    pub thermal_production: Vec<i32>,
    pub units_on: Vec<i32>,
    pub units_starting: Vec<i32>,
    pub units_stopping: Vec<i32>,
    pub units_failing: Vec<i32>,

    // Short-term storage, keyed by global storage index.
    pub storage_injection: Vec<i32>,
    pub storage_withdrawal: Vec<i32>,
    pub storage_level: Vec<i32>,

    // Reserves, keyed by global reserve index.
    pub reserve_unsatisfied: Vec<i32>,
    pub reserve_excess: Vec<i32>,

    // Reserve participations, keyed by global participation index.
    pub thermal_reserve_participation: Vec<i32>,
    pub thermal_reserve_participation_on: Vec<i32>,
    pub thermal_reserve_participation_off: Vec<i32>,
    pub st_reserve_turbining: Vec<i32>,
    pub st_reserve_pumping: Vec<i32>,
    pub st_reserve_participation: Vec<i32>,
    pub lt_reserve_turbining: Vec<i32>,
    pub lt_reserve_pumping: Vec<i32>,
    pub lt_reserve_participation: Vec<i32>,
}

impl VariableMap {
    pub fn sized(counts: &GlobalCounts) -> Self {
        Self {
            link_flow: vec![NO_INDEX; counts.links],
            link_flow_direct_cost: vec![NO_INDEX; counts.links],
            link_flow_indirect_cost: vec![NO_INDEX; counts.links],
            unsupplied: vec![NO_INDEX; counts.areas],
            spilled: vec![NO_INDEX; counts.areas],
            hydro_generation: vec![NO_INDEX; counts.areas],
            pumping: vec![NO_INDEX; counts.areas],
            hydro_level: vec![NO_INDEX; counts.areas],
            overflow: vec![NO_INDEX; counts.areas],
            thermal_production: vec![NO_INDEX; counts.thermal_clusters],
            units_on: vec![NO_INDEX; counts.thermal_clusters],
            units_starting: vec![NO_INDEX; counts.thermal_clusters],
            units_stopping: vec![NO_INDEX; counts.thermal_clusters],
            units_failing: vec![NO_INDEX; counts.thermal_clusters],
            storage_injection: vec![NO_INDEX; counts.storage_clusters],
            storage_withdrawal: vec![NO_INDEX; counts.storage_clusters],
            storage_level: vec![NO_INDEX; counts.storage_clusters],
            reserve_unsatisfied: vec![NO_INDEX; counts.reserves],
            reserve_excess: vec![NO_INDEX; counts.reserves],
            thermal_reserve_participation: vec![NO_INDEX; counts.thermal_participations],
            thermal_reserve_participation_on: vec![NO_INDEX; counts.thermal_participations],
            thermal_reserve_participation_off: vec![NO_INDEX; counts.thermal_participations],
            st_reserve_turbining: vec![NO_INDEX; counts.st_participations],
            st_reserve_pumping: vec![NO_INDEX; counts.st_participations],
            st_reserve_participation: vec![NO_INDEX; counts.st_participations],
            lt_reserve_turbining: vec![NO_INDEX; counts.lt_participations],
            lt_reserve_pumping: vec![NO_INDEX; counts.lt_participations],
            lt_reserve_participation: vec![NO_INDEX; counts.lt_participations],
        }
    }
}

/// Columns that exist once per week rather than once per timestep.
#[derive(Debug, Clone, Default)]
pub struct NonHourlyVariableMap {
    /// Final reservoir level, by area (accurate water-value mode).
    pub final_level: Vec<i32>,
    /// Water layers, by area then layer.
    pub water_layers: Vec<Vec<i32>>,
}

impl NonHourlyVariableMap {
    pub fn sized(counts: &GlobalCounts, layers: usize) -> Self {
        Self {
            final_level: vec![NO_INDEX; counts.areas],
            water_layers: vec![vec![NO_INDEX; layers]; counts.areas],
        }
    }
}

/// All column tables of one week.
#[derive(Debug, Clone, Default)]
pub struct VariableCorrespondence {
    pub hourly: Vec<VariableMap>,
    pub extra: NonHourlyVariableMap,
}

impl VariableCorrespondence {
    pub fn sized(counts: &GlobalCounts, horizon: usize, layers: usize) -> Self {
        Self {
            hourly: (0..horizon).map(|_| VariableMap::sized(counts)).collect(),
            extra: NonHourlyVariableMap::sized(counts, layers),
        }
    }
}

/// Row numbers of one timestep.
#[derive(Debug, Clone, Default)]
pub struct ConstraintMap {
    pub area_balance: Vec<i32>,
    pub flow_dissociation: Vec<i32>,
    pub hydro_level: Vec<i32>,
    pub storage_level: Vec<i32>,

    // Thermal unit commitment, keyed by global cluster index.
    pub thermal_pmin: Vec<i32>,
    pub thermal_pmax: Vec<i32>,
    pub unit_consistency: Vec<i32>,
    pub unit_outage: Vec<i32>,
    pub unit_min_up: Vec<i32>,
    pub unit_min_down: Vec<i32>,

    pub hourly_binding: Vec<i32>,

    // Reserves.
    pub reserve_need: Vec<i32>,
    pub thermal_participation: Vec<i32>,
    pub thermal_participation_max_on: Vec<i32>,
    pub thermal_participation_max_off: Vec<i32>,
    pub st_participation: Vec<i32>,
    pub st_energy_level: Vec<i32>,
    pub st_turbining_max: Vec<i32>,
    pub st_turbining_min: Vec<i32>,
    pub st_pumping_max: Vec<i32>,
    pub st_stock_level_down: Vec<i32>,
    pub st_stock_level_up: Vec<i32>,
    pub st_global_energy_down: Vec<i32>,
    pub st_global_energy_up: Vec<i32>,
    pub lt_participation: Vec<i32>,
    pub lt_energy_level: Vec<i32>,
    pub lt_turbining_max: Vec<i32>,
    pub lt_pumping_max: Vec<i32>,
    pub lt_stock_level_down: Vec<i32>,
    pub lt_stock_level_up: Vec<i32>,
    pub lt_global_energy_down: Vec<i32>,
    pub lt_global_energy_up: Vec<i32>,
}

impl ConstraintMap {
    pub fn sized(counts: &GlobalCounts) -> Self {
        Self {
            area_balance: vec![NO_INDEX; counts.areas],
            flow_dissociation: vec![NO_INDEX; counts.links],
            hydro_level: vec![NO_INDEX; counts.areas],
            storage_level: vec![NO_INDEX; counts.storage_clusters],
            thermal_pmin: vec![NO_INDEX; counts.thermal_clusters],
            thermal_pmax: vec![NO_INDEX; counts.thermal_clusters],
            unit_consistency: vec![NO_INDEX; counts.thermal_clusters],
            unit_outage: vec![NO_INDEX; counts.thermal_clusters],
            unit_min_up: vec![NO_INDEX; counts.thermal_clusters],
            unit_min_down: vec![NO_INDEX; counts.thermal_clusters],
            hourly_binding: vec![NO_INDEX; counts.binding_constraints],
            reserve_need: vec![NO_INDEX; counts.reserves],
            thermal_participation: vec![NO_INDEX; counts.thermal_participations],
            thermal_participation_max_on: vec![NO_INDEX; counts.thermal_participations],
            thermal_participation_max_off: vec![NO_INDEX; counts.thermal_participations],
            st_participation: vec![NO_INDEX; counts.st_participations],
            st_energy_level: vec![NO_INDEX; counts.st_participations],
            st_turbining_max: vec![NO_INDEX; counts.storage_clusters],
            st_turbining_min: vec![NO_INDEX; counts.storage_clusters],
            st_pumping_max: vec![NO_INDEX; counts.storage_clusters],
            st_stock_level_down: vec![NO_INDEX; counts.storage_clusters],
            st_stock_level_up: vec![NO_INDEX; counts.storage_clusters],
            st_global_energy_down: vec![NO_INDEX; counts.storage_clusters],
            st_global_energy_up: vec![NO_INDEX; counts.storage_clusters],
            lt_participation: vec![NO_INDEX; counts.lt_participations],
            lt_energy_level: vec![NO_INDEX; counts.lt_participations],
            lt_turbining_max: vec![NO_INDEX; counts.areas],
            lt_pumping_max: vec![NO_INDEX; counts.areas],
            lt_stock_level_down: vec![NO_INDEX; counts.areas],
            lt_stock_level_up: vec![NO_INDEX; counts.areas],
            lt_global_energy_down: vec![NO_INDEX; counts.areas],
            lt_global_energy_up: vec![NO_INDEX; counts.areas],
        }
    }
}

/// Rows emitted once per day of the horizon.
#[derive(Debug, Clone, Default)]
pub struct DailyConstraintMap {
    pub daily_binding: Vec<i32>,
    pub hydro_daily_energy: Vec<i32>,
}

impl DailyConstraintMap {
    pub fn sized(counts: &GlobalCounts) -> Self {
        Self {
            daily_binding: vec![NO_INDEX; counts.binding_constraints],
            hydro_daily_energy: vec![NO_INDEX; counts.areas],
        }
    }
}

/// Rows emitted once per optimization.
#[derive(Debug, Clone, Default)]
pub struct WeeklyConstraintMap {
    pub weekly_binding: Vec<i32>,
    /// Cumulative storage rows, keyed by global hour-group index.
    pub storage_cumulation: Vec<i32>,
    pub hydro_energy_fixed: Vec<i32>,
    pub hydro_energy_min: Vec<i32>,
    pub hydro_energy_max: Vec<i32>,
    pub pumping_energy_max: Vec<i32>,
    pub final_level_equation: Vec<i32>,
    pub final_level_layers: Vec<i32>,
}

impl WeeklyConstraintMap {
    pub fn sized(counts: &GlobalCounts) -> Self {
        Self {
            weekly_binding: vec![NO_INDEX; counts.binding_constraints],
            storage_cumulation: vec![NO_INDEX; counts.additional_constraint_groups],
            hydro_energy_fixed: vec![NO_INDEX; counts.areas],
            hydro_energy_min: vec![NO_INDEX; counts.areas],
            hydro_energy_max: vec![NO_INDEX; counts.areas],
            pumping_energy_max: vec![NO_INDEX; counts.areas],
            final_level_equation: vec![NO_INDEX; counts.areas],
            final_level_layers: vec![NO_INDEX; counts.areas],
        }
    }
}

/// All row tables of one week.
#[derive(Debug, Clone, Default)]
pub struct ConstraintCorrespondence {
    pub hourly: Vec<ConstraintMap>,
    pub daily: Vec<DailyConstraintMap>,
    pub weekly: WeeklyConstraintMap,
}

impl ConstraintCorrespondence {
    pub fn sized(counts: &GlobalCounts, horizon: usize, days: usize) -> Self {
        Self {
            hourly: (0..horizon).map(|_| ConstraintMap::sized(counts)).collect(),
            daily: (0..days).map(|_| DailyConstraintMap::sized(counts)).collect(),
            weekly: WeeklyConstraintMap::sized(counts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adeq_core::{
        AreaReserves, CapacityReservation, StorageCluster, ThermalCluster, ThermalPark,
        ThermalParticipation,
    };

    #[test]
    fn slot_decodes_the_sentinel() {
        assert_eq!(slot(NO_INDEX), None);
        assert_eq!(slot(0), Some(0));
        assert_eq!(slot(7), Some(7));
    }

    #[test]
    fn global_numbering_is_dense_across_areas() {
        let mut problem = WeeklyProblem {
            areas: vec![Default::default(), Default::default()],
            thermal: vec![
                ThermalPark {
                    clusters: vec![ThermalCluster::default(), ThermalCluster::default()],
                },
                ThermalPark {
                    clusters: vec![ThermalCluster::default()],
                },
            ],
            hydro: vec![Default::default(), Default::default()],
            storage: vec![vec![StorageCluster::default()], vec![]],
            reserves: vec![
                AreaReserves {
                    up: vec![CapacityReservation {
                        thermal_participations: vec![ThermalParticipation::default()],
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                AreaReserves::default(),
            ],
            ..Default::default()
        };
        let counts = assign_global_indices(&mut problem);
        assert_eq!(counts.thermal_clusters, 3);
        assert_eq!(problem.thermal[1].clusters[0].global_index, 2);
        assert_eq!(counts.storage_clusters, 1);
        assert_eq!(counts.reserves, 1);
        assert_eq!(counts.thermal_participations, 1);
    }
}
