//! Short-term storage clusters (batteries, pumped hydro) and their
//! additional cumulative constraints.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::problem::HOURS_PER_WEEK;

/// Hourly series of one short-term storage cluster. Modulations are in
/// [0, 1] and scale the nominal capacities; rule curves are in fractions of
/// the reservoir capacity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSeries {
    pub max_injection_modulation: Vec<f64>,
    pub max_withdrawal_modulation: Vec<f64>,
    pub inflows: Vec<f64>,
    pub lower_rule_curve: Vec<f64>,
    pub upper_rule_curve: Vec<f64>,
}

/// The variable an additional constraint sums over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintVariable {
    Injection,
    Withdrawal,
    /// Injection minus withdrawal.
    Netting,
}

/// Comparison operator of an additional constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintOperator {
    Less,
    Equal,
    Greater,
}

/// One hour-group of an additional-constraints block: the set of
/// hours-of-week (1-based, in [1, 168]) whose chosen variable is summed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SingleAdditionalConstraint {
    pub hours: BTreeSet<u32>,
    pub global_index: usize,
    pub local_index: usize,
}

impl SingleAdditionalConstraint {
    pub fn is_valid_hours_range(&self) -> bool {
        match (self.hours.first(), self.hours.last()) {
            (Some(&min), Some(&max)) => min >= 1 && max as usize <= HOURS_PER_WEEK,
            _ => false,
        }
    }
}

/// One additional-constraints block attached to a storage cluster: a named
/// set of hour-groups sharing a variable, an operator, and a per-group RHS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalConstraints {
    pub name: String,
    pub cluster_id: String,
    pub variable: ConstraintVariable,
    pub operator: ConstraintOperator,
    pub rhs: Vec<f64>,
    pub constraints: Vec<SingleAdditionalConstraint>,
}

impl AdditionalConstraints {
    /// Validate the block. Errors name the first failing rule so the loader
    /// can report it next to the section name.
    pub fn validate(&self) -> CoreResult<()> {
        if self.cluster_id.is_empty() {
            return Err(CoreError::InvalidInput("Cluster ID is empty.".into()));
        }
        if self.constraints.is_empty() {
            return Err(CoreError::InvalidInput(
                "Constraint contains no hour group.".into(),
            ));
        }
        if !self.constraints.iter().all(|c| c.is_valid_hours_range()) {
            return Err(CoreError::InvalidInput(
                "Hours set contains invalid values. Must be between 1 and 168.".into(),
            ));
        }
        Ok(())
    }
}

/// One short-term storage cluster of an area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageCluster {
    pub name: String,
    pub id: String,
    /// Position in the study-wide storage numbering.
    pub global_index: usize,

    pub reservoir_capacity: f64,
    pub injection_nominal_capacity: f64,
    pub withdrawal_nominal_capacity: f64,
    pub injection_efficiency: f64,
    pub withdrawal_efficiency: f64,
    pub initial_level: f64,
    /// When true the initial level is optimized and the week is cyclic.
    pub initial_level_optim: bool,

    pub series: StorageSeries,
    pub additional_constraints: Vec<AdditionalConstraints>,
}

impl StorageCluster {
    /// Fail fast on a cluster whose data cannot make a model.
    pub fn validate(&self) -> CoreResult<()> {
        if self.reservoir_capacity > 0.0 && self.initial_level > self.reservoir_capacity {
            return Err(CoreError::InvalidInput(format!(
                "storage cluster `{}`: initial level {} exceeds capacity {}",
                self.name, self.initial_level, self.reservoir_capacity
            )));
        }
        for block in &self.additional_constraints {
            block.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour_group(hours: &[u32]) -> SingleAdditionalConstraint {
        SingleAdditionalConstraint {
            hours: hours.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn block(groups: Vec<SingleAdditionalConstraint>) -> AdditionalConstraints {
        AdditionalConstraints {
            name: "cumul".into(),
            cluster_id: "battery".into(),
            variable: ConstraintVariable::Injection,
            operator: ConstraintOperator::Less,
            rhs: vec![0.0; groups.len()],
            constraints: groups,
        }
    }

    #[test]
    fn accepts_hours_within_week() {
        assert!(block(vec![hour_group(&[1, 24, 168])]).validate().is_ok());
    }

    #[test]
    fn rejects_hour_zero_and_beyond_week() {
        assert!(block(vec![hour_group(&[0, 5])]).validate().is_err());
        assert!(block(vec![hour_group(&[169])]).validate().is_err());
    }

    #[test]
    fn rejects_empty_groups_and_empty_cluster_id() {
        assert!(block(vec![hour_group(&[])]).validate().is_err());

        let mut b = block(vec![hour_group(&[1])]);
        b.cluster_id.clear();
        assert!(b.validate().is_err());
    }

    #[test]
    fn cluster_rejects_initial_level_above_capacity() {
        let cluster = StorageCluster {
            name: "battery".into(),
            reservoir_capacity: 10.0,
            initial_level: 11.0,
            ..Default::default()
        };
        assert!(cluster.validate().is_err());
    }
}
