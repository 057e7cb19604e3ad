//! Loader for short-term-storage additional constraints.
//!
//! Reads `additional-constraints.ini` from a storage folder. Each section
//! describes one block: the cluster it applies to, the summed variable
//! (`injection`, `withdrawal` or `netting`), a comparison operator, and an
//! `hours` property holding bracketed groups of hour-of-week values, e.g.
//! `[1,2,3], [25,26,27]`. The per-group right-hand sides come from a side
//! file named `rhs_<section>.txt`, one value per line, zero-padded when the
//! file is shorter than the group list.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use adeq_core::storage::{
    AdditionalConstraints, ConstraintOperator, ConstraintVariable, SingleAdditionalConstraint,
    StorageCluster,
};
use adeq_core::{transform_name_into_id, CoreError, CoreResult};

use crate::ini::IniFile;

fn parse_variable(value: &str) -> CoreResult<ConstraintVariable> {
    match value {
        "injection" => Ok(ConstraintVariable::Injection),
        "withdrawal" => Ok(ConstraintVariable::Withdrawal),
        "netting" => Ok(ConstraintVariable::Netting),
        other => Err(CoreError::InvalidInput(format!(
            "invalid variable type `{other}`. Must be 'injection', 'withdrawal', or 'netting'."
        ))),
    }
}

fn parse_operator(value: &str) -> CoreResult<ConstraintOperator> {
    match value {
        "less" => Ok(ConstraintOperator::Less),
        "equal" => Ok(ConstraintOperator::Equal),
        "greater" => Ok(ConstraintOperator::Greater),
        other => Err(CoreError::InvalidInput(format!(
            "invalid operator type `{other}`. Must be 'less', 'equal', or 'greater'."
        ))),
    }
}

/// Split an `hours` property into bracketed groups of integers.
fn parse_hour_groups(value: &str) -> CoreResult<Vec<SingleAdditionalConstraint>> {
    let mut groups = Vec::new();
    let mut rest = value;
    while let Some(open) = rest.find('[') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find(']') else {
            return Err(CoreError::InvalidInput(format!(
                "unterminated hour group in `{value}`"
            )));
        };
        let body = &after_open[..close];
        let mut hours = BTreeSet::new();
        for token in body.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let hour: u32 = token.parse().map_err(|_| {
                CoreError::InvalidInput(format!("malformed hour `{token}` in `{value}`"))
            })?;
            hours.insert(hour);
        }
        groups.push(SingleAdditionalConstraint {
            hours,
            global_index: 0,
            local_index: groups.len(),
        });
        rest = &after_open[close + 1..];
    }
    Ok(groups)
}

/// Read the RHS side file of one block. Missing entries (or a missing
/// file) read as zero; rows beyond the group count are ignored.
fn load_rhs(path: &Path, group_count: usize) -> CoreResult<Vec<f64>> {
    let mut rhs = vec![0.0; group_count];
    if !path.exists() {
        return Ok(rhs);
    }
    let content = fs::read_to_string(path)?;
    let mut count = 0usize;
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if count >= group_count {
            warn!(
                "{}: ignoring rows beyond the {group_count} hour groups",
                path.display()
            );
            break;
        }
        rhs[count] = line.parse().map_err(|_| {
            CoreError::InvalidInput(format!(
                "{}: line {}: malformed value `{line}`",
                path.display(),
                line_no + 1
            ))
        })?;
        count += 1;
    }
    Ok(rhs)
}

/// Load every additional-constraints block of a storage folder and attach
/// each to its cluster. A missing file is not an error; a block that
/// references an unknown cluster is.
pub fn load_additional_constraints(
    folder: &Path,
    clusters: &mut [StorageCluster],
) -> CoreResult<()> {
    let path = folder.join("additional-constraints.ini");
    let Some(ini) = IniFile::open(&path)? else {
        info!("no additional constraints at {}", path.display());
        return Ok(());
    };

    for section in &ini.sections {
        let cluster_id = section
            .value("cluster")
            .map(transform_name_into_id)
            .unwrap_or_default();
        let variable = parse_variable(section.value("variable").unwrap_or_default())
            .map_err(|e| invalid_in_section(&section.name, e))?;
        let operator = parse_operator(section.value("operator").unwrap_or_default())
            .map_err(|e| invalid_in_section(&section.name, e))?;
        let constraints = parse_hour_groups(section.value("hours").unwrap_or_default())
            .map_err(|e| invalid_in_section(&section.name, e))?;

        let rhs = load_rhs(
            &folder.join(format!("rhs_{}.txt", section.name)),
            constraints.len(),
        )?;

        let block = AdditionalConstraints {
            name: section.name.clone(),
            cluster_id,
            variable,
            operator,
            rhs,
            constraints,
        };
        block
            .validate()
            .map_err(|e| invalid_in_section(&section.name, e))?;

        let Some(cluster) = clusters.iter_mut().find(|c| c.id == block.cluster_id) else {
            return Err(CoreError::InvalidInput(format!(
                "constraint `{}` does not reference an existing cluster (`{}`)",
                section.name, block.cluster_id
            )));
        };
        cluster.additional_constraints.push(block);
    }
    Ok(())
}

fn invalid_in_section(section: &str, err: CoreError) -> CoreError {
    CoreError::InvalidInput(format!("invalid constraint in section `{section}`: {err}"))
}

/// Assign the study-wide indices of every hour group, cluster by cluster.
/// Returns the total group count, which is also the number of cumulative
/// rows the weekly problem will carry.
pub fn number_additional_constraints(clusters: &mut [StorageCluster]) -> usize {
    let mut next = 0usize;
    for cluster in clusters.iter_mut() {
        for block in &mut cluster.additional_constraints {
            for group in &mut block.constraints {
                group.global_index = next;
                next += 1;
            }
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery() -> StorageCluster {
        StorageCluster {
            name: "Battery".into(),
            id: "battery".into(),
            ..Default::default()
        }
    }

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn loads_blocks_with_hour_groups_and_rhs() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "additional-constraints.ini",
            "[cumul]\ncluster = Battery\nvariable = injection\noperator = less\nhours = [1,2,3], [25, 26]\n",
        );
        write(dir.path(), "rhs_cumul.txt", "12.5\n");

        let mut clusters = vec![battery()];
        load_additional_constraints(dir.path(), &mut clusters).unwrap();

        let block = &clusters[0].additional_constraints[0];
        assert_eq!(block.constraints.len(), 2);
        assert_eq!(
            block.constraints[0].hours.iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        // The second group's RHS is zero-padded.
        assert_eq!(block.rhs, vec![12.5, 0.0]);
        assert_eq!(block.operator, ConstraintOperator::Less);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut clusters = vec![battery()];
        load_additional_constraints(dir.path(), &mut clusters).unwrap();
        assert!(clusters[0].additional_constraints.is_empty());
    }

    #[test]
    fn unknown_cluster_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "additional-constraints.ini",
            "[cumul]\ncluster = Ghost\nvariable = injection\noperator = less\nhours = [1]\n",
        );
        let mut clusters = vec![battery()];
        let err = load_additional_constraints(dir.path(), &mut clusters).unwrap_err();
        assert!(err.to_string().contains("existing cluster"));
    }

    #[test]
    fn bad_variable_operator_and_hours_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for (body, fragment) in [
            ("variable = osmosis\noperator = less\nhours = [1]", "variable"),
            ("variable = injection\noperator = about\nhours = [1]", "operator"),
            ("variable = injection\noperator = less\nhours = [0]", "between 1 and 168"),
            ("variable = injection\noperator = less\nhours = [169]", "between 1 and 168"),
        ] {
            write(
                dir.path(),
                "additional-constraints.ini",
                &format!("[bad]\ncluster = Battery\n{body}\n"),
            );
            let mut clusters = vec![battery()];
            let err = load_additional_constraints(dir.path(), &mut clusters).unwrap_err();
            assert!(
                err.to_string().contains(fragment),
                "expected `{fragment}` in `{err}`"
            );
        }
    }

    #[test]
    fn oversized_rhs_file_keeps_the_leading_rows() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "additional-constraints.ini",
            "[cumul]\ncluster = Battery\nvariable = injection\noperator = less\nhours = [1]\n",
        );
        write(dir.path(), "rhs_cumul.txt", "1.0\n2.0\n");
        let mut clusters = vec![battery()];
        load_additional_constraints(dir.path(), &mut clusters).unwrap();
        assert_eq!(clusters[0].additional_constraints[0].rhs, vec![1.0]);
    }

    #[test]
    fn numbering_is_dense_across_clusters() {
        let mut clusters = vec![battery(), battery()];
        for cluster in &mut clusters {
            cluster.additional_constraints.push(AdditionalConstraints {
                name: "cumul".into(),
                cluster_id: "battery".into(),
                variable: ConstraintVariable::Injection,
                operator: ConstraintOperator::Less,
                rhs: vec![0.0; 2],
                constraints: vec![
                    SingleAdditionalConstraint {
                        hours: [1u32].into_iter().collect(),
                        ..Default::default()
                    },
                    SingleAdditionalConstraint {
                        hours: [2u32].into_iter().collect(),
                        ..Default::default()
                    },
                ],
            });
        }
        let total = number_additional_constraints(&mut clusters);
        assert_eq!(total, 4);
        assert_eq!(clusters[1].additional_constraints[0].constraints[0].global_index, 2);
    }
}
