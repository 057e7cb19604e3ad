//! Short-term storage rows: level recursion and the cumulative rows of
//! the additional constraints.
//!
//! Level recursion per cluster and hour:
//! `L(t) - L(t-1) - ηi·inj(t) + (1/ηw)·with(t) = inflows(t)`.
//! Injection efficiency burns energy on the way in, withdrawal efficiency
//! on the way out (the grid receives the withdrawal variable, the
//! reservoir loses `with/ηw`).
//!
//! The t = 0 row folds the initial level into the right-hand side, except
//! for clusters whose initial level is optimized: those wrap to the last
//! hour, making the week cyclic.
//!
//! Additional constraints become one cumulative row per hour-group,
//! emitted only when the optimization covers the whole week (hour-of-week
//! sets cannot be expressed on a daily horizon).

use adeq_core::{ConstraintOperator, ConstraintVariable};

use crate::builder::ConstraintBuilder;
use crate::context::EntityView;
use crate::indexing::ConstraintCorrespondence;
use crate::naming::NameTagger;

pub fn add_all(
    view: &EntityView,
    rows: &mut ConstraintCorrespondence,
    builder: &mut ConstraintBuilder,
    tagger: &mut NameTagger,
) {
    for (a, area) in view.areas.iter().enumerate() {
        tagger.update_area(&area.name);

        for cluster in &view.storage[a] {
            let g = cluster.global_index;
            let qualifier = [("cluster", cluster.name.as_str())];
            let withdrawal_slope = 1.0 / cluster.withdrawal_efficiency.max(f64::EPSILON);

            for hour in 0..view.horizon {
                tagger.update_time_step(view.hour_in_year + hour as u32);
                builder.set_hour(hour);
                builder.storage_level(g, 1.0);
                if hour > 0 {
                    builder.storage_level_at(g, -1.0, hour - 1);
                } else if cluster.initial_level_optim {
                    builder.storage_level_at(g, -1.0, view.horizon - 1);
                }
                builder.storage_injection(g, -cluster.injection_efficiency);
                builder.storage_withdrawal(g, withdrawal_slope);
                if let Some(row) = builder.equal_to() {
                    rows.hourly[hour].storage_level[g] = row as i32;
                    tagger.tag(row, "STStorageLevel", &qualifier);
                }
            }

            if !view.weekly_optimization {
                continue;
            }
            for block in &cluster.additional_constraints {
                for group in &block.constraints {
                    for &hour_of_week in &group.hours {
                        let hour = (hour_of_week - 1) as usize;
                        if hour >= view.horizon {
                            continue;
                        }
                        match block.variable {
                            ConstraintVariable::Injection => {
                                builder.storage_injection_at(g, 1.0, hour);
                            }
                            ConstraintVariable::Withdrawal => {
                                builder.storage_withdrawal_at(g, 1.0, hour);
                            }
                            ConstraintVariable::Netting => {
                                builder.storage_injection_at(g, 1.0, hour);
                                builder.storage_withdrawal_at(g, -1.0, hour);
                            }
                        }
                    }
                    let row = match block.operator {
                        ConstraintOperator::Less => builder.less_than(),
                        ConstraintOperator::Equal => builder.equal_to(),
                        ConstraintOperator::Greater => builder.greater_than(),
                    };
                    if let Some(row) = row {
                        rows.weekly.storage_cumulation[group.global_index] = row as i32;
                        tagger.tag_weekly(
                            row,
                            "StorageCumulation",
                            &[
                                ("cluster", cluster.name.as_str()),
                                ("constraint", block.name.as_str()),
                                ("group", &group.local_index.to_string()),
                            ],
                        );
                    }
                }
            }
        }
    }
}
