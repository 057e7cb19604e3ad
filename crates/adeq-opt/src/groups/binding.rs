//! User-defined binding constraint rows.
//!
//! Hourly constraints are emitted once per timestep; a term offset that
//! runs past the horizon wraps modulo the horizon, so an hourly constraint
//! can couple the end of the week back to its start. Daily and weekly
//! constraints never wrap: a shifted term that falls outside the horizon
//! is dropped.

use adeq_core::{BindingConstraint, ConstraintScope, RowSense};

use crate::builder::ConstraintBuilder;
use crate::context::EntityView;
use crate::indexing::ConstraintCorrespondence;
use crate::naming::NameTagger;

fn wrapped_hour(hour: usize, offset: i32, horizon: usize) -> usize {
    (hour as i64 + offset as i64).rem_euclid(horizon as i64) as usize
}

fn shifted_hour(hour: usize, offset: i32, horizon: usize) -> Option<usize> {
    let shifted = hour as i64 + offset as i64;
    (0..horizon as i64)
        .contains(&shifted)
        .then(|| shifted as usize)
}

fn commit(builder: &mut ConstraintBuilder, sense: RowSense) -> Option<usize> {
    match sense {
        RowSense::LessOrEqual => builder.less_than(),
        RowSense::Equal => builder.equal_to(),
        RowSense::GreaterOrEqual => builder.greater_than(),
    }
}

fn append_terms(
    view: &EntityView,
    constraint: &BindingConstraint,
    hour: usize,
    wrap: bool,
    builder: &mut ConstraintBuilder,
) {
    for term in &constraint.link_terms {
        let target = if wrap {
            Some(wrapped_hour(hour, term.offset, view.horizon))
        } else {
            shifted_hour(hour, term.offset, view.horizon)
        };
        if let Some(t) = target {
            builder.link_flow_at(term.link_index, term.weight, t);
        }
    }
    for term in &constraint.thermal_terms {
        let target = if wrap {
            Some(wrapped_hour(hour, term.offset, view.horizon))
        } else {
            shifted_hour(hour, term.offset, view.horizon)
        };
        if let Some(t) = target {
            let cluster = &view.thermal[term.area_index].clusters[term.cluster_index];
            builder.thermal_production_at(cluster.global_index, term.weight, t);
        }
    }
}

pub fn add_all(
    view: &EntityView,
    rows: &mut ConstraintCorrespondence,
    builder: &mut ConstraintBuilder,
    tagger: &mut NameTagger,
) {
    tagger.update_area("");

    for hour in 0..view.horizon {
        tagger.update_time_step(view.hour_in_year + hour as u32);
        for (bc, constraint) in view.binding_constraints.iter().enumerate() {
            if constraint.scope != ConstraintScope::Hourly || constraint.term_count() == 0 {
                continue;
            }
            builder.set_hour(hour);
            append_terms(view, constraint, hour, true, builder);
            if let Some(row) = commit(builder, constraint.sense) {
                rows.hourly[hour].hourly_binding[bc] = row as i32;
                tagger.tag(row, "BindingConstraintHourly", &[("name", constraint.name.as_str())]);
            }
        }
    }

    for day in 0..view.days_per_optimization() {
        let first = day * view.timesteps_per_day;
        for (bc, constraint) in view.binding_constraints.iter().enumerate() {
            if constraint.scope != ConstraintScope::Daily || constraint.term_count() == 0 {
                continue;
            }
            builder.set_hour(first);
            for hour in first..(first + view.timesteps_per_day).min(view.horizon) {
                append_terms(view, constraint, hour, false, builder);
            }
            if builder.number_of_variables() == 0 {
                continue;
            }
            if let Some(row) = commit(builder, constraint.sense) {
                rows.daily[day].daily_binding[bc] = row as i32;
                tagger.tag_weekly(
                    row,
                    "BindingConstraintDaily",
                    &[("name", constraint.name.as_str()), ("day", &day.to_string())],
                );
            }
        }
    }

    if view.weekly_optimization {
        for (bc, constraint) in view.binding_constraints.iter().enumerate() {
            if constraint.scope != ConstraintScope::Weekly || constraint.term_count() == 0 {
                continue;
            }
            builder.set_hour(0);
            for hour in 0..view.horizon {
                append_terms(view, constraint, hour, false, builder);
            }
            if builder.number_of_variables() == 0 {
                continue;
            }
            if let Some(row) = commit(builder, constraint.sense) {
                rows.weekly.weekly_binding[bc] = row as i32;
                tagger.tag_weekly(
                    row,
                    "BindingConstraintWeekly",
                    &[("name", constraint.name.as_str())],
                );
            }
        }
    }
}
