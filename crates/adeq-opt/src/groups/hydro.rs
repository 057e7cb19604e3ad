//! Hydro reservoir rows: level trajectory, energy budgets, and the
//! final-level expression of the accurate water-value mode.
//!
//! Per area with a dispatchable reservoir:
//!
//! - Hourly level recursion (when the level is tracked in the LP):
//!   `L(t) - L(t-1) + H(t) - ratio·pump(t) + overflow(t) = inflow(t)`,
//!   with the initial level folded into the right-hand side of t = 0.
//! - Energy budgets over the optimization interval: a fixed weekly energy,
//!   or min/max bounds when generation runs between bounds, plus a pumping
//!   energy cap.
//! - Daily energy caps when optimizing the whole week at once.
//! - In accurate water-value mode, a final-level variable tied to the
//!   trajectory (or expressed from the full balance when the level is not
//!   tracked) and spread over the water layers that carry the water
//!   values.

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
        let hydro = &view.hydro[a];
        if !hydro.has_dispatchable_hydro {
            continue;
        }
        tagger.update_area(&area.name);

        if hydro.follow_hourly_level {
            for hour in 0..view.horizon {
                tagger.update_time_step(view.hour_in_year + hour as u32);
                builder.set_hour(hour);
                builder.hydro_level(a, 1.0);
                if hour > 0 {
                    builder.hydro_level_at(a, -1.0, hour - 1);
                }
                builder.hydro_generation(a, 1.0);
                if hydro.has_pumping {
                    builder.pumping(a, -hydro.pumping_ratio);
                }
                builder.overflow(a, 1.0);
                if let Some(row) = builder.equal_to() {
                    rows.hourly[hour].hydro_level[a] = row as i32;
                    tagger.tag(row, "AreaHydroLevel", &[]);
                }
            }
        }

        // Energy budgets span the whole optimization interval.
        builder.set_hour(0);
        if hydro.generation_between_bounds {
            for hour in 0..view.horizon {
                builder.hydro_generation_at(a, 1.0, hour);
            }
            if let Some(row) = builder.less_than() {
                rows.weekly.hydro_energy_max[a] = row as i32;
                tagger.tag_weekly(row, "MaxHydroPower", &[]);
            }
            for hour in 0..view.horizon {
                builder.hydro_generation_at(a, 1.0, hour);
            }
            if let Some(row) = builder.greater_than() {
                rows.weekly.hydro_energy_min[a] = row as i32;
                tagger.tag_weekly(row, "MinHydroPower", &[]);
            }
        } else {
            for hour in 0..view.horizon {
                builder.hydro_generation_at(a, 1.0, hour);
            }
            if let Some(row) = builder.equal_to() {
                rows.weekly.hydro_energy_fixed[a] = row as i32;
                tagger.tag_weekly(row, "HydroPower", &[]);
            }
        }
        if hydro.has_pumping {
            for hour in 0..view.horizon {
                builder.pumping_at(a, 1.0, hour);
            }
            if let Some(row) = builder.less_than() {
                rows.weekly.pumping_energy_max[a] = row as i32;
                tagger.tag_weekly(row, "MaxPumping", &[]);
            }
        }

        if view.weekly_optimization {
            for day in 0..view.days_per_optimization() {
                let first = day * view.timesteps_per_day;
                for hour in first..(first + view.timesteps_per_day).min(view.horizon) {
                    builder.hydro_generation_at(a, 1.0, hour);
                }
                if let Some(row) = builder.less_than() {
                    rows.daily[day].hydro_daily_energy[a] = row as i32;
                    tagger.tag_weekly(row, "DailyHydroEnergy", &[("day", &day.to_string())]);
                }
            }
        }

        if view.accurate_water_value {
            // Tie the final level to the trajectory, then spread it over
            // the water layers carrying the water values.
            if hydro.follow_hourly_level {
                builder.final_level(a, 1.0);
                builder.hydro_level_at(a, -1.0, view.horizon - 1);
                if let Some(row) = builder.equal_to() {
                    rows.weekly.final_level_equation[a] = row as i32;
                    tagger.tag_weekly(row, "FinalStockEquivalent", &[]);
                }
            } else {
                builder.final_level(a, 1.0);
                for hour in 0..view.horizon {
                    builder.hydro_generation_at(a, 1.0, hour);
                    if hydro.has_pumping {
                        builder.pumping_at(a, -hydro.pumping_ratio, hour);
                    }
                }
                if let Some(row) = builder.equal_to() {
                    rows.weekly.final_level_equation[a] = row as i32;
                    tagger.tag_weekly(row, "FinalStockExpression", &[]);
                }
            }

            let layer_count = hydro.water_layer_values.len();
            builder.final_level(a, 1.0);
            for layer in 0..layer_count {
                builder.water_layer(a, layer, -1.0);
            }
            if let Some(row) = builder.equal_to() {
                rows.weekly.final_level_layers[a] = row as i32;
                tagger.tag_weekly(row, "FinalStockLayers", &[]);
            }
        }
    }
}
