//! Area balance rows and flow dissociation rows.

use crate::builder::ConstraintBuilder;
use crate::context::EntityView;
use crate::indexing::ConstraintCorrespondence;
use crate::naming::NameTagger;

/// Per hour and area: generation minus consumption, plus net imports,
/// equals the net demand (set by the RHS pass). The dual of this row is
/// the hourly marginal price.
///
/// Per hour and link with hurdle costs: the signed flow is split into two
/// nonnegative cost-carrying parts, `flow - direct + indirect = loop flow`.
pub fn add_all(
    view: &EntityView,
    rows: &mut ConstraintCorrespondence,
    builder: &mut ConstraintBuilder,
    tagger: &mut NameTagger,
) {
    for hour in 0..view.horizon {
        tagger.update_time_step(view.hour_in_year + hour as u32);
        builder.set_hour(hour);

        for (a, area) in view.areas.iter().enumerate() {
            tagger.update_area(&area.name);

            for (l, link) in view.links.iter().enumerate() {
                if link.origin_area == a {
                    builder.link_flow(l, -1.0);
                } else if link.extremity_area == a {
                    builder.link_flow(l, 1.0);
                }
            }

            for cluster in &view.thermal[a].clusters {
                builder.thermal_production(cluster.global_index, 1.0);
            }

            let hydro = &view.hydro[a];
            if hydro.has_dispatchable_hydro {
                builder.hydro_generation(a, 1.0);
                if hydro.has_pumping {
                    builder.pumping(a, -1.0);
                }
            }

            for cluster in &view.storage[a] {
                builder.storage_withdrawal(cluster.global_index, 1.0);
                builder.storage_injection(cluster.global_index, -1.0);
            }

            builder.unsupplied(a, 1.0);
            builder.spilled(a, -1.0);

            if let Some(row) = builder.equal_to() {
                rows.hourly[hour].area_balance[a] = row as i32;
                tagger.tag(row, "AreaBalance", &[]);
            }
        }

        tagger.update_area("");
        for (l, link) in view.links.iter().enumerate() {
            if !link.transfer_costs.with_hurdle_costs {
                continue;
            }
            builder
                .link_flow(l, 1.0)
                .link_flow_direct_cost(l, -1.0)
                .link_flow_indirect_cost(l, 1.0);
            if let Some(row) = builder.equal_to() {
                rows.hourly[hour].flow_dissociation[l] = row as i32;
                tagger.tag(row, "FlowDissociation", &[("link", link.name.as_str())]);
            }
        }
    }
}
