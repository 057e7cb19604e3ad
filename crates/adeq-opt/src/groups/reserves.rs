//! Operating-reserve rows.
//!
//! Per hour, area and reservation:
//!
//! - **Need**: the participations of every cluster kind, plus the
//!   unsatisfied slack and minus the excess slack, equal the reserved
//!   capacity.
//! - **Thermal composition**: total participation splits into running and
//!   (for up reserves) off units, with headroom rows tying each part to
//!   the commitment state.
//! - **Storage rows**: capacity thresholds coupling participations with
//!   the cluster's injection/withdrawal (or the reservoir's generation and
//!   pumping for long-term storage), a composition row per participation,
//!   and the stock rows below.
//!
//! The stock-level, stock-energy and global stock-energy rows exist in six
//! near-identical variants: {up, down} × {short-term, long-term}. They are
//! emitted by single functions parameterized over [`StorageFamily`] and
//! direction rather than one copy per variant; the descriptor picks the
//! participation list, the level term and the sign.
//!
//! Activation windows slide forward from the constraint's hour and clamp
//! at the end of the horizon; offsets past it are dropped. A reservation
//! with a zero activation duration emits no stock-energy row at all.

use adeq_core::{CapacityReservation, ReserveDirection, StorageParticipation};

use crate::builder::ConstraintBuilder;
use crate::context::EntityView;
use crate::indexing::ConstraintCorrespondence;
use crate::naming::NameTagger;

/// Which storage family a stock row binds.
#[derive(Clone, Copy)]
enum StorageFamily {
    /// Short-term cluster, by global storage index.
    Short(usize),
    /// The long-term reservoir of an area.
    Long(usize),
}

impl StorageFamily {
    fn participation_of<'a>(
        &self,
        reservation: &'a CapacityReservation,
        cluster_in_area: usize,
    ) -> Option<&'a StorageParticipation> {
        match self {
            StorageFamily::Short(_) => reservation.st_participation_for(cluster_in_area),
            StorageFamily::Long(_) => reservation.lt_storage_participations.first(),
        }
    }

    fn append_participation(
        &self,
        builder: &mut ConstraintBuilder,
        participation: usize,
        coeff: f64,
        offset: usize,
    ) {
        match self {
            StorageFamily::Short(_) => {
                builder.st_reserve_participation_offset(participation, coeff, offset);
            }
            StorageFamily::Long(_) => {
                builder.lt_reserve_participation_offset(participation, coeff, offset);
            }
        }
    }

    fn append_level(&self, builder: &mut ConstraintBuilder, coeff: f64, offset: usize) {
        match self {
            StorageFamily::Short(cluster) => {
                builder.storage_level_offset(*cluster, coeff, offset);
            }
            StorageFamily::Long(area) => {
                builder.hydro_level_offset(*area, coeff, offset);
            }
        }
    }
}

fn reservations<'a>(view: &EntityView<'a>, area: usize, direction: ReserveDirection) -> &'a [CapacityReservation] {
    view.reserves[area].for_direction(direction)
}

pub fn add_all(
    view: &EntityView,
    rows: &mut ConstraintCorrespondence,
    builder: &mut ConstraintBuilder,
    tagger: &mut NameTagger,
) {
    for hour in 0..view.horizon {
        tagger.update_time_step(view.hour_in_year + hour as u32);
        for (a, area) in view.areas.iter().enumerate() {
            if view.reserves[a].is_empty() {
                continue;
            }
            tagger.update_area(&area.name);
            builder.set_hour(hour);

            add_need_rows(view, a, hour, rows, builder, tagger);
            add_thermal_rows(view, a, hour, rows, builder, tagger);
            add_st_storage_rows(view, a, hour, rows, builder, tagger);
            add_lt_storage_rows(view, a, hour, rows, builder, tagger);
        }
    }
}

/// One row per reservation: participations + unsatisfied - excess = need.
fn add_need_rows(
    view: &EntityView,
    area: usize,
    hour: usize,
    rows: &mut ConstraintCorrespondence,
    builder: &mut ConstraintBuilder,
    tagger: &mut NameTagger,
) {
    for direction in [ReserveDirection::Up, ReserveDirection::Down] {
        for reservation in reservations(view, area, direction) {
            builder.set_hour(hour);
            for p in &reservation.thermal_participations {
                builder.thermal_reserve_participation(p.global_participation_index, 1.0);
            }
            for p in &reservation.st_storage_participations {
                builder.st_reserve_participation(p.global_participation_index, 1.0);
            }
            for p in &reservation.lt_storage_participations {
                builder.lt_reserve_participation(p.global_participation_index, 1.0);
            }
            builder.reserve_unsatisfied(reservation.global_index, 1.0);
            builder.reserve_excess(reservation.global_index, -1.0);
            if let Some(row) = builder.equal_to() {
                rows.hourly[hour].reserve_need[reservation.global_index] = row as i32;
                tagger.tag(row, "ReserveNeed", &[("reserve", reservation.name.as_str())]);
            }
        }
    }
}

/// Composition and headroom rows of every thermal participation.
fn add_thermal_rows(
    view: &EntityView,
    area: usize,
    hour: usize,
    rows: &mut ConstraintCorrespondence,
    builder: &mut ConstraintBuilder,
    tagger: &mut NameTagger,
) {
    for direction in [ReserveDirection::Up, ReserveDirection::Down] {
        let is_up = direction == ReserveDirection::Up;
        for reservation in reservations(view, area, direction) {
            for p in &reservation.thermal_participations {
                let cluster = &view.thermal[area].clusters[p.cluster_index];
                let g = p.global_participation_index;
                let off_participating = is_up && p.max_power_off > 0.0;
                let qualifiers = [
                    ("cluster", p.cluster_name.as_str()),
                    ("reserve", reservation.name.as_str()),
                ];

                // P - P_on (- P_off) = 0.
                builder.set_hour(hour);
                builder
                    .thermal_reserve_participation(g, 1.0)
                    .running_thermal_reserve_participation(g, -1.0);
                if off_participating {
                    builder.off_thermal_reserve_participation(g, -1.0);
                }
                if let Some(row) = builder.equal_to() {
                    rows.hourly[hour].thermal_participation[g] = row as i32;
                    tagger.tag(row, "ParticipationOfUnitsToReserve", &qualifiers);
                }

                // Running units: participation fits within the committed
                // capacity (startup-cost mode) or the available headroom.
                builder.running_thermal_reserve_participation(g, 1.0);
                if view.with_startup_costs {
                    builder.units_on(cluster.global_index, -p.max_power_on);
                } else {
                    builder.thermal_production(cluster.global_index, 1.0);
                }
                if let Some(row) = builder.less_than() {
                    rows.hourly[hour].thermal_participation_max_on[g] = row as i32;
                    tagger.tag(row, "MaxParticipationOfRunningUnits", &qualifiers);
                }

                // Off units: bounded by the units not running.
                if off_participating {
                    builder.off_thermal_reserve_participation(g, 1.0);
                    if view.with_startup_costs {
                        builder.units_on(cluster.global_index, p.max_power_off);
                    } else {
                        let per_unit = if cluster.unit_size > 0.0 {
                            p.max_power_off / cluster.unit_size
                        } else {
                            0.0
                        };
                        builder.thermal_production(cluster.global_index, per_unit);
                    }
                    if let Some(row) = builder.less_than() {
                        rows.hourly[hour].thermal_participation_max_off[g] = row as i32;
                        tagger.tag(row, "MaxParticipationOfOffUnits", &qualifiers);
                    }
                }
            }
        }
    }
}

/// Capacity thresholds, compositions and stock rows of the short-term
/// storage clusters of one area.
fn add_st_storage_rows(
    view: &EntityView,
    area: usize,
    hour: usize,
    rows: &mut ConstraintCorrespondence,
    builder: &mut ConstraintBuilder,
    tagger: &mut NameTagger,
) {
    let reserves = &view.reserves[area];
    for (c, cluster) in view.storage[area].iter().enumerate() {
        let participates_up = reserves.up.iter().any(|r| r.st_participation_for(c).is_some());
        let participates_down = reserves
            .down
            .iter()
            .any(|r| r.st_participation_for(c).is_some());
        if !participates_up && !participates_down {
            continue;
        }
        let g = cluster.global_index;
        let qualifier = [("cluster", cluster.name.as_str())];
        let family = StorageFamily::Short(g);

        // Withdrawal headroom consumed by up turbining participations.
        builder.set_hour(hour);
        builder.storage_withdrawal(g, 1.0);
        for r in &reserves.up {
            if let Some(p) = r.st_participation_for(c) {
                builder.st_reserve_turbining(p.global_participation_index, 1.0);
            }
        }
        if let Some(row) = builder.less_than() {
            rows.hourly[hour].st_turbining_max[g] = row as i32;
            tagger.tag(row, "STTurbiningCapacityMax", &qualifier);
        }

        // Withdrawal floor consumed by down turbining participations.
        builder.storage_withdrawal(g, 1.0);
        for r in &reserves.down {
            if let Some(p) = r.st_participation_for(c) {
                builder.st_reserve_turbining(p.global_participation_index, -1.0);
            }
        }
        if let Some(row) = builder.greater_than() {
            rows.hourly[hour].st_turbining_min[g] = row as i32;
            tagger.tag(row, "STTurbiningCapacityMin", &qualifier);
        }

        // Injection headroom consumed by down pumping participations.
        builder.storage_injection(g, 1.0);
        for r in &reserves.down {
            if let Some(p) = r.st_participation_for(c) {
                builder.st_reserve_pumping(p.global_participation_index, 1.0);
            }
        }
        if let Some(row) = builder.less_than() {
            rows.hourly[hour].st_pumping_max[g] = row as i32;
            tagger.tag(row, "STPumpingCapacityMax", &qualifier);
        }

        // P = turbining + pumping, per participation.
        for direction in [ReserveDirection::Up, ReserveDirection::Down] {
            for reservation in reservations(view, area, direction) {
                if let Some(p) = reservation.st_participation_for(c) {
                    let gp = p.global_participation_index;
                    builder
                        .st_reserve_participation(gp, 1.0)
                        .st_reserve_turbining(gp, -1.0)
                        .st_reserve_pumping(gp, -1.0);
                    if let Some(row) = builder.equal_to() {
                        rows.hourly[hour].st_participation[gp] = row as i32;
                        tagger.tag(
                            row,
                            "STReserveComposition",
                            &[
                                ("cluster", p.cluster_name.as_str()),
                                ("reserve", reservation.name.as_str()),
                            ],
                        );
                    }
                }
            }
        }

        // Stock rows, shared shape with long-term storage.
        let (down_row, up_row) = add_stock_level_rows(view, area, c, family, hour, builder);
        if let Some(row) = down_row {
            rows.hourly[hour].st_stock_level_down[g] = row as i32;
            tagger.tag(row, "STStockLevelReserveDown", &qualifier);
        }
        if let Some(row) = up_row {
            rows.hourly[hour].st_stock_level_up[g] = row as i32;
            tagger.tag(row, "STStockLevelReserveUp", &qualifier);
        }

        add_stock_energy_rows(view, area, c, family, hour, rows, builder, tagger);

        let (down_row, up_row) = add_global_stock_energy_rows(view, area, c, family, hour, builder);
        if let Some(row) = down_row {
            rows.hourly[hour].st_global_energy_down[g] = row as i32;
            tagger.tag(row, "STGlobalEnergyStockLevelReserveDown", &qualifier);
        }
        if let Some(row) = up_row {
            rows.hourly[hour].st_global_energy_up[g] = row as i32;
            tagger.tag(row, "STGlobalEnergyStockLevelReserveUp", &qualifier);
        }
    }
}

/// Capacity, composition and stock rows of the long-term reservoir of one
/// area.
fn add_lt_storage_rows(
    view: &EntityView,
    area: usize,
    hour: usize,
    rows: &mut ConstraintCorrespondence,
    builder: &mut ConstraintBuilder,
    tagger: &mut NameTagger,
) {
    let hydro = &view.hydro[area];
    if !hydro.has_dispatchable_hydro {
        return;
    }
    let reserves = &view.reserves[area];
    let participates_up = reserves.up.iter().any(|r| !r.lt_storage_participations.is_empty());
    let participates_down = reserves
        .down
        .iter()
        .any(|r| !r.lt_storage_participations.is_empty());
    if !participates_up && !participates_down {
        return;
    }
    let family = StorageFamily::Long(area);
    let qualifier = [("cluster", "LongTermStorage")];

    // Generation headroom consumed by up turbining participations.
    builder.set_hour(hour);
    builder.hydro_generation(area, 1.0);
    for r in &reserves.up {
        for p in &r.lt_storage_participations {
            builder.lt_reserve_turbining(p.global_participation_index, 1.0);
        }
    }
    if let Some(row) = builder.less_than() {
        rows.hourly[hour].lt_turbining_max[area] = row as i32;
        tagger.tag(row, "LTTurbiningCapacityMax", &qualifier);
    }

    // Pumping headroom consumed by down pumping participations.
    if hydro.has_pumping {
        builder.pumping(area, 1.0);
        for r in &reserves.down {
            for p in &r.lt_storage_participations {
                builder.lt_reserve_pumping(p.global_participation_index, 1.0);
            }
        }
        if let Some(row) = builder.less_than() {
            rows.hourly[hour].lt_pumping_max[area] = row as i32;
            tagger.tag(row, "LTPumpingCapacityMax", &qualifier);
        }
    }

    for direction in [ReserveDirection::Up, ReserveDirection::Down] {
        for reservation in reservations(view, area, direction) {
            for p in &reservation.lt_storage_participations {
                let gp = p.global_participation_index;
                builder
                    .lt_reserve_participation(gp, 1.0)
                    .lt_reserve_turbining(gp, -1.0)
                    .lt_reserve_pumping(gp, -1.0);
                if let Some(row) = builder.equal_to() {
                    rows.hourly[hour].lt_participation[gp] = row as i32;
                    tagger.tag(
                        row,
                        "LTReserveComposition",
                        &[
                            ("cluster", p.cluster_name.as_str()),
                            ("reserve", reservation.name.as_str()),
                        ],
                    );
                }
            }
        }
    }

    if !hydro.follow_hourly_level {
        return;
    }

    let (down_row, up_row) = add_stock_level_rows(view, area, 0, family, hour, builder);
    if let Some(row) = down_row {
        rows.hourly[hour].lt_stock_level_down[area] = row as i32;
        tagger.tag(row, "LTStockLevelReserveDown", &qualifier);
    }
    if let Some(row) = up_row {
        rows.hourly[hour].lt_stock_level_up[area] = row as i32;
        tagger.tag(row, "LTStockLevelReserveUp", &qualifier);
    }

    add_stock_energy_rows(view, area, 0, family, hour, rows, builder, tagger);

    let (down_row, up_row) = add_global_stock_energy_rows(view, area, 0, family, hour, builder);
    if let Some(row) = down_row {
        rows.hourly[hour].lt_global_energy_down[area] = row as i32;
        tagger.tag(row, "LTGlobalEnergyStockLevelReserveDown", &qualifier);
    }
    if let Some(row) = up_row {
        rows.hourly[hour].lt_global_energy_up[area] = row as i32;
        tagger.tag(row, "LTGlobalEnergyStockLevelReserveUp", &qualifier);
    }
}

/// Down/up stock-level rows: serving a reserve over its activation window
/// requires the stored energy to stay within the rule curves.
///
/// Down: `L(t) + Σ_res Σ_window P·ratio <= L_max`.
/// Up:   `L(t) - Σ_res Σ_window P·ratio >= L_min`.
fn add_stock_level_rows(
    view: &EntityView,
    area: usize,
    cluster_in_area: usize,
    family: StorageFamily,
    hour: usize,
    builder: &mut ConstraintBuilder,
) -> (Option<usize>, Option<usize>) {
    builder.set_hour(hour);
    builder_level_term(family, builder, 1.0);
    for reservation in reservations(view, area, ReserveDirection::Down) {
        if let Some(p) = family.participation_of(reservation, cluster_in_area) {
            for offset in 0..reservation.max_activation_duration {
                family.append_participation(
                    builder,
                    p.global_participation_index,
                    reservation.max_activation_ratio,
                    offset,
                );
            }
        }
    }
    let down_row = builder.less_than();

    builder_level_term(family, builder, 1.0);
    for reservation in reservations(view, area, ReserveDirection::Up) {
        if let Some(p) = family.participation_of(reservation, cluster_in_area) {
            for offset in 0..reservation.max_activation_duration {
                family.append_participation(
                    builder,
                    p.global_participation_index,
                    -reservation.max_activation_ratio,
                    offset,
                );
            }
        }
    }
    let up_row = builder.greater_than();

    (down_row, up_row)
}

fn builder_level_term(family: StorageFamily, builder: &mut ConstraintBuilder, coeff: f64) {
    family.append_level(builder, coeff, 0);
}

/// Per-participation stock-energy rows over the activation window, with
/// direction-aware level signs. A zero activation duration emits nothing.
#[allow(clippy::too_many_arguments)]
fn add_stock_energy_rows(
    view: &EntityView,
    area: usize,
    cluster_in_area: usize,
    family: StorageFamily,
    hour: usize,
    rows: &mut ConstraintCorrespondence,
    builder: &mut ConstraintBuilder,
    tagger: &mut NameTagger,
) {
    for direction in [ReserveDirection::Up, ReserveDirection::Down] {
        let sign = match direction {
            ReserveDirection::Up => -1.0,
            ReserveDirection::Down => 1.0,
        };
        for reservation in reservations(view, area, direction) {
            if reservation.max_activation_duration == 0 {
                continue;
            }
            let Some(p) = family.participation_of(reservation, cluster_in_area) else {
                continue;
            };
            builder.set_hour(hour);
            for offset in 0..reservation.max_activation_duration {
                family.append_participation(
                    builder,
                    p.global_participation_index,
                    reservation.max_activation_ratio,
                    offset,
                );
                family.append_level(
                    builder,
                    sign * reservation.max_energy_activation_ratio,
                    offset,
                );
            }
            if let Some(row) = builder.less_than() {
                let gp = p.global_participation_index;
                let slot = match family {
                    StorageFamily::Short(_) => &mut rows.hourly[hour].st_energy_level[gp],
                    StorageFamily::Long(_) => &mut rows.hourly[hour].lt_energy_level[gp],
                };
                *slot = row as i32;
                let kind = match family {
                    StorageFamily::Short(_) => "STEnergyStockLevelReserveParticipation",
                    StorageFamily::Long(_) => "LTEnergyStockLevelReserveParticipation",
                };
                tagger.tag(
                    row,
                    kind,
                    &[
                        ("cluster", p.cluster_name.as_str()),
                        ("reserve", reservation.name.as_str()),
                    ],
                );
            }
        }
    }
}

/// Optional coupling across every reservation of one direction for a given
/// storage: the summed activations over the global window, together with
/// the level, stay within the stock. Only emitted when at least one
/// participation is present, mirrored exactly by the sizing pass through
/// `number_of_variables`.
fn add_global_stock_energy_rows(
    view: &EntityView,
    area: usize,
    cluster_in_area: usize,
    family: StorageFamily,
    hour: usize,
    builder: &mut ConstraintBuilder,
) -> (Option<usize>, Option<usize>) {
    let reserves = &view.reserves[area];

    builder.set_hour(hour);
    for offset in 0..reserves.max_global_activation_duration_down {
        for reservation in &reserves.down {
            if let Some(p) = family.participation_of(reservation, cluster_in_area) {
                family.append_participation(
                    builder,
                    p.global_participation_index,
                    reservation.max_activation_ratio,
                    offset,
                );
            }
        }
        if builder.number_of_variables() > 0 {
            family.append_level(
                builder,
                reserves.max_global_energy_activation_ratio_down,
                offset,
            );
        }
    }
    let down_row = if builder.number_of_variables() > 0 {
        builder.less_than()
    } else {
        None
    };

    builder.set_hour(hour);
    for offset in 0..reserves.max_global_activation_duration_up {
        for reservation in &reserves.up {
            if let Some(p) = family.participation_of(reservation, cluster_in_area) {
                family.append_participation(
                    builder,
                    p.global_participation_index,
                    reservation.max_activation_ratio,
                    offset,
                );
            }
        }
        if builder.number_of_variables() > 0 {
            family.append_level(
                builder,
                -reserves.max_global_energy_activation_ratio_up,
                offset,
            );
        }
    }
    let up_row = if builder.number_of_variables() > 0 {
        builder.less_than()
    } else {
        None
    };

    (down_row, up_row)
}
