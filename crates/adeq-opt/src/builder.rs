//! The constraint builder: a fluent surface appending one linear term at a
//! time to a growing row, then finalizing it with a sense.
//!
//! The builder runs in one of two modes:
//!
//! - **Sizing**: nothing is emitted; a running row counter and non-zero
//!   counter are bumped instead. Column tables are not consulted.
//! - **Emitting**: terms resolve to column numbers through the variable
//!   tables and land in the CSR matrix; terminators fix the row's sense
//!   and return its number.
//!
//! Both modes execute the SAME group code: every appender call counts one
//! term in sizing mode and emits one term in emitting mode, and the
//! window/offset skip conditions depend only on entity data and the
//! horizon. This is what makes the announced sizes and the emitted counts
//! equal by construction — the single hardest correctness property of the
//! whole core.
//!
//! Horizon-offset appenders clamp to the end of the optimization horizon:
//! an offset that runs past the last timestep is dropped, never wrapped
//! back to the start. (Cyclic lookups, where a constraint genuinely wants
//! the previous week-wrapped hour, go through `set_hour` with an
//! explicitly wrapped value instead.)

use adeq_core::lp::{LpProblem, RowSense};

use crate::indexing::{slot, NonHourlyVariableMap, VariableMap};

/// Which of the two passes is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    Size,
    Emit,
}

/// Tallies of a sizing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizingCounters {
    pub rows: usize,
    pub nonzeros: usize,
}

enum Sink<'a> {
    Size(SizingCounters),
    Emit {
        lp: &'a mut LpProblem,
        vars: &'a [VariableMap],
        extra: &'a NonHourlyVariableMap,
        pending: Vec<(usize, f64)>,
    },
}

pub struct ConstraintBuilder<'a> {
    sink: Sink<'a>,
    horizon: usize,
    hour: usize,
    pending_terms: usize,
}

impl<'a> ConstraintBuilder<'a> {
    /// A builder that only counts rows and non-zeros.
    pub fn sizing(horizon: usize) -> Self {
        Self {
            sink: Sink::Size(SizingCounters::default()),
            horizon,
            hour: 0,
            pending_terms: 0,
        }
    }

    /// A builder that emits into the matrix, resolving columns through the
    /// bound variable tables.
    pub fn emitting(
        lp: &'a mut LpProblem,
        vars: &'a [VariableMap],
        extra: &'a NonHourlyVariableMap,
        horizon: usize,
    ) -> Self {
        Self {
            sink: Sink::Emit {
                lp,
                vars,
                extra,
                pending: Vec::with_capacity(16),
            },
            horizon,
            hour: 0,
            pending_terms: 0,
        }
    }

    pub fn mode(&self) -> PassMode {
        match self.sink {
            Sink::Size(_) => PassMode::Size,
            Sink::Emit { .. } => PassMode::Emit,
        }
    }

    /// Tallies of a finished sizing pass.
    pub fn sizes(&self) -> SizingCounters {
        match &self.sink {
            Sink::Size(counters) => *counters,
            Sink::Emit { .. } => SizingCounters::default(),
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Set the timestep cursor used by column lookups.
    pub fn set_hour(&mut self, hour: usize) -> &mut Self {
        debug_assert!(hour < self.horizon);
        self.hour = hour;
        self
    }

    pub fn hour(&self) -> usize {
        self.hour
    }

    /// Count of terms appended since the last termination.
    pub fn number_of_variables(&self) -> usize {
        self.pending_terms
    }

    /// Cursor plus offset, or `None` once past the end of the horizon.
    fn offset_hour(&self, offset: usize) -> Option<usize> {
        let hour = self.hour + offset;
        (hour < self.horizon).then_some(hour)
    }

    /// Append one term at the given timestep. `resolve` picks the column
    /// out of that timestep's table; it only runs in emitting mode.
    fn term_at(&mut self, hour: usize, coeff: f64, resolve: impl FnOnce(&VariableMap) -> i32) {
        self.pending_terms += 1;
        if let Sink::Emit { vars, pending, .. } = &mut self.sink {
            let column = slot(resolve(&vars[hour]))
                .unwrap_or_else(|| panic!("term references a variable absent from this pass"));
            pending.push((column, coeff));
        }
    }

    fn term(&mut self, coeff: f64, resolve: impl FnOnce(&VariableMap) -> i32) {
        self.term_at(self.hour, coeff, resolve)
    }

    /// Append one term resolved against the non-hourly table.
    fn weekly_term(&mut self, coeff: f64, resolve: impl FnOnce(&NonHourlyVariableMap) -> i32) {
        self.pending_terms += 1;
        if let Sink::Emit { extra, pending, .. } = &mut self.sink {
            let column = slot(resolve(extra))
                .unwrap_or_else(|| panic!("term references a variable absent from this pass"));
            pending.push((column, coeff));
        }
    }

    // === Term appenders, one per variable family ===

    pub fn link_flow(&mut self, link: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.link_flow[link]);
        self
    }

    pub fn link_flow_direct_cost(&mut self, link: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.link_flow_direct_cost[link]);
        self
    }

    pub fn link_flow_indirect_cost(&mut self, link: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.link_flow_indirect_cost[link]);
        self
    }

    pub fn unsupplied(&mut self, area: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.unsupplied[area]);
        self
    }

    pub fn spilled(&mut self, area: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.spilled[area]);
        self
    }

    pub fn thermal_production(&mut self, cluster: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.thermal_production[cluster]);
        self
    }

    pub fn units_on(&mut self, cluster: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.units_on[cluster]);
        self
    }

    pub fn units_on_at(&mut self, cluster: usize, coeff: f64, hour: usize) -> &mut Self {
        self.term_at(hour, coeff, |m| m.units_on[cluster]);
        self
    }

    pub fn units_starting(&mut self, cluster: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.units_starting[cluster]);
        self
    }

    pub fn units_starting_at(&mut self, cluster: usize, coeff: f64, hour: usize) -> &mut Self {
        self.term_at(hour, coeff, |m| m.units_starting[cluster]);
        self
    }

    pub fn units_stopping(&mut self, cluster: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.units_stopping[cluster]);
        self
    }

    pub fn units_stopping_at(&mut self, cluster: usize, coeff: f64, hour: usize) -> &mut Self {
        self.term_at(hour, coeff, |m| m.units_stopping[cluster]);
        self
    }

    pub fn units_failing(&mut self, cluster: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.units_failing[cluster]);
        self
    }

    pub fn hydro_generation(&mut self, area: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.hydro_generation[area]);
        self
    }

    pub fn pumping(&mut self, area: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.pumping[area]);
        self
    }

    pub fn hydro_level(&mut self, area: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.hydro_level[area]);
        self
    }

    /// Hydro level at `hour + offset`; dropped past the horizon.
    pub fn hydro_level_offset(&mut self, area: usize, coeff: f64, offset: usize) -> &mut Self {
        if let Some(hour) = self.offset_hour(offset) {
            self.term_at(hour, coeff, |m| m.hydro_level[area]);
        }
        self
    }

    pub fn hydro_level_at(&mut self, area: usize, coeff: f64, hour: usize) -> &mut Self {
        self.term_at(hour, coeff, |m| m.hydro_level[area]);
        self
    }

    pub fn overflow(&mut self, area: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.overflow[area]);
        self
    }

    pub fn storage_injection(&mut self, cluster: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.storage_injection[cluster]);
        self
    }

    pub fn storage_injection_at(&mut self, cluster: usize, coeff: f64, hour: usize) -> &mut Self {
        self.term_at(hour, coeff, |m| m.storage_injection[cluster]);
        self
    }

    pub fn storage_withdrawal(&mut self, cluster: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.storage_withdrawal[cluster]);
        self
    }

    pub fn storage_withdrawal_at(&mut self, cluster: usize, coeff: f64, hour: usize) -> &mut Self {
        self.term_at(hour, coeff, |m| m.storage_withdrawal[cluster]);
        self
    }

    pub fn storage_level(&mut self, cluster: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.storage_level[cluster]);
        self
    }

    /// Storage level at `hour + offset`; dropped past the horizon.
    pub fn storage_level_offset(&mut self, cluster: usize, coeff: f64, offset: usize) -> &mut Self {
        if let Some(hour) = self.offset_hour(offset) {
            self.term_at(hour, coeff, |m| m.storage_level[cluster]);
        }
        self
    }

    pub fn storage_level_at(&mut self, cluster: usize, coeff: f64, hour: usize) -> &mut Self {
        self.term_at(hour, coeff, |m| m.storage_level[cluster]);
        self
    }

    pub fn hydro_generation_at(&mut self, area: usize, coeff: f64, hour: usize) -> &mut Self {
        self.term_at(hour, coeff, |m| m.hydro_generation[area]);
        self
    }

    pub fn pumping_at(&mut self, area: usize, coeff: f64, hour: usize) -> &mut Self {
        self.term_at(hour, coeff, |m| m.pumping[area]);
        self
    }

    pub fn overflow_at(&mut self, area: usize, coeff: f64, hour: usize) -> &mut Self {
        self.term_at(hour, coeff, |m| m.overflow[area]);
        self
    }

    pub fn thermal_production_at(&mut self, cluster: usize, coeff: f64, hour: usize) -> &mut Self {
        self.term_at(hour, coeff, |m| m.thermal_production[cluster]);
        self
    }

    pub fn link_flow_at(&mut self, link: usize, coeff: f64, hour: usize) -> &mut Self {
        self.term_at(hour, coeff, |m| m.link_flow[link]);
        self
    }

    pub fn reserve_unsatisfied(&mut self, reserve: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.reserve_unsatisfied[reserve]);
        self
    }

    pub fn reserve_excess(&mut self, reserve: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.reserve_excess[reserve]);
        self
    }

    pub fn thermal_reserve_participation(&mut self, participation: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.thermal_reserve_participation[participation]);
        self
    }

    pub fn running_thermal_reserve_participation(
        &mut self,
        participation: usize,
        coeff: f64,
    ) -> &mut Self {
        self.term(coeff, |m| m.thermal_reserve_participation_on[participation]);
        self
    }

    pub fn off_thermal_reserve_participation(
        &mut self,
        participation: usize,
        coeff: f64,
    ) -> &mut Self {
        self.term(coeff, |m| m.thermal_reserve_participation_off[participation]);
        self
    }

    pub fn st_reserve_turbining(&mut self, participation: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.st_reserve_turbining[participation]);
        self
    }

    pub fn st_reserve_pumping(&mut self, participation: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.st_reserve_pumping[participation]);
        self
    }

    pub fn st_reserve_participation(&mut self, participation: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.st_reserve_participation[participation]);
        self
    }

    /// Storage reserve participation at `hour + offset`; dropped past the
    /// horizon.
    pub fn st_reserve_participation_offset(
        &mut self,
        participation: usize,
        coeff: f64,
        offset: usize,
    ) -> &mut Self {
        if let Some(hour) = self.offset_hour(offset) {
            self.term_at(hour, coeff, |m| m.st_reserve_participation[participation]);
        }
        self
    }

    pub fn lt_reserve_turbining(&mut self, participation: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.lt_reserve_turbining[participation]);
        self
    }

    pub fn lt_reserve_pumping(&mut self, participation: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.lt_reserve_pumping[participation]);
        self
    }

    pub fn lt_reserve_participation(&mut self, participation: usize, coeff: f64) -> &mut Self {
        self.term(coeff, |m| m.lt_reserve_participation[participation]);
        self
    }

    /// Long-term storage reserve participation at `hour + offset`; dropped
    /// past the horizon.
    pub fn lt_reserve_participation_offset(
        &mut self,
        participation: usize,
        coeff: f64,
        offset: usize,
    ) -> &mut Self {
        if let Some(hour) = self.offset_hour(offset) {
            self.term_at(hour, coeff, |m| m.lt_reserve_participation[participation]);
        }
        self
    }

    pub fn final_level(&mut self, area: usize, coeff: f64) -> &mut Self {
        self.weekly_term(coeff, |m| m.final_level[area]);
        self
    }

    pub fn water_layer(&mut self, area: usize, layer: usize, coeff: f64) -> &mut Self {
        self.weekly_term(coeff, |m| m.water_layers[area][layer]);
        self
    }

    // === Row terminators ===

    pub fn less_than(&mut self) -> Option<usize> {
        self.commit(RowSense::LessOrEqual)
    }

    pub fn equal_to(&mut self) -> Option<usize> {
        self.commit(RowSense::Equal)
    }

    pub fn greater_than(&mut self) -> Option<usize> {
        self.commit(RowSense::GreaterOrEqual)
    }

    /// Finalize the pending row. In sizing mode the counters are bumped
    /// and `None` is returned; in emitting mode the CSR row is written and
    /// its number returned.
    fn commit(&mut self, sense: RowSense) -> Option<usize> {
        debug_assert!(self.pending_terms > 0, "finalizing an empty row");
        let terms = std::mem::take(&mut self.pending_terms);
        match &mut self.sink {
            Sink::Size(counters) => {
                counters.rows += 1;
                counters.nonzeros += terms;
                None
            }
            Sink::Emit { lp, pending, .. } => {
                let row = lp.constraint_count;
                lp.row_start[row] = lp.column_index.len();
                lp.row_len[row] = pending.len();
                for (column, coeff) in pending.drain(..) {
                    lp.column_index.push(column);
                    lp.coefficient.push(coeff);
                }
                lp.sense[row] = sense;
                lp.constraint_count += 1;
                Some(row)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::{GlobalCounts, NonHourlyVariableMap, VariableMap};
    use adeq_core::lp::AnnouncedSizes;

    fn counts() -> GlobalCounts {
        GlobalCounts {
            areas: 1,
            thermal_clusters: 1,
            ..Default::default()
        }
    }

    fn maps(horizon: usize) -> Vec<VariableMap> {
        let mut maps: Vec<VariableMap> = (0..horizon).map(|_| VariableMap::sized(&counts())).collect();
        for (h, map) in maps.iter_mut().enumerate() {
            map.thermal_production[0] = (2 * h) as i32;
            map.unsupplied[0] = (2 * h + 1) as i32;
        }
        maps
    }

    #[test]
    fn sizing_and_emitting_count_the_same() {
        let horizon = 3;
        let vars = maps(horizon);
        let extra = NonHourlyVariableMap::sized(&counts(), 0);

        let mut sizing = ConstraintBuilder::sizing(horizon);
        for h in 0..horizon {
            sizing.set_hour(h);
            sizing.thermal_production(0, 1.0).unsupplied(0, 1.0);
            sizing.equal_to();
        }
        let announced = sizing.sizes();
        assert_eq!(announced.rows, 3);
        assert_eq!(announced.nonzeros, 6);

        let mut lp = LpProblem::new();
        lp.resize(AnnouncedSizes {
            variables: 2 * horizon,
            constraints: announced.rows,
            nonzeros: announced.nonzeros,
        });
        lp.variable_count = 2 * horizon;
        let mut emitting = ConstraintBuilder::emitting(&mut lp, &vars, &extra, horizon);
        for h in 0..horizon {
            emitting.set_hour(h);
            emitting.thermal_production(0, 1.0).unsupplied(0, -1.0);
            let row = emitting.equal_to().expect("row number in emit mode");
            assert_eq!(row, h);
        }
        assert_eq!(lp.constraint_count, announced.rows);
        assert_eq!(lp.nonzero_count(), announced.nonzeros);
        assert_eq!(lp.row_len, vec![2; 3]);
        assert_eq!(lp.column_index[0], 0);
        assert_eq!(lp.coefficient[1], -1.0);
    }

    #[test]
    fn offsets_past_the_horizon_are_dropped_in_both_modes() {
        let horizon = 2;
        let vars = {
            let mut v = maps(horizon);
            for (h, map) in v.iter_mut().enumerate() {
                map.hydro_level[0] = (10 + h) as i32;
            }
            v
        };
        let extra = NonHourlyVariableMap::sized(&counts(), 0);

        let mut sizing = ConstraintBuilder::sizing(horizon);
        sizing.set_hour(1);
        sizing.hydro_level_offset(0, 1.0, 0);
        sizing.hydro_level_offset(0, 1.0, 1); // past the horizon, dropped
        assert_eq!(sizing.number_of_variables(), 1);
        sizing.less_than();

        let mut lp = LpProblem::new();
        lp.resize(AnnouncedSizes {
            variables: 12,
            constraints: 1,
            nonzeros: 1,
        });
        lp.variable_count = 12;
        let mut emitting = ConstraintBuilder::emitting(&mut lp, &vars, &extra, horizon);
        emitting.set_hour(1);
        emitting.hydro_level_offset(0, 1.0, 0);
        emitting.hydro_level_offset(0, 1.0, 1);
        emitting.less_than();
        assert_eq!(lp.row_len[0], 1);
        assert_eq!(lp.column_index[0], 11);
    }

    #[test]
    fn number_of_variables_resets_at_termination() {
        let mut sizing = ConstraintBuilder::sizing(1);
        sizing.thermal_production(0, 1.0);
        assert_eq!(sizing.number_of_variables(), 1);
        sizing.greater_than();
        assert_eq!(sizing.number_of_variables(), 0);
    }
}
