//! The weekly optimization loop.
//!
//! One call to [`WeeklyLoopDriver::solve_week`] runs the whole pipeline for
//! a week: size, emit, assign bounds/costs/RHS, solve, read back, adjust
//! the thermal floors, solve again. The strict per-week order is
//!
//! ```text
//! reinit -> size -> emit -> (bounds, costs, rhs, solve, read back)+
//!        -> thermal heuristic -> (bounds, costs, rhs, solve, read back)+
//! ```
//!
//! with one `(...)` round per optimization interval (one for a weekly
//! horizon, seven for a daily one). The second round is skipped in integer
//! and expansion modes and after a first-pass failure.
//!
//! Any disagreement between the announced sizes and the emitted counts is
//! fatal: the CSR and every parallel vector would be misaligned.

use tracing::{debug, info, warn};

use adeq_core::{
    AnnouncedSizes, CoreError, CoreResult, DualTarget, MpsExport, OptimizationHorizon,
    PrimalTarget, ProblemContext, RunOptions, WeeklyProblem, HOURS_PER_DAY, HOURS_PER_WEEK,
};
use adeq_solver::{
    criterion_line, write_column_structure, write_mps, write_row_structure, LpSolution,
    SolveStatus, SolverDriver, SolverSettings,
};

use crate::bounds::set_variable_bounds;
use crate::builder::ConstraintBuilder;
use crate::context::split_problem;
use crate::costs::set_linear_costs;
use crate::groups::run_constraint_groups;
use crate::heuristic::run_thermal_heuristic;
use crate::indexing::{
    assign_global_indices, ConstraintCorrespondence, VariableCorrespondence,
};
use crate::naming::NameTagger;
use crate::rhs::set_right_hand_sides;
use crate::variables::register_variables;

/// Which of the two optimization passes is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationPass {
    First,
    Second,
}

impl OptimizationPass {
    fn index(&self) -> usize {
        match self {
            OptimizationPass::First => 0,
            OptimizationPass::Second => 1,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            OptimizationPass::First => "1",
            OptimizationPass::Second => "2",
        }
    }
}

/// Outcome of one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekStatus {
    Solved,
    /// Best-effort mode only: the week failed and its results are missing.
    Missing,
}

/// Streams each weekly problem before it is solved.
pub trait SimulationObserver {
    fn notify_weekly_problem(
        &mut self,
        problem: &WeeklyProblem,
        pass: OptimizationPass,
        mps_name: &str,
    );
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NullObserver;

impl SimulationObserver for NullObserver {
    fn notify_weekly_problem(&mut self, _: &WeeklyProblem, _: OptimizationPass, _: &str) {}
}

/// Sink for every file-like artifact of the run (MPS dumps, criterion
/// records, structure exports, raw results).
pub trait ResultWriter {
    fn add_entry(&mut self, filename: &str, content: &str) -> std::io::Result<()>;
}

/// Writer that keeps entries in memory; also the test double.
#[derive(Debug, Default)]
pub struct InMemoryWriter {
    pub entries: Vec<(String, String)>,
}

impl ResultWriter for InMemoryWriter {
    fn add_entry(&mut self, filename: &str, content: &str) -> std::io::Result<()> {
        self.entries.push((filename.to_string(), content.to_string()));
        Ok(())
    }
}

/// Optional hook running the curtailment-sharing pass on the shared weekly
/// problem after the standard solve.
pub type AdequacyPatchHook = Box<dyn FnMut(&mut WeeklyProblem) -> CoreResult<()>>;

/// Drives the two optimization passes of every week.
pub struct WeeklyLoopDriver {
    pub options: RunOptions,
    solver: SolverDriver,
    adequacy_patch: Option<AdequacyPatchHook>,
}

impl WeeklyLoopDriver {
    pub fn new(options: RunOptions) -> Self {
        let solver = SolverDriver::new(SolverSettings {
            verbose: options.solver.verbose,
            time_limit_seconds: options.solver.time_limit_seconds,
            max_iterations: None,
        });
        Self {
            options,
            solver,
            adequacy_patch: None,
        }
    }

    /// Install the external curtailment-sharing pass.
    pub fn with_adequacy_patch(mut self, hook: AdequacyPatchHook) -> Self {
        self.adequacy_patch = Some(hook);
        self
    }

    /// Solve one week. In best-effort mode a solver failure yields
    /// `WeekStatus::Missing` instead of an error.
    pub fn solve_week(
        &mut self,
        problem: &mut WeeklyProblem,
        writer: &mut dyn ResultWriter,
        observer: &mut dyn SimulationObserver,
    ) -> CoreResult<WeekStatus> {
        self.configure(problem);
        problem.reinit();
        let counts = assign_global_indices(problem);
        problem.allocate_results();

        let horizon = problem.timesteps_per_optimization;
        let layer_count = problem
            .hydro
            .iter()
            .map(|h| h.water_layer_values.len())
            .max()
            .unwrap_or(0);
        let mut vars = VariableCorrespondence::sized(&counts, horizon, layer_count);
        let days = (horizon / problem.timesteps_per_day.max(1)).max(1);
        let mut rows = ConstraintCorrespondence::sized(&counts, horizon, days);

        let named = self.options.named_problems
            || self.options.export_structure.is_on()
            || self.options.export_mps != MpsExport::None;
        let mut variable_tagger = NameTagger::new(named);
        let mut constraint_tagger = NameTagger::new(named);

        // Sizing pass: announce the final shape of the problem.
        let announced = {
            let (view, lp, _, _) = split_problem(problem);
            let variables = register_variables(
                &view,
                lp,
                &mut vars,
                &mut variable_tagger,
                crate::builder::PassMode::Size,
            );
            let mut builder = ConstraintBuilder::sizing(view.horizon);
            run_constraint_groups(&view, &mut rows, &mut builder, &mut constraint_tagger);
            let sizes = builder.sizes();
            AnnouncedSizes {
                variables,
                constraints: sizes.rows,
                nonzeros: sizes.nonzeros,
            }
        };
        debug!(
            variables = announced.variables,
            constraints = announced.constraints,
            nonzeros = announced.nonzeros,
            week = problem.week_in_year,
            "announced problem sizes"
        );

        problem.lp.resize(announced);
        problem.primal_targets.clear();
        problem
            .primal_targets
            .resize(announced.variables, PrimalTarget::None);
        problem.dual_targets.clear();
        problem
            .dual_targets
            .resize(announced.constraints, DualTarget::None);
        problem.reduced_costs.clear();
        problem.reduced_costs.resize(announced.variables, 0.0);

        // Binding pass: emit for real and cross-check against the
        // announcement.
        {
            let (view, lp, _, _) = split_problem(problem);
            variable_tagger.start_pass(announced.variables, view.year, view.week);
            let bound = register_variables(
                &view,
                lp,
                &mut vars,
                &mut variable_tagger,
                crate::builder::PassMode::Emit,
            );
            lp.variable_count = bound;
            if bound != announced.variables {
                return Err(CoreError::InconsistentSizing {
                    context: ProblemContext::week(view.year, view.week),
                    detail: format!(
                        "variable registration announced {} columns but bound {bound}",
                        announced.variables
                    ),
                });
            }

            constraint_tagger.start_pass(announced.constraints, view.year, view.week);
            let mut builder =
                ConstraintBuilder::emitting(lp, &vars.hourly, &vars.extra, view.horizon);
            run_constraint_groups(&view, &mut rows, &mut builder, &mut constraint_tagger);
        }
        if problem.lp.constraint_count != announced.constraints
            || problem.lp.nonzero_count() != announced.nonzeros
        {
            return Err(CoreError::InconsistentSizing {
                context: ProblemContext::week(problem.year, problem.week_in_year),
                detail: format!(
                    "sizing announced {} rows / {} terms, emission produced {} rows / {} terms",
                    announced.constraints,
                    announced.nonzeros,
                    problem.lp.constraint_count,
                    problem.lp.nonzero_count()
                ),
            });
        }
        variable_tagger.store_into(&mut problem.lp.variable_name);
        constraint_tagger.store_into(&mut problem.lp.constraint_name);

        if self.options.export_structure.is_on() && problem.first_week_of_simulation {
            writer.add_entry("structure_rows.txt", &write_row_structure(&problem.lp))?;
            writer.add_entry("structure_columns.txt", &write_column_structure(&problem.lp))?;
        }

        let first = self.run_pass(problem, &vars, &rows, OptimizationPass::First, writer, observer);
        match first {
            Ok(()) => {}
            Err(err) => return self.fail_week(err),
        }
        if self.options.export_raw_results.is_on() {
            let dump = dump_raw_results(problem);
            writer.add_entry(
                &format!("RawResultsWeek{}_beforeHeuristic.txt", problem.week_in_year),
                &dump,
            )?;
        }

        // The second pass only makes sense for the continuous model: with
        // integer commitment the first answer is final, and expansion mode
        // keeps the relaxation.
        if !problem.expansion && !problem.with_integer_variables {
            run_thermal_heuristic(problem);
            let second =
                self.run_pass(problem, &vars, &rows, OptimizationPass::Second, writer, observer);
            match second {
                Ok(()) => {}
                Err(err) => return self.fail_week(err),
            }
            if self.options.export_raw_results.is_on() {
                let dump = dump_raw_results(problem);
                writer.add_entry(
                    &format!("RawResultsWeek{}_afterHeuristic.txt", problem.week_in_year),
                    &dump,
                )?;
            }
        }

        if self.options.adequacy_patch.is_on() {
            if let Some(hook) = self.adequacy_patch.as_mut() {
                hook(problem)?;
            }
        }

        problem.problem_already_instantiated = true;
        Ok(WeekStatus::Solved)
    }

    fn configure(&self, problem: &mut WeeklyProblem) {
        problem.timestep_count = HOURS_PER_WEEK;
        problem.timesteps_per_day = HOURS_PER_DAY;
        problem.day_count = HOURS_PER_WEEK / HOURS_PER_DAY;
        problem.weekly_optimization =
            self.options.optimization_horizon == OptimizationHorizon::Weekly;
        problem.timesteps_per_optimization = if problem.weekly_optimization {
            HOURS_PER_WEEK
        } else {
            HOURS_PER_DAY
        };
        problem.with_startup_costs = self.options.startup_costs.is_on();
        problem.with_integer_variables = self.options.integer_variables.is_on();
        problem.accurate_water_value =
            self.options.water_value_mode == adeq_core::WaterValueMode::Accurate;
        for hydro in &mut problem.hydro {
            hydro.accurate_water_value = problem.accurate_water_value;
        }
    }

    fn fail_week(&self, err: CoreError) -> CoreResult<WeekStatus> {
        if self.options.best_effort {
            warn!("week failed, marking results missing: {err}");
            return Ok(WeekStatus::Missing);
        }
        Err(err)
    }

    /// One full pass over the week: for each optimization interval, fill
    /// the numeric vectors, stream the problem, solve, and read back.
    fn run_pass(
        &mut self,
        problem: &mut WeeklyProblem,
        vars: &VariableCorrespondence,
        rows: &ConstraintCorrespondence,
        pass: OptimizationPass,
        writer: &mut dyn ResultWriter,
        observer: &mut dyn SimulationObserver,
    ) -> CoreResult<()> {
        let intervals = problem.interval_count();
        for interval in 0..intervals {
            let offset = interval * problem.timesteps_per_optimization;
            {
                let (view, lp, primal_targets, dual_targets) = split_problem(problem);
                set_variable_bounds(&view, vars, lp, primal_targets, offset);
                set_linear_costs(&view, vars, lp, self.options.water_value_mode, offset);
                set_right_hand_sides(&view, rows, lp, dual_targets, offset);
            }

            let mps_name = format!(
                "problem-{}-{}-{}--optim-nb-{}.mps",
                problem.year,
                problem.week_in_year,
                interval + 1,
                pass.tag()
            );
            observer.notify_weekly_problem(problem, pass, &mps_name);

            let solution = self
                .solver
                .solve(&problem.lp)
                .map_err(|e| CoreError::Internal(e.to_string()))?;
            self.record_timing(problem, pass, &solution);

            if !solution.status.is_success() {
                self.dump_on_failure(problem, &mps_name, writer)?;
                let context = ProblemContext::week(problem.year, problem.week_in_year)
                    .with_timestep(offset);
                return Err(match solution.status {
                    SolveStatus::Infeasible => CoreError::SolverInfeasible(context),
                    SolveStatus::Unbounded => CoreError::SolverUnbounded(context),
                    SolveStatus::TimeLimit => CoreError::SolverTimeLimit(context),
                    SolveStatus::IterationLimit | SolveStatus::NumericalError => {
                        CoreError::SolverNumerical(context, solution.status.to_string())
                    }
                    SolveStatus::Optimal | SolveStatus::Unknown => {
                        CoreError::SolverNumerical(context, "unknown solver status".into())
                    }
                });
            }

            problem.store_solution(&solution.primal, &solution.marginal_values);
            problem.reduced_costs.clone_from(&solution.reduced_costs);
            match pass {
                OptimizationPass::First => problem.first_pass_cost.push(solution.objective),
                OptimizationPass::Second => problem.second_pass_cost.push(solution.objective),
            }
            info!(
                week = problem.week_in_year,
                interval,
                pass = pass.tag(),
                objective = solution.objective,
                "interval solved"
            );

            if self.options.export_mps == MpsExport::Always {
                writer.add_entry(&mps_name, &write_mps(&problem.lp, &mps_name))?;
                let criterion_name = format!(
                    "criterion-{}-{}-{}--optim-nb-{}.txt",
                    problem.year,
                    problem.week_in_year,
                    interval + 1,
                    pass.tag()
                );
                writer.add_entry(&criterion_name, &criterion_line(solution.objective))?;
            }
        }
        Ok(())
    }

    fn record_timing(&self, problem: &mut WeeklyProblem, pass: OptimizationPass, solution: &LpSolution) {
        problem.time_measures[pass.index()].solve_time_ms += solution.solve_time_ms;
    }

    fn dump_on_failure(
        &self,
        problem: &WeeklyProblem,
        mps_name: &str,
        writer: &mut dyn ResultWriter,
    ) -> CoreResult<()> {
        if matches!(self.options.export_mps, MpsExport::OnError | MpsExport::Always) {
            writer.add_entry(mps_name, &write_mps(&problem.lp, mps_name))?;
        }
        Ok(())
    }
}

/// Human-readable key/value dump of the weekly problem state, written
/// before and after the thermal heuristic when raw-results export is on.
pub fn dump_raw_results(problem: &WeeklyProblem) -> String {
    let mut out = String::new();
    let mut line = |key: &str, value: String| {
        out.push_str(key);
        out.push_str(":\t");
        out.push_str(&value);
        out.push_str("\r\n");
    };

    line("year", problem.year.to_string());
    line("weekInTheYear", problem.week_in_year.to_string());
    line("weeklyOptimization", problem.weekly_optimization.to_string());
    line("withStartupCosts", problem.with_startup_costs.to_string());
    line(
        "withIntegerVariables",
        problem.with_integer_variables.to_string(),
    );
    line("accurateWaterValue", problem.accurate_water_value.to_string());
    line("areaCount", problem.area_count().to_string());
    line("linkCount", problem.link_count().to_string());
    line("timestepCount", problem.timestep_count.to_string());
    line(
        "timestepsPerOptimization",
        problem.timesteps_per_optimization.to_string(),
    );

    for (cost, label) in [
        (&problem.first_pass_cost, "costOptimalSolution1"),
        (&problem.second_pass_cost, "costOptimalSolution2"),
    ] {
        for (interval, value) in cost.iter().enumerate() {
            line(&format!("{label}<{interval}>"), format!("{value:.6}"));
        }
    }

    for (a, area) in problem.areas.iter().enumerate() {
        let results = &problem.results[a];
        line(
            &format!("area<{}>:unsuppliedEnergyCost", area.name),
            format!("{:.6}", area.unsupplied_energy_cost),
        );
        line(
            &format!("area<{}>:spilledEnergyCost", area.name),
            format!("{:.6}", area.spilled_energy_cost),
        );
        for hour in 0..problem.timestep_count.min(results.unsupplied.len()) {
            line(
                &format!("area<{}>:unsupplied<{hour}>", area.name),
                format!("{:.6}", results.unsupplied[hour]),
            );
            line(
                &format!("area<{}>:marginalPrice<{hour}>", area.name),
                format!("{:.6}", results.marginal_price[hour]),
            );
            line(
                &format!("area<{}>:hydroGeneration<{hour}>", area.name),
                format!("{:.6}", results.hydro_generation[hour]),
            );
            for (c, cluster) in problem.thermal[a].clusters.iter().enumerate() {
                line(
                    &format!(
                        "area<{}>:thermal<{}>:production<{hour}>",
                        area.name, cluster.name
                    ),
                    format!("{:.6}", results.thermal[hour].production[c]),
                );
            }
        }
    }

    for (pass, measure) in problem.time_measures.iter().enumerate() {
        line(
            &format!("timeMeasure<{pass}>:solveTime"),
            measure.solve_time_ms.to_string(),
        );
        line(
            &format!("timeMeasure<{pass}>:updateTime"),
            measure.update_time_ms.to_string(),
        );
    }
    out
}
