//! End-to-end tests of the weekly loop on a small two-area system with
//! thermal commitment, hydro, short-term storage, reserves and binding
//! constraints.

use adeq_core::{
    AdditionalConstraints, Area, AreaReserves, BindingConstraint, CapacityReservation,
    ConstraintOperator, ConstraintScope, ConstraintVariable, HydroReservoir, Link, NtcValues,
    OptimizationHorizon, RowSense, RunOptions, SingleAdditionalConstraint, StorageCluster,
    StorageParticipation, StorageSeries, ThermalCluster, ThermalPark, ThermalParticipation,
    Toggle, TransferCosts, WeeklyProblem, HOURS_PER_WEEK,
};
use adeq_opt::builder::PassMode;
use adeq_opt::{
    assign_global_indices, register_variables, split_problem, ConstraintBuilder,
    ConstraintCorrespondence, InMemoryWriter, NameTagger, NullObserver, VariableCorrespondence,
    WeekStatus, WeeklyLoopDriver,
};

const H: usize = HOURS_PER_WEEK;

fn thermal_cluster(name: &str, available: f64, cost: f64) -> ThermalCluster {
    ThermalCluster {
        name: name.into(),
        id: name.into(),
        unit_size: 50.0,
        unit_min_power: 10.0,
        min_up_time: 2,
        min_down_time: 2,
        min_up_down_time: 2,
        startup_cost: 100.0,
        shutdown_cost: 10.0,
        fixed_cost: 1.0,
        available_power: vec![available; H],
        available_power_ref: vec![available; H],
        min_power: vec![0.0; H],
        min_power_ref: vec![0.0; H],
        production_cost: vec![cost; H],
        max_units_on: vec![(available / 50.0).ceil() as i32; H],
        min_units_on: vec![0; H],
        ..Default::default()
    }
}

fn battery(name: &str) -> StorageCluster {
    StorageCluster {
        name: name.into(),
        id: name.into(),
        reservoir_capacity: 100.0,
        injection_nominal_capacity: 50.0,
        withdrawal_nominal_capacity: 50.0,
        injection_efficiency: 0.9,
        withdrawal_efficiency: 0.9,
        initial_level: 50.0,
        series: StorageSeries {
            max_injection_modulation: vec![1.0; H],
            max_withdrawal_modulation: vec![1.0; H],
            inflows: vec![0.0; H],
            lower_rule_curve: vec![0.0; H],
            upper_rule_curve: vec![1.0; H],
        },
        additional_constraints: vec![AdditionalConstraints {
            name: "cumul".into(),
            cluster_id: name.into(),
            variable: ConstraintVariable::Injection,
            operator: ConstraintOperator::Less,
            rhs: vec![600.0],
            constraints: vec![SingleAdditionalConstraint {
                hours: (1..=24).collect(),
                global_index: 0,
                local_index: 0,
            }],
        }],
        ..Default::default()
    }
}

fn reservoir() -> HydroReservoir {
    HydroReservoir {
        has_dispatchable_hydro: true,
        has_pumping: true,
        follow_hourly_level: true,
        generation_between_bounds: true,
        min_energy_per_interval: vec![0.0],
        max_energy_per_interval: vec![5000.0],
        fixed_energy_per_interval: vec![0.0],
        max_pumping_energy_per_interval: vec![2000.0],
        daily_energy: vec![800.0; 7],
        hourly_max_generation: vec![80.0; H],
        hourly_max_generation_ref: vec![80.0; H],
        hourly_max_pumping: vec![40.0; H],
        hourly_min_generation: vec![0.0; H],
        inflows: vec![10.0; H],
        level_ceiling: vec![1000.0; H],
        level_floor: vec![0.0; H],
        initial_level: 500.0,
        reservoir_capacity: 1000.0,
        pumping_ratio: 0.8,
        weekly_water_value: 5.0,
        ..Default::default()
    }
}

fn two_area_week() -> WeeklyProblem {
    let north_reserves = AreaReserves {
        up: vec![CapacityReservation {
            name: "fcr-up".into(),
            need: vec![10.0; H],
            failure_cost: 5000.0,
            spillage_cost: 50.0,
            max_activation_duration: 2,
            max_activation_ratio: 0.5,
            max_energy_activation_ratio: 0.1,
            thermal_participations: vec![ThermalParticipation {
                cluster_index: 0,
                cluster_name: "gas".into(),
                max_power_on: 20.0,
                max_power_off: 5.0,
                participation_cost: 2.0,
                ..Default::default()
            }],
            lt_storage_participations: vec![StorageParticipation {
                cluster_index: 0,
                cluster_name: "reservoir".into(),
                max_turbining: 30.0,
                max_pumping: 20.0,
                participation_cost: 1.0,
                ..Default::default()
            }],
            ..Default::default()
        }],
        down: vec![CapacityReservation {
            name: "afrr-down".into(),
            need: vec![5.0; H],
            failure_cost: 4000.0,
            spillage_cost: 40.0,
            max_activation_duration: 1,
            max_activation_ratio: 0.5,
            max_energy_activation_ratio: 0.1,
            thermal_participations: vec![ThermalParticipation {
                cluster_index: 0,
                cluster_name: "gas".into(),
                max_power_on: 10.0,
                max_power_off: 0.0,
                participation_cost: 2.0,
                ..Default::default()
            }],
            ..Default::default()
        }],
        max_global_activation_duration_up: 2,
        max_global_activation_duration_down: 1,
        max_global_energy_activation_ratio_up: 0.1,
        max_global_energy_activation_ratio_down: 0.1,
    };

    let south_reserves = AreaReserves {
        up: vec![CapacityReservation {
            name: "fcr-south".into(),
            need: vec![5.0; H],
            failure_cost: 5000.0,
            spillage_cost: 50.0,
            max_activation_duration: 2,
            max_activation_ratio: 0.5,
            max_energy_activation_ratio: 0.1,
            st_storage_participations: vec![StorageParticipation {
                cluster_index: 0,
                cluster_name: "battery".into(),
                max_turbining: 20.0,
                max_pumping: 20.0,
                participation_cost: 1.0,
                ..Default::default()
            }],
            ..Default::default()
        }],
        down: Vec::new(),
        max_global_activation_duration_up: 2,
        max_global_activation_duration_down: 0,
        max_global_energy_activation_ratio_up: 0.1,
        max_global_energy_activation_ratio_down: 0.0,
    };

    WeeklyProblem {
        year: 2030,
        week_in_year: 12,
        hour_in_year: 12 * 168,
        first_week_of_simulation: true,
        timestep_count: H,
        areas: vec![
            Area {
                name: "north".into(),
                net_demand: vec![100.0; H],
                must_run_generation: vec![0.0; H],
                unsupplied_energy_cost: 1000.0,
                spilled_energy_cost: 1.0,
            },
            Area {
                name: "south".into(),
                net_demand: vec![50.0; H],
                must_run_generation: vec![0.0; H],
                unsupplied_energy_cost: 1000.0,
                spilled_energy_cost: 1.0,
            },
        ],
        links: vec![Link {
            name: "north-south".into(),
            origin_area: 0,
            extremity_area: 1,
            transfer_costs: TransferCosts {
                with_hurdle_costs: true,
                with_loop_flow: false,
                direct: vec![0.5; H],
                indirect: vec![0.5; H],
                direct_ref: vec![0.5; H],
                indirect_ref: vec![0.5; H],
            },
        }],
        ntc: (0..H)
            .map(|_| NtcValues {
                direct: vec![100.0],
                indirect: vec![100.0],
                loop_flow: vec![0.0],
                apparent_resistance: vec![0.0],
                flow: vec![0.0],
            })
            .collect(),
        thermal: vec![
            ThermalPark {
                clusters: vec![thermal_cluster("gas", 200.0, 30.0)],
            },
            ThermalPark {
                clusters: vec![thermal_cluster("coal", 100.0, 50.0)],
            },
        ],
        hydro: vec![reservoir(), HydroReservoir::default()],
        storage: vec![Vec::new(), vec![battery("battery")]],
        reserves: vec![north_reserves, south_reserves],
        binding_constraints: vec![
            BindingConstraint {
                name: "flow-cap".into(),
                scope: ConstraintScope::Hourly,
                sense: RowSense::LessOrEqual,
                rhs: vec![80.0; H],
                link_terms: vec![adeq_core::LinkTerm {
                    link_index: 0,
                    weight: 1.0,
                    offset: 0,
                }],
                thermal_terms: Vec::new(),
            },
            BindingConstraint {
                name: "coal-budget".into(),
                scope: ConstraintScope::Weekly,
                sense: RowSense::LessOrEqual,
                rhs: vec![10_000.0],
                link_terms: Vec::new(),
                thermal_terms: vec![adeq_core::ThermalTerm {
                    area_index: 1,
                    cluster_index: 0,
                    weight: 1.0,
                    offset: 0,
                }],
            },
        ],
        ..Default::default()
    }
}

fn weekly_options() -> RunOptions {
    RunOptions {
        optimization_horizon: OptimizationHorizon::Weekly,
        named_problems: true,
        export_raw_results: Toggle::On,
        ..Default::default()
    }
}

#[test]
fn solves_a_full_week_and_fills_results() {
    let mut problem = two_area_week();
    let mut writer = InMemoryWriter::default();
    let mut observer = NullObserver;
    let mut driver = WeeklyLoopDriver::new(weekly_options());

    let status = driver
        .solve_week(&mut problem, &mut writer, &mut observer)
        .expect("the week is feasible");
    assert_eq!(status, WeekStatus::Solved);

    // Both passes solved one weekly interval each.
    assert_eq!(problem.first_pass_cost.len(), 1);
    assert_eq!(problem.second_pass_cost.len(), 1);

    // Hour-by-hour balance: generation + net imports + slack = demand.
    for hour in [0, 3, 100, 167] {
        for (a, area) in problem.areas.iter().enumerate() {
            let r = &problem.results[a];
            let mut supply = r.thermal[hour].production.iter().sum::<f64>()
                + r.hydro_generation[hour]
                - r.pumping[hour]
                + r.unsupplied[hour]
                - r.spilled[hour];
            for storage in &r.storage[hour].withdrawal {
                supply += storage;
            }
            for storage in &r.storage[hour].injection {
                supply -= storage;
            }
            let flow = problem.ntc[hour].flow[0];
            supply += if a == 0 { -flow } else { flow };
            assert!(
                (supply - area.net_demand[hour]).abs() < 1e-3,
                "area {a} hour {hour}: supply {supply} vs demand {}",
                area.net_demand[hour]
            );
        }
    }

    // No unserved energy in a system with ample capacity, and a sane
    // marginal price set by a real generator.
    assert!(problem.results[0].unsupplied.iter().all(|&u| u < 1e-3));
    let price = problem.results[0].marginal_price[10];
    assert!(price > 0.0 && price < 1000.0, "price {price}");

    // The raw dumps were written around the heuristic.
    let names: Vec<&str> = writer.entries.iter().map(|(n, _)| n.as_str()).collect();
    assert!(names.contains(&"RawResultsWeek12_beforeHeuristic.txt"));
    assert!(names.contains(&"RawResultsWeek12_afterHeuristic.txt"));
}

#[test]
fn lp_invariants_hold_after_assembly() {
    let mut problem = two_area_week();
    let mut writer = InMemoryWriter::default();
    let mut observer = NullObserver;
    let mut driver = WeeklyLoopDriver::new(weekly_options());
    driver
        .solve_week(&mut problem, &mut writer, &mut observer)
        .unwrap();

    let lp = &problem.lp;
    lp.check_consistency().expect("parallel vectors line up");

    // Name/index alignment and uniqueness.
    assert_eq!(lp.variable_name.len(), lp.variable_count);
    assert_eq!(lp.constraint_name.len(), lp.constraint_count);
    let mut names: Vec<&String> = lp.variable_name.iter().collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), lp.variable_count, "variable names are unique");
    let mut row_names: Vec<&String> = lp.constraint_name.iter().collect();
    row_names.sort();
    row_names.dedup();
    assert_eq!(row_names.len(), lp.constraint_count, "constraint names are unique");

    // Bound admissibility.
    for (lo, hi) in lp.lower_bound.iter().zip(&lp.upper_bound) {
        assert!(lo <= hi);
    }

    // Back-pointer coverage: the user-visible families all point at a
    // result cell.
    let visible = problem
        .primal_targets
        .iter()
        .filter(|t| !matches!(t, adeq_core::PrimalTarget::None))
        .count();
    assert!(visible > 0);
    let named_visible = lp
        .variable_name
        .iter()
        .zip(&problem.primal_targets)
        .filter(|(name, _)| {
            name.starts_with("ThermalProduction")
                || name.starts_with("UnsuppliedEnergy")
                || name.starts_with("HydroGeneration")
                || name.starts_with("StorageLevel")
                || name.starts_with("LinkFlow")
        })
        .all(|(_, target)| !matches!(target, adeq_core::PrimalTarget::None));
    assert!(named_visible, "every user-visible column has a target");
}

/// The sizing and emission passes agree on every count, for the weekly and
/// the daily horizon alike.
#[test]
fn sizing_matches_emission() {
    for weekly in [true, false] {
        let mut problem = two_area_week();
        problem.weekly_optimization = weekly;
        problem.timesteps_per_optimization = if weekly { H } else { 24 };
        problem.timesteps_per_day = 24;
        problem.with_startup_costs = true;
        let counts = assign_global_indices(&mut problem);

        let horizon = problem.timesteps_per_optimization;
        let mut vars = VariableCorrespondence::sized(&counts, horizon, 0);
        let days = horizon / 24;
        let mut rows = ConstraintCorrespondence::sized(&counts, horizon, days);
        let mut tagger = NameTagger::new(false);

        let (view, lp, _, _) = split_problem(&mut problem);

        let announced_vars =
            register_variables(&view, lp, &mut vars, &mut tagger, PassMode::Size);
        let mut sizing = ConstraintBuilder::sizing(horizon);
        adeq_opt::groups::run_constraint_groups(&view, &mut rows, &mut sizing, &mut tagger);
        let announced = sizing.sizes();

        lp.resize(adeq_core::AnnouncedSizes {
            variables: announced_vars,
            constraints: announced.rows,
            nonzeros: announced.nonzeros,
        });
        let bound_vars = register_variables(&view, lp, &mut vars, &mut tagger, PassMode::Emit);
        lp.variable_count = bound_vars;
        let mut emitting = ConstraintBuilder::emitting(lp, &vars.hourly, &vars.extra, horizon);
        adeq_opt::groups::run_constraint_groups(&view, &mut rows, &mut emitting, &mut tagger);

        assert_eq!(bound_vars, announced_vars, "weekly={weekly}");
        assert_eq!(lp.constraint_count, announced.rows, "weekly={weekly}");
        assert_eq!(lp.nonzero_count(), announced.nonzeros, "weekly={weekly}");
    }
}

/// Scenario: one area, one up reserve served by one thermal cluster whose
/// off units may participate. Per timestep the reserve family contributes
/// four rows (need, composition, running bound, off bound) with
/// 3 + 3 + 2 + 2 non-zeros.
#[test]
fn reserve_row_accounting() {
    let mut problem = two_area_week();
    problem.areas.truncate(1);
    problem.links.clear();
    problem.ntc.iter_mut().for_each(|n| *n = NtcValues::zeroed(0));
    problem.thermal.truncate(1);
    problem.hydro = vec![HydroReservoir::default()];
    problem.storage = vec![Vec::new()];
    problem.binding_constraints.clear();
    problem.reserves = vec![AreaReserves {
        up: vec![CapacityReservation {
            name: "primary".into(),
            need: vec![10.0; H],
            failure_cost: 5000.0,
            spillage_cost: 50.0,
            max_activation_duration: 0,
            max_activation_ratio: 0.5,
            max_energy_activation_ratio: 0.0,
            thermal_participations: vec![ThermalParticipation {
                cluster_index: 0,
                cluster_name: "gas".into(),
                max_power_on: 20.0,
                max_power_off: 5.0,
                participation_cost: 2.0,
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    }];
    problem.weekly_optimization = true;
    problem.timesteps_per_optimization = H;
    problem.timesteps_per_day = 24;
    problem.with_startup_costs = false;

    let counts = assign_global_indices(&mut problem);
    let mut rows = ConstraintCorrespondence::sized(&counts, H, 7);
    let mut tagger = NameTagger::new(false);
    let (view, _, _, _) = split_problem(&mut problem);

    let mut sizing = ConstraintBuilder::sizing(H);
    adeq_opt::groups::reserves::add_all(&view, &mut rows, &mut sizing, &mut tagger);
    let sizes = sizing.sizes();

    assert_eq!(sizes.rows, 4 * H);
    assert_eq!(sizes.nonzeros, (3 + 3 + 2 + 2) * H);
}

/// A zero activation duration disables the stock-energy coupling rows of a
/// storage participation; a positive one adds exactly one row per hour for
/// the direction that has it.
#[test]
fn zero_activation_duration_emits_no_stock_energy_rows() {
    let sizes_with_duration = |duration: usize| {
        let mut problem = two_area_week();
        problem.areas.truncate(1);
        problem.areas[0].name = "island".into();
        problem.links.clear();
        problem.ntc.iter_mut().for_each(|n| *n = NtcValues::zeroed(0));
        problem.thermal = vec![ThermalPark::default()];
        problem.hydro = vec![HydroReservoir::default()];
        problem.storage = vec![vec![battery("battery")]];
        problem.binding_constraints.clear();
        problem.reserves = vec![AreaReserves {
            up: vec![CapacityReservation {
                name: "fcr".into(),
                need: vec![5.0; H],
                failure_cost: 5000.0,
                spillage_cost: 50.0,
                max_activation_duration: duration,
                max_activation_ratio: 0.5,
                max_energy_activation_ratio: 0.1,
                st_storage_participations: vec![StorageParticipation {
                    cluster_index: 0,
                    cluster_name: "battery".into(),
                    max_turbining: 20.0,
                    max_pumping: 20.0,
                    participation_cost: 1.0,
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }];
        problem.weekly_optimization = true;
        problem.timesteps_per_optimization = H;
        problem.timesteps_per_day = 24;
        problem.with_startup_costs = false;

        let counts = assign_global_indices(&mut problem);
        let mut rows = ConstraintCorrespondence::sized(&counts, H, 7);
        let mut tagger = NameTagger::new(false);
        let (view, _, _, _) = split_problem(&mut problem);
        let mut sizing = ConstraintBuilder::sizing(H);
        adeq_opt::groups::reserves::add_all(&view, &mut rows, &mut sizing, &mut tagger);
        sizing.sizes()
    };

    let without = sizes_with_duration(0);
    let with = sizes_with_duration(2);
    // Need + three capacity thresholds + composition + two stock-level
    // rows per hour either way; the stock-energy row only when the window
    // is non-empty.
    assert_eq!(without.rows, 7 * H);
    assert_eq!(with.rows, 8 * H);
}

/// Scenario: a demand step with min-up time keeps the committed floor up
/// across the window after the second pass.
#[test]
fn thermal_min_up_commitment_follows_demand_step() {
    let mut problem = two_area_week();
    problem.areas.truncate(1);
    problem.links.clear();
    problem.ntc.iter_mut().for_each(|n| *n = NtcValues::zeroed(0));
    problem.thermal.truncate(1);
    problem.hydro = vec![HydroReservoir::default()];
    problem.storage = vec![Vec::new()];
    problem.binding_constraints.clear();
    problem.reserves = vec![AreaReserves::default()];

    let mut demand = vec![0.0; H];
    for (t, d) in demand.iter_mut().enumerate() {
        if t >= 2 {
            *d = 100.0;
        }
    }
    problem.areas[0].net_demand = demand;
    {
        let cluster = &mut problem.thermal[0].clusters[0];
        cluster.min_up_time = 3;
        cluster.min_down_time = 3;
        cluster.min_up_down_time = 3;
    }

    let mut options = weekly_options();
    options.startup_costs = Toggle::On;
    let mut driver = WeeklyLoopDriver::new(options);
    let mut writer = InMemoryWriter::default();
    let mut observer = NullObserver;
    driver
        .solve_week(&mut problem, &mut writer, &mut observer)
        .expect("feasible commitment");

    let results = &problem.results[0];
    let units: Vec<f64> = (0..6).map(|t| results.thermal[t].units_on[0]).collect();
    // Two 50 MW units carry the 100 MW step; the count never dips inside
    // the window.
    assert!(units[2] >= 2.0 - 1e-3);
    assert!(units[3] >= units[2] - 1e-3);
    assert!(units[4] >= units[3] - 1e-3);
}
