//! Variable registration: walks every (entity, timestep) pair in the
//! canonical traversal order and assigns column numbers.
//!
//! The same function runs twice per week. The sizing run only produces the
//! final column count; the binding run additionally fixes the index
//! tables, the integer markers and (when named problems are on) the
//! variable names. Both runs traverse identically, so the announced count
//! and the bound count can only diverge through a bug, which the driver
//! treats as fatal.

use adeq_core::lp::LpProblem;

use crate::builder::PassMode;
use crate::context::EntityView;
use crate::indexing::VariableCorrespondence;
use crate::naming::NameTagger;

struct Registrar<'a> {
    mode: PassMode,
    next: usize,
    lp: &'a mut LpProblem,
    tagger: &'a mut NameTagger,
}

impl Registrar<'_> {
    fn add(&mut self, cell: &mut i32, kind: &str, qualifiers: &[(&str, &str)]) {
        self.add_typed(cell, kind, qualifiers, false)
    }

    fn add_typed(
        &mut self,
        cell: &mut i32,
        kind: &str,
        qualifiers: &[(&str, &str)],
        integer: bool,
    ) {
        let index = self.next;
        self.next += 1;
        if self.mode == PassMode::Emit {
            *cell = index as i32;
            self.lp.is_integer[index] = integer;
            self.tagger.tag(index, kind, qualifiers);
        }
    }
}

/// Register every variable of the week. Returns the column count.
pub fn register_variables(
    view: &EntityView,
    lp: &mut LpProblem,
    vars: &mut VariableCorrespondence,
    tagger: &mut NameTagger,
    mode: PassMode,
) -> usize {
    let integer_units = view.with_integer_variables;
    let mut reg = Registrar {
        mode,
        next: 0,
        lp,
        tagger,
    };

    for hour in 0..view.horizon {
        reg.tagger.update_time_step(view.hour_in_year + hour as u32);
        let map = &mut vars.hourly[hour];

        reg.tagger.update_area("");
        for (l, link) in view.links.iter().enumerate() {
            let qualifier = [("link", link.name.as_str())];
            reg.add(&mut map.link_flow[l], "LinkFlow", &qualifier);
            if link.transfer_costs.with_hurdle_costs {
                reg.add(&mut map.link_flow_direct_cost[l], "HurdleCostDirect", &qualifier);
                reg.add(
                    &mut map.link_flow_indirect_cost[l],
                    "HurdleCostIndirect",
                    &qualifier,
                );
            }
        }

        for (a, area) in view.areas.iter().enumerate() {
            reg.tagger.update_area(&area.name);
            reg.add(&mut map.unsupplied[a], "UnsuppliedEnergy", &[]);
            reg.add(&mut map.spilled[a], "SpilledEnergy", &[]);

            for cluster in &view.thermal[a].clusters {
                let g = cluster.global_index;
                let qualifier = [("cluster", cluster.name.as_str())];
                reg.add(&mut map.thermal_production[g], "ThermalProduction", &qualifier);
                if view.with_startup_costs {
                    reg.add_typed(&mut map.units_on[g], "UnitsOn", &qualifier, integer_units);
                    reg.add_typed(
                        &mut map.units_starting[g],
                        "UnitsStarting",
                        &qualifier,
                        integer_units,
                    );
                    reg.add_typed(
                        &mut map.units_stopping[g],
                        "UnitsStopping",
                        &qualifier,
                        integer_units,
                    );
                    reg.add_typed(
                        &mut map.units_failing[g],
                        "UnitsFailing",
                        &qualifier,
                        integer_units,
                    );
                }
            }

            let hydro = &view.hydro[a];
            if hydro.has_dispatchable_hydro {
                reg.add(&mut map.hydro_generation[a], "HydroGeneration", &[]);
                if hydro.has_pumping {
                    reg.add(&mut map.pumping[a], "Pumping", &[]);
                }
                if hydro.follow_hourly_level {
                    reg.add(&mut map.hydro_level[a], "HydroLevel", &[]);
                    reg.add(&mut map.overflow[a], "Overflow", &[]);
                }
            }

            for cluster in &view.storage[a] {
                let g = cluster.global_index;
                let qualifier = [("cluster", cluster.name.as_str())];
                reg.add(&mut map.storage_injection[g], "StorageInjection", &qualifier);
                reg.add(&mut map.storage_withdrawal[g], "StorageWithdrawal", &qualifier);
                reg.add(&mut map.storage_level[g], "StorageLevel", &qualifier);
            }

            let reserves = &view.reserves[a];
            for (direction, is_up) in [(&reserves.up, true), (&reserves.down, false)] {
                for reservation in direction.iter() {
                    let r = reservation.global_index;
                    let reserve_qualifier = [("reserve", reservation.name.as_str())];
                    reg.add(&mut map.reserve_unsatisfied[r], "UnsatisfiedReserve", &reserve_qualifier);
                    reg.add(&mut map.reserve_excess[r], "ExcessReserve", &reserve_qualifier);

                    for p in &reservation.thermal_participations {
                        let q = [
                            ("cluster", p.cluster_name.as_str()),
                            ("reserve", reservation.name.as_str()),
                        ];
                        let g = p.global_participation_index;
                        reg.add(
                            &mut map.thermal_reserve_participation_on[g],
                            "RunningUnitsReserveParticipation",
                            &q,
                        );
                        if is_up && p.max_power_off > 0.0 {
                            reg.add(
                                &mut map.thermal_reserve_participation_off[g],
                                "OffUnitsReserveParticipation",
                                &q,
                            );
                        }
                        reg.add(
                            &mut map.thermal_reserve_participation[g],
                            "ThermalReserveParticipation",
                            &q,
                        );
                    }
                    for p in &reservation.st_storage_participations {
                        let q = [
                            ("cluster", p.cluster_name.as_str()),
                            ("reserve", reservation.name.as_str()),
                        ];
                        let g = p.global_participation_index;
                        reg.add(&mut map.st_reserve_turbining[g], "STTurbiningReserve", &q);
                        reg.add(&mut map.st_reserve_pumping[g], "STPumpingReserve", &q);
                        reg.add(
                            &mut map.st_reserve_participation[g],
                            "STStorageReserveParticipation",
                            &q,
                        );
                    }
                    for p in &reservation.lt_storage_participations {
                        let q = [
                            ("cluster", p.cluster_name.as_str()),
                            ("reserve", reservation.name.as_str()),
                        ];
                        let g = p.global_participation_index;
                        reg.add(&mut map.lt_reserve_turbining[g], "LTTurbiningReserve", &q);
                        reg.add(&mut map.lt_reserve_pumping[g], "LTPumpingReserve", &q);
                        reg.add(
                            &mut map.lt_reserve_participation[g],
                            "LTStorageReserveParticipation",
                            &q,
                        );
                    }
                }
            }
        }
    }

    // Weekly-scope variables: the final reservoir level expressed over the
    // water layers, in accurate water-value mode.
    if view.accurate_water_value {
        reg.tagger.update_time_step(view.hour_in_year + view.horizon as u32 - 1);
        for (a, area) in view.areas.iter().enumerate() {
            if !view.hydro[a].has_dispatchable_hydro {
                continue;
            }
            reg.tagger.update_area(&area.name);
            reg.add(&mut vars.extra.final_level[a], "FinalStorageLevel", &[]);
            for layer in 0..view.hydro[a].water_layer_values.len() {
                let label = layer.to_string();
                reg.add(
                    &mut vars.extra.water_layers[a][layer],
                    "WaterLayer",
                    &[("layer", label.as_str())],
                );
            }
        }
    }

    reg.next
}
