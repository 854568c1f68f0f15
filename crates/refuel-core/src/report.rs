//! JSON-friendly summary of a simulation run.

use crate::airplane::AirplaneSnapshot;
use crate::config::SimulationConfig;
use crate::fleet::{Fleet, PlannedFlight};
use crate::simulator::{AirplanesSimulator, DockingRecord, SimulatorConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All airplanes at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub time_s: f64,
    pub airplanes: Vec<AirplaneSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirplaneReport {
    #[serde(flatten)]
    pub plan: PlannedFlight,
    /// Simulation time at which each tagged waypoint was actually reached
    pub reached_tagged_times_s: BTreeMap<String, f64>,
    pub initial_energy_level_pc: f64,
    pub final_energy_level_pc: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_refueling_energy_level_pc: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub generated_at: DateTime<Utc>,
    pub simulated_time_s: f64,
    pub steps: usize,
    pub airplanes: Vec<AirplaneReport>,
    pub docking_log: Vec<DockingRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snapshots: Vec<StepSnapshot>,
}

/// Plan of a fleet that was not simulated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReport {
    pub generated_at: DateTime<Utc>,
    pub airplanes: Vec<PlannedFlight>,
}

impl PlanReport {
    pub fn new(airplanes: Vec<PlannedFlight>) -> Self {
        Self {
            generated_at: Utc::now(),
            airplanes,
        }
    }
}

impl SimulationReport {
    /// Combine the pre-flight plan with what the simulator recorded.
    ///
    /// `initial_energy_pc` maps airplane ids to their energy before the run.
    pub fn new(
        plan: Vec<PlannedFlight>,
        initial_energy_pc: &BTreeMap<String, f64>,
        simulator: &AirplanesSimulator,
        steps: usize,
        snapshots: Vec<StepSnapshot>,
    ) -> Self {
        let airplanes = plan
            .into_iter()
            .map(|plan| {
                let airplane = simulator.airplane(&plan.id);
                AirplaneReport {
                    reached_tagged_times_s: simulator
                        .reached_tags()
                        .get(&plan.id)
                        .cloned()
                        .unwrap_or_default(),
                    initial_energy_level_pc: initial_energy_pc.get(&plan.id).copied().unwrap_or(0.0),
                    final_energy_level_pc: airplane.map_or(0.0, |a| a.energy_level_pc()),
                    final_refueling_energy_level_pc: airplane
                        .and_then(|a| a.refueling_energy_level_pc()),
                    plan,
                }
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            simulated_time_s: simulator.current_time_s(),
            steps,
            airplanes,
            docking_log: simulator.docking_log().to_vec(),
            snapshots,
        }
    }

    pub fn airplane(&self, id: &str) -> Option<&AirplaneReport> {
        self.airplanes.iter().find(|a| a.plan.id == id)
    }

    /// Energy the airliner received over the whole run, in MJ before efficiency.
    pub fn total_delivered_mj(&self) -> f64 {
        self.docking_log.iter().map(|r| r.delivered_mj).sum()
    }
}

/// Build the fleet of `config`, fly it until every queue is empty and report.
///
/// With `trace_every > 0` a snapshot of all airplanes is kept every
/// `trace_every` steps.
pub fn run_scenario(config: &SimulationConfig, trace_every: usize) -> crate::Result<SimulationReport> {
    let fleet = Fleet::build(config)?;
    let plan = fleet.plan()?;
    let initial_energy_pc: BTreeMap<String, f64> = fleet
        .airplanes()
        .map(|a| (a.id.clone(), a.energy_level_pc()))
        .collect();
    let mut simulator = fleet.into_simulator(SimulatorConfig {
        max_time_step_s: config.simulation.max_time_step_s,
    })?;

    let mut snapshots = Vec::new();
    let mut step = 0usize;
    let steps = simulator.run_with(config.simulation.time_step_s, |sim| {
        step += 1;
        if trace_every > 0 && step % trace_every == 0 {
            snapshots.push(StepSnapshot {
                time_s: sim.current_time_s(),
                airplanes: sim.snapshots(),
            });
        }
    })?;
    Ok(SimulationReport::new(
        plan,
        &initial_energy_pc,
        &simulator,
        steps,
        snapshots,
    ))
}
