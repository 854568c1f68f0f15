//! Steps every airplane through simulated time.
//!
//! Each step runs two passes in a fixed order: airplanes move along their
//! queues (in the order they were given), then the docking events collected
//! on the way are replayed in time order and energy flows from the docked
//! UAV to the airliner for exactly the docked part of the step.

use crate::airplane::{energy_at, Airplane, AirplaneSnapshot};
use crate::error::SimulationError;
use crate::models::{AirplaneId, WaypointEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Longest step accepted by `update_state`
    pub max_time_step_s: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_time_step_s: 60.0,
        }
    }
}

/// One docking of a UAV with the airliner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockingRecord {
    pub uav: AirplaneId,
    pub docked_at_s: f64,
    pub undocked_at_s: Option<f64>,
    /// Energy handed over by the UAV, before the airliner's efficiency
    pub delivered_mj: f64,
}

impl DockingRecord {
    pub fn duration_s(&self) -> Option<f64> {
        self.undocked_at_s.map(|end| end - self.docked_at_s)
    }
}

pub struct AirplanesSimulator {
    config: SimulatorConfig,
    airplanes: Vec<Airplane>,
    airliner: usize,
    current_time_s: f64,
    docking_log: Vec<DockingRecord>,
    reached_tags: BTreeMap<AirplaneId, BTreeMap<String, f64>>,
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

impl AirplanesSimulator {
    /// `airplanes` must contain exactly one airliner. They are updated in the given order.
    pub fn new(airplanes: Vec<Airplane>, config: SimulatorConfig) -> Result<Self, SimulationError> {
        let airliners: Vec<usize> = airplanes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_airliner())
            .map(|(i, _)| i)
            .collect();
        let [airliner] = airliners[..] else {
            return Err(SimulationError::AirlinerCount(airliners.len()));
        };
        if config.max_time_step_s <= 0.0 {
            return Err(SimulationError::NonPositiveStep(config.max_time_step_s));
        }
        Ok(Self {
            config,
            airplanes,
            airliner,
            current_time_s: 0.0,
            docking_log: Vec::new(),
            reached_tags: BTreeMap::new(),
        })
    }

    pub fn current_time_s(&self) -> f64 {
        self.current_time_s
    }

    pub fn airplanes(&self) -> &[Airplane] {
        &self.airplanes
    }

    pub fn airplane(&self, id: &str) -> Option<&Airplane> {
        self.airplanes.iter().find(|a| a.id == id)
    }

    pub fn airliner(&self) -> &Airplane {
        &self.airplanes[self.airliner]
    }

    pub fn is_done(&self) -> bool {
        self.airplanes.iter().all(Airplane::is_done)
    }

    pub fn docking_log(&self) -> &[DockingRecord] {
        &self.docking_log
    }

    /// Simulation time at which each airplane reached each of its tagged waypoints.
    pub fn reached_tags(&self) -> &BTreeMap<AirplaneId, BTreeMap<String, f64>> {
        &self.reached_tags
    }

    pub fn snapshots(&self) -> Vec<AirplaneSnapshot> {
        self.airplanes.iter().map(Airplane::snapshot).collect()
    }

    /// Advance by `time_step_s`, checked as given against the maximum step.
    pub fn step(&mut self, time_step_s: f64) -> Result<Vec<AirplaneSnapshot>, SimulationError> {
        if time_step_s <= 0.0 {
            return Err(SimulationError::NonPositiveStep(time_step_s));
        }
        if time_step_s > self.config.max_time_step_s {
            return Err(SimulationError::StepTooLarge {
                step_s: time_step_s,
                max_s: self.config.max_time_step_s,
            });
        }
        self.advance_to(self.current_time_s + time_step_s)
    }

    /// Advance every airplane to `time_s`.
    pub fn update_state(&mut self, time_s: f64) -> Result<Vec<AirplaneSnapshot>, SimulationError> {
        if time_s < self.current_time_s {
            return Err(SimulationError::TimeWentBackwards {
                current_s: self.current_time_s,
                requested_s: time_s,
            });
        }
        // the difference of two absolute times carries their rounding
        let step_s = time_s - self.current_time_s;
        let slack_s = 4.0 * f64::EPSILON * time_s.abs().max(self.config.max_time_step_s);
        if step_s - slack_s > self.config.max_time_step_s {
            return Err(SimulationError::StepTooLarge {
                step_s,
                max_s: self.config.max_time_step_s,
            });
        }
        self.advance_to(time_s)
    }

    fn advance_to(&mut self, time_s: f64) -> Result<Vec<AirplaneSnapshot>, SimulationError> {
        let from_s = self.current_time_s;
        let mut events = Vec::new();
        for airplane in &mut self.airplanes {
            for arrival in airplane.advance(from_s, time_s)? {
                if let Some(tag) = arrival.tag {
                    self.reached_tags
                        .entry(airplane.id.clone())
                        .or_default()
                        .insert(tag, arrival.time_s);
                }
                if arrival.event != WaypointEvent::None {
                    events.push((arrival.time_s, arrival.event));
                }
            }
        }
        // stable: simultaneous events keep airplane order
        events.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut cursor = from_s;
        for (event_s, event) in events {
            self.transfer_while_docked(event_s - cursor)?;
            cursor = event_s;
            self.apply_event(event_s, event)?;
        }
        self.transfer_while_docked(time_s - cursor)?;

        self.current_time_s = time_s;
        Ok(self.snapshots())
    }

    /// Step until every queue is empty, calling `on_step` after each step.
    pub fn run_with<F>(&mut self, time_step_s: f64, mut on_step: F) -> Result<usize, SimulationError>
    where
        F: FnMut(&Self),
    {
        let mut steps = 0;
        while !self.is_done() {
            self.step(time_step_s)?;
            steps += 1;
            on_step(self);
        }
        tracing::info!(
            "Simulation finished after {} steps at {:.1} s",
            steps,
            self.current_time_s
        );
        Ok(steps)
    }

    pub fn run(&mut self, time_step_s: f64) -> Result<usize, SimulationError> {
        self.run_with(time_step_s, |_| {})
    }

    fn uav_index(&self, uav: &str) -> Result<usize, SimulationError> {
        self.airplanes
            .iter()
            .position(|a| a.id == uav && !a.is_airliner())
            .ok_or_else(|| SimulationError::UnknownAirplane(uav.to_string()))
    }

    fn apply_event(&mut self, time_s: f64, event: WaypointEvent) -> Result<(), SimulationError> {
        let airliner = &self.airplanes[self.airliner];
        match event {
            WaypointEvent::None => {}
            WaypointEvent::Dock { uav } => match airliner.docked_uav() {
                Some(docked) if docked == uav => {}
                Some(docked) => {
                    return Err(SimulationError::DockingConflict {
                        airliner: airliner.id.clone(),
                        docked: docked.to_string(),
                        uav,
                    })
                }
                None => {
                    self.uav_index(&uav)?;
                    tracing::info!("{} docked with {} at {:.1} s", uav, airliner.id, time_s);
                    self.docking_log.push(DockingRecord {
                        uav: uav.clone(),
                        docked_at_s: time_s,
                        undocked_at_s: None,
                        delivered_mj: 0.0,
                    });
                    self.airplanes[self.airliner].set_docked_uav(Some(uav));
                }
            },
            WaypointEvent::Undock { uav } => {
                if airliner.docked_uav() == Some(uav.as_str()) {
                    tracing::info!("{} undocked from {} at {:.1} s", uav, airliner.id, time_s);
                    if let Some(record) = self.docking_log.last_mut() {
                        record.undocked_at_s = Some(time_s);
                    }
                    self.airplanes[self.airliner].set_docked_uav(None);
                }
            }
        }
        Ok(())
    }

    fn transfer_while_docked(&mut self, duration_s: f64) -> Result<(), SimulationError> {
        let Some(uav) = self.airliner().docked_uav().map(str::to_string) else {
            return Ok(());
        };
        if duration_s <= 0.0 {
            return Ok(());
        }
        let uav_index = self.uav_index(&uav)?;
        let (airliner, tanker) = pair_mut(&mut self.airplanes, self.airliner, uav_index);
        if airliner.energy_level_pc() >= 100.0 {
            return Ok(());
        }
        let rate_kw = airliner.spec.refueling_rate_kw.min(tanker.spec.refueling_rate_kw);
        let headroom_mj = energy_at(100.0 - airliner.energy_level_pc(), airliner.spec.energy_capacity_mj)
            / airliner.spec.energy_efficiency;
        let delivered_mj = tanker.discharge_cargo((rate_kw * duration_s / 1000.0).min(headroom_mj));
        airliner.charge(delivered_mj);
        if airliner.energy_level_pc() >= 100.0 {
            tracing::warn!("{} is full, {} stops transferring", airliner.id, tanker.id);
        }
        if let Some(record) = self.docking_log.last_mut() {
            record.delivered_mj += delivered_mj;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airplane::{AirplaneKind, AirplaneSpec, CargoTank};
    use crate::geometry::Location;
    use crate::models::Waypoint;

    fn spec() -> AirplaneSpec {
        AirplaneSpec {
            energy_capacity_mj: 1000.0,
            energy_consumption_mj_per_km: 0.0,
            refueling_rate_kw: 1000.0,
            energy_efficiency: 1.0,
        }
    }

    /// Airliner and UAV flying together along x at 360 km/h (0.1 km/s),
    /// docked between x = 10 and x = 20.
    fn formation(uav_id: &str) -> Vec<Airplane> {
        formation_with_airliner_at(uav_id, 50.0)
    }

    fn formation_with_airliner_at(uav_id: &str, airliner_pc: f64) -> Vec<Airplane> {
        let dock = WaypointEvent::Dock { uav: uav_id.into() };
        let undock = WaypointEvent::Undock { uav: uav_id.into() };
        let route = |altitude: f64| {
            vec![
                Waypoint::new(Location::new(0.0, 0.0, altitude), 0.0),
                Waypoint::new(Location::new(10.0, 0.0, altitude), 360.0).with_event(dock.clone()),
                Waypoint::new(Location::new(20.0, 0.0, altitude), 360.0).with_event(undock.clone()),
                Waypoint::new(Location::new(30.0, 0.0, altitude), 360.0),
            ]
        };
        vec![
            Airplane::new(
                "Airliner",
                spec(),
                AirplaneKind::Airliner { docked_uav: None },
                airliner_pc,
                route(10.0),
            )
            .unwrap(),
            Airplane::new(
                "UAV",
                spec(),
                AirplaneKind::Uav {
                    cargo: CargoTank {
                        capacity_mj: 1000.0,
                        level_pc: 100.0,
                    },
                },
                100.0,
                route(10.1),
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_requires_one_airliner() {
        let mut planes = formation("UAV");
        planes.remove(0);
        assert!(matches!(
            AirplanesSimulator::new(planes, SimulatorConfig::default()),
            Err(SimulationError::AirlinerCount(0))
        ));
    }

    #[test]
    fn test_step_guard() {
        let mut sim = AirplanesSimulator::new(formation("UAV"), SimulatorConfig::default()).unwrap();
        assert!(matches!(
            sim.step(61.0),
            Err(SimulationError::StepTooLarge { .. })
        ));
        sim.step(10.0).unwrap();
        assert!(matches!(
            sim.update_state(5.0),
            Err(SimulationError::TimeWentBackwards { .. })
        ));
        assert!(matches!(sim.step(0.0), Err(SimulationError::NonPositiveStep(_))));
    }

    #[test]
    fn test_steps_of_exactly_the_maximum_are_accepted() {
        let config = SimulatorConfig { max_time_step_s: 0.1 };
        let mut sim = AirplanesSimulator::new(formation("UAV"), config).unwrap();
        for _ in 0..500 {
            sim.step(0.1).unwrap();
        }
        for _ in 0..500 {
            let next = sim.current_time_s() + 0.1;
            sim.update_state(next).unwrap();
        }
        assert!((sim.current_time_s() - 100.0).abs() < 1e-9);

        let too_far = sim.current_time_s() + 0.1001;
        assert!(matches!(
            sim.update_state(too_far),
            Err(SimulationError::StepTooLarge { .. })
        ));
        assert!(matches!(
            sim.step(0.1001),
            Err(SimulationError::StepTooLarge { .. })
        ));
    }

    #[test]
    fn test_energy_flows_only_while_docked() {
        let mut sim = AirplanesSimulator::new(formation("UAV"), SimulatorConfig::default()).unwrap();
        // docking at 100 s and undocking at 200 s fall inside steps
        sim.run(30.0).unwrap();
        let record = &sim.docking_log()[0];
        assert_eq!(record.uav, "UAV");
        assert!((record.docked_at_s - 100.0).abs() < 1e-9);
        assert!((record.duration_s().unwrap() - 100.0).abs() < 1e-9);
        // 1000 kW for 100 s is 100 MJ, 10 % of either tank
        assert!((record.delivered_mj - 100.0).abs() < 1e-6);
        assert!((sim.airliner().energy_level_pc() - 60.0).abs() < 1e-6);
        let uav = sim.airplane("UAV").unwrap();
        assert!((uav.refueling_energy_level_pc().unwrap() - 90.0).abs() < 1e-6);
        assert_eq!(sim.airliner().docked_uav(), None);
    }

    #[test]
    fn test_transfer_stops_when_airliner_is_full() {
        let planes = formation_with_airliner_at("UAV", 96.0);
        let mut sim = AirplanesSimulator::new(planes, SimulatorConfig::default()).unwrap();
        sim.run(10.0).unwrap();
        // only the 40 MJ of headroom leaves the cargo tank
        assert!((sim.airliner().energy_level_pc() - 100.0).abs() < 1e-9);
        assert!((sim.docking_log()[0].delivered_mj - 40.0).abs() < 1e-6);
        let uav = sim.airplane("UAV").unwrap();
        assert!((uav.refueling_energy_level_pc().unwrap() - 96.0).abs() < 1e-6);
    }

    #[test]
    fn test_docked_state_between_events() {
        let mut sim = AirplanesSimulator::new(formation("UAV"), SimulatorConfig::default()).unwrap();
        sim.update_state(50.0).unwrap();
        assert_eq!(sim.airliner().docked_uav(), None);
        sim.update_state(110.0).unwrap();
        assert_eq!(sim.airliner().docked_uav(), Some("UAV"));
        let snapshots = sim.update_state(150.0).unwrap();
        assert_eq!(snapshots[0].docked_uav.as_deref(), Some("UAV"));
        sim.update_state(210.0).unwrap();
        assert_eq!(sim.airliner().docked_uav(), None);
        // both queues carry the events but only one docking is recorded
        assert_eq!(sim.docking_log().len(), 1);
    }

    #[test]
    fn test_reached_tags_are_recorded() {
        let mut planes = formation("UAV");
        let mut route: Vec<Waypoint> = planes[0].path().iter().cloned().map(|l| Waypoint::new(l, 360.0)).collect();
        route[2].set_tag("Airliner_mid");
        planes[0] = Airplane::new(
            "Airliner",
            spec(),
            AirplaneKind::Airliner { docked_uav: None },
            50.0,
            route,
        )
        .unwrap();
        let mut sim = AirplanesSimulator::new(planes, SimulatorConfig::default()).unwrap();
        sim.run(60.0).unwrap();
        assert!((sim.reached_tags()["Airliner"]["Airliner_mid"] - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_second_uav_cannot_dock_while_first_is_attached() {
        let mut planes = formation("UAV");
        let intruder_route = vec![
            Waypoint::new(Location::new(0.0, 0.0, 10.2), 0.0),
            Waypoint::new(Location::new(15.0, 0.0, 10.2), 360.0)
                .with_event(WaypointEvent::Dock { uav: "UAV2".into() }),
        ];
        planes.push(
            Airplane::new(
                "UAV2",
                spec(),
                AirplaneKind::Uav {
                    cargo: CargoTank {
                        capacity_mj: 1000.0,
                        level_pc: 100.0,
                    },
                },
                100.0,
                intruder_route,
            )
            .unwrap(),
        );
        let mut sim = AirplanesSimulator::new(planes, SimulatorConfig::default()).unwrap();
        sim.update_state(60.0).unwrap();
        sim.update_state(120.0).unwrap();
        assert!(matches!(
            sim.update_state(160.0),
            Err(SimulationError::DockingConflict { docked, uav, .. }) if docked == "UAV" && uav == "UAV2"
        ));
    }

    #[test]
    fn test_unknown_uav_docking_fails() {
        let mut sim = AirplanesSimulator::new(formation("Ghost"), SimulatorConfig::default()).unwrap();
        sim.update_state(60.0).unwrap();
        assert!(matches!(
            sim.update_state(110.0),
            Err(SimulationError::UnknownAirplane(id)) if id == "Ghost"
        ));
    }
}
