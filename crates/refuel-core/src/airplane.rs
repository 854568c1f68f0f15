//! Simulated airplanes: energy state, position and the waypoint queue.

use crate::error::{ConfigError, LookupError, SimulationError};
use crate::geometry::Location;
use crate::models::{travel_time_s, AirplaneId, Waypoint, WaypointEvent};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Percent of `capacity_mj` that `energy_mj` represents.
pub fn percent_of(energy_mj: f64, capacity_mj: f64) -> f64 {
    energy_mj / capacity_mj * 100.0
}

/// Energy in MJ held at `level_pc` percent of `capacity_mj`.
pub fn energy_at(level_pc: f64, capacity_mj: f64) -> f64 {
    level_pc / 100.0 * capacity_mj
}

fn validate_percent(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            name,
            format!("{value} is outside [0, 100] percent"),
        ))
    }
}

/// Static energy characteristics of an airplane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirplaneSpec {
    pub energy_capacity_mj: f64,
    pub energy_consumption_mj_per_km: f64,
    pub refueling_rate_kw: f64,
    /// Charging multiplies by it, discharging divides by it
    #[serde(default = "default_efficiency")]
    pub energy_efficiency: f64,
}

fn default_efficiency() -> f64 {
    1.0
}

impl AirplaneSpec {
    /// Narrow-body airliner burning jet fuel (27 200 l at 34.7 MJ/l).
    pub fn airliner() -> Self {
        Self {
            energy_capacity_mj: 943_840.0,
            energy_consumption_mj_per_km: 111.0,
            refueling_rate_kw: 1_000_000.0,
            energy_efficiency: 1.0,
        }
    }

    /// Cargo UAV (1 256 l of own fuel, 184 l/h at 300 km/h).
    pub fn uav() -> Self {
        Self {
            energy_capacity_mj: 43_583.0,
            energy_consumption_mj_per_km: 21.3,
            refueling_rate_kw: 1_000_000.0,
            energy_efficiency: 1.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("energy_capacity_mj", self.energy_capacity_mj),
            ("refueling_rate_kw", self.refueling_rate_kw),
            ("energy_efficiency", self.energy_efficiency),
        ] {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::invalid(name, format!("must be positive, got {value}")));
            }
        }
        if self.energy_consumption_mj_per_km < 0.0 {
            return Err(ConfigError::invalid(
                "energy_consumption_mj_per_km",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

/// Fuel a UAV carries for the airliner, separate from its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoTank {
    pub capacity_mj: f64,
    pub level_pc: f64,
}

impl CargoTank {
    pub fn energy_mj(&self) -> f64 {
        energy_at(self.level_pc, self.capacity_mj)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AirplaneKind {
    Airliner { docked_uav: Option<AirplaneId> },
    Uav { cargo: CargoTank },
}

/// A waypoint reached during a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    pub time_s: f64,
    pub tag: Option<String>,
    pub event: WaypointEvent,
}

/// Point-in-time view of an airplane, for rendering and reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirplaneSnapshot {
    pub id: AirplaneId,
    pub location: [f64; 3],
    pub heading: [f64; 3],
    pub speed_kmph: f64,
    pub energy_level_pc: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refueling_energy_level_pc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docked_uav: Option<AirplaneId>,
}

#[derive(Debug, Clone)]
pub struct Airplane {
    pub id: AirplaneId,
    pub spec: AirplaneSpec,
    pub kind: AirplaneKind,
    energy_level_pc: f64,
    location: Location,
    heading: [f64; 3],
    speed_kmph: f64,
    waypoints: VecDeque<Waypoint>,
    path: Vec<Location>,
    reached: usize,
    depleted: bool,
}

impl Airplane {
    /// The first waypoint is the starting location; the rest form the queue.
    pub fn new(
        id: impl Into<AirplaneId>,
        spec: AirplaneSpec,
        kind: AirplaneKind,
        energy_level_pc: f64,
        waypoints: Vec<Waypoint>,
    ) -> crate::Result<Self> {
        let id = id.into();
        spec.validate()?;
        validate_percent("energy_level_pc", energy_level_pc)?;
        if let AirplaneKind::Uav { cargo } = &kind {
            validate_percent("refueling_energy_level_pc", cargo.level_pc)?;
        }

        let path: Vec<Location> = waypoints.iter().map(|w| w.location.clone()).collect();
        let mut waypoints = VecDeque::from(waypoints);
        let start = waypoints
            .pop_front()
            .ok_or_else(|| SimulationError::EmptyWaypoints(id.clone()))?;

        let mut airplane = Self {
            id,
            spec,
            kind,
            energy_level_pc,
            location: start.location,
            heading: [1.0, 0.0, 0.0],
            speed_kmph: 0.0,
            waypoints,
            path,
            reached: 0,
            depleted: false,
        };
        if let Some(first) = airplane.waypoints.front() {
            if let Some(heading) = heading_toward(&airplane.location, first) {
                airplane.heading = heading;
            }
        }
        Ok(airplane)
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn heading(&self) -> [f64; 3] {
        self.heading
    }

    pub fn energy_level_pc(&self) -> f64 {
        self.energy_level_pc
    }

    pub fn waypoints(&self) -> &VecDeque<Waypoint> {
        &self.waypoints
    }

    /// Every location of the generated path, starting point included.
    pub fn path(&self) -> &[Location] {
        &self.path
    }

    pub fn is_done(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn is_airliner(&self) -> bool {
        matches!(self.kind, AirplaneKind::Airliner { .. })
    }

    pub fn docked_uav(&self) -> Option<&str> {
        match &self.kind {
            AirplaneKind::Airliner { docked_uav } => docked_uav.as_deref(),
            AirplaneKind::Uav { .. } => None,
        }
    }

    pub fn set_docked_uav(&mut self, uav: Option<AirplaneId>) {
        if let AirplaneKind::Airliner { docked_uav } = &mut self.kind {
            *docked_uav = uav;
        }
    }

    pub fn refueling_energy_level_pc(&self) -> Option<f64> {
        match &self.kind {
            AirplaneKind::Uav { cargo } => Some(cargo.level_pc),
            AirplaneKind::Airliner { .. } => None,
        }
    }

    pub fn snapshot(&self) -> AirplaneSnapshot {
        AirplaneSnapshot {
            id: self.id.clone(),
            location: self.location.to_array(),
            heading: self.heading,
            speed_kmph: self.speed_kmph,
            energy_level_pc: self.energy_level_pc,
            refueling_energy_level_pc: self.refueling_energy_level_pc(),
            docked_uav: self.docked_uav().map(str::to_string),
        }
    }

    /// The single queued waypoint carrying `tag`.
    pub fn tagged_waypoint(&self, tag: &str) -> Result<&Waypoint, LookupError> {
        let mut matches = self.waypoints.iter().filter(|w| w.tag() == Some(tag));
        let found = matches.next().ok_or_else(|| LookupError::NotFound {
            airplane: self.id.clone(),
            tag: tag.to_string(),
        })?;
        let extra = matches.count();
        if extra > 0 {
            return Err(LookupError::NotUnique {
                airplane: self.id.clone(),
                tag: tag.to_string(),
                count: extra + 1,
            });
        }
        Ok(found)
    }

    fn cumulative_times(&self, honor_delays: bool) -> Result<BTreeMap<String, f64>, LookupError> {
        let mut times = BTreeMap::new();
        let mut elapsed = 0.0;
        let mut at = &self.location;
        for waypoint in &self.waypoints {
            if honor_delays {
                if let Some(depart) = waypoint.time_into_simulation_s {
                    elapsed = f64::max(elapsed, depart);
                }
            }
            let distance = at.distance_km(&waypoint.location);
            if distance > 0.0 {
                elapsed += travel_time_s(distance, waypoint.speed_kmph);
            }
            at = &waypoint.location;
            if let Some(tag) = waypoint.tag() {
                if times.insert(tag.to_string(), elapsed).is_some() {
                    return Err(LookupError::NotUnique {
                        airplane: self.id.clone(),
                        tag: tag.to_string(),
                        count: self.waypoints.iter().filter(|w| w.tag() == Some(tag)).count(),
                    });
                }
            }
        }
        Ok(times)
    }

    /// Direct travel time (s) from the current location to every tagged waypoint,
    /// ignoring departure delays.
    pub fn travel_durations_to_tagged_waypoints(&self) -> Result<BTreeMap<String, f64>, LookupError> {
        self.cumulative_times(false)
    }

    /// Expected elapsed time (s) at every tagged waypoint, departure delays included.
    pub fn elapsed_time_at_tagged_waypoints(&self) -> Result<BTreeMap<String, f64>, LookupError> {
        self.cumulative_times(true)
    }

    /// Hold the airplane at its current location until `time_s`.
    pub fn delay_departure(&mut self, time_s: f64) -> Result<(), SimulationError> {
        let first = self
            .waypoints
            .front_mut()
            .ok_or_else(|| SimulationError::EmptyWaypoints(self.id.clone()))?;
        first.time_into_simulation_s = Some(time_s);
        Ok(())
    }

    pub fn energy_mj(&self) -> f64 {
        energy_at(self.energy_level_pc, self.spec.energy_capacity_mj)
    }

    fn consume_for_distance(&mut self, distance_km: f64) {
        let energy_mj =
            self.spec.energy_consumption_mj_per_km * distance_km / self.spec.energy_efficiency;
        let level = self.energy_level_pc - percent_of(energy_mj, self.spec.energy_capacity_mj);
        if level < 0.0 && !self.depleted {
            tracing::warn!("{} has run out of energy", self.id);
            self.depleted = true;
        }
        self.energy_level_pc = level.max(0.0);
    }

    /// Absorb `energy_mj` delivered by a tanker, clipped at capacity.
    /// Returns the percent actually gained.
    pub fn charge(&mut self, energy_mj: f64) -> f64 {
        let gained = percent_of(
            energy_mj * self.spec.energy_efficiency,
            self.spec.energy_capacity_mj,
        );
        let before = self.energy_level_pc;
        self.energy_level_pc = (before + gained).min(100.0);
        self.energy_level_pc - before
    }

    /// Hand over up to `energy_mj` from the cargo tank. Returns the MJ delivered.
    pub fn discharge_cargo(&mut self, energy_mj: f64) -> f64 {
        let efficiency = self.spec.energy_efficiency;
        let AirplaneKind::Uav { cargo } = &mut self.kind else {
            return 0.0;
        };
        let available = cargo.energy_mj();
        let drained = (energy_mj / efficiency).min(available);
        cargo.level_pc = percent_of(available - drained, cargo.capacity_mj).max(0.0);
        drained * efficiency
    }

    /// Move along the queue from `from_s` to `to_s`, consuming energy for the
    /// distance covered. Returns the waypoints reached, in order.
    pub fn advance(&mut self, from_s: f64, to_s: f64) -> Result<Vec<Arrival>, SimulationError> {
        let mut now = from_s;
        let mut arrivals = Vec::new();

        while let Some(target) = self.waypoints.front().cloned() {
            if let Some(heading) = heading_toward(&self.location, &target) {
                self.heading = heading;
            }
            if let Some(depart) = target.time_into_simulation_s {
                if depart > now {
                    if depart >= to_s {
                        self.speed_kmph = 0.0;
                        break;
                    }
                    now = depart;
                }
            }
            self.speed_kmph = target.speed_kmph;

            let distance = self.location.distance_km(&target.location);
            let travel_s = if distance <= 0.0 {
                0.0
            } else if target.speed_kmph <= 0.0 {
                return Err(SimulationError::NonPositiveSpeed {
                    airplane: self.id.clone(),
                    index: self.reached,
                    distance_km: distance,
                    speed_kmph: target.speed_kmph,
                });
            } else {
                travel_time_s(distance, target.speed_kmph)
            };

            if now + travel_s <= to_s {
                now += travel_s;
                self.consume_for_distance(distance);
                self.location = Location::new(
                    target.location.x_km,
                    target.location.y_km,
                    target.location.altitude_km,
                );
                self.waypoints.pop_front();
                self.reached += 1;
                if let Some(tag) = target.tag() {
                    tracing::debug!("{} reached {} at {:.1} s", self.id, tag, now);
                }
                arrivals.push(Arrival {
                    time_s: now,
                    tag: target.location.tag,
                    event: target.event,
                });
            } else {
                let next = self.location.lerp(&target.location, (to_s - now) / travel_s);
                let covered = self.location.distance_km(&next);
                self.consume_for_distance(covered);
                self.location = next;
                break;
            }
        }
        if self.waypoints.is_empty() {
            self.speed_kmph = 0.0;
        }
        Ok(arrivals)
    }
}

/// Unit vector from `from` toward `target`, flattened when the waypoint asks
/// for a level attitude. `None` when there is no direction to point in.
fn heading_toward(from: &Location, target: &Waypoint) -> Option<[f64; 3]> {
    let dz = if target.zero_angle_of_attack {
        0.0
    } else {
        target.location.altitude_km - from.altitude_km
    };
    let v = [
        target.location.x_km - from.x_km,
        target.location.y_km - from.y_km,
        dz,
    ];
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if norm <= f64::EPSILON {
        return None;
    }
    Some([v[0] / norm, v[1] / norm, v[2] / norm])
}
