//! Core data models shared by the path generators and the simulator.

use crate::geometry::Location;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type AirplaneId = String;

/// Megajoules in one kilowatt-hour.
pub const MJ_PER_KWH: f64 = 3.6;

pub fn mps_to_kmph(mps: f64) -> f64 {
    mps * 3.6
}

/// Travel time in seconds for `distance_km` at `speed_kmph`.
pub fn travel_time_s(distance_km: f64, speed_kmph: f64) -> f64 {
    distance_km / speed_kmph * 3600.0
}

/// Side of a flyover airport on which a UAV refuels the airliner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceSide {
    /// Refuels before the airliner reaches the airport.
    ToAirport,
    /// Refuels after the airliner has passed the airport.
    FromAirport,
}

impl fmt::Display for ServiceSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceSide::ToAirport => write!(f, "to_airport"),
            ServiceSide::FromAirport => write!(f, "from_airport"),
        }
    }
}

/// State change triggered when a waypoint is reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaypointEvent {
    #[default]
    None,
    Dock { uav: AirplaneId },
    Undock { uav: AirplaneId },
}

/// A location to fly straight toward, and how to approach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub location: Location,
    /// Direct approach speed while flying toward this waypoint
    pub speed_kmph: f64,
    /// Earliest simulation time (s) at which the airplane may leave for this waypoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_into_simulation_s: Option<f64>,
    /// Hold the nose level while approaching
    #[serde(default)]
    pub zero_angle_of_attack: bool,
    #[serde(default)]
    pub event: WaypointEvent,
}

impl Waypoint {
    pub fn new(location: Location, speed_kmph: f64) -> Self {
        Self {
            location,
            speed_kmph,
            time_into_simulation_s: None,
            zero_angle_of_attack: false,
            event: WaypointEvent::None,
        }
    }

    pub fn level(mut self) -> Self {
        self.zero_angle_of_attack = true;
        self
    }

    pub fn with_event(mut self, event: WaypointEvent) -> Self {
        self.event = event;
        self
    }

    pub fn tag(&self) -> Option<&str> {
        self.location.tag.as_deref()
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.location.tag = Some(tag.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_time() {
        assert!((travel_time_s(300.0, 600.0) - 1800.0).abs() < 1e-9);
    }

    #[test]
    fn test_rate_conversion() {
        assert!((mps_to_kmph(10.0) - 36.0).abs() < 1e-12);
    }

    #[test]
    fn test_service_side_serde_names() {
        let json = serde_json::to_string(&ServiceSide::FromAirport).unwrap();
        assert_eq!(json, "\"from_airport\"");
        let side: ServiceSide = serde_json::from_str("\"to_airport\"").unwrap();
        assert_eq!(side, ServiceSide::ToAirport);
    }

    #[test]
    fn test_waypoint_event_defaults_to_none() {
        let json = r#"{"location":{"x_km":1.0,"y_km":2.0,"altitude_km":3.0},"speed_kmph":100.0}"#;
        let waypoint: Waypoint = serde_json::from_str(json).unwrap();
        assert_eq!(waypoint.event, WaypointEvent::None);
        assert!(!waypoint.zero_angle_of_attack);
        assert!(waypoint.tag().is_none());
    }
}
