//! Flight path parameters of an airplane class and of a single mission.

use crate::airports::Airport;
use crate::error::GeometryError;
use crate::models::{mps_to_kmph, ServiceSide};
use serde::{Deserialize, Serialize};

/// Parameters shared by every flight of one airplane class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPath {
    pub takeoff_speed_kmph: f64,
    pub takeoff_distance_km: f64,
    /// Horizontal run over which the climb arc starts after lift-off
    pub takeoff_leveling_distance_km: f64,
    pub rate_of_climb_mps: f64,
    pub climb_leveling_distance_km: f64,
    pub cruise_altitude_km: f64,
    pub cruise_speed_kmph: f64,
    pub turning_radius_km: f64,
    pub descent_leveling_distance_km: f64,
    pub rate_of_descent_mps: f64,
    pub landing_leveling_distance_km: f64,
    pub landing_distance_km: f64,
    pub landing_speed_kmph: f64,
}

impl Default for FlightPath {
    fn default() -> Self {
        Self {
            takeoff_speed_kmph: 280.0,
            takeoff_distance_km: 2.0,
            takeoff_leveling_distance_km: 0.5,
            rate_of_climb_mps: 12.0,
            climb_leveling_distance_km: 3.0,
            cruise_altitude_km: 10.0,
            cruise_speed_kmph: 829.0,
            turning_radius_km: 20.0,
            descent_leveling_distance_km: 3.0,
            rate_of_descent_mps: 10.0,
            landing_leveling_distance_km: 0.5,
            landing_distance_km: 2.0,
            landing_speed_kmph: 250.0,
        }
    }
}

impl FlightPath {
    /// Parameters of a small refueling UAV.
    pub fn uav() -> Self {
        Self {
            takeoff_speed_kmph: 150.0,
            takeoff_distance_km: 1.0,
            takeoff_leveling_distance_km: 0.3,
            rate_of_climb_mps: 15.0,
            climb_leveling_distance_km: 1.0,
            cruise_altitude_km: 10.6,
            cruise_speed_kmph: 300.0,
            turning_radius_km: 20.0,
            descent_leveling_distance_km: 1.0,
            rate_of_descent_mps: 8.0,
            landing_leveling_distance_km: 0.3,
            landing_distance_km: 1.0,
            landing_speed_kmph: 140.0,
        }
    }

    pub fn climb_rate_kmph(&self) -> f64 {
        mps_to_kmph(self.rate_of_climb_mps)
    }

    pub fn descent_rate_kmph(&self) -> f64 {
        mps_to_kmph(self.rate_of_descent_mps)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.takeoff_leveling_distance_km >= self.takeoff_distance_km {
            return Err(GeometryError::LevelingTooLong {
                phase: "takeoff",
                leveling_km: self.takeoff_leveling_distance_km,
                distance_km: self.takeoff_distance_km,
            });
        }
        if self.landing_leveling_distance_km >= self.landing_distance_km {
            return Err(GeometryError::LevelingTooLong {
                phase: "landing",
                leveling_km: self.landing_leveling_distance_km,
                distance_km: self.landing_distance_km,
            });
        }
        let positive = [
            ("takeoff_speed_kmph", self.takeoff_speed_kmph),
            ("takeoff_leveling_distance_km", self.takeoff_leveling_distance_km),
            ("rate_of_climb_mps", self.rate_of_climb_mps),
            ("climb_leveling_distance_km", self.climb_leveling_distance_km),
            ("cruise_speed_kmph", self.cruise_speed_kmph),
            ("turning_radius_km", self.turning_radius_km),
            ("descent_leveling_distance_km", self.descent_leveling_distance_km),
            ("rate_of_descent_mps", self.rate_of_descent_mps),
            ("landing_leveling_distance_km", self.landing_leveling_distance_km),
            ("landing_speed_kmph", self.landing_speed_kmph),
        ];
        for (name, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(GeometryError::Degenerate(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// The airliner's route and the class parameters it flies it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirlinerFlightPath {
    pub flight_path: FlightPath,
    /// Origin, flyover airports in order, destination
    pub airports: Vec<Airport>,
    /// Distance over which the airliner slows down to or speeds up from refueling speed
    pub speed_change_distance_km: f64,
}

impl AirlinerFlightPath {
    pub fn origin(&self) -> Option<&Airport> {
        self.airports.first()
    }

    pub fn destination(&self) -> Option<&Airport> {
        self.airports.last()
    }

    pub fn flyover_airports(&self) -> &[Airport] {
        if self.airports.len() < 2 {
            return &[];
        }
        &self.airports[1..self.airports.len() - 1]
    }
}

/// How a UAV falls behind and below the airliner after undocking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearanceManeuver {
    pub speed_kmph: f64,
    /// How far the airliner must pull ahead before the UAV starts to descend
    pub distance_km: f64,
    pub altitude_km: f64,
}

/// One UAV's mission parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UavFlightPath {
    pub flight_path: FlightPath,
    pub home: Airport,
    pub service_side: ServiceSide,
    pub arc_radius_km: f64,
    pub refueling_altitude_km: f64,
    /// Distance flown while docked
    pub refueling_distance_km: f64,
    /// Distance from the home airport of the airport-side end of the refueling window
    pub window_offset_km: f64,
    pub clearance: ClearanceManeuver,
}

impl UavFlightPath {
    /// Distance from the home airport of the far end of the refueling window.
    pub fn far_rendezvous_distance_km(&self) -> f64 {
        self.refueling_distance_km + self.window_offset_km
    }

    pub fn average_clearance_speed_kmph(&self) -> f64 {
        (self.flight_path.cruise_speed_kmph + self.clearance.speed_kmph) / 2.0
    }
}
