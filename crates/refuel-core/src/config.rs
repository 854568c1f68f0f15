//! Scenario configuration loaded from YAML.
//!
//! Every section is optional; missing sections and fields fall back to the
//! defaults below, which describe a JFK to LAX flight refueled over PIT and DEN.

use crate::airplane::AirplaneSpec;
use crate::airports::{builtin_coordinates, project_airports, Airport, LatLon};
use crate::error::ConfigError;
use crate::flight_path::FlightPath;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AirlinerConfig {
    pub id: String,
    pub spec: AirplaneSpec,
    pub initial_energy_level_pc: f64,
}

impl Default for AirlinerConfig {
    fn default() -> Self {
        Self {
            id: "Airliner".to_string(),
            spec: AirplaneSpec::airliner(),
            initial_energy_level_pc: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AirlinerRouteConfig {
    pub flight_path: FlightPath,
    pub origin_airport: String,
    pub flyover_airports: Vec<String>,
    pub destination_airport: String,
    pub speed_change_distance_km: f64,
}

impl Default for AirlinerRouteConfig {
    fn default() -> Self {
        Self {
            flight_path: FlightPath::default(),
            origin_airport: "JFK".to_string(),
            flyover_airports: vec!["PIT".to_string(), "DEN".to_string()],
            destination_airport: "LAX".to_string(),
            speed_change_distance_km: 30.0,
        }
    }
}

impl AirlinerRouteConfig {
    /// Origin, flyover airports and destination, in flown order.
    pub fn airport_codes(&self) -> Vec<String> {
        let mut codes = vec![self.origin_airport.clone()];
        codes.extend(self.flyover_airports.iter().cloned());
        codes.push(self.destination_airport.clone());
        codes
    }
}

/// Number of UAVs serving each side of one flyover airport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UavCount {
    pub to_airport: usize,
    pub from_airport: usize,
}

impl UavCount {
    pub fn total(&self) -> usize {
        self.to_airport + self.from_airport
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UavConfig {
    pub spec: AirplaneSpec,
    pub cargo_capacity_mj: f64,
    pub initial_energy_level_pc: f64,
    pub initial_refueling_energy_level_pc: f64,
}

impl Default for UavConfig {
    fn default() -> Self {
        Self {
            spec: AirplaneSpec::uav(),
            // 5 000 l of jet fuel
            cargo_capacity_mj: 173_500.0,
            initial_energy_level_pc: 100.0,
            initial_refueling_energy_level_pc: 100.0,
        }
    }
}

/// Flight parameters shared by all UAVs. The flight path's cruise altitude is
/// the altitude of the lowest UAV on each side of an airport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UavFlightPathConfig {
    pub flight_path: FlightPath,
    pub arc_radius_km: f64,
    /// Height of the UAV above the airliner while docked
    pub airliner_uav_docking_distance_km: f64,
    pub smallest_window_offset_km: f64,
    /// Gap between consecutive refueling windows on the same side
    pub inter_uav_clearance_km: f64,
    pub airliner_clearance_speed_kmph: f64,
    pub airliner_clearance_distance_km: f64,
    pub smallest_airliner_clearance_altitude_km: f64,
    pub inter_uav_vertical_distance_km: f64,
}

impl Default for UavFlightPathConfig {
    fn default() -> Self {
        Self {
            flight_path: FlightPath::uav(),
            arc_radius_km: 5.0,
            airliner_uav_docking_distance_km: 0.1,
            smallest_window_offset_km: 150.0,
            inter_uav_clearance_km: 10.0,
            airliner_clearance_speed_kmph: 200.0,
            airliner_clearance_distance_km: 2.0,
            smallest_airliner_clearance_altitude_km: 9.5,
            inter_uav_vertical_distance_km: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub time_step_s: f64,
    pub max_time_step_s: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            time_step_s: 10.0,
            max_time_step_s: 60.0,
        }
    }
}

/// A complete refueling scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Added to, or replacing, the built-in airport table
    pub airports: BTreeMap<String, LatLon>,
    pub airliner: AirlinerConfig,
    pub airliner_flight_path: AirlinerRouteConfig,
    pub n_uavs_per_flyover_airport: BTreeMap<String, UavCount>,
    pub uavs: UavConfig,
    pub uavs_flight_path: UavFlightPathConfig,
    pub simulation: SimulationSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let n_uavs_per_flyover_airport = [
            (
                "PIT".to_string(),
                UavCount {
                    to_airport: 1,
                    from_airport: 0,
                },
            ),
            (
                "DEN".to_string(),
                UavCount {
                    to_airport: 1,
                    from_airport: 1,
                },
            ),
        ]
        .into_iter()
        .collect();
        Self {
            airports: BTreeMap::new(),
            airliner: AirlinerConfig::default(),
            airliner_flight_path: AirlinerRouteConfig::default(),
            n_uavs_per_flyover_airport,
            uavs: UavConfig::default(),
            uavs_flight_path: UavFlightPathConfig::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&contents)?;
        tracing::info!("Loaded scenario from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.airliner.spec.validate()?;
        self.uavs.spec.validate()?;
        for (name, value) in [
            ("airliner.initial_energy_level_pc", self.airliner.initial_energy_level_pc),
            ("uavs.initial_energy_level_pc", self.uavs.initial_energy_level_pc),
            (
                "uavs.initial_refueling_energy_level_pc",
                self.uavs.initial_refueling_energy_level_pc,
            ),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::invalid(name, format!("{value} is outside [0, 100] percent")));
            }
        }
        let positive = [
            ("uavs.cargo_capacity_mj", self.uavs.cargo_capacity_mj),
            (
                "airliner_flight_path.speed_change_distance_km",
                self.airliner_flight_path.speed_change_distance_km,
            ),
            ("uavs_flight_path.arc_radius_km", self.uavs_flight_path.arc_radius_km),
            (
                "uavs_flight_path.smallest_window_offset_km",
                self.uavs_flight_path.smallest_window_offset_km,
            ),
            ("simulation.time_step_s", self.simulation.time_step_s),
            ("simulation.max_time_step_s", self.simulation.max_time_step_s),
        ];
        for (name, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::invalid(name, format!("must be positive, got {value}")));
            }
        }
        if self.simulation.time_step_s > self.simulation.max_time_step_s {
            return Err(ConfigError::invalid(
                "simulation.time_step_s",
                format!(
                    "{} s exceeds max_time_step_s {} s",
                    self.simulation.time_step_s, self.simulation.max_time_step_s
                ),
            ));
        }

        let route = &self.airliner_flight_path;
        let mut seen = BTreeSet::new();
        for code in &route.flyover_airports {
            if !seen.insert(code) {
                return Err(ConfigError::invalid(
                    "airliner_flight_path.flyover_airports",
                    format!("{code} is listed twice"),
                ));
            }
        }
        for code in self.n_uavs_per_flyover_airport.keys() {
            if !seen.contains(code) {
                return Err(ConfigError::invalid(
                    "n_uavs_per_flyover_airport",
                    format!("{code} is not a flyover airport"),
                ));
            }
        }
        Ok(())
    }

    /// Built-in airports merged with the scenario's own table.
    pub fn airport_table(&self) -> BTreeMap<String, LatLon> {
        let mut table = builtin_coordinates();
        table.extend(self.airports.iter().map(|(code, at)| (code.clone(), *at)));
        table
    }

    /// Airports of the route projected into the local frame.
    pub fn project_airports(&self) -> Result<BTreeMap<String, Airport>, ConfigError> {
        project_airports(&self.airliner_flight_path.airport_codes(), &self.airport_table())
    }

    pub fn uav_count(&self, airport: &str) -> UavCount {
        self.n_uavs_per_flyover_airport
            .get(airport)
            .copied()
            .unwrap_or_default()
    }
}
