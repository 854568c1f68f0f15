//! Builds the airliner and its UAVs from a scenario and synchronizes them.

use crate::airplane::{Airplane, AirplaneKind, CargoTank};
use crate::airports::Airport;
use crate::assembly::{airliner_waypoints, uav_waypoints, RefuelingSlot};
use crate::config::SimulationConfig;
use crate::error::{ConfigError, SimulationError};
use crate::flight_path::{AirlinerFlightPath, ClearanceManeuver, FlightPath, UavFlightPath};
use crate::geometry::{path_length_km, Location};
use crate::models::{ServiceSide, MJ_PER_KWH};
use crate::schedule::delay_uavs;
use crate::simulator::{AirplanesSimulator, SimulatorConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Planned flight of one airplane, captured before simulation starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedFlight {
    pub id: String,
    pub kind: String,
    pub path: Vec<[f64; 3]>,
    pub path_length_km: f64,
    /// Expected time at every tagged waypoint, departure delay included
    pub tagged_times_s: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_delay_s: Option<f64>,
}

pub struct Fleet {
    pub airports: BTreeMap<String, Airport>,
    pub route: AirlinerFlightPath,
    pub uav_paths: Vec<UavFlightPath>,
    pub airliner: Airplane,
    pub uavs: Vec<Airplane>,
}

fn lookup<'a>(airports: &'a BTreeMap<String, Airport>, code: &str) -> Result<&'a Airport, ConfigError> {
    airports
        .get(code)
        .ok_or_else(|| ConfigError::UnknownAirport(code.to_string()))
}

/// Mission parameters of UAV `index` of `count` on one side of `home`.
pub fn uav_flight_path(
    config: &SimulationConfig,
    home: &Airport,
    side: ServiceSide,
    index: usize,
    count: usize,
) -> UavFlightPath {
    let uav = &config.uavs_flight_path;
    let airliner = &config.airliner_flight_path.flight_path;
    let rate_kw = config
        .airliner
        .spec
        .refueling_rate_kw
        .min(config.uavs.spec.refueling_rate_kw);
    let refueling_distance_km =
        uav.flight_path.cruise_speed_kmph * config.uavs.cargo_capacity_mj / rate_kw / MJ_PER_KWH;
    let windows_before = match side {
        ServiceSide::FromAirport => index,
        ServiceSide::ToAirport => count - index - 1,
    };
    let climb = uav.inter_uav_vertical_distance_km * index as f64;

    UavFlightPath {
        flight_path: FlightPath {
            cruise_altitude_km: uav.flight_path.cruise_altitude_km + climb,
            turning_radius_km: airliner.turning_radius_km,
            ..uav.flight_path.clone()
        },
        home: home.clone(),
        service_side: side,
        arc_radius_km: uav.arc_radius_km,
        refueling_altitude_km: airliner.cruise_altitude_km + uav.airliner_uav_docking_distance_km,
        refueling_distance_km,
        window_offset_km: uav.smallest_window_offset_km
            + (refueling_distance_km + uav.inter_uav_clearance_km) * windows_before as f64,
        clearance: ClearanceManeuver {
            speed_kmph: uav.airliner_clearance_speed_kmph,
            distance_km: uav.airliner_clearance_distance_km,
            altitude_km: uav.smallest_airliner_clearance_altitude_km + climb,
        },
    }
}

impl Fleet {
    /// Generate every waypoint queue and delay the UAVs so they meet the airliner.
    pub fn build(config: &SimulationConfig) -> crate::Result<Self> {
        config.validate()?;
        let airports = config.project_airports()?;
        let codes = config.airliner_flight_path.airport_codes();
        let route = AirlinerFlightPath {
            flight_path: config.airliner_flight_path.flight_path.clone(),
            airports: codes
                .iter()
                .map(|code| lookup(&airports, code).cloned())
                .collect::<Result<_, _>>()?,
            speed_change_distance_km: config.airliner_flight_path.speed_change_distance_km,
        };

        let mut uav_paths = Vec::new();
        let mut uavs = Vec::new();
        let mut slots = Vec::new();
        for (i, home) in route.airports.iter().enumerate() {
            if i == 0 || i + 1 == route.airports.len() {
                continue;
            }
            let count = config.uav_count(&home.code);
            let mut k = 0;
            for (side, n, toward) in [
                (ServiceSide::ToAirport, count.to_airport, &route.airports[i - 1]),
                (ServiceSide::FromAirport, count.from_airport, &route.airports[i + 1]),
            ] {
                for j in 0..n {
                    let id = format!("{}_UAV_{}", home.code, k);
                    k += 1;
                    let path = uav_flight_path(config, home, side, j, n);
                    let waypoints = uav_waypoints(&id, j, n, &path, toward.xy())?;
                    slots.push(RefuelingSlot::from_uav(&id, &path, &waypoints)?);
                    uavs.push(Airplane::new(
                        id,
                        config.uavs.spec.clone(),
                        AirplaneKind::Uav {
                            cargo: CargoTank {
                                capacity_mj: config.uavs.cargo_capacity_mj,
                                level_pc: config.uavs.initial_refueling_energy_level_pc,
                            },
                        },
                        config.uavs.initial_energy_level_pc,
                        waypoints,
                    )?);
                    uav_paths.push(path);
                }
            }
        }

        let airliner = Airplane::new(
            config.airliner.id.clone(),
            config.airliner.spec.clone(),
            AirplaneKind::Airliner { docked_uav: None },
            config.airliner.initial_energy_level_pc,
            airliner_waypoints(&config.airliner.id, &route, &slots)?,
        )?;
        delay_uavs(&airliner, &mut uavs)?;
        tracing::info!(
            "Built fleet: {} over {} airports, {} UAVs, route {:.1} km",
            airliner.id,
            route.airports.len(),
            uavs.len(),
            path_length_km(airliner.path())
        );

        Ok(Self {
            airports,
            route,
            uav_paths,
            airliner,
            uavs,
        })
    }

    /// Airliner first, then the UAVs in the order they were generated.
    pub fn airplanes(&self) -> impl Iterator<Item = &Airplane> {
        std::iter::once(&self.airliner).chain(&self.uavs)
    }

    pub fn plan(&self) -> crate::Result<Vec<PlannedFlight>> {
        self.airplanes()
            .map(|airplane| {
                Ok(PlannedFlight {
                    id: airplane.id.clone(),
                    kind: if airplane.is_airliner() { "airliner" } else { "uav" }.to_string(),
                    path: airplane.path().iter().map(Location::to_array).collect(),
                    path_length_km: path_length_km(airplane.path()),
                    tagged_times_s: airplane.elapsed_time_at_tagged_waypoints()?,
                    departure_delay_s: airplane
                        .waypoints()
                        .front()
                        .and_then(|w| w.time_into_simulation_s),
                })
            })
            .collect()
    }

    pub fn into_simulator(self, config: SimulatorConfig) -> Result<AirplanesSimulator, SimulationError> {
        let mut airplanes = vec![self.airliner];
        airplanes.extend(self.uavs);
        AirplanesSimulator::new(airplanes, config)
    }
}
