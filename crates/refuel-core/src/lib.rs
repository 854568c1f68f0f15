pub mod airplane;
pub mod airports;
pub mod assembly;
pub mod config;
pub mod error;
pub mod fleet;
pub mod flight_path;
pub mod geometry;
pub mod models;
pub mod planar_curve;
pub mod rendezvous;
pub mod report;
pub mod runway;
pub mod schedule;
pub mod simulator;
pub mod tags;
pub mod transitions;

pub use airplane::{Airplane, AirplaneKind, AirplaneSnapshot, AirplaneSpec, CargoTank};
pub use airports::{builtin_coordinates, project_airports, Airport, LatLon};
pub use assembly::{airliner_waypoints, uav_waypoints, RefuelingSlot};
pub use config::SimulationConfig;
pub use error::{
    ConfigError, Error, GeometryError, LookupError, Result, ScheduleError, SimulationError,
};
pub use fleet::{Fleet, PlannedFlight};
pub use flight_path::{AirlinerFlightPath, ClearanceManeuver, FlightPath, UavFlightPath};
pub use geometry::{intermediate_point, Location, Point2};
pub use models::{AirplaneId, ServiceSide, Waypoint, WaypointEvent};
pub use report::{run_scenario, PlanReport, SimulationReport, StepSnapshot};
pub use schedule::delay_uavs;
pub use simulator::{AirplanesSimulator, DockingRecord, SimulatorConfig};
