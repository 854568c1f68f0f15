//! Error types for path generation, scheduling and simulation.

use thiserror::Error;

/// Invalid scenario geometry. Raised while generating waypoints.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("no arc of radius {radius_km} km fits the corner at ({x_km:.3}, {y_km:.3})")]
    NoTangentArc { x_km: f64, y_km: f64, radius_km: f64 },

    #[error("{count} candidate arcs of radius {radius_km} km round the corner at ({x_km:.3}, {y_km:.3})")]
    AmbiguousTangentArc {
        x_km: f64,
        y_km: f64,
        radius_km: f64,
        count: usize,
    },

    #[error("{phase} leveling distance {leveling_km} km must be shorter than the {phase} distance {distance_km} km")]
    LevelingTooLong {
        phase: &'static str,
        leveling_km: f64,
        distance_km: f64,
    },

    #[error("cannot transition between equal altitudes ({altitude_km} km)")]
    FlatTransition { altitude_km: f64 },

    #[error("vertical speed {vertical_kmph:.1} km/h is not below cruise speed {cruise_kmph:.1} km/h")]
    VerticalSpeedTooHigh { vertical_kmph: f64, cruise_kmph: f64 },

    #[error("{airplane}: {needed_km:.2} km of runway segment do not fit before the arc, which starts {available_km:.2} km from the airport")]
    ArcTooCloseToAirport {
        airplane: String,
        needed_km: f64,
        available_km: f64,
    },

    #[error("{airplane}: the {segment} needs {needed_km:.2} km but only {available_km:.2} km are left")]
    SegmentTooShort {
        airplane: String,
        segment: &'static str,
        needed_km: f64,
        available_km: f64,
    },

    #[error("{airplane}: refueling window ends {window_km:.2} km from {airport} but the turn over it spans {turn_km:.2} km")]
    WindowOverlapsTurn {
        airplane: String,
        airport: String,
        window_km: f64,
        turn_km: f64,
    },
}

/// Tagged waypoint lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("{airplane} has no waypoint tagged {tag}")]
    NotFound { airplane: String, tag: String },

    #[error("{airplane} has {count} waypoints tagged {tag}")]
    NotUnique {
        airplane: String,
        tag: String,
        count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("{uav} needs {uav_s:.1} s to reach {tag} but the airliner gets there after {airliner_s:.1} s")]
    NegativeDelay {
        uav: String,
        tag: String,
        uav_s: f64,
        airliner_s: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("time step of {step_s} s exceeds the maximum of {max_s} s")]
    StepTooLarge { step_s: f64, max_s: f64 },

    #[error("time step must be positive, got {0} s")]
    NonPositiveStep(f64),

    #[error("cannot move simulation time back from {current_s} s to {requested_s} s")]
    TimeWentBackwards { current_s: f64, requested_s: f64 },

    #[error("{uav} requested docking while {docked} is docked with {airliner}")]
    DockingConflict {
        airliner: String,
        docked: String,
        uav: String,
    },

    #[error("{airplane}: waypoint {index} is {distance_km:.3} km away with approach speed {speed_kmph} km/h")]
    NonPositiveSpeed {
        airplane: String,
        index: usize,
        distance_km: f64,
        speed_kmph: f64,
    },

    #[error("{0} has no waypoints")]
    EmptyWaypoints(String),

    #[error("simulation has {0} airliners, expected exactly one")]
    AirlinerCount(usize),

    #[error("unknown airplane {0}")]
    UnknownAirplane(String),
}

/// Errors raised while loading or interpreting a scenario.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read YAML: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("unknown airport {0}")]
    UnknownAirport(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl ConfigError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
