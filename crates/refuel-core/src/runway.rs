//! Takeoff and landing sequences: a ground run plus the transition to or
//! from a cruise level.

use crate::error::GeometryError;
use crate::flight_path::FlightPath;
use crate::geometry::{intermediate_point, Location, Point2};
use crate::models::Waypoint;
use crate::tags;
use crate::transitions::{speed_ramp, AltitudeTransition, RAMP_POINTS};

fn climb_out<'a>(
    flight_path: &'a FlightPath,
    airport: Point2,
    toward: Point2,
    altitude_km: f64,
) -> Result<AltitudeTransition<'a>, GeometryError> {
    Ok(AltitudeTransition {
        flight_path,
        start_altitude_km: 0.0,
        start: intermediate_point(airport, toward, flight_path.takeoff_distance_km)?,
        end_altitude_km: altitude_km,
        toward,
        runway: true,
        reversed: false,
    })
}

fn approach<'a>(
    flight_path: &'a FlightPath,
    airport: Point2,
    from: Point2,
    altitude_km: f64,
) -> Result<AltitudeTransition<'a>, GeometryError> {
    Ok(AltitudeTransition {
        flight_path,
        start_altitude_km: 0.0,
        start: intermediate_point(airport, from, flight_path.landing_distance_km)?,
        end_altitude_km: altitude_km,
        toward: from,
        runway: true,
        reversed: true,
    })
}

/// Horizontal distance from the airport to the point where a takeoff levels off.
pub fn takeoff_extent_km(
    flight_path: &FlightPath,
    altitude_km: f64,
) -> Result<f64, GeometryError> {
    let transition = climb_out(flight_path, Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), altitude_km)?;
    Ok(flight_path.takeoff_distance_km + transition.profile()?.horizontal_extent_km())
}

/// Horizontal distance from the airport to the point where a landing approach starts.
pub fn landing_extent_km(
    flight_path: &FlightPath,
    altitude_km: f64,
) -> Result<f64, GeometryError> {
    let transition = approach(flight_path, Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), altitude_km)?;
    Ok(flight_path.landing_distance_km + transition.profile()?.horizontal_extent_km())
}

/// Accelerate from standstill at `airport` toward `toward`, lift off and
/// climb to `altitude_km`.
///
/// Tags `<airplane>_takeoff_point` at lift-off and `<airplane>_ascended_point`
/// where the climb levels off.
pub fn takeoff(
    airplane: &str,
    flight_path: &FlightPath,
    airport: Point2,
    toward: Point2,
    altitude_km: f64,
) -> Result<Vec<Waypoint>, GeometryError> {
    let transition = climb_out(flight_path, airport, toward, altitude_km)?;
    let mut climb = transition.waypoints()?;
    let last = climb.len() - 1;
    climb[0].set_tag(tags::tag(airplane, tags::TAKEOFF_POINT));
    climb[last].set_tag(tags::tag(airplane, tags::ASCENDED_POINT));

    let mut waypoints = speed_ramp(
        &Location::at(airport, 0.0),
        0.0,
        &Location::at(transition.start, 0.0),
        flight_path.takeoff_speed_kmph,
        RAMP_POINTS,
    )?;
    waypoints.extend(climb);
    Ok(waypoints)
}

/// Descend from `altitude_km` on a course coming from `from`, touch down
/// and brake to a stop at `airport`.
///
/// Tags `<airplane>_descent_point`, `<airplane>_landing_point` at touchdown and
/// `<airplane>_landed_point` at the stop.
pub fn landing(
    airplane: &str,
    flight_path: &FlightPath,
    airport: Point2,
    from: Point2,
    altitude_km: f64,
) -> Result<Vec<Waypoint>, GeometryError> {
    let transition = approach(flight_path, airport, from, altitude_km)?;
    let mut waypoints = transition.waypoints()?;
    let last = waypoints.len() - 1;
    waypoints[0].set_tag(tags::tag(airplane, tags::DESCENT_POINT));
    waypoints[last].set_tag(tags::tag(airplane, tags::LANDING_POINT));

    let mut ground = speed_ramp(
        &Location::at(transition.start, 0.0),
        flight_path.landing_speed_kmph,
        &Location::at(airport, 0.0),
        0.0,
        RAMP_POINTS,
    )?;
    if let Some(stop) = ground.last_mut() {
        stop.set_tag(tags::tag(airplane, tags::LANDED_POINT));
    }
    waypoints.extend(ground);
    Ok(waypoints)
}
