//! UAV legs between its home airport and the airliner's route.
//!
//! The airliner flies along the line from `A` to `B` (or from `B` to `A`).
//! A UAV based at `B` takes off toward the tangent point `E` of a circle of
//! the configured arc radius, turns around on that circle until its course
//! is parallel to the route at `F`, and then climbs or descends onto the
//! airliner at the rendezvous point `H`. The return leg flies the same
//! geometry backwards.

use crate::error::GeometryError;
use crate::flight_path::UavFlightPath;
use crate::geometry::{intermediate_point, linspace, Location, Point2};
use crate::models::{Waypoint, WaypointEvent};
use crate::runway::{landing, landing_extent_km, takeoff, takeoff_extent_km};
use crate::tags;
use crate::transitions::AltitudeTransition;
use std::f64::consts::TAU;

pub const ARC_POINTS: usize = 500;

/// Which part of the round trip a leg belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    /// Home airport up to the docking point.
    Outbound,
    /// Undocking point back to the home airport.
    Return,
}

/// Turning circle joining the line from `B` through `E` with the route at `F`.
#[derive(Debug, Clone)]
pub struct RendezvousArc {
    pub center: Point2,
    pub radius_km: f64,
    /// Tangent point of the line from the airport
    pub start: Point2,
    /// Tangent point on the route
    pub end: Point2,
    /// Clockwise samples from `start` to `end`
    pub points: Vec<Point2>,
}

/// Circle of `radius_km` touching the route `a-b` at distance `distance_km`
/// from `b`, together with the other tangent point seen from `b`.
pub fn rendezvous_arc(
    a: Point2,
    b: Point2,
    distance_km: f64,
    radius_km: f64,
    num_points: usize,
) -> Result<RendezvousArc, GeometryError> {
    if radius_km <= 0.0 || !radius_km.is_finite() {
        return Err(GeometryError::Degenerate(format!(
            "arc radius must be positive, got {radius_km}"
        )));
    }
    if distance_km <= 0.0 {
        return Err(GeometryError::Degenerate(format!(
            "rendezvous distance must be positive, got {distance_km}"
        )));
    }
    let u = (b - a).unit()?;
    let n = u.perpendicular();
    let (d, r) = (distance_km, radius_km);

    let end = b - u * d;
    let center = end - n * r;
    // second tangent point from b; |start - b| == d
    let start = b - (u * (d * d - r * r) + n * (2.0 * r * d)) * (d / (d * d + r * r));

    let start_angle = (start - center).angle();
    let mut sweep = start_angle - (end - center).angle();
    if sweep <= 0.0 {
        sweep += TAU;
    }
    let points = linspace(0.0, 1.0, num_points)
        .into_iter()
        .map(|f| center.on_circle(r, start_angle - sweep * f))
        .collect();

    Ok(RendezvousArc {
        center,
        radius_km: r,
        start,
        end,
        points,
    })
}

/// Waypoints of one leg of `uav`'s trip between airport `b` and the route toward `a`.
///
/// The outbound leg ends at the docking point, tagged
/// `<uav>_on_airliner_docking_point` and carrying a dock event. The return
/// leg starts at the undocking point, which carries the undock event.
pub fn rendezvous_leg(
    uav: &str,
    path: &UavFlightPath,
    a: Point2,
    b: Point2,
    leg: Leg,
) -> Result<Vec<Waypoint>, GeometryError> {
    let fp = &path.flight_path;
    let meeting_point = intermediate_point(b, a, path.far_rendezvous_distance_km())?;
    let transition = AltitudeTransition {
        flight_path: fp,
        start_altitude_km: path.refueling_altitude_km,
        start: meeting_point,
        end_altitude_km: fp.cruise_altitude_km,
        toward: a,
        runway: false,
        reversed: leg == Leg::Outbound,
    };
    let mut rendezvous = transition.waypoints()?;
    let last = rendezvous.len() - 1;
    let far_end = match leg {
        Leg::Outbound => rendezvous[0].location.xy(),
        Leg::Return => rendezvous[last].location.xy(),
    };

    let distance = far_end.distance(b);
    let arc = rendezvous_arc(a, b, distance, path.arc_radius_km, ARC_POINTS)?;
    let runway_extent = match leg {
        Leg::Outbound => takeoff_extent_km(fp, fp.cruise_altitude_km)?,
        Leg::Return => landing_extent_km(fp, fp.cruise_altitude_km)?,
    };
    if runway_extent > distance {
        return Err(GeometryError::ArcTooCloseToAirport {
            airplane: uav.to_string(),
            needed_km: runway_extent,
            available_km: distance,
        });
    }

    let mut turn: Vec<Waypoint> = arc
        .points
        .iter()
        .map(|p| Waypoint::new(Location::at(*p, fp.cruise_altitude_km), fp.cruise_speed_kmph))
        .collect();
    if leg == Leg::Return {
        turn.reverse();
    }
    let turn_last = turn.len() - 1;
    turn[0].set_tag(tags::tag(uav, tags::ARC_START_POINT));
    turn[turn_last].set_tag(tags::tag(uav, tags::ARC_END_POINT));

    let waypoints = match leg {
        Leg::Outbound => {
            rendezvous[0].set_tag(tags::tag(uav, tags::DESCENT_TO_AIRLINER_POINT));
            rendezvous[last].set_tag(tags::docking_point(uav));
            rendezvous[last].event = WaypointEvent::Dock {
                uav: uav.to_string(),
            };
            let mut waypoints = takeoff(uav, fp, b, arc.start, fp.cruise_altitude_km)?;
            waypoints.extend(turn);
            waypoints.extend(rendezvous);
            waypoints
        }
        Leg::Return => {
            rendezvous[0].set_tag(tags::undocking_point(uav));
            rendezvous[0].event = WaypointEvent::Undock {
                uav: uav.to_string(),
            };
            rendezvous[last].set_tag(tags::tag(uav, tags::ASCENDED_FROM_AIRLINER_POINT));
            let mut waypoints = rendezvous;
            waypoints.extend(turn);
            waypoints.extend(landing(uav, fp, b, arc.start, fp.cruise_altitude_km)?);
            waypoints
        }
    };
    tracing::debug!(
        "{} {:?} leg: {} waypoints, arc of {:.1} km radius {:.1} km from airport",
        uav,
        leg,
        waypoints.len(),
        arc.radius_km,
        distance
    );
    Ok(waypoints)
}
