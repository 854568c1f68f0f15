//! Complete waypoint queues of the airliner and of every UAV.
//!
//! UAV queues are built first. The airliner then picks up each UAV's docking
//! and undocking points by tag, so both airplanes fly through the exact same
//! horizontal positions while docked.

use crate::airports::Airport;
use crate::error::{ConfigError, GeometryError, LookupError};
use crate::flight_path::{AirlinerFlightPath, UavFlightPath};
use crate::geometry::{intermediate_point, Location, Point2};
use crate::models::{AirplaneId, ServiceSide, Waypoint, WaypointEvent};
use crate::planar_curve::curve_over_airport;
use crate::rendezvous::{rendezvous_leg, Leg};
use crate::runway::{landing, landing_extent_km, takeoff};
use crate::tags;
use crate::transitions::{speed_ramp, temporary_speed_change, AltitudeTransition, RAMP_POINTS};

/// Spacing of parked UAVs along the route at their home airport.
pub const PARKING_SPACING_KM: f64 = 0.015;

/// The stretch of route over which one UAV is docked with the airliner.
#[derive(Debug, Clone, PartialEq)]
pub struct RefuelingSlot {
    pub uav: AirplaneId,
    pub airport: String,
    pub service_side: ServiceSide,
    /// Speed flown while docked
    pub speed_kmph: f64,
    pub docking: Point2,
    pub undocking: Point2,
}

impl RefuelingSlot {
    /// Read the docking window out of a generated UAV queue.
    pub fn from_uav(
        uav: &str,
        path: &UavFlightPath,
        waypoints: &[Waypoint],
    ) -> Result<Self, LookupError> {
        Ok(Self {
            uav: uav.to_string(),
            airport: path.home.code.clone(),
            service_side: path.service_side,
            speed_kmph: path.flight_path.cruise_speed_kmph,
            docking: unique_tagged(uav, waypoints, &tags::docking_point(uav))?,
            undocking: unique_tagged(uav, waypoints, &tags::undocking_point(uav))?,
        })
    }
}

fn unique_tagged(airplane: &str, waypoints: &[Waypoint], tag: &str) -> Result<Point2, LookupError> {
    let mut found = waypoints.iter().filter(|w| w.tag() == Some(tag));
    let first = found.next().ok_or_else(|| LookupError::NotFound {
        airplane: airplane.to_string(),
        tag: tag.to_string(),
    })?;
    let extra = found.count();
    if extra > 0 {
        return Err(LookupError::NotUnique {
            airplane: airplane.to_string(),
            tag: tag.to_string(),
            count: extra + 1,
        });
    }
    Ok(first.location.xy())
}

/// Waypoints of the airliner from its origin to its destination, with a turn
/// over every flyover airport and a docking stretch for every slot.
pub fn airliner_waypoints(
    id: &str,
    route: &AirlinerFlightPath,
    slots: &[RefuelingSlot],
) -> crate::Result<Vec<Waypoint>> {
    let fp = &route.flight_path;
    fp.validate()?;
    let airports = &route.airports;
    let n = airports.len();
    if n < 2 {
        return Err(ConfigError::invalid("airports", "a route needs an origin and a destination").into());
    }
    if route.speed_change_distance_km <= 0.0 {
        return Err(ConfigError::invalid("speed_change_distance_km", "must be positive").into());
    }

    let altitude = fp.cruise_altitude_km;
    let origin = airports[0].xy();
    let mut waypoints = vec![Waypoint::new(
        Location::at(origin, 0.0).with_tag(tags::tag(id, tags::FIRST_POINT)),
        0.0,
    )];
    waypoints.extend(takeoff(id, fp, origin, airports[1].xy(), altitude)?);
    for window in airports.windows(3) {
        waypoints.extend(flyover(id, route, &window[0], &window[1], &window[2], slots)?);
    }
    waypoints.extend(landing(id, fp, airports[n - 1].xy(), airports[n - 2].xy(), altitude)?);

    tracing::debug!(
        "{}: {} waypoints over {} airports with {} refueling slots",
        id,
        waypoints.len(),
        n,
        slots.len()
    );
    Ok(waypoints)
}

fn slots_at<'a>(slots: &'a [RefuelingSlot], airport: &Airport, side: ServiceSide) -> Vec<&'a RefuelingSlot> {
    let home = airport.xy();
    let mut found: Vec<&RefuelingSlot> = slots
        .iter()
        .filter(|s| s.airport == airport.code && s.service_side == side)
        .collect();
    // flown order: toward the airport first, then away from it
    found.sort_by(|a, b| {
        let (da, db) = (a.docking.distance(home), b.docking.distance(home));
        match side {
            ServiceSide::ToAirport => db.total_cmp(&da),
            ServiceSide::FromAirport => da.total_cmp(&db),
        }
    });
    found
}

fn check_window(
    airplane: &str,
    airport: &Airport,
    window_end: Option<Point2>,
    turn_point: Point2,
) -> Result<(), GeometryError> {
    let Some(window_end) = window_end else {
        return Ok(());
    };
    let window_km = window_end.distance(airport.xy());
    let turn_km = turn_point.distance(airport.xy());
    if window_km < turn_km {
        return Err(GeometryError::WindowOverlapsTurn {
            airplane: airplane.to_string(),
            airport: airport.code.clone(),
            window_km,
            turn_km,
        });
    }
    Ok(())
}

fn docking_waypoint(slot: &RefuelingSlot, altitude_km: f64, speed_kmph: f64) -> Waypoint {
    let mut waypoint = Waypoint::new(Location::at(slot.docking, altitude_km), speed_kmph)
        .with_event(WaypointEvent::Dock {
            uav: slot.uav.clone(),
        });
    waypoint.set_tag(tags::docking_point(&slot.uav));
    waypoint
}

fn undocking_waypoint(slot: &RefuelingSlot, altitude_km: f64) -> Waypoint {
    let mut waypoint = Waypoint::new(Location::at(slot.undocking, altitude_km), slot.speed_kmph)
        .with_event(WaypointEvent::Undock {
            uav: slot.uav.clone(),
        });
    waypoint.set_tag(tags::undocking_point(&slot.uav));
    waypoint
}

/// Slow down, refuel, turn over `airport`, refuel again and speed back up.
fn flyover(
    id: &str,
    route: &AirlinerFlightPath,
    previous: &Airport,
    airport: &Airport,
    next: &Airport,
    slots: &[RefuelingSlot],
) -> crate::Result<Vec<Waypoint>> {
    let fp = &route.flight_path;
    let altitude = fp.cruise_altitude_km;
    let cruise = fp.cruise_speed_kmph;
    let to_airport = slots_at(slots, airport, ServiceSide::ToAirport);
    let from_airport = slots_at(slots, airport, ServiceSide::FromAirport);

    let curve_speed = to_airport
        .iter()
        .chain(&from_airport)
        .map(|s| s.speed_kmph)
        .reduce(f64::min)
        .unwrap_or(cruise);
    let curve = curve_over_airport(
        id,
        previous.xy(),
        airport,
        next.xy(),
        altitude,
        curve_speed,
        fp.turning_radius_km,
    )?;
    if to_airport.is_empty() && from_airport.is_empty() {
        return Ok(curve);
    }
    let curve_start = curve[0].location.xy();
    let curve_end = curve[curve.len() - 1].location.xy();
    check_window(id, airport, to_airport.last().map(|s| s.undocking), curve_start)?;
    check_window(id, airport, from_airport.first().map(|s| s.docking), curve_end)?;

    let (target, target_speed) = match to_airport.first() {
        Some(slot) => (slot.docking, slot.speed_kmph),
        None => (curve_start, curve_speed),
    };
    let ramp_start = Location::at(
        intermediate_point(target, previous.xy(), route.speed_change_distance_km)?,
        altitude,
    );
    let mut waypoints = vec![Waypoint::new(ramp_start.clone(), cruise)];
    waypoints.extend(speed_ramp(
        &ramp_start,
        cruise,
        &Location::at(target, altitude),
        target_speed,
        RAMP_POINTS,
    )?);
    for (k, slot) in to_airport.iter().enumerate() {
        // the ramp already ends on the first docking point
        let speed = if k == 0 {
            waypoints.pop().map_or(slot.speed_kmph, |w| w.speed_kmph)
        } else {
            slot.speed_kmph
        };
        waypoints.push(docking_waypoint(slot, altitude, speed));
        waypoints.push(undocking_waypoint(slot, altitude));
    }

    waypoints.extend(curve);

    for slot in &from_airport {
        waypoints.push(docking_waypoint(slot, altitude, slot.speed_kmph));
        waypoints.push(undocking_waypoint(slot, altitude));
    }
    let (last, last_speed) = match from_airport.last() {
        Some(slot) => (slot.undocking, slot.speed_kmph),
        None => (curve_end, curve_speed),
    };
    let ramp_end = intermediate_point(last, next.xy(), route.speed_change_distance_km)?;
    waypoints.extend(speed_ramp(
        &Location::at(last, altitude),
        last_speed,
        &Location::at(ramp_end, altitude),
        cruise,
        RAMP_POINTS,
    )?);
    Ok(waypoints)
}

/// Round trip of UAV `index` of the `count` serving one side of its home
/// airport. `toward` is the airliner's previous airport for a to-airport UAV
/// and its next airport for a from-airport UAV.
pub fn uav_waypoints(
    id: &str,
    index: usize,
    count: usize,
    path: &UavFlightPath,
    toward: Point2,
) -> crate::Result<Vec<Waypoint>> {
    path.flight_path.validate()?;
    if index >= count {
        return Err(ConfigError::invalid(
            "uav index",
            format!("{id} is number {index} of only {count}"),
        )
        .into());
    }
    let home = path.home.xy();
    let first = intermediate_point(home, toward, PARKING_SPACING_KM * (count - index) as f64)?;
    let mut waypoints = vec![Waypoint::new(
        Location::at(first, 0.0).with_tag(tags::tag(id, tags::FIRST_POINT)),
        0.0,
    )];
    match path.service_side {
        ServiceSide::ToAirport => waypoints.extend(to_airport_mission(id, index, path, toward, first)?),
        ServiceSide::FromAirport => waypoints.extend(from_airport_mission(id, path, toward, first)?),
    }
    tracing::debug!(
        "{}: {} {} waypoints from {}",
        id,
        waypoints.len(),
        path.service_side,
        path.home.code
    );
    Ok(waypoints)
}

fn to_airport_mission(
    id: &str,
    index: usize,
    path: &UavFlightPath,
    previous: Point2,
    first: Point2,
) -> crate::Result<Vec<Waypoint>> {
    let fp = &path.flight_path;
    let home = path.home.xy();
    let mut waypoints = rendezvous_leg(id, path, previous, first, Leg::Outbound)?;
    let docking = waypoints
        .last()
        .map(|w| w.location.xy())
        .ok_or_else(|| GeometryError::Degenerate(format!("{id} has an empty outbound leg")))?;

    let undocking = intermediate_point(docking, home, path.refueling_distance_km)?;
    let mut separation = AltitudeTransition {
        flight_path: fp,
        start_altitude_km: path.refueling_altitude_km,
        start: undocking,
        end_altitude_km: fp.cruise_altitude_km,
        toward: home,
        runway: false,
        reversed: false,
    }
    .waypoints()?;
    let last = separation.len() - 1;
    separation[0].set_tag(tags::undocking_point(id));
    separation[0].event = WaypointEvent::Undock { uav: id.to_string() };
    separation[last].set_tag(tags::tag(id, tags::ASCENDED_FROM_AIRLINER_POINT));
    let ascended = separation[last].location.clone();
    waypoints.extend(separation);

    // hang back until the airliner is clear ahead
    let average_kmph = path.average_clearance_speed_kmph();
    let relative_kmph = fp.cruise_speed_kmph - average_kmph;
    if relative_kmph <= 0.0 {
        return Err(ConfigError::invalid(
            "airliner_clearance_speed_kmph",
            format!(
                "{} km/h does not let the airliner pull away at {} km/h",
                path.clearance.speed_kmph, fp.cruise_speed_kmph
            ),
        )
        .into());
    }
    let clearance_km = average_kmph * path.clearance.distance_km / relative_kmph;
    let lowering_start = intermediate_point(ascended.xy(), home, clearance_km)?;
    waypoints.extend(temporary_speed_change(
        &ascended,
        &Location::at(lowering_start, fp.cruise_altitude_km),
        fp.cruise_speed_kmph,
        path.clearance.speed_kmph,
        RAMP_POINTS,
    )?);

    let mut lowering = AltitudeTransition {
        flight_path: fp,
        start_altitude_km: fp.cruise_altitude_km,
        start: lowering_start,
        end_altitude_km: path.clearance.altitude_km,
        toward: home,
        runway: false,
        reversed: false,
    }
    .waypoints()?;
    let last = lowering.len() - 1;
    lowering[0].set_tag(tags::tag(id, tags::LOWERING_POINT));
    lowering[last].set_tag(tags::tag(id, tags::LOWERED_POINT));
    let lowered = lowering[last].location.xy();
    waypoints.extend(lowering);

    let landing_spot = intermediate_point(home, previous, PARKING_SPACING_KM * (index + 1) as f64)?;
    let needed_km = landing_extent_km(fp, path.clearance.altitude_km)?;
    let available_km = lowered.distance(landing_spot);
    if available_km < needed_km {
        return Err(GeometryError::SegmentTooShort {
            airplane: id.to_string(),
            segment: "approach after the clearance maneuver",
            needed_km,
            available_km,
        }
        .into());
    }
    waypoints.extend(landing(id, fp, landing_spot, lowered, path.clearance.altitude_km)?);
    Ok(waypoints)
}

fn from_airport_mission(
    id: &str,
    path: &UavFlightPath,
    next: Point2,
    first: Point2,
) -> crate::Result<Vec<Waypoint>> {
    let fp = &path.flight_path;
    let home = path.home.xy();
    let mut waypoints = takeoff(id, fp, first, next, fp.cruise_altitude_km)?;
    let ascended_km = waypoints
        .last()
        .map_or(0.0, |w| w.location.xy().distance(home));

    let undocking = intermediate_point(home, next, path.far_rendezvous_distance_km())?;
    let docking = intermediate_point(undocking, home, path.refueling_distance_km)?;
    let mut descent = AltitudeTransition {
        flight_path: fp,
        start_altitude_km: path.refueling_altitude_km,
        start: docking,
        end_altitude_km: fp.cruise_altitude_km,
        toward: home,
        runway: false,
        reversed: true,
    }
    .waypoints()?;
    let descent_km = descent[0].location.xy().distance(home);
    if descent_km < ascended_km {
        return Err(GeometryError::SegmentTooShort {
            airplane: id.to_string(),
            segment: "climb-out before docking",
            needed_km: ascended_km,
            available_km: descent_km,
        }
        .into());
    }
    let last = descent.len() - 1;
    descent[0].set_tag(tags::tag(id, tags::DESCENT_TO_AIRLINER_POINT));
    descent[last].set_tag(tags::docking_point(id));
    descent[last].event = WaypointEvent::Dock { uav: id.to_string() };
    waypoints.extend(descent);

    waypoints.extend(rendezvous_leg(id, path, next, home, Leg::Return)?);
    Ok(waypoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::flight_path::{ClearanceManeuver, FlightPath};

    fn route() -> AirlinerFlightPath {
        AirlinerFlightPath {
            flight_path: FlightPath::default(),
            airports: vec![
                Airport::new("AAA", Point2::new(-1000.0, 0.0)),
                Airport::new("PIT", Point2::new(0.0, 0.0)),
                Airport::new("ZZZ", Point2::new(2000.0, 500.0)),
            ],
            speed_change_distance_km: 30.0,
        }
    }

    fn uav_path(side: ServiceSide) -> UavFlightPath {
        UavFlightPath {
            flight_path: FlightPath::uav(),
            home: Airport::new("PIT", Point2::new(0.0, 0.0)),
            service_side: side,
            arc_radius_km: 5.0,
            refueling_altitude_km: 10.1,
            refueling_distance_km: 14.46,
            window_offset_km: 150.0,
            clearance: ClearanceManeuver {
                speed_kmph: 200.0,
                distance_km: 2.0,
                altitude_km: 9.5,
            },
        }
    }

    fn count_tag(waypoints: &[Waypoint], tag: &str) -> usize {
        waypoints.iter().filter(|w| w.tag() == Some(tag)).count()
    }

    #[test]
    fn test_airliner_without_uavs() {
        let route = route();
        let waypoints = airliner_waypoints("Airliner", &route, &[]).unwrap();
        assert_eq!(waypoints[0].tag(), Some("Airliner_first_point"));
        assert_eq!(waypoints[0].location.xy(), Point2::new(-1000.0, 0.0));
        let stop = waypoints.last().unwrap();
        assert_eq!(stop.tag(), Some("Airliner_landed_point"));
        assert!(stop.location.xy().distance(Point2::new(2000.0, 500.0)) < 1e-9);
        assert_eq!(count_tag(&waypoints, "Airliner_curve_over_PIT_start_point"), 1);
        assert_eq!(count_tag(&waypoints, "Airliner_curve_over_PIT_end_point"), 1);
        assert!(waypoints[1..].iter().all(|w| w.speed_kmph > 0.0));
        assert!(waypoints.iter().all(|w| w.event == WaypointEvent::None));
    }

    #[test]
    fn test_to_airport_uav_round_trip() {
        let path = uav_path(ServiceSide::ToAirport);
        let previous = Point2::new(-1000.0, 0.0);
        let waypoints = uav_waypoints("PIT_UAV_0", 0, 1, &path, previous).unwrap();
        assert_eq!(waypoints[0].tag(), Some("PIT_UAV_0_first_point"));
        assert!((waypoints[0].location.x_km + 0.015).abs() < 1e-12);
        for suffix in [
            tags::DOCKING_POINT,
            tags::UNDOCKING_POINT,
            tags::ASCENDED_FROM_AIRLINER_POINT,
            tags::LOWERING_POINT,
            tags::LOWERED_POINT,
            tags::LANDED_POINT,
        ] {
            assert_eq!(count_tag(&waypoints, &tags::tag("PIT_UAV_0", suffix)), 1, "{suffix}");
        }
        let slot = RefuelingSlot::from_uav("PIT_UAV_0", &path, &waypoints).unwrap();
        assert!((slot.docking.distance(slot.undocking) - 14.46).abs() < 1e-9);
        assert!((slot.undocking.distance(Point2::new(-0.015, 0.0)) - 150.0).abs() < 1e-9);

        let stop = waypoints.last().unwrap();
        assert!(stop.location.xy().distance(Point2::new(-0.015, 0.0)) < 1e-9);
        let lowered = waypoints
            .iter()
            .find(|w| w.tag() == Some("PIT_UAV_0_lowered_point"))
            .unwrap();
        assert!((lowered.location.altitude_km - 9.5).abs() < 1e-9);
    }

    #[test]
    fn test_from_airport_uav_round_trip() {
        let path = uav_path(ServiceSide::FromAirport);
        let next = Point2::new(2000.0, 500.0);
        let waypoints = uav_waypoints("PIT_UAV_1", 0, 1, &path, next).unwrap();
        let slot = RefuelingSlot::from_uav("PIT_UAV_1", &path, &waypoints).unwrap();
        assert!((slot.docking.norm() - 150.0).abs() < 1e-9);
        assert!((slot.undocking.norm() - 164.46).abs() < 1e-9);
        let dock = waypoints
            .iter()
            .find(|w| w.tag() == Some("PIT_UAV_1_on_airliner_docking_point"))
            .unwrap();
        assert_eq!(
            dock.event,
            WaypointEvent::Dock {
                uav: "PIT_UAV_1".into()
            }
        );
        assert!((dock.location.altitude_km - 10.1).abs() < 1e-9);
        assert!(waypoints.last().unwrap().location.xy().norm() < 1e-9);
    }

    #[test]
    fn test_airliner_flies_through_docking_window() {
        let route = route();
        let to_path = uav_path(ServiceSide::ToAirport);
        let from_path = uav_path(ServiceSide::FromAirport);
        let to_uav = uav_waypoints("PIT_UAV_0", 0, 1, &to_path, Point2::new(-1000.0, 0.0)).unwrap();
        let from_uav = uav_waypoints("PIT_UAV_1", 0, 1, &from_path, Point2::new(2000.0, 500.0)).unwrap();
        let slots = vec![
            RefuelingSlot::from_uav("PIT_UAV_1", &from_path, &from_uav).unwrap(),
            RefuelingSlot::from_uav("PIT_UAV_0", &to_path, &to_uav).unwrap(),
        ];
        let waypoints = airliner_waypoints("Airliner", &route, &slots).unwrap();

        let position = |tag: &str| waypoints.iter().position(|w| w.tag() == Some(tag)).unwrap();
        let dock_0 = position("PIT_UAV_0_on_airliner_docking_point");
        let undock_0 = position("PIT_UAV_0_on_airliner_undocking_point");
        let curve = position("Airliner_curve_over_PIT_start_point");
        let dock_1 = position("PIT_UAV_1_on_airliner_docking_point");
        let undock_1 = position("PIT_UAV_1_on_airliner_undocking_point");
        assert!(dock_0 < undock_0 && undock_0 < curve && curve < dock_1 && dock_1 < undock_1);

        assert_eq!(waypoints[undock_0].speed_kmph, 300.0);
        assert_eq!(waypoints[curve].speed_kmph, 300.0);
        assert!(waypoints[dock_0].location.xy().distance(slots[1].docking) < 1e-9);
        assert!((waypoints[dock_0].location.altitude_km - 10.0).abs() < 1e-12);
        assert!(matches!(waypoints[undock_1].event, WaypointEvent::Undock { .. }));
    }

    #[test]
    fn test_window_inside_turn_is_rejected() {
        let route = route();
        let slot = RefuelingSlot {
            uav: "PIT_UAV_0".into(),
            airport: "PIT".into(),
            service_side: ServiceSide::ToAirport,
            speed_kmph: 300.0,
            docking: Point2::new(-10.0, 0.0),
            undocking: Point2::new(-0.5, 0.0),
        };
        let result = airliner_waypoints("Airliner", &route, &[slot]);
        assert!(matches!(
            result,
            Err(Error::Geometry(GeometryError::WindowOverlapsTurn { .. }))
        ));
    }

    #[test]
    fn test_clearance_speed_must_be_slower_than_cruise() {
        let mut path = uav_path(ServiceSide::ToAirport);
        path.clearance.speed_kmph = 400.0;
        let result = uav_waypoints("PIT_UAV_0", 0, 1, &path, Point2::new(-1000.0, 0.0));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_uav_index_out_of_range() {
        let path = uav_path(ServiceSide::ToAirport);
        assert!(uav_waypoints("PIT_UAV_3", 3, 2, &path, Point2::new(-1000.0, 0.0)).is_err());
    }
}
