//! Speed ramps and smoothed climb/descent transitions.

use crate::error::GeometryError;
use crate::flight_path::FlightPath;
use crate::geometry::{intermediate_point, linspace, Location, Point2};
use crate::models::Waypoint;

pub const RAMP_POINTS: usize = 50;
pub const VERTICAL_CURVE_POINTS: usize = 50;

/// Speed after `distance_km` at constant `acceleration` (km/h per km, i.e. `v dv/dx`).
pub fn kinematic_speed_kmph(start_speed_kmph: f64, acceleration: f64, distance_km: f64) -> f64 {
    (start_speed_kmph.powi(2) + 2.0 * acceleration * distance_km)
        .max(0.0)
        .sqrt()
}

/// Straight run from `from` to `to` changing speed at constant acceleration.
///
/// The segment is cut into `num_points` equal pieces. Each sub-waypoint is
/// approached at the mean of the kinematic speeds at both ends of its piece,
/// so the time spent on the run is the constant-acceleration time.
/// The stored `speed_kmph` is therefore a travel-time speed for the piece,
/// not the instantaneous speed at the sub-waypoint, which is
/// `sqrt(v0^2 + 2 * a * d)` at distance `d` from `from`.
pub fn speed_ramp(
    from: &Location,
    start_speed_kmph: f64,
    to: &Location,
    end_speed_kmph: f64,
    num_points: usize,
) -> Result<Vec<Waypoint>, GeometryError> {
    let distance = from.distance_km(to);
    if distance <= f64::EPSILON || num_points == 0 {
        return Err(GeometryError::Degenerate(format!(
            "speed ramp from ({:.3}, {:.3}) has no length",
            from.x_km, from.y_km
        )));
    }
    let acceleration = (end_speed_kmph.powi(2) - start_speed_kmph.powi(2)) / (2.0 * distance);
    let step = distance / num_points as f64;

    let mut previous_speed = start_speed_kmph;
    let mut waypoints = Vec::with_capacity(num_points);
    for i in 1..=num_points {
        let speed = if i == num_points {
            end_speed_kmph
        } else {
            kinematic_speed_kmph(start_speed_kmph, acceleration, step * i as f64)
        };
        let fraction = i as f64 / num_points as f64;
        waypoints.push(Waypoint::new(
            from.lerp(to, fraction),
            (previous_speed + speed) / 2.0,
        ));
        previous_speed = speed;
    }
    Ok(waypoints)
}

/// Slow down (or speed up) to `temporary_speed_kmph` over the first half of a
/// straight run and return to `default_speed_kmph` over the second half.
pub fn temporary_speed_change(
    from: &Location,
    to: &Location,
    default_speed_kmph: f64,
    temporary_speed_kmph: f64,
    num_points: usize,
) -> Result<Vec<Waypoint>, GeometryError> {
    let middle = from.lerp(to, 0.5);
    let mut waypoints = speed_ramp(
        from,
        default_speed_kmph,
        &middle,
        temporary_speed_kmph,
        num_points,
    )?;
    waypoints.extend(speed_ramp(
        &middle,
        temporary_speed_kmph,
        to,
        default_speed_kmph,
        num_points,
    )?);
    Ok(waypoints)
}

/// A climb or descent between two cruise levels, rounded at both ends.
///
/// Geometrically the transition starts at `start` on `start_altitude_km` and
/// extends toward `toward`, reaching `end_altitude_km`. With `reversed` the
/// waypoints are emitted from the far end back to `start`, so a geometric
/// climb is flown as a descent.
#[derive(Debug, Clone)]
pub struct AltitudeTransition<'a> {
    pub flight_path: &'a FlightPath,
    pub start_altitude_km: f64,
    pub start: Point2,
    pub end_altitude_km: f64,
    pub toward: Point2,
    /// The low end touches a runway: takeoff/landing leveling and speeds apply there
    pub runway: bool,
    pub reversed: bool,
}

/// Dimensions of a transition, derived from the flight path rates.
#[derive(Debug, Clone, Copy)]
pub struct TransitionProfile {
    pub vertical_speed_kmph: f64,
    pub ground_distance_km: f64,
    pub angle_rad: f64,
    pub start_leveling_km: f64,
    pub end_leveling_km: f64,
    pub start_speed_kmph: f64,
    pub end_speed_kmph: f64,
}

impl TransitionProfile {
    pub fn horizontal_extent_km(&self) -> f64 {
        self.start_leveling_km + self.ground_distance_km + self.end_leveling_km
    }
}

impl AltitudeTransition<'_> {
    fn rising(&self) -> bool {
        self.end_altitude_km > self.start_altitude_km
    }

    /// True when the flown direction is upward.
    pub fn climbing(&self) -> bool {
        self.rising() != self.reversed
    }

    pub fn profile(&self) -> Result<TransitionProfile, GeometryError> {
        let fp = self.flight_path;
        let delta = (self.end_altitude_km - self.start_altitude_km).abs();
        if delta < 1e-9 {
            return Err(GeometryError::FlatTransition {
                altitude_km: self.start_altitude_km,
            });
        }
        let climbing = self.climbing();
        let vertical_speed_kmph = if climbing {
            fp.climb_rate_kmph()
        } else {
            fp.descent_rate_kmph()
        };
        if vertical_speed_kmph >= fp.cruise_speed_kmph {
            return Err(GeometryError::VerticalSpeedTooHigh {
                vertical_kmph: vertical_speed_kmph,
                cruise_kmph: fp.cruise_speed_kmph,
            });
        }
        let duration_h = delta / vertical_speed_kmph;
        let ground_speed = (fp.cruise_speed_kmph.powi(2) - vertical_speed_kmph.powi(2)).sqrt();
        let ground_distance_km = ground_speed * duration_h;

        let high_leveling = if climbing {
            fp.climb_leveling_distance_km
        } else {
            fp.descent_leveling_distance_km
        };
        let (low_leveling, low_speed) = match (self.runway, climbing) {
            (true, true) => (fp.takeoff_leveling_distance_km, fp.takeoff_speed_kmph),
            (true, false) => (fp.landing_leveling_distance_km, fp.landing_speed_kmph),
            (false, _) => (high_leveling, fp.cruise_speed_kmph),
        };
        let high_speed = fp.cruise_speed_kmph;

        let (start_leveling_km, end_leveling_km, start_speed_kmph, end_speed_kmph) =
            if self.rising() {
                (low_leveling, high_leveling, low_speed, high_speed)
            } else {
                (high_leveling, low_leveling, high_speed, low_speed)
            };

        Ok(TransitionProfile {
            vertical_speed_kmph,
            ground_distance_km,
            angle_rad: delta.atan2(ground_distance_km),
            start_leveling_km,
            end_leveling_km,
            start_speed_kmph,
            end_speed_kmph,
        })
    }

    /// Waypoints in flown order. The first and last are level.
    pub fn waypoints(&self) -> Result<Vec<Waypoint>, GeometryError> {
        let profile = self.profile()?;
        let direction = (self.toward - self.start).unit()?;
        let sense = if self.rising() { 1.0 } else { -1.0 };
        let half_angle_tan = (profile.angle_rad / 2.0).tan();
        let thetas = linspace(0.0, profile.angle_rad, VERTICAL_CURVE_POINTS);

        let start_radius = profile.start_leveling_km / half_angle_tan;
        let start_arc: Vec<Waypoint> = thetas
            .iter()
            .map(|theta| {
                Waypoint::new(
                    Location::at(
                        self.start + direction * (start_radius * theta.sin()),
                        self.start_altitude_km + sense * start_radius * (1.0 - theta.cos()),
                    ),
                    profile.start_speed_kmph,
                )
            })
            .collect();

        let level_end = intermediate_point(
            self.start,
            self.toward,
            profile.horizontal_extent_km(),
        )?;
        let end_radius = profile.end_leveling_km / half_angle_tan;
        let end_arc: Vec<Waypoint> = thetas
            .iter()
            .rev()
            .map(|theta| {
                Waypoint::new(
                    Location::at(
                        level_end - direction * (end_radius * theta.sin()),
                        self.end_altitude_km - sense * end_radius * (1.0 - theta.cos()),
                    ),
                    profile.end_speed_kmph,
                )
            })
            .collect();

        let (first_arc, second_arc) = if self.reversed {
            (
                end_arc.into_iter().rev().collect::<Vec<_>>(),
                start_arc.into_iter().rev().collect::<Vec<_>>(),
            )
        } else {
            (start_arc, end_arc)
        };

        let mut waypoints = first_arc;
        if self.runway {
            let (ramp_from, from_speed) = match waypoints.last() {
                Some(w) => (w.location.clone(), w.speed_kmph),
                None => return Err(GeometryError::Degenerate("empty vertical arc".into())),
            };
            let ramp_to = second_arc[0].location.clone();
            waypoints.extend(speed_ramp(
                &ramp_from,
                from_speed,
                &ramp_to,
                second_arc[0].speed_kmph,
                RAMP_POINTS,
            )?);
        }
        waypoints.extend(second_arc);

        let last = waypoints.len() - 1;
        for (i, waypoint) in waypoints.iter_mut().enumerate() {
            waypoint.zero_angle_of_attack = i == 0 || i == last;
        }
        Ok(waypoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speeds_from_ramp(start_speed: f64, ramp: &[Waypoint]) -> Vec<f64> {
        // invert the mean-speed rule to recover the kinematic speeds
        let mut speeds = vec![start_speed];
        for w in ramp {
            let previous = speeds[speeds.len() - 1];
            speeds.push(2.0 * w.speed_kmph - previous);
        }
        speeds
    }

    #[test]
    fn test_speed_ramp_follows_constant_acceleration() {
        let from = Location::new(0.0, 0.0, 0.0);
        let to = Location::new(3.0, 4.0, 0.0);
        for (v0, v1) in [(0.0, 280.0), (829.0, 300.0), (300.0, 829.0), (250.0, 0.0)] {
            let ramp = speed_ramp(&from, v0, &to, v1, RAMP_POINTS).unwrap();
            assert_eq!(ramp.len(), RAMP_POINTS);
            let d = from.distance_km(&to);
            let a = (v1 * v1 - v0 * v0) / (2.0 * d);
            let speeds = speeds_from_ramp(v0, &ramp);
            for (i, w) in ramp.iter().enumerate() {
                let partial = from.distance_km(&w.location);
                let v = speeds[i + 1];
                assert!((v * v - v0 * v0 - 2.0 * a * partial).abs() < 1e-6 * v1.max(v0).powi(2));
            }
            assert!((speeds[RAMP_POINTS] - v1).abs() < 1e-6);
            assert!(ramp.iter().all(|w| w.speed_kmph > 0.0));
        }
    }

    #[test]
    fn test_speed_ramp_stores_piece_mean_speed() {
        let from = Location::new(0.0, 0.0, 0.0);
        let to = Location::new(10.0, 0.0, 0.0);
        let (v0, v1) = (300.0, 829.0);
        let ramp = speed_ramp(&from, v0, &to, v1, 10).unwrap();
        let a = (v1 * v1 - v0 * v0) / 20.0;
        // the first piece ends 1 km in
        let at_1km = kinematic_speed_kmph(v0, a, 1.0);
        assert!((ramp[0].speed_kmph - (v0 + at_1km) / 2.0).abs() < 1e-9);
        assert!(ramp[0].speed_kmph < at_1km);
        // the last piece is approached slower than its end speed
        let at_9km = kinematic_speed_kmph(v0, a, 9.0);
        assert!((ramp[9].speed_kmph - (at_9km + v1) / 2.0).abs() < 1e-9);
        assert!(ramp[9].speed_kmph < v1);
    }

    #[test]
    fn test_speed_ramp_time_matches_constant_acceleration() {
        let from = Location::new(0.0, 0.0, 0.0);
        let to = Location::new(2.0, 0.0, 0.0);
        let ramp = speed_ramp(&from, 0.0, &to, 280.0, RAMP_POINTS).unwrap();
        let mut previous = from.clone();
        let mut hours = 0.0;
        for w in &ramp {
            hours += previous.distance_km(&w.location) / w.speed_kmph;
            previous = w.location.clone();
        }
        // t = 2d / (v0 + v1)
        assert!((hours - 2.0 * 2.0 / 280.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_ramp_needs_length() {
        let here = Location::new(1.0, 1.0, 1.0);
        assert!(speed_ramp(&here, 0.0, &here, 10.0, RAMP_POINTS).is_err());
    }

    #[test]
    fn test_temporary_speed_change_returns_to_default() {
        let from = Location::new(0.0, 0.0, 10.0);
        let to = Location::new(10.0, 0.0, 10.0);
        let waypoints = temporary_speed_change(&from, &to, 300.0, 200.0, RAMP_POINTS).unwrap();
        assert_eq!(waypoints.len(), 2 * RAMP_POINTS);
        let slowest = waypoints
            .iter()
            .map(|w| w.speed_kmph)
            .fold(f64::INFINITY, f64::min);
        assert!(slowest > 200.0 && slowest < 210.0);
        let last = waypoints.last().unwrap();
        assert!(last.speed_kmph > 290.0);
        assert!(last.location.distance_km(&to) < 1e-9);
    }

    fn transition(fp: &FlightPath, runway: bool, reversed: bool) -> AltitudeTransition<'_> {
        AltitudeTransition {
            flight_path: fp,
            start_altitude_km: 0.0,
            start: Point2::new(0.0, 0.0),
            end_altitude_km: fp.cruise_altitude_km,
            toward: Point2::new(100.0, 100.0),
            runway,
            reversed,
        }
    }

    #[test]
    fn test_only_transition_ends_are_level() {
        let fp = FlightPath::default();
        for (runway, reversed) in [(true, false), (true, true), (false, false), (false, true)] {
            let waypoints = transition(&fp, runway, reversed).waypoints().unwrap();
            let last = waypoints.len() - 1;
            assert!(waypoints[0].zero_angle_of_attack);
            assert!(waypoints[last].zero_angle_of_attack);
            assert!(waypoints[1..last].iter().all(|w| !w.zero_angle_of_attack));
        }
    }

    #[test]
    fn test_climb_line_matches_transition_angle() {
        let fp = FlightPath::default();
        let t = transition(&fp, false, false);
        let profile = t.profile().unwrap();
        let waypoints = t.waypoints().unwrap();
        let top_of_first_arc = &waypoints[VERTICAL_CURVE_POINTS - 1].location;
        let bottom_of_second_arc = &waypoints[VERTICAL_CURVE_POINTS].location;
        let rise = bottom_of_second_arc.altitude_km - top_of_first_arc.altitude_km;
        let run = top_of_first_arc.xy().distance(bottom_of_second_arc.xy());
        let expected = fp.cruise_altitude_km.atan2(profile.ground_distance_km);
        assert!((rise.atan2(run) - expected).abs() < 1e-9);
        assert!((profile.angle_rad - expected).abs() < 1e-12);
    }

    #[test]
    fn test_transition_reaches_both_altitudes() {
        let fp = FlightPath::default();
        let t = transition(&fp, true, false);
        let profile = t.profile().unwrap();
        let waypoints = t.waypoints().unwrap();
        let first = &waypoints[0].location;
        let last = &waypoints[waypoints.len() - 1].location;
        assert!(first.altitude_km.abs() < 1e-12);
        assert!(first.xy().norm() < 1e-12);
        assert!((last.altitude_km - fp.cruise_altitude_km).abs() < 1e-9);
        assert!((last.xy().norm() - profile.horizontal_extent_km()).abs() < 1e-9);
        assert_eq!(waypoints.len(), 2 * VERTICAL_CURVE_POINTS + RAMP_POINTS);
        assert!((waypoints[0].speed_kmph - fp.takeoff_speed_kmph).abs() < 1e-12);
        assert!((waypoints[waypoints.len() - 1].speed_kmph - fp.cruise_speed_kmph).abs() < 1e-12);
    }

    #[test]
    fn test_reversed_runway_transition_is_a_landing_approach() {
        let fp = FlightPath::default();
        let t = transition(&fp, true, true);
        assert!(!t.climbing());
        let profile = t.profile().unwrap();
        assert!((profile.vertical_speed_kmph - fp.descent_rate_kmph()).abs() < 1e-12);
        assert!((profile.start_leveling_km - fp.landing_leveling_distance_km).abs() < 1e-12);
        let waypoints = t.waypoints().unwrap();
        let last = &waypoints[waypoints.len() - 1];
        assert!(last.location.altitude_km.abs() < 1e-12);
        assert!((last.speed_kmph - fp.landing_speed_kmph).abs() < 1e-12);
        let altitudes: Vec<f64> = waypoints.iter().map(|w| w.location.altitude_km).collect();
        assert!(altitudes.windows(2).all(|p| p[1] <= p[0] + 1e-12));
    }

    #[test]
    fn test_flat_transition_is_rejected() {
        let fp = FlightPath::default();
        let t = AltitudeTransition {
            end_altitude_km: 0.0,
            ..transition(&fp, false, false)
        };
        assert!(matches!(
            t.waypoints(),
            Err(GeometryError::FlatTransition { .. })
        ));
    }
}
