//! Circular arc rounding the corner between two straight segments.
//!
//! Used for cruise-altitude turns over flyover airports.

use crate::airports::Airport;
use crate::error::GeometryError;
use crate::geometry::{linspace, Location, Point2};
use crate::models::Waypoint;
use crate::tags;
use std::f64::consts::{PI, TAU};

pub const CURVE_POINTS: usize = 50;

/// Arc of `radius_km` around `center`, sampled from the first tangent point to the second.
/// Always holds at least two points.
#[derive(Debug, Clone)]
pub struct PlanarArc {
    pub center: Point2,
    pub radius_km: f64,
    pub points: Vec<Point2>,
}

impl PlanarArc {
    pub fn start(&self) -> Point2 {
        self.points[0]
    }

    pub fn end(&self) -> Point2 {
        self.points[self.points.len() - 1]
    }
}

/// Where a line `origin + t * direction` touches the circle; the double root of
/// `|origin + t * direction - center|^2 = radius^2`. `direction` must be a unit vector.
fn tangent_parameter(origin: Point2, direction: Point2, center: Point2) -> f64 {
    let b = 2.0 * direction.dot(origin - center);
    -b / 2.0
}

/// Arc of radius `radius_km` tangent to segment `p1-p2` and to segment `p2-p3`,
/// sampled at `num_points >= 2` points.
///
/// Each of the four pairs of offset lines meets at a candidate center; only the
/// one whose tangent points fall on both segments (measured from the corner)
/// is kept. None or several valid candidates are reported as errors.
pub fn tangent_arc(
    p1: Point2,
    p2: Point2,
    p3: Point2,
    radius_km: f64,
    num_points: usize,
) -> Result<PlanarArc, GeometryError> {
    if num_points < 2 {
        return Err(GeometryError::Degenerate(format!(
            "an arc needs at least 2 points, got {num_points}"
        )));
    }
    if radius_km <= 0.0 || !radius_km.is_finite() {
        return Err(GeometryError::Degenerate(format!(
            "turning radius must be positive, got {radius_km}"
        )));
    }
    let (len1, len2) = (p2.distance(p1), p2.distance(p3));
    let d1 = (p1 - p2).unit()?;
    let d2 = (p3 - p2).unit()?;
    let det = d1.cross(d2);
    if det.abs() < 1e-12 {
        return Err(GeometryError::Degenerate(format!(
            "corner at ({:.3}, {:.3}) has collinear legs",
            p2.x, p2.y
        )));
    }

    let (n1, n2) = (d1.perpendicular(), d2.perpendicular());
    let tolerance = 1e-9 * len1.max(len2).max(radius_km);
    let mut candidates = Vec::with_capacity(1);
    for (s1, s2) in [(1.0, 1.0), (1.0, -1.0), (-1.0, -1.0), (-1.0, 1.0)] {
        let o1 = p2 + n1 * (s1 * radius_km);
        let o2 = p2 + n2 * (s2 * radius_km);
        let t = (o2 - o1).cross(d2) / det;
        let center = o1 + d1 * t;

        let t1 = tangent_parameter(p2, d1, center);
        let t2 = tangent_parameter(p2, d2, center);
        let on_ray = |t: f64, len: f64| t >= -tolerance && t <= len + tolerance;
        if on_ray(t1, len1) && on_ray(t2, len2) {
            candidates.push((center, p2 + d1 * t1, p2 + d2 * t2));
        }
    }

    let (center, first, last) = match candidates.as_slice() {
        [only] => *only,
        [] => {
            return Err(GeometryError::NoTangentArc {
                x_km: p2.x,
                y_km: p2.y,
                radius_km,
            })
        }
        many => {
            return Err(GeometryError::AmbiguousTangentArc {
                x_km: p2.x,
                y_km: p2.y,
                radius_km,
                count: many.len(),
            })
        }
    };

    let start_angle = (first - center).angle();
    let mut sweep = (last - center).angle() - start_angle;
    if sweep > PI {
        sweep -= TAU;
    } else if sweep <= -PI {
        sweep += TAU;
    }
    let points = linspace(0.0, 1.0, num_points)
        .into_iter()
        .map(|f| center.on_circle(radius_km, start_angle + sweep * f))
        .collect();

    Ok(PlanarArc {
        center,
        radius_km,
        points,
    })
}

/// Level turn over `airport` from the `previous` leg onto the `next` leg.
pub fn curve_over_airport(
    airplane: &str,
    previous: Point2,
    airport: &Airport,
    next: Point2,
    altitude_km: f64,
    speed_kmph: f64,
    radius_km: f64,
) -> Result<Vec<Waypoint>, GeometryError> {
    let arc = tangent_arc(previous, airport.xy(), next, radius_km, CURVE_POINTS)?;
    let mut waypoints: Vec<Waypoint> = arc
        .points
        .iter()
        .map(|p| Waypoint::new(Location::at(*p, altitude_km), speed_kmph))
        .collect();
    let last = waypoints.len() - 1;
    waypoints[0].set_tag(tags::curve_start_point(airplane, &airport.code));
    waypoints[last].set_tag(tags::curve_end_point(airplane, &airport.code));
    Ok(waypoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_segment(p: Point2, a: Point2, b: Point2) -> bool {
        let along = (p - a).dot((b - a).unit().unwrap());
        let off = (p - a).cross((b - a).unit().unwrap()).abs();
        off < 1e-9 && along >= -1e-9 && along <= a.distance(b) + 1e-9
    }

    #[test]
    fn test_right_angle_corner() {
        let (p1, p2, p3) = (
            Point2::new(-10.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 10.0),
        );
        let arc = tangent_arc(p1, p2, p3, 2.0, CURVE_POINTS).unwrap();
        assert!((arc.center.x + 2.0).abs() < 1e-9);
        assert!((arc.center.y - 2.0).abs() < 1e-9);
        assert_eq!(arc.points.len(), CURVE_POINTS);
        for p in &arc.points {
            assert!((p.distance(arc.center) - 2.0).abs() < 1e-9);
        }
        assert!(on_segment(arc.start(), p1, p2));
        assert!(on_segment(arc.end(), p2, p3));
        assert!((arc.start().x + 2.0).abs() < 1e-9);
        assert!((arc.end().y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_shallow_right_turn() {
        let (p1, p2, p3) = (
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 5.0),
            Point2::new(200.0, -30.0),
        );
        let arc = tangent_arc(p1, p2, p3, 20.0, CURVE_POINTS).unwrap();
        for p in &arc.points {
            assert!((p.distance(arc.center) - 20.0).abs() < 1e-8);
        }
        assert!(on_segment(arc.start(), p1, p2));
        assert!(on_segment(arc.end(), p2, p3));
        // the arc stays on the inside of the turn
        assert!((arc.center - p2).cross(p2 - p1) > 0.0);
    }

    #[test]
    fn test_radius_too_large_for_corner() {
        let result = tangent_arc(
            Point2::new(-1.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
            5.0,
            CURVE_POINTS,
        );
        assert!(matches!(result, Err(GeometryError::NoTangentArc { .. })));
    }

    #[test]
    fn test_collinear_points_are_degenerate() {
        let result = tangent_arc(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            1.0,
            CURVE_POINTS,
        );
        assert!(matches!(result, Err(GeometryError::Degenerate(_))));
    }

    #[test]
    fn test_arc_needs_two_points() {
        let (p1, p2, p3) = (
            Point2::new(-100.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 100.0),
        );
        for num_points in [0, 1] {
            let result = tangent_arc(p1, p2, p3, 20.0, num_points);
            assert!(matches!(result, Err(GeometryError::Degenerate(_))));
        }
        let arc = tangent_arc(p1, p2, p3, 20.0, 2).unwrap();
        assert_eq!(arc.points.len(), 2);
        assert!((arc.start().distance(arc.end()) - 20.0 * 2f64.sqrt()).abs() < 1e-8);
    }

    #[test]
    fn test_curve_over_airport_tags_ends() {
        let airport = Airport::new("PIT", Point2::new(0.0, 0.0));
        let waypoints = curve_over_airport(
            "Airliner",
            Point2::new(-50.0, 0.0),
            &airport,
            Point2::new(0.0, 50.0),
            10.0,
            300.0,
            5.0,
        )
        .unwrap();
        assert_eq!(waypoints[0].tag(), Some("Airliner_curve_over_PIT_start_point"));
        assert_eq!(
            waypoints.last().unwrap().tag(),
            Some("Airliner_curve_over_PIT_end_point")
        );
        assert!(waypoints.iter().all(|w| w.location.altitude_km == 10.0));
    }
}
