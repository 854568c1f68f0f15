//! Planar vectors and 3D locations in the local projected frame.
//!
//! All coordinates are kilometers. Distances are Euclidean, not geodesic.

use crate::error::GeometryError;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::ops::{Add, Mul, Neg, Sub};

/// A point or vector in the horizontal plane (km).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Rotated 90 degrees counterclockwise.
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Polar angle in (-pi, pi].
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn distance(self, other: Self) -> f64 {
        (other - self).norm()
    }

    pub fn unit(self) -> Result<Self, GeometryError> {
        let norm = self.norm();
        if norm <= f64::EPSILON {
            return Err(GeometryError::Degenerate(format!(
                "zero-length vector ({}, {}) has no direction",
                self.x, self.y
            )));
        }
        Ok(self * (1.0 / norm))
    }

    /// Point on the circle of `radius` around `self` at polar `angle`.
    pub fn on_circle(self, radius: f64, angle: f64) -> Self {
        self + Self::new(angle.cos(), angle.sin()) * radius
    }
}

impl Add for Point2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// A 3D point with an optional tag marking it for lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x_km: f64,
    pub y_km: f64,
    pub altitude_km: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Location {
    pub fn new(x_km: f64, y_km: f64, altitude_km: f64) -> Self {
        Self {
            x_km,
            y_km,
            altitude_km,
            tag: None,
        }
    }

    pub fn at(xy: Point2, altitude_km: f64) -> Self {
        Self::new(xy.x, xy.y, altitude_km)
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Same point (tag included) at another altitude.
    pub fn with_altitude(&self, altitude_km: f64) -> Self {
        Self {
            altitude_km,
            ..self.clone()
        }
    }

    pub fn xy(&self) -> Point2 {
        Point2::new(self.x_km, self.y_km)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }

    pub fn distance_km(&self, other: &Location) -> f64 {
        let dz = other.altitude_km - self.altitude_km;
        self.xy().distance(other.xy()).hypot(dz)
    }

    /// Untagged point a `fraction` of the way toward `other`.
    pub fn lerp(&self, other: &Location, fraction: f64) -> Location {
        Location::new(
            self.x_km + (other.x_km - self.x_km) * fraction,
            self.y_km + (other.y_km - self.y_km) * fraction,
            self.altitude_km + (other.altitude_km - self.altitude_km) * fraction,
        )
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x_km, self.y_km, self.altitude_km]
    }
}

/// Point `distance_km` from `from` in the direction of `toward`.
pub fn intermediate_point(
    from: Point2,
    toward: Point2,
    distance_km: f64,
) -> Result<Point2, GeometryError> {
    Ok(from + (toward - from).unit()? * distance_km)
}

/// Normalize an angle into [0, 2pi).
pub fn angle_0_2pi(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// `count` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Total length of a polyline through `locations`.
pub fn path_length_km(locations: &[Location]) -> f64 {
    locations
        .windows(2)
        .map(|pair| pair[0].distance_km(&pair[1]))
        .sum()
}
