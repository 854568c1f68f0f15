//! Airport coordinates and their projection into the local km frame.

use crate::error::ConfigError;
use crate::geometry::{Location, Point2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kilometers per degree of latitude (and of longitude in the flat projection).
pub const KM_PER_LAT_LON: f64 = 111.194_926_644_558_73;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// An airport placed in the local frame at ground level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub code: String,
    /// Tagged with the airport code
    pub location: Location,
}

impl Airport {
    pub fn new(code: impl Into<String>, xy: Point2) -> Self {
        let code = code.into();
        Self {
            location: Location::at(xy, 0.0).with_tag(code.clone()),
            code,
        }
    }

    pub fn xy(&self) -> Point2 {
        self.location.xy()
    }
}

pub fn builtin_coordinates() -> BTreeMap<String, LatLon> {
    [
        ("ATL", 33.6407, -84.4277),
        ("BOS", 42.3656, -71.0096),
        ("DEN", 39.8561, -104.6737),
        ("DFW", 32.8998, -97.0403),
        ("JFK", 40.6413, -73.7781),
        ("LAX", 33.9416, -118.4085),
        ("ORD", 41.9742, -87.9073),
        ("PIT", 40.4914, -80.2328),
        ("SEA", 47.4502, -122.3088),
        ("SFO", 37.6213, -122.3790),
    ]
    .into_iter()
    .map(|(code, lat, lon)| (code.to_string(), LatLon { lat, lon }))
    .collect()
}

/// Project `codes` into a km frame centered on their bounding box.
pub fn project_airports(
    codes: &[String],
    coordinates: &BTreeMap<String, LatLon>,
) -> Result<BTreeMap<String, Airport>, ConfigError> {
    let mut raw = Vec::with_capacity(codes.len());
    for code in codes {
        let lat_lon = coordinates
            .get(code)
            .ok_or_else(|| ConfigError::UnknownAirport(code.clone()))?;
        raw.push((
            code,
            Point2::new(lat_lon.lon * KM_PER_LAT_LON, lat_lon.lat * KM_PER_LAT_LON),
        ));
    }

    let (mut min, mut max) = (
        Point2::new(f64::INFINITY, f64::INFINITY),
        Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
    );
    for (_, p) in &raw {
        min = Point2::new(min.x.min(p.x), min.y.min(p.y));
        max = Point2::new(max.x.max(p.x), max.y.max(p.y));
    }
    let center = (min + max) * 0.5;

    Ok(raw
        .into_iter()
        .map(|(code, p)| (code.clone(), Airport::new(code.clone(), p - center)))
        .collect())
}
