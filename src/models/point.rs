// src/models/point.rs
// DOCUMENTATION: Geographic point with GeoJSON wire format
// PURPOSE: Accept web {lng, lat} and GeoJSON shapes, always emit GeoJSON

use crate::errors::StoreError;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Mean earth radius used for every distance computation (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A (longitude, latitude) pair in degrees
/// DOCUMENTATION: Coordinates are range-checked on every construction path
/// (`Point::new`, deserialization, database row decoding), so a `Point`
/// value is always valid once it exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PointInput", into = "GeoJsonPoint")]
pub struct Point {
    longitude: f64,
    latitude: f64,
}

#[derive(Debug, Validate)]
struct CoordinateBounds {
    #[validate(range(min = -180.0, max = 180.0))]
    longitude: f64,

    #[validate(range(min = -90.0, max = 90.0))]
    latitude: f64,
}

/// Both accepted input shapes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PointInput {
    GeoJson {
        #[serde(rename = "type")]
        kind: String,
        coordinates: Vec<f64>,
    },
    Web {
        lng: f64,
        lat: f64,
    },
}

/// Output shape: {"type": "Point", "coordinates": [lng, lat]}
#[derive(Debug, Serialize)]
struct GeoJsonPoint {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: [f64; 2],
}

impl Point {
    /// Build a point, rejecting non-finite or out-of-range coordinates
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, StoreError> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(StoreError::InvalidPoint(format!(
                "coordinates must be finite, got ({}, {})",
                longitude, latitude
            )));
        }

        CoordinateBounds {
            longitude,
            latitude,
        }
        .validate()
        .map_err(|e| {
            StoreError::InvalidPoint(format!("({}, {}) out of range: {}", longitude, latitude, e))
        })?;

        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Great-circle distance to `other` in meters
    /// Uses Haversine formula on a sphere of radius EARTH_RADIUS_M
    pub fn distance_to(&self, other: &Point) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);

        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_M * c
    }

    /// GeoJSON geometry for this point
    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::Point(vec![self.longitude, self.latitude]))
    }
}

impl TryFrom<PointInput> for Point {
    type Error = StoreError;

    fn try_from(input: PointInput) -> Result<Self, Self::Error> {
        match input {
            PointInput::Web { lng, lat } => Point::new(lng, lat),
            PointInput::GeoJson { kind, coordinates } => {
                if kind != "Point" {
                    return Err(StoreError::InvalidPoint(format!(
                        "expected GeoJSON type 'Point', got '{}'",
                        kind
                    )));
                }
                position_to_point(&coordinates)
            }
        }
    }
}

impl From<Point> for GeoJsonPoint {
    fn from(point: Point) -> Self {
        GeoJsonPoint {
            kind: "Point",
            coordinates: [point.longitude, point.latitude],
        }
    }
}

impl From<Point> for geojson::Geometry {
    fn from(point: Point) -> Self {
        point.to_geojson()
    }
}

impl TryFrom<geojson::Geometry> for Point {
    type Error = StoreError;

    fn try_from(geometry: geojson::Geometry) -> Result<Self, Self::Error> {
        match geometry.value {
            geojson::Value::Point(position) => position_to_point(&position),
            _ => Err(StoreError::InvalidPoint(
                "expected a Point geometry".to_string(),
            )),
        }
    }
}

impl From<Point> for geo_types::Point<f64> {
    fn from(point: Point) -> Self {
        geo_types::Point::new(point.longitude, point.latitude)
    }
}

impl TryFrom<geo_types::Point<f64>> for Point {
    type Error = StoreError;

    fn try_from(point: geo_types::Point<f64>) -> Result<Self, Self::Error> {
        Point::new(point.x(), point.y())
    }
}

// A GeoJSON position may carry an altitude as a third element; it is ignored.
fn position_to_point(position: &[f64]) -> Result<Point, StoreError> {
    match position {
        [lng, lat] | [lng, lat, _] => Point::new(*lng, *lat),
        _ => Err(StoreError::InvalidPoint(format!(
            "a position needs 2 or 3 elements, got {}",
            position.len()
        ))),
    }
}
