//! Geographic primitives shared by the parser, the distance service and the
//! distance-matrix endpoint.

pub mod parser;

pub use parser::{extract_coordinates_from_url, inspect_coordinates, parse_coordinates, ParseReport};

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Mean Earth radius used for great-circle estimates, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Multiplier applied to a great-circle distance to approximate road distance.
pub const ROAD_DETOUR_FACTOR: f64 = 1.3;

pub const LAT_MIN: f64 = -90.0;
pub const LAT_MAX: f64 = 90.0;
pub const LNG_MIN: f64 = -180.0;
pub const LNG_MAX: f64 = 180.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({"lat": 6.1319, "lng": 1.2228}))]
pub struct Coordinate {
    /// Latitude in decimal degrees (-90..=90)
    #[validate(custom = "validate_latitude")]
    #[schema(example = 6.1319)]
    pub lat: f64,
    /// Longitude in decimal degrees (-180..=180)
    #[validate(custom = "validate_longitude")]
    #[schema(example = 1.2228)]
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_within_bounds(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (LAT_MIN..=LAT_MAX).contains(&self.lat)
            && (LNG_MIN..=LNG_MAX).contains(&self.lng)
    }

    /// Comma-joined `lat,lng` form expected by the distance-matrix provider.
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

// validator hands `Copy` numeric fields to custom functions by value.
fn validate_latitude(value: f64) -> Result<(), ValidationError> {
    validate_degrees(value, LAT_MIN, LAT_MAX, "lat")
}

fn validate_longitude(value: f64) -> Result<(), ValidationError> {
    validate_degrees(value, LNG_MIN, LNG_MAX, "lng")
}

fn validate_degrees(
    value: f64,
    min: f64,
    max: f64,
    code: &'static str,
) -> Result<(), ValidationError> {
    if value.is_finite() && (min..=max).contains(&value) {
        return Ok(());
    }
    let mut err = ValidationError::new(code);
    err.message = Some(format!("must be between {} and {}", min, max).into());
    err.add_param("value".into(), &value);
    Err(err)
}

/// Great-circle distance between two coordinates, in kilometers.
pub fn haversine_km(origin: &Coordinate, destination: &Coordinate) -> f64 {
    let lat1 = origin.lat.to_radians();
    let lat2 = destination.lat.to_radians();
    let delta_lat = (destination.lat - origin.lat).to_radians();
    let delta_lng = (destination.lng - origin.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Haversine distance stretched by [`ROAD_DETOUR_FACTOR`].
pub fn estimated_road_km(origin: &Coordinate, destination: &Coordinate) -> f64 {
    haversine_km(origin, destination) * ROAD_DETOUR_FACTOR
}
