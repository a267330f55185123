use crate::errors::{LocationRole, ServiceError};
use crate::geo::{estimated_road_km, parse_coordinates, Coordinate};
use crate::providers::GoogleMapsClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Road distance between two points, either measured by the provider or
/// estimated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DistanceResult {
    /// Distance in kilometers
    pub distance_km: f64,
    /// Travel time as reported by the provider, or "Estimated"
    pub duration_text: String,
    /// Display form of the distance
    pub distance_text: String,
    /// True when the provider could not be reached and haversine was used
    pub is_estimated: bool,
}

impl DistanceResult {
    /// Great-circle estimate stretched by the road detour factor.
    pub fn estimated(origin: &Coordinate, destination: &Coordinate) -> Self {
        let distance_km = estimated_road_km(origin, destination);
        Self {
            distance_km,
            duration_text: "Estimated".to_string(),
            distance_text: format!("~{:.1} km (estimated)", distance_km),
            is_estimated: true,
        }
    }

    fn measured(remote: BackendDistance) -> Self {
        let duration_text = remote
            .duration
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        let distance_text = remote
            .distance_text
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| format!("{:.1} km", remote.distance));

        Self {
            distance_km: remote.distance,
            duration_text,
            distance_text,
            is_estimated: false,
        }
    }
}

/// Payload a distance backend answers with; mirrors the `data` object of the
/// distance-matrix endpoint, minus fields the service does not read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendDistance {
    /// Kilometers, already rounded to two decimals
    pub distance: f64,
    #[serde(default)]
    pub distance_text: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

/// Something that can answer a single origin/destination distance query.
#[async_trait]
pub trait DistanceBackend: Send + Sync {
    async fn distance_matrix(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<BackendDistance, ServiceError>;
}

/// Lets the server price deliveries without a round trip through its own
/// HTTP endpoint.
#[async_trait]
impl DistanceBackend for GoogleMapsClient {
    async fn distance_matrix(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<BackendDistance, ServiceError> {
        let matrix = self.distance(origin, destination).await?;
        Ok(BackendDistance {
            distance: matrix.distance_km,
            distance_text: Some(matrix.distance_text),
            duration: Some(matrix.duration_text),
        })
    }
}

/// Computes delivery distances: one backend attempt, then a local estimate.
#[derive(Clone)]
pub struct DistanceService {
    backend: Arc<dyn DistanceBackend>,
}

impl DistanceService {
    pub fn new(backend: Arc<dyn DistanceBackend>) -> Self {
        Self { backend }
    }

    /// Distance between two coordinates.
    ///
    /// Coordinates outside the WGS84 ranges, or not finite, are rejected before
    /// the backend is contacted. Any backend failure falls back to
    /// [`DistanceResult::estimated`]; there is no retry.
    #[instrument(skip(self), fields(origin = %origin, destination = %destination))]
    pub async fn calculate_distance(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<DistanceResult, ServiceError> {
        check_bounds("origin", origin)?;
        check_bounds("destination", destination)?;

        match self.backend.distance_matrix(origin, destination).await {
            Ok(remote) if remote.distance.is_finite() && remote.distance >= 0.0 => {
                info!(distance_km = remote.distance, "distance measured by backend");
                Ok(DistanceResult::measured(remote))
            }
            Ok(remote) => {
                warn!(
                    distance = remote.distance,
                    "backend returned an unusable distance, using fallback"
                );
                Ok(DistanceResult::estimated(origin, destination))
            }
            Err(err) => {
                warn!(error = %err, "backend distance calculation failed, using fallback");
                Ok(DistanceResult::estimated(origin, destination))
            }
        }
    }

    /// Parses two free-text locations and computes the distance between them.
    pub async fn calculate_distance_from_urls(
        &self,
        pickup: &str,
        dropoff: &str,
    ) -> Result<DistanceResult, ServiceError> {
        let origin =
            parse_coordinates(pickup).ok_or(ServiceError::ParseFailure(LocationRole::Pickup))?;
        let destination =
            parse_coordinates(dropoff).ok_or(ServiceError::ParseFailure(LocationRole::Dropoff))?;

        self.calculate_distance(&origin, &destination).await
    }
}

fn check_bounds(name: &str, coordinate: &Coordinate) -> Result<(), ServiceError> {
    coordinate
        .validate()
        .map_err(|e| ServiceError::ValidationError(format!("{}: {}", name, e)))
}
