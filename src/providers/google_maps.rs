use crate::config::AppConfig;
use crate::geo::Coordinate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, instrument};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

/// Failures of a single distance-matrix lookup.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Google Maps API key is not configured")]
    MissingApiKey,

    /// The provider answered with a non-success HTTP status.
    #[error("provider returned HTTP {status}")]
    Http { status: u16 },

    /// No HTTP status at all: connection refused, DNS, timeout.
    #[error("provider unreachable: {0}")]
    Transport(String),

    #[error("provider status {status}")]
    Status {
        status: String,
        error_message: Option<String>,
    },

    /// First row/element missing or not `OK`.
    #[error("no usable element: {}", status.as_deref().unwrap_or("missing element"))]
    Element { status: Option<String> },

    #[error("unreadable provider response: {0}")]
    Decode(String),
}

/// Distance between one origin and one destination as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    /// Kilometers, rounded to two decimals
    pub distance_km: f64,
    pub distance_in_meters: u64,
    pub distance_text: String,
    pub duration_text: String,
    pub duration_in_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: u64,
}

/// Thin client over the Distance Matrix JSON API.
#[derive(Clone, Debug)]
pub struct GoogleMapsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleMapsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            // a blank key is as good as none
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        Self::new(
            config.google_maps_base_url.clone(),
            config.google_maps_api_key.clone(),
            Duration::from_secs(config.provider_timeout_secs),
        )
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Looks up driving distance and duration between two points. Exactly one
    /// HTTP request is made.
    #[instrument(skip(self), fields(origin = %origin, destination = %destination))]
    pub async fn distance(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<DistanceMatrix, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            error!("Google Maps API key not configured");
            ProviderError::MissingApiKey
        })?;

        let origins = origin.to_query_value();
        let destinations = destination.to_query_value();
        info!(origins = %origins, destinations = %destinations, "calling distance matrix provider");

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("units", "metric"),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "distance matrix request failed");
                ProviderError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "distance matrix provider HTTP error");
            return Err(ProviderError::Http {
                status: status.as_u16(),
            });
        }

        let body: MatrixResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        if body.status != "OK" {
            error!(
                status = %body.status,
                error_message = ?body.error_message,
                "distance matrix provider status error"
            );
            return Err(ProviderError::Status {
                status: body.status,
                error_message: body.error_message,
            });
        }

        let element = body
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
            .ok_or_else(|| {
                error!("distance matrix response has no element");
                ProviderError::Element { status: None }
            })?;

        if element.status != "OK" {
            error!(element_status = %element.status, "distance calculation failed");
            return Err(ProviderError::Element {
                status: Some(element.status),
            });
        }

        let (Some(distance), Some(duration)) = (element.distance, element.duration) else {
            return Err(ProviderError::Decode(
                "element is missing distance or duration".to_string(),
            ));
        };

        let matrix = DistanceMatrix {
            distance_km: round_km(distance.value),
            distance_in_meters: distance.value,
            distance_text: distance.text,
            duration_text: duration.text,
            duration_in_seconds: duration.value,
        };
        info!(distance_km = matrix.distance_km, "distance matrix success");
        Ok(matrix)
    }
}

fn round_km(meters: u64) -> f64 {
    (meters as f64 / 1000.0 * 100.0).round() / 100.0
}
