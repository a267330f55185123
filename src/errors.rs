use crate::geo::parser::SUPPORTED_FORMATS;
use crate::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

/// Field path (`origin.lat`) to the list of messages describing what is wrong with it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error envelope returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "success": false,
    "message": "Google Maps API error: REQUEST_DENIED",
    "error": "GOOGLE_MAPS_API_ERROR",
    "details": "The provided API key is invalid.",
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Human-readable error description
    pub message: String,
    /// Machine-readable error code
    #[schema(example = "VALIDATION_ERROR")]
    pub error: String,
    /// Field errors, provider message or element status depending on the code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// HTTP status returned by the upstream provider, when it answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    fn new(message: String, error: &str) -> Self {
        Self {
            success: false,
            message,
            error: error.to_string(),
            details: None,
            status_code: None,
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }

    fn with_status_code(mut self, status_code: Option<u16>) -> Self {
        self.status_code = status_code;
        self
    }
}

/// Which end of a delivery a location string describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationRole {
    Pickup,
    Dropoff,
}

impl fmt::Display for LocationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pickup => f.write_str("pickup"),
            Self::Dropoff => f.write_str("dropoff"),
        }
    }
}

/// Errors raised by the library side: parsing, distance calculation, API client.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Network or HTTP failure talking to the proxy or provider.
    #[error("Upstream transport error: {0}")]
    UpstreamTransport(String),

    /// The upstream answered but reported no usable result.
    #[error("Upstream error: {0}")]
    UpstreamLogical(String),

    #[error("Could not extract coordinates from {0} location. {}", SUPPORTED_FORMATS)]
    ParseFailure(LocationRole),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<crate::services::PricingError> for ServiceError {
    fn from(err: crate::services::PricingError) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::SerializationError(err.to_string())
        } else {
            ServiceError::UpstreamTransport(err.to_string())
        }
    }
}

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MissingApiKey => ServiceError::ConfigurationError(err.to_string()),
            ProviderError::Http { .. } | ProviderError::Transport(_) => {
                ServiceError::UpstreamTransport(err.to_string())
            }
            ProviderError::Status { .. } | ProviderError::Element { .. } => {
                ServiceError::UpstreamLogical(err.to_string())
            }
            ProviderError::Decode(message) => ServiceError::SerializationError(message),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) | Self::ParseFailure(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::UpstreamTransport(_) | Self::UpstreamLogical(_) => StatusCode::BAD_GATEWAY,
            Self::ConfigurationError(_) | Self::SerializationError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable code placed in the `error` field of the envelope.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ParseFailure(_) => "COORDINATE_PARSE_FAILED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::UpstreamTransport(_) | Self::UpstreamLogical(_) => "UPSTREAM_ERROR",
            Self::ConfigurationError(_) => "CONFIGURATION_ERROR",
            Self::SerializationError(_) | Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::SerializationError(_) | Self::InternalError(_) => {
                "Internal server error".to_string()
            }
            Self::ConfigurationError(_) => "Server configuration error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(self.response_message(), self.error_code());
        (status, Json(body)).into_response()
    }
}

/// Errors produced by the distance-matrix endpoint. Each variant maps to one
/// wire code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request data")]
    Validation(FieldErrors),

    #[error("Google Maps API key is not configured")]
    ApiKeyNotSet,

    #[error("Error while calling the Google Maps API")]
    ProviderHttp { status_code: Option<u16> },

    #[error("Google Maps API error: {status}")]
    ProviderStatus {
        status: String,
        error_message: Option<String>,
    },

    #[error("Unable to calculate the distance")]
    DistanceCalculationFailed { element_status: Option<String> },

    #[error("Error while calculating the distance")]
    Internal { details: Option<String> },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    /// Single-field validation failure.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    /// Maps a provider failure onto its wire error. Internal detail is only
    /// attached when `expose_details` is set (non-production).
    pub fn from_provider(err: ProviderError, expose_details: bool) -> Self {
        match err {
            ProviderError::MissingApiKey => ApiError::ApiKeyNotSet,
            ProviderError::Http { status } => ApiError::ProviderHttp {
                status_code: Some(status),
            },
            ProviderError::Transport(_) => ApiError::ProviderHttp { status_code: None },
            ProviderError::Status {
                status,
                error_message,
            } => ApiError::ProviderStatus {
                status,
                error_message,
            },
            ProviderError::Element { status } => ApiError::DistanceCalculationFailed {
                element_status: status,
            },
            ProviderError::Decode(message) => ApiError::Internal {
                details: expose_details.then_some(message),
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::ProviderStatus { .. }
            | Self::DistanceCalculationFailed { .. } => StatusCode::BAD_REQUEST,
            Self::ApiKeyNotSet | Self::ProviderHttp { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Service(err) => err.status_code(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ApiKeyNotSet => "GOOGLE_MAPS_API_KEY_NOT_SET",
            Self::ProviderHttp { .. } | Self::ProviderStatus { .. } => "GOOGLE_MAPS_API_ERROR",
            Self::DistanceCalculationFailed { .. } => "DISTANCE_CALCULATION_FAILED",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Service(err) => err.error_code(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            Self::Validation(errors) => Some(json!(errors)),
            Self::ProviderStatus { error_message, .. } => error_message.clone().map(Value::String),
            Self::DistanceCalculationFailed { element_status } => Some(Value::String(
                element_status
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            )),
            Self::Internal { details } => details.clone().map(Value::String),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Service(err) => err.response_message(),
            other => other.to_string(),
        };
        let status_code = match &self {
            Self::ProviderHttp { status_code } => *status_code,
            _ => None,
        };

        let body = ErrorResponse::new(message, self.error_code())
            .with_details(self.details())
            .with_status_code(status_code);

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> ErrorResponse {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn validation_error_carries_field_details() {
        let response = ApiError::invalid_field("origin.lat", "The origin.lat field is required.")
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let payload = body_of(response).await;
        assert!(!payload.success);
        assert_eq!(payload.error, "VALIDATION_ERROR");
        assert_eq!(
            payload.details,
            Some(json!({"origin.lat": ["The origin.lat field is required."]}))
        );
    }

    #[tokio::test]
    async fn error_response_includes_request_id() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("req-123"), async {
                ApiError::ApiKeyNotSet.into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let payload = body_of(response).await;
        assert_eq!(payload.error, "GOOGLE_MAPS_API_KEY_NOT_SET");
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
    }

    #[tokio::test]
    async fn provider_http_error_reports_upstream_status() {
        let response = ApiError::from_provider(ProviderError::Http { status: 503 }, false)
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let payload = body_of(response).await;
        assert_eq!(payload.error, "GOOGLE_MAPS_API_ERROR");
        assert_eq!(payload.status_code, Some(503));
    }

    #[tokio::test]
    async fn missing_element_status_defaults_to_unknown() {
        let response = ApiError::DistanceCalculationFailed {
            element_status: None,
        }
        .into_response();
        let payload = body_of(response).await;
        assert_eq!(payload.error, "DISTANCE_CALCULATION_FAILED");
        assert_eq!(payload.details, Some(json!("Unknown error")));
    }

    #[test]
    fn decode_failures_hide_details_in_production() {
        let hidden = ApiError::from_provider(ProviderError::Decode("eof".into()), false);
        assert!(matches!(hidden, ApiError::Internal { details: None }));

        let shown = ApiError::from_provider(ProviderError::Decode("eof".into()), true);
        assert!(matches!(shown, ApiError::Internal { details: Some(ref d) } if d == "eof"));
    }

    #[test]
    fn api_error_status_code_mapping() {
        assert_eq!(
            ApiError::Validation(FieldErrors::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ProviderStatus {
                status: "REQUEST_DENIED".into(),
                error_message: None
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ProviderHttp { status_code: None }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal { details: None }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn service_error_response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::InternalError("sensitive".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::ValidationError("lat out of range".into()).response_message(),
            "Validation error: lat out of range"
        );
    }

    #[test]
    fn parse_failure_names_side_and_formats() {
        let message = ServiceError::ParseFailure(LocationRole::Dropoff).to_string();
        assert!(message.starts_with("Could not extract coordinates from dropoff location."));
        assert!(message.contains("Google Maps URL"));
        assert!(message.contains("DMS format"));
        assert!(message.contains("Decimal"));
    }
}
