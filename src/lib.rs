//! Delivery API Library
//!
//! Distance-matrix proxy, coordinate parsing and tiered pricing for the
//! delivery admin dashboard, plus the client-side pieces the dashboard uses
//! to talk to it.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod client;
pub mod config;
pub mod errors;
pub mod geo;
pub mod handlers;
pub mod middleware_helpers;
pub mod navigation;
pub mod openapi;
pub mod providers;
pub mod reports;
pub mod services;
pub mod statuses;
pub mod tracing;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::ToSchema;

use crate::providers::{GoogleMapsClient, ProviderError};
use crate::services::DistanceService;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
    /// Provider client used by the distance-matrix endpoint
    pub maps: Arc<GoogleMapsClient>,
    /// In-process distance service backed by `maps`, used for price quotes
    pub distance_service: DistanceService,
}

impl AppState {
    pub fn new(config: config::AppConfig) -> Result<Self, ProviderError> {
        let maps = Arc::new(GoogleMapsClient::from_config(&config)?);
        let distance_service = DistanceService::new(maps.clone());
        Ok(Self {
            config: Arc::new(config),
            maps,
            distance_service,
        })
    }
}

// Common response wrappers
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Status and health endpoints
        .route("/status", get(handlers::health::api_status))
        .route("/health", get(handlers::health::health_check))
        .route(
            "/distance-matrix",
            post(handlers::distance_matrix::calculate_distance_matrix),
        )
        .route("/pricing/quote", post(handlers::pricing::quote_delivery))
}

/// Full application router with middleware applied.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    // leave headroom over the provider timeout so its error is reported, not ours
    let request_timeout = Duration::from_secs(state.config.provider_timeout_secs + 5);
    let body_limit = state.config.max_body_size;

    Router::new()
        .route("/", get(|| async { "delivery-api up" }))
        // Unversioned alias used by the dashboard's relative API base
        .route(
            "/distance-matrix",
            post(handlers::distance_matrix::calculate_distance_matrix),
        )
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::openapi_routes())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

fn cors_layer(config: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        ::tracing::info!("Using permissive CORS because explicit origins were not configured");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub mod prelude {
    pub use crate::client::{ApiClient, AuthFailureHandler, ClientConfig, SessionContext};
    pub use crate::errors::{ApiError, ServiceError};
    pub use crate::geo::{
        extract_coordinates_from_url, haversine_km, parse_coordinates, Coordinate,
    };
    pub use crate::services::{
        calculate_delivery_price, DistanceBackend, DistanceResult, DistanceService, PricingTiers,
    };
    pub use crate::statuses::{StatusCategory, StatusEntry, StatusRegistry};
    pub use crate::{app, ApiResponse, AppState};
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        assert!(response.success);
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn success_response_omits_empty_message() {
        let json = serde_json::to_value(ApiResponse::success(1)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 1);
        assert!(json.get("message").is_none());
    }
}
