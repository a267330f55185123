use crate::{ApiResponse, ApiResult, AppState};
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;
use utoipa::ToSchema;

/// Component health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Degraded,
}

/// Individual component health details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub message: String,
}

/// Full health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: String,
    pub environment: String,
    pub uptime_secs: u64,
    pub distance_provider: ComponentHealth,
}

/// Tracks application start time for uptime calculation
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time (call this on application startup)
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn get_uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

#[utoipa::path(
    get,
    path = "/api/v1/status",
    responses((status = 200, description = "Service metadata")),
    tag = "health"
)]
pub async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    Ok(Json(ApiResponse::success(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))))
}

/// Reports whether the service can reach its distance provider. Without an API
/// key the server still answers pricing quotes from estimates, so the overall
/// status is degraded rather than down.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Health report", body = ApiResponse<HealthResponse>)),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    let distance_provider = if state.maps.has_api_key() {
        ComponentHealth {
            status: ComponentStatus::Up,
            message: "API key configured".to_string(),
        }
    } else {
        ComponentHealth {
            status: ComponentStatus::Degraded,
            message: "API key not configured; distances are estimated".to_string(),
        }
    };

    Ok(Json(ApiResponse::success(HealthResponse {
        status: distance_provider.status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        uptime_secs: get_uptime_secs(),
        distance_provider,
    })))
}
