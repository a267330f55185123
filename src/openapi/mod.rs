use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Delivery API",
        version = "1.0.0",
        description = r#"
# Delivery Admin API

Distance and pricing services backing the delivery admin dashboard.

## Distance matrix

`POST /api/v1/distance-matrix` proxies a single origin/destination lookup to the
mapping provider. The provider key never leaves the server.

## Pricing

Deliveries are billed in FCFA on a tiered schedule: 375 up to 1 km, 500 up to
5 km, 600 up to 6 km, then 100 per started kilometer.

## Error Handling

Every failure uses the same envelope:

```json
{
  "success": false,
  "message": "Invalid request data",
  "error": "VALIDATION_ERROR",
  "details": {"origin.lat": ["The origin.lat field is required."]},
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "distance", description = "Distance matrix proxy"),
        (name = "pricing", description = "Delivery price quotes"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::distance_matrix::calculate_distance_matrix,
        crate::handlers::pricing::quote_delivery,
        crate::handlers::health::api_status,
        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::geo::Coordinate,
            crate::handlers::distance_matrix::DistanceMatrixRequest,
            crate::handlers::distance_matrix::DistanceMatrixData,
            crate::handlers::pricing::QuoteRequest,
            crate::handlers::pricing::QuoteResponse,
            crate::handlers::health::HealthResponse,
            crate::services::PricingTiers,
            crate::services::DistanceResult,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

/// Serves the generated document at `/api-docs/openapi.json`.
pub fn openapi_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDocV1::openapi()) }),
    )
}
