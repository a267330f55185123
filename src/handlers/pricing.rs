use super::common::validate_input;
use crate::errors::ServiceError;
use crate::services::{calculate_delivery_price, DistanceResult, PricingTiers};
use crate::{ApiResponse, ApiResult, AppState};
use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

pub const CURRENCY: &str = "FCFA";

/// Price request: either a known distance or two location strings.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "pickup": "https://www.google.com/maps?q=6.1319,1.2228",
    "dropoff": "6°10'21.0\"N 1°13'53.0\"E"
}))]
pub struct QuoteRequest {
    /// Distance already known by the caller, in kilometers
    pub distance_km: Option<f64>,
    /// Pickup location: map URL, DMS pair or decimal pair
    #[validate(length(min = 1, max = 2048))]
    pub pickup: Option<String>,
    /// Dropoff location, same formats as pickup
    #[validate(length(min = 1, max = 2048))]
    pub dropoff: Option<String>,
    /// Overrides the default price schedule
    #[validate]
    pub tiers: Option<PricingTiers>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuoteResponse {
    pub distance_km: f64,
    /// Present when the distance was computed from locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<DistanceResult>,
    pub price: Decimal,
    #[schema(example = "FCFA")]
    pub currency: String,
    pub tiers: PricingTiers,
}

/// Prices a delivery, computing the distance first when only locations are given.
#[utoipa::path(
    post,
    path = "/api/v1/pricing/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Price computed", body = ApiResponse<QuoteResponse>),
        (status = 400, description = "Invalid request or unparseable location", body = crate::errors::ErrorResponse)
    ),
    tag = "pricing"
)]
pub async fn quote_delivery(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequest>,
) -> ApiResult<QuoteResponse> {
    validate_input(&payload)?;
    let tiers = payload.tiers.unwrap_or_default();

    let (distance_km, distance) = match (payload.distance_km, payload.pickup, payload.dropoff) {
        (Some(km), _, _) => {
            if !km.is_finite() || km < 0.0 {
                return Err(ServiceError::ValidationError(
                    "distance_km must be a non-negative number".to_string(),
                ));
            }
            (km, None)
        }
        (None, Some(pickup), Some(dropoff)) => {
            let result = state
                .distance_service
                .calculate_distance_from_urls(&pickup, &dropoff)
                .await?;
            (result.distance_km, Some(result))
        }
        _ => {
            return Err(ServiceError::ValidationError(
                "Provide distance_km, or both pickup and dropoff".to_string(),
            ))
        }
    };

    let price = calculate_delivery_price(distance_km, Some(&tiers))?;

    Ok(Json(ApiResponse::success(QuoteResponse {
        distance_km,
        distance,
        price,
        currency: CURRENCY.to_string(),
        tiers,
    })))
}
