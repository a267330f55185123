use super::common::collect_field_errors;
use crate::errors::{ApiError, FieldErrors};
use crate::geo::Coordinate;
use crate::{ApiResponse, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};
use utoipa::ToSchema;
use validator::Validate;

/// Body of `POST /distance-matrix`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "origin": {"lat": 6.1319, "lng": 1.2228},
    "destination": {"lat": 6.1725, "lng": 1.2314}
}))]
pub struct DistanceMatrixRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
}

/// Successful distance lookup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DistanceMatrixData {
    /// Kilometers, rounded to two decimals
    #[schema(example = 4.82)]
    pub distance: f64,
    pub distance_in_meters: u64,
    #[schema(example = "4.8 km")]
    pub distance_text: String,
    /// Human-readable travel time
    #[schema(example = "12 mins")]
    pub duration: String,
    pub duration_in_seconds: u64,
    pub origin: Coordinate,
    pub destination: Coordinate,
}

/// Computes road distance and travel time between two coordinates through
/// the mapping provider.
#[utoipa::path(
    post,
    path = "/api/v1/distance-matrix",
    request_body = DistanceMatrixRequest,
    responses(
        (status = 200, description = "Distance calculated", body = ApiResponse<DistanceMatrixData>),
        (status = 400, description = "Invalid request, provider status error or unusable element", body = crate::errors::ErrorResponse),
        (status = 500, description = "Missing API key, provider HTTP failure or internal error", body = crate::errors::ErrorResponse)
    ),
    tag = "distance"
)]
pub async fn calculate_distance_matrix(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<DistanceMatrixData>>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        error!(error = %rejection.body_text(), "distance matrix request body rejected");
        ApiError::invalid_field("body", rejection.body_text())
    })?;

    info!(body = %body, "distance matrix request");

    let request = parse_request(&body).map_err(|errors| {
        error!(errors = ?errors, "distance matrix validation error");
        ApiError::Validation(errors)
    })?;

    let matrix = state
        .maps
        .distance(&request.origin, &request.destination)
        .await
        .map_err(|err| ApiError::from_provider(err, !state.config.is_production()))?;

    Ok(Json(ApiResponse::success(DistanceMatrixData {
        distance: matrix.distance_km,
        distance_in_meters: matrix.distance_in_meters,
        distance_text: matrix.distance_text,
        duration: matrix.duration_text,
        duration_in_seconds: matrix.duration_in_seconds,
        origin: request.origin,
        destination: request.destination,
    })))
}

/// Checks presence, numeric type and range of both endpoints, collecting
/// every failure rather than stopping at the first.
fn parse_request(body: &Value) -> Result<DistanceMatrixRequest, FieldErrors> {
    let mut errors = FieldErrors::new();
    let origin = parse_point(body, "origin", &mut errors);
    let destination = parse_point(body, "destination", &mut errors);

    match (origin, destination) {
        (Some(origin), Some(destination)) if errors.is_empty() => Ok(DistanceMatrixRequest {
            origin,
            destination,
        }),
        _ => Err(errors),
    }
}

fn parse_point(body: &Value, side: &str, errors: &mut FieldErrors) -> Option<Coordinate> {
    let point = match body.get(side) {
        None | Some(Value::Null) => {
            add_error(errors, side, format!("The {} field is required.", side));
            return None;
        }
        Some(Value::Object(point)) => point,
        Some(_) => {
            add_error(errors, side, format!("The {} field must be an object.", side));
            return None;
        }
    };

    let lat = parse_number(point.get("lat"), &format!("{}.lat", side), errors);
    let lng = parse_number(point.get("lng"), &format!("{}.lng", side), errors);
    let coordinate = Coordinate::new(lat?, lng?);

    if let Err(range_errors) = coordinate.validate() {
        collect_field_errors(side, &range_errors, errors);
        return None;
    }
    Some(coordinate)
}

/// Accepts JSON numbers and numeric strings.
fn parse_number(value: Option<&Value>, key: &str, errors: &mut FieldErrors) -> Option<f64> {
    let parsed = match value {
        None | Some(Value::Null) => {
            add_error(errors, key, format!("The {} field is required.", key));
            return None;
        }
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed.filter(|n| n.is_finite()) {
        Some(number) => Some(number),
        None => {
            add_error(errors, key, format!("The {} field must be a number.", key));
            None
        }
    }
}

fn add_error(errors: &mut FieldErrors, key: &str, message: String) {
    errors.entry(key.to_string()).or_default().push(message);
}
