mod common;

use axum::http::{Method, StatusCode};
use common::{
    lome_request, mount_provider, provider_ok, response_json, TestApp, PROVIDER_PATH, TEST_API_KEY,
};
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, ResponseTemplate,
};

const ENDPOINT: &str = "/api/v1/distance-matrix";

#[tokio::test]
async fn returns_rounded_distance_and_echoes_coordinates() {
    let (app, server) = TestApp::with_provider().await;
    Mock::given(method("GET"))
        .and(path(PROVIDER_PATH))
        .and(query_param("origins", "6.1319,1.2228"))
        .and(query_param("destinations", "6.1725,1.2314"))
        .and(query_param("units", "metric"))
        .and(query_param("key", TEST_API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_ok(4817, 720)))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = app.json(Method::POST, ENDPOINT, Some(lome_request())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["distance"], 4.82);
    assert_eq!(data["distance_in_meters"], 4817);
    assert_eq!(data["distance_text"], "4.8 km");
    assert_eq!(data["duration"], "12 mins");
    assert_eq!(data["duration_in_seconds"], 720);
    assert_eq!(data["origin"], json!({"lat": 6.1319, "lng": 1.2228}));
    assert_eq!(data["destination"], json!({"lat": 6.1725, "lng": 1.2314}));
}

#[tokio::test]
async fn numeric_strings_are_accepted() {
    let (app, server) = TestApp::with_provider().await;
    mount_provider(&server, ResponseTemplate::new(200).set_body_json(provider_ok(1500, 240))).await;

    let (status, body) = app
        .json(
            Method::POST,
            ENDPOINT,
            Some(json!({
                "origin": {"lat": "6.1319", "lng": "1.2228"},
                "destination": {"lat": 6.1725, "lng": "1.2314"}
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["distance"], 1.5);
    assert_eq!(body["data"]["origin"]["lat"], 6.1319);
}

#[tokio::test]
async fn unversioned_alias_is_served() {
    let (app, server) = TestApp::with_provider().await;
    mount_provider(&server, ResponseTemplate::new(200).set_body_json(provider_ok(4817, 720))).await;

    let (status, body) = app
        .json(Method::POST, "/distance-matrix", Some(lome_request()))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["distance"], 4.82);
}

#[tokio::test]
async fn missing_fields_are_validation_errors() {
    let (app, server) = TestApp::with_provider().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = app
        .json(Method::POST, ENDPOINT, Some(json!({"origin": {"lat": 6.13}})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["details"]["destination"][0], "The destination field is required.");
    assert_eq!(body["details"]["origin.lng"][0], "The origin.lng field is required.");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn out_of_range_coordinates_never_reach_the_provider() {
    let (app, server) = TestApp::with_provider().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = app
        .json(
            Method::POST,
            ENDPOINT,
            Some(json!({
                "origin": {"lat": 91, "lng": 1.2},
                "destination": {"lat": 6.17, "lng": 1.23}
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(
        body["details"]["origin.lat"][0],
        "The origin.lat field must be between -90 and 90."
    );
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let (app, _server) = TestApp::with_provider().await;

    let (status, body) = response_json(app.post_raw(ENDPOINT, "{\"origin\": ").await).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["details"]["body"].is_array());
}

#[tokio::test]
async fn missing_api_key_is_reported_without_calling_the_provider() {
    let server = wiremock::MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = TestApp::new(&server.uri(), None);

    let (status, body) = app.json(Method::POST, ENDPOINT, Some(lome_request())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "GOOGLE_MAPS_API_KEY_NOT_SET");
}

#[tokio::test]
async fn provider_http_failure_carries_its_status_code() {
    let (app, server) = TestApp::with_provider().await;
    mount_provider(&server, ResponseTemplate::new(503)).await;

    let (status, body) = app.json(Method::POST, ENDPOINT, Some(lome_request())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "GOOGLE_MAPS_API_ERROR");
    assert_eq!(body["status_code"], 503);
}

#[tokio::test]
async fn unreachable_provider_omits_status_code() {
    // nothing listens on the discard port
    let app = TestApp::new("http://127.0.0.1:9", Some(TEST_API_KEY));

    let (status, body) = app.json(Method::POST, ENDPOINT, Some(lome_request())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "GOOGLE_MAPS_API_ERROR");
    assert!(body.get("status_code").is_none());
}

#[tokio::test]
async fn provider_status_error_is_a_bad_request() {
    let (app, server) = TestApp::with_provider().await;
    mount_provider(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "rows": []
        })),
    )
    .await;

    let (status, body) = app.json(Method::POST, ENDPOINT, Some(lome_request())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "GOOGLE_MAPS_API_ERROR");
    assert_eq!(body["message"], "Google Maps API error: REQUEST_DENIED");
    assert_eq!(body["details"], "The provided API key is invalid.");
}

#[tokio::test]
async fn element_failure_reports_the_element_status() {
    let (app, server) = TestApp::with_provider().await;
    mount_provider(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "rows": [{"elements": [{"status": "ZERO_RESULTS"}]}]
        })),
    )
    .await;

    let (status, body) = app.json(Method::POST, ENDPOINT, Some(lome_request())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "DISTANCE_CALCULATION_FAILED");
    assert_eq!(body["details"], "ZERO_RESULTS");
}

#[tokio::test]
async fn empty_rows_report_unknown_error() {
    let (app, server) = TestApp::with_provider().await;
    mount_provider(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"status": "OK", "rows": []})),
    )
    .await;

    let (status, body) = app.json(Method::POST, ENDPOINT, Some(lome_request())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "DISTANCE_CALCULATION_FAILED");
    assert_eq!(body["details"], "Unknown error");
}

#[tokio::test]
async fn undecodable_provider_body_is_an_internal_error() {
    let (app, server) = TestApp::with_provider().await;
    mount_provider(&server, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

    let (status, body) = app.json(Method::POST, ENDPOINT, Some(lome_request())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "INTERNAL_ERROR");
    // non-production environments expose the decode failure
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let (app, server) = TestApp::with_provider().await;
    mount_provider(&server, ResponseTemplate::new(200).set_body_json(provider_ok(4817, 720))).await;

    let response = app.request(Method::POST, ENDPOINT, Some(lome_request())).await;
    let header = response
        .headers()
        .get("x-request-id")
        .expect("request id header")
        .to_str()
        .unwrap()
        .to_string();

    let (_, body) = response_json(response).await;
    assert_eq!(body["meta"]["request_id"], header.as_str());
}
