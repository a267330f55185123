#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use delivery_api::{app, config::AppConfig, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_API_KEY: &str = "test-maps-key";
pub const PROVIDER_PATH: &str = "/maps/api/distancematrix/json";

/// Router wired to a configurable distance-matrix provider.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// App whose provider lives at `provider_base` and uses `api_key`.
    pub fn new(provider_base: &str, api_key: Option<&str>) -> Self {
        let cfg = AppConfig {
            environment: "test".to_string(),
            google_maps_api_key: api_key.map(str::to_string),
            google_maps_base_url: format!("{}{}", provider_base, PROVIDER_PATH),
            provider_timeout_secs: 2,
            ..AppConfig::default()
        };
        Self::with_config(cfg)
    }

    pub fn with_config(cfg: AppConfig) -> Self {
        let state = AppState::new(cfg).expect("failed to build test state");
        Self {
            router: app(state.clone()),
            state,
        }
    }

    /// App backed by a mock provider; the mock server is returned so the
    /// caller can register expectations on it.
    pub async fn with_provider() -> (Self, MockServer) {
        let server = MockServer::start().await;
        (Self::new(&server.uri(), Some(TEST_API_KEY)), server)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        self.send(builder.body(body).expect("failed to build request")).await
    }

    /// POST with a raw, possibly malformed, JSON body.
    pub async fn post_raw(&self, uri: &str, body: &'static str) -> axum::response::Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("failed to build request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a JSON request and returns status and decoded body.
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        response_json(self.request(method, uri, body).await).await
    }
}

pub async fn response_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = serde_json::from_slice(&bytes).expect("response body is not JSON");
    (status, value)
}

/// Lomé city centre to Tokoin, roughly 4.8 km by road.
pub fn lome_request() -> Value {
    json!({
        "origin": {"lat": 6.1319, "lng": 1.2228},
        "destination": {"lat": 6.1725, "lng": 1.2314}
    })
}

pub fn provider_ok(meters: u64, seconds: u64) -> Value {
    json!({
        "status": "OK",
        "origin_addresses": ["Lomé, Togo"],
        "destination_addresses": ["Tokoin, Lomé, Togo"],
        "rows": [{
            "elements": [{
                "status": "OK",
                "distance": {"text": format!("{:.1} km", meters as f64 / 1000.0), "value": meters},
                "duration": {"text": format!("{} mins", seconds / 60), "value": seconds}
            }]
        }]
    })
}

/// Registers a single provider answer on `server`.
pub async fn mount_provider(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(PROVIDER_PATH))
        .respond_with(template)
        .mount(server)
        .await;
}
