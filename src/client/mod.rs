//! HTTP client for the delivery API, as used by the admin dashboard.

pub mod session;

pub use session::{
    login_redirect, AbilityRule, AuthFailure, AuthFailureHandler, LoginRedirect, SessionContext,
};

use crate::errors::ServiceError;
use crate::geo::Coordinate;
use crate::services::{BackendDistance, DistanceBackend};
use async_trait::async_trait;
use reqwest::{header, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Environment variable overriding [`ClientConfig::base_url`].
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults, with the base URL taken from `API_BASE_URL` when set.
    pub fn from_env() -> Self {
        match env::var(API_BASE_URL_ENV) {
            Ok(base) if !base.trim().is_empty() => Self::new(base.trim()),
            _ => Self::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Envelope every endpoint answers with; only the parts the client reads.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

/// Authenticated JSON client. Attaches the session's bearer token to every
/// request and clears the session on 401/403.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionContext,
    on_auth_failure: Option<Arc<dyn AuthFailureHandler>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: SessionContext) -> Result<Self, ServiceError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ServiceError::ConfigurationError(format!(
                "invalid API base URL {}: {}",
                config.base_url, e
            ))
        })?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::ConfigurationError(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            session,
            on_auth_failure: None,
        })
    }

    pub fn with_auth_failure_handler(mut self, handler: Arc<dyn AuthFailureHandler>) -> Self {
        self.on_auth_failure = Some(handler);
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ServiceError> {
        let builder = self.http.get(self.endpoint(path)).query(query);
        self.send(path, builder).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.http.post(self.endpoint(path)).json(body);
        self.send(path, builder).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let mut builder = builder.header(header::ACCEPT, "application/json");
        if let Some(token) = self.session.access_token().await {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!(path, status = status.as_u16(), "API response");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(path, status = status.as_u16(), "authentication error, clearing session");
            self.session.clear().await;
            if let Some(handler) = &self.on_auth_failure {
                handler.on_auth_failure(&AuthFailure {
                    status: status.as_u16(),
                    path: path.to_string(),
                });
            }
            return Err(ServiceError::Unauthorized(format!(
                "{} returned {}",
                path,
                status.as_u16()
            )));
        }

        if !status.is_success() {
            return Err(ServiceError::UpstreamTransport(format!(
                "{} returned {}",
                path,
                status.as_u16()
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl DistanceBackend for ApiClient {
    async fn distance_matrix(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<BackendDistance, ServiceError> {
        let body = json!({ "origin": origin, "destination": destination });
        let envelope: Envelope<BackendDistance> = self.post_json("/distance-matrix", &body).await?;

        match envelope {
            Envelope {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            Envelope { message, .. } => Err(ServiceError::UpstreamLogical(
                message.unwrap_or_else(|| "distance-matrix returned no data".to_string()),
            )),
        }
    }
}
