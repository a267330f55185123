//! Per-user session state shared between the API client and its owner.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Route names that already are the login page; no redirect from those.
const LOGIN_ROUTES: [&str; 2] = ["auth-login", "template-login"];

/// One permission grant: `action` on `subject`. `manage` and `all` are wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityRule {
    pub action: String,
    pub subject: String,
}

impl AbilityRule {
    pub fn new(action: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            subject: subject.into(),
        }
    }

    pub fn allows(&self, action: &str, subject: &str) -> bool {
        (self.action == "manage" || self.action == action)
            && (self.subject == "all" || self.subject == subject)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    access_token: Option<String>,
    user_data: Option<Value>,
    ability_rules: Vec<AbilityRule>,
}

/// Access token, user profile and ability rules of the signed-in user.
///
/// Cloning yields another handle to the same session, so the client can clear
/// it on an authentication failure and the owner observes the change.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    state: Arc<RwLock<SessionState>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session already holding a token, as after a login.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState {
                access_token: Some(token.into()),
                ..SessionState::default()
            })),
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.access_token.clone()
    }

    /// Stores everything a successful login returns.
    pub async fn sign_in(&self, token: String, user_data: Value, ability_rules: Vec<AbilityRule>) {
        let mut state = self.state.write().await;
        state.access_token = Some(token);
        state.user_data = Some(user_data);
        state.ability_rules = ability_rules;
    }

    pub async fn user_data(&self) -> Option<Value> {
        self.state.read().await.user_data.clone()
    }

    /// Logged in means both a token and a user profile are present.
    pub async fn is_logged_in(&self) -> bool {
        let state = self.state.read().await;
        state.access_token.is_some() && state.user_data.is_some()
    }

    pub async fn can(&self, action: &str, subject: &str) -> bool {
        self.state
            .read()
            .await
            .ability_rules
            .iter()
            .any(|rule| rule.allows(action, subject))
    }

    /// Drops token, user data and ability rules together.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = SessionState::default();
    }
}

/// Where to send the user after their credentials were rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRedirect {
    pub route: &'static str,
    /// Path to come back to after login; absent for the root page
    pub to: Option<String>,
}

/// Redirect target for a user currently on `route_name` at `path`, or `None`
/// when they already are on a login page.
pub fn login_redirect(route_name: &str, path: &str) -> Option<LoginRedirect> {
    if LOGIN_ROUTES.contains(&route_name) {
        return None;
    }
    Some(LoginRedirect {
        route: LOGIN_ROUTES[0],
        to: (path != "/").then(|| path.to_string()),
    })
}

/// A request was rejected with 401 or 403. The session has already been
/// cleared when this is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    pub status: u16,
    pub path: String,
}

/// Callback invoked by the API client on authentication failures.
pub trait AuthFailureHandler: Send + Sync {
    fn on_auth_failure(&self, failure: &AuthFailure);
}

impl<F> AuthFailureHandler for F
where
    F: Fn(&AuthFailure) + Send + Sync,
{
    fn on_auth_failure(&self, failure: &AuthFailure) {
        self(failure)
    }
}
