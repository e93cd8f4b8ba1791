//! Client for a GoTrue-style hosted auth REST API.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::error::AuthError;
use super::provider::AuthProvider;
use super::session::{AuthSession, UserProfile, AUTH_SESSION_KEY};
use crate::config::ChatConfig;
use crate::storage::KeyValueStore;

/// Email/password auth against `<base_url>/auth/v1/*`.
///
/// The issued session is cached in a [`KeyValueStore`] so a restart keeps the
/// user signed in. Expired sessions are refreshed once with the stored
/// refresh token; if that fails the cached copy is dropped.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use chatdeck::auth::{AuthProvider, GoTrueAuthProvider};
/// use chatdeck::storage::MemoryKeyValueStore;
///
/// # async fn example() -> Result<(), chatdeck::auth::AuthError> {
/// let auth = GoTrueAuthProvider::new(
///     "https://project.example.co",
///     "public-anon-key",
///     Arc::new(MemoryKeyValueStore::new()),
/// );
/// let session = auth.sign_in_with_password("ada@example.com", "hunter2").await?;
/// println!("{}", session.user.email);
/// # Ok(())
/// # }
/// ```
pub struct GoTrueAuthProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    storage: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for GoTrueAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoTrueAuthProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"..")
            .finish()
    }
}

impl GoTrueAuthProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            storage,
        }
    }

    pub fn from_config(
        config: &ChatConfig,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, AuthError> {
        let base_url = config.auth_url.clone().ok_or_else(|| {
            AuthError::NotConfigured("set CHATDECK_AUTH_URL or auth_url in config.toml".to_string())
        })?;
        let api_key = config.auth_api_key.clone().unwrap_or_default();
        Ok(Self::new(base_url, api_key, storage))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url.trim_end_matches('/'))
    }

    fn load_stored(&self) -> Result<Option<AuthSession>, AuthError> {
        let raw = self
            .storage
            .get(AUTH_SESSION_KEY)
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(error = %e, "Discarding malformed stored auth session");
                self.clear_stored()?;
                Ok(None)
            }
        }
    }

    fn store_session(&self, session: &AuthSession) -> Result<(), AuthError> {
        let raw = serde_json::to_string(session)?;
        self.storage
            .set(AUTH_SESSION_KEY, &raw)
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    fn clear_stored(&self) -> Result<(), AuthError> {
        self.storage
            .remove(AUTH_SESSION_KEY)
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    async fn post(&self, url: &str, body: &Value, bearer: Option<&str>) -> Result<Value, AuthError> {
        let mut request = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .header("Accept", "application/json")
            .json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(status_to_error(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let url = format!("{}?grant_type=refresh_token", self.endpoint("token"));
        let payload = self
            .post(&url, &json!({ "refresh_token": refresh_token }), None)
            .await?;
        let session = parse_token_response(payload)?;
        self.store_session(&session)?;
        Ok(session)
    }
}

#[async_trait]
impl AuthProvider for GoTrueAuthProvider {
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let Some(session) = self.load_stored()? else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            debug!("Stored auth session expired without refresh token");
            self.clear_stored()?;
            return Ok(None);
        };
        match self.refresh(refresh_token).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(e) => {
                warn!(error = %e, "Auth session refresh failed");
                self.clear_stored()?;
                Ok(None)
            }
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserProfile, AuthError> {
        let body = json!({
            "email": email,
            "password": password,
            "data": { "display_name": display_name },
        });
        let payload = self.post(&self.endpoint("signup"), &body, None).await?;

        // With email confirmation off the service signs the user in directly.
        if payload.get("access_token").is_some() {
            let session = parse_token_response(payload)?;
            self.store_session(&session)?;
            return Ok(session.user);
        }
        let user: WireUser = serde_json::from_value(payload)?;
        user.into_profile()
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let url = format!("{}?grant_type=password", self.endpoint("token"));
        let payload = self
            .post(&url, &json!({ "email": email, "password": password }), None)
            .await?;
        let session = parse_token_response(payload)?;
        self.store_session(&session)?;
        debug!(email = %session.user.email, "Signed in");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        match self.load_stored() {
            Ok(Some(session)) => {
                if let Err(e) = self
                    .post(&self.endpoint("logout"), &json!({}), Some(session.access_token.as_str()))
                    .await
                {
                    warn!(error = %e, "Remote sign-out failed; clearing local session anyway");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not read stored auth session; clearing it"),
        }
        self.clear_stored()
    }
}

#[derive(Debug, Deserialize)]
struct WireTokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: WireUser,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: WireUserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct WireUserMetadata {
    #[serde(default)]
    display_name: Option<String>,
}

impl WireUser {
    fn into_profile(self) -> Result<UserProfile, AuthError> {
        let email = self
            .email
            .ok_or_else(|| AuthError::InvalidResponse("user has no email".to_string()))?;
        Ok(UserProfile {
            id: self.id,
            email,
            display_name: self.user_metadata.display_name,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct WireError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn parse_token_response(payload: Value) -> Result<AuthSession, AuthError> {
    let wire: WireTokenResponse = serde_json::from_value(payload)?;
    let expires_at = resolve_expiry(wire.expires_at, wire.expires_in, Utc::now());
    Ok(AuthSession {
        access_token: wire.access_token,
        refresh_token: wire.refresh_token,
        expires_at,
        user: wire.user.into_profile()?,
    })
}

fn resolve_expiry(
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    expires_at
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .or_else(|| expires_in.map(|secs| now + Duration::seconds(secs)))
}

fn status_to_error(status: StatusCode, body: &str) -> AuthError {
    let wire: WireError = serde_json::from_str(body).unwrap_or_default();
    let message = wire
        .msg
        .or(wire.error_description)
        .or(wire.message)
        .or_else(|| wire.error.clone())
        .unwrap_or_else(|| body.trim().to_string());
    let code = wire.error_code.or(wire.error);
    match (status.as_u16(), code.as_deref()) {
        (429, _) => AuthError::RateLimited,
        (_, Some("invalid_grant" | "invalid_credentials")) => AuthError::InvalidCredentials(message),
        (status, _) => AuthError::Rejected { status, message },
    }
}
