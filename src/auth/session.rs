//! Authenticated session and the current-user sum type.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Storage key for the cached auth session.
pub const AUTH_SESSION_KEY: &str = "auth-session";

/// Sessions this close to expiry are treated as expired.
const EXPIRY_LEEWAY_SECS: i64 = 30;

/// Identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Tokens issued by the auth service for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: UserProfile,
}

impl AuthSession {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|exp| exp - Duration::seconds(EXPIRY_LEEWAY_SECS) <= now)
            .unwrap_or(false)
    }

    pub fn user(&self) -> AuthUser {
        AuthUser::Authenticated {
            email: self.user.email.clone(),
            display_name: self.user.display_name.clone(),
        }
    }
}

/// Who is using the client right now.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthUser {
    #[default]
    Unauthenticated,
    Authenticated {
        email: String,
        display_name: Option<String>,
    },
}

impl AuthUser {
    pub fn from_session(session: Option<&AuthSession>) -> Self {
        session.map(AuthSession::user).unwrap_or_default()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Name to greet the user with: display name, else email.
    pub fn greeting_name(&self) -> Option<&str> {
        match self {
            Self::Unauthenticated => None,
            Self::Authenticated {
                display_name: Some(name),
                ..
            } if !name.trim().is_empty() => Some(name.as_str()),
            Self::Authenticated { email, .. } => Some(email.as_str()),
        }
    }
}
