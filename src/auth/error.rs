use thiserror::Error;

/// Normalized authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("Request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Rate limited")]
    RateLimited,
    #[error("Auth service not configured: {0}")]
    NotConfigured(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
