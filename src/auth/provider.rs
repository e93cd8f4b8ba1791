use async_trait::async_trait;

use super::error::AuthError;
use super::session::{AuthSession, AuthUser, UserProfile};

/// Operations the client needs from a hosted auth service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current session, if one is stored and still valid.
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError>;

    /// Register a new account and return its profile. When the service
    /// issues a session right away it is stored; services that require email
    /// confirmation leave the user signed out.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserProfile, AuthError>;

    /// Exchange credentials for a session and remember it.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;

    /// End the current session. Always forgets the local copy.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Resolve the current user from [`AuthProvider::get_session`].
    async fn current_user(&self) -> Result<AuthUser, AuthError> {
        Ok(AuthUser::from_session(self.get_session().await?.as_ref()))
    }
}
