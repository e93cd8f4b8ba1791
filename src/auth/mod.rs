//! Authentication boundary: sessions, sign-up/in/out, and route guarding.

pub mod error;
pub mod gotrue;
pub mod provider;
pub mod route;
pub mod session;

pub use error::AuthError;
pub use gotrue::GoTrueAuthProvider;
pub use provider::AuthProvider;
pub use route::{guard, Route};
pub use session::{AuthSession, AuthUser, UserProfile, AUTH_SESSION_KEY};
