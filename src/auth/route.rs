//! Which view a user may see.

use strum::{Display, EnumString};

use super::session::AuthUser;

/// Top-level views of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Route {
    Login,
    Signup,
    Chat,
}

/// Redirect `requested` according to who is signed in.
///
/// Signed-out users asking for the chat view go to login; signed-in users
/// asking for login or signup go to the chat view.
pub fn guard(requested: Route, user: &AuthUser) -> Route {
    match (requested, user) {
        (Route::Chat, AuthUser::Unauthenticated) => Route::Login,
        (Route::Login | Route::Signup, AuthUser::Authenticated { .. }) => Route::Chat,
        (route, _) => route,
    }
}
