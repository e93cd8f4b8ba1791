//! Conversation registry, its persisted snapshot, and change notifications.

pub mod events;
pub mod snapshot;
pub mod store;

pub use events::{ChatEvent, ChatEventSink};
pub use snapshot::SessionSnapshot;
pub use store::{SessionStore, SESSIONS_KEY};
