//! Convenience re-exports for common use.

pub use crate::app::ChatApp;
pub use crate::auth::{AuthProvider, AuthSession, AuthUser, GoTrueAuthProvider, Route};
pub use crate::config::ChatConfig;
pub use crate::dispatch::{MessageDispatcher, SendOutcome};
pub use crate::error::{ChatError, Result};
pub use crate::generation::{GenerationClient, HttpGenerationClient};
pub use crate::session::{ChatEvent, SessionStore};
pub use crate::storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use crate::types::{Conversation, ConversationSummary, Message, Role};
