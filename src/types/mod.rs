//! Core chat types: conversations and the messages they own.

pub mod conversation;
pub mod message;

pub use conversation::{truncate_title, Conversation, ConversationSummary, DEFAULT_TITLE, TITLE_MAX_CHARS};
pub use message::{Message, Role};
