//! Conversation type and title handling.

use serde::{Deserialize, Serialize};

use super::message::Message;

/// Title given to a freshly created conversation.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Titles longer than this many characters are truncated.
pub const TITLE_MAX_CHARS: usize = 20;

/// A titled, ordered sequence of messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
        }
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

/// Read-only row for rendering the conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub message_count: usize,
    pub active: bool,
}

/// Shorten a raw title to [`TITLE_MAX_CHARS`] characters, appending `...`
/// only when something was cut.
pub fn truncate_title(raw: &str) -> String {
    match raw.char_indices().nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &raw[..cut]),
        None => raw.to_string(),
    }
}
