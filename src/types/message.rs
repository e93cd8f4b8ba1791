//! Message types for conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// A single entry in a conversation.
///
/// Bot-authored content is stored already sanitized. `is_error` marks the
/// synthetic fallback appended when the generation service fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    /// Create a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    /// Create a bot message stamped with the current time.
    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    /// Create a bot message flagged as an error.
    pub fn bot_error(content: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::bot(content)
        }
    }
}
