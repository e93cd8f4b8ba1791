//! Sends a user message and records the reply.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::generation::GenerationClient;
use crate::sanitize::sanitize;
use crate::session::{ChatEvent, SessionStore};
use crate::types::Message;

/// Shown in place of a reply when the generation service fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Which path [`MessageDispatcher::send_message`] took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing was recorded.
    Ignored,
    /// A sanitized reply was appended.
    Replied { conversation_id: String },
    /// The service failed and the fallback reply was appended.
    Failed { conversation_id: String },
}

impl SendOutcome {
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            Self::Ignored => None,
            Self::Replied { conversation_id } | Self::Failed { conversation_id } => {
                Some(conversation_id.as_str())
            }
        }
    }
}

/// Relays user messages to a [`GenerationClient`].
#[derive(Clone)]
pub struct MessageDispatcher {
    client: Arc<dyn GenerationClient>,
}

impl std::fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDispatcher").finish_non_exhaustive()
    }
}

impl MessageDispatcher {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self { client }
    }

    /// Record `text` as a user message in the active conversation (creating
    /// one if needed), ask the service for a reply, and record that reply.
    ///
    /// Never fails: service errors become a bot message flagged `is_error`.
    /// The reply goes to the conversation the send started in, even if the
    /// view switched conversations meanwhile.
    pub async fn send_message(&self, store: &mut SessionStore, text: &str) -> SendOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SendOutcome::Ignored;
        }

        let conversation_id = match store.active_id() {
            Some(id) => id.to_string(),
            None => store.create_conversation(),
        };

        store.append_message(&conversation_id, Message::user(trimmed));
        let is_first = store
            .get(&conversation_id)
            .is_some_and(|c| c.messages.len() == 1);
        if is_first {
            store.rename_conversation(&conversation_id, text);
        }
        persist(store);
        store.notify(ChatEvent::MessagesChanged);

        store.notify(ChatEvent::Typing(true));
        let result = self.client.generate(trimmed).await;
        store.notify(ChatEvent::Typing(false));

        let outcome = match result {
            Ok(body) => {
                let reply = sanitize(&body);
                debug!(conversation_id = %conversation_id, reply_chars = reply.chars().count(), "Received reply");
                store.append_message(&conversation_id, Message::bot(reply));
                SendOutcome::Replied {
                    conversation_id: conversation_id.clone(),
                }
            }
            Err(e) => {
                warn!(
                    conversation_id = %conversation_id,
                    category = %e.category(),
                    error = %e,
                    "Generation failed; appending fallback reply"
                );
                store.append_message(&conversation_id, Message::bot_error(FALLBACK_REPLY));
                SendOutcome::Failed {
                    conversation_id: conversation_id.clone(),
                }
            }
        };
        persist(store);
        store.notify(ChatEvent::MessagesChanged);
        outcome
    }
}

fn persist(store: &SessionStore) {
    if let Err(e) = store.save() {
        warn!(error = %e, "Failed to save session snapshot");
    }
}
