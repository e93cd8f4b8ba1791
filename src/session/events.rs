//! Change notifications emitted by the session store and dispatcher.

use std::sync::Arc;

/// What changed, so a view can redraw only the affected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatEvent {
    /// The conversation list (membership, titles, or active marker) changed.
    ConversationsChanged,
    /// The active conversation's messages changed, or a different one is active.
    MessagesChanged,
    /// A generation request started (`true`) or finished (`false`).
    Typing(bool),
}

/// Callback receiving chat events.
pub type ChatEventSink = Arc<dyn Fn(&ChatEvent) + Send + Sync>;
