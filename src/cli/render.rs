//! Plain-text views of session snapshots.

use chrono::Local;

use crate::auth::AuthUser;
use crate::types::{ConversationSummary, Message, Role};

/// Numbered conversation list, active entry marked with `*`.
pub fn conversation_list(rows: &[ConversationSummary]) -> String {
    if rows.is_empty() {
        return "No conversations yet. Type a message or /new to start one.\n".to_string();
    }
    let mut out = String::new();
    for (index, row) in rows.iter().enumerate() {
        let marker = if row.active { '*' } else { ' ' };
        let noun = if row.message_count == 1 { "message" } else { "messages" };
        out.push_str(&format!(
            "{marker} {:>2}. {} ({} {noun})\n",
            index + 1,
            row.title,
            row.message_count
        ));
    }
    out
}

/// One message line, e.g. `[14:02] you: hello`.
pub fn message_line(message: &Message) -> String {
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    let who = match (message.role, message.is_error) {
        (Role::User, _) => "you",
        (Role::Bot, false) => "bot",
        (Role::Bot, true) => "bot (error)",
    };
    format!("[{time}] {who}: {}\n", message.content)
}

/// Title header followed by every message.
pub fn transcript(title: Option<&str>, messages: &[Message]) -> String {
    let Some(title) = title else {
        return "No active conversation.\n".to_string();
    };
    let mut out = format!("== {title} ==\n");
    if messages.is_empty() {
        out.push_str("(empty)\n");
    }
    for message in messages {
        out.push_str(&message_line(message));
    }
    out
}

pub fn greeting(user: &AuthUser) -> String {
    match user.greeting_name() {
        Some(name) => format!("Signed in as {name}. Type /help for commands.\n"),
        None => "Not signed in. Type /help for commands.\n".to_string(),
    }
}
