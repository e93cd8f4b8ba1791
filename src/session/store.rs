//! In-memory conversation registry backed by a key-value store.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::events::{ChatEvent, ChatEventSink};
use super::snapshot::SessionSnapshot;
use crate::error::Result;
use crate::storage::KeyValueStore;
use crate::types::{truncate_title, Conversation, ConversationSummary, Message};

/// Storage key holding the serialized registry.
pub const SESSIONS_KEY: &str = "chatSessions";

/// Authoritative collection of conversations plus the active pointer.
///
/// Every mutating operation saves the full snapshot and notifies
/// subscribers. Operations naming an unknown id are no-ops that return
/// `false`.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use chatdeck::session::SessionStore;
/// use chatdeck::storage::MemoryKeyValueStore;
///
/// let mut store = SessionStore::open(Arc::new(MemoryKeyValueStore::new()));
/// let id = store.create_conversation();
/// assert_eq!(store.active_id(), Some(id.as_str()));
/// ```
pub struct SessionStore {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    storage: Arc<dyn KeyValueStore>,
    storage_key: String,
    sinks: Vec<ChatEventSink>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("conversations", &self.conversations.len())
            .field("active_id", &self.active_id)
            .field("storage_key", &self.storage_key)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl SessionStore {
    /// Create a store over `storage` and load whatever snapshot it holds.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::open_with_key(storage, SESSIONS_KEY)
    }

    /// Like [`SessionStore::open`], with a custom storage key.
    pub fn open_with_key(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let mut store = Self {
            conversations: Vec::new(),
            active_id: None,
            storage,
            storage_key: key.into(),
            sinks: Vec::new(),
        };
        store.load();
        store
    }

    /// Register a change listener.
    pub fn subscribe(&mut self, sink: ChatEventSink) {
        self.sinks.push(sink);
    }

    /// Deliver `event` to every subscriber.
    pub fn notify(&self, event: ChatEvent) {
        for sink in &self.sinks {
            sink(&event);
        }
    }

    /// Replace in-memory state with the stored snapshot.
    ///
    /// Missing, unreadable, or malformed data resets to an empty registry
    /// with no active conversation.
    pub fn load(&mut self) {
        let snapshot = match self.storage.get(&self.storage_key) {
            Ok(Some(raw)) => match SessionSnapshot::from_json(&raw) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(key = %self.storage_key, error = %e, "Discarding malformed session snapshot");
                    SessionSnapshot::default()
                }
            },
            Ok(None) => SessionSnapshot::default(),
            Err(e) => {
                warn!(key = %self.storage_key, error = %e, "Failed to read session snapshot");
                SessionSnapshot::default()
            }
        };
        debug!(
            conversations = snapshot.chats.len(),
            active = ?snapshot.current_chat_id,
            "Loaded session snapshot"
        );
        self.conversations = snapshot.chats;
        self.active_id = snapshot.current_chat_id;
    }

    /// Write the registry and active pointer as one snapshot.
    pub fn save(&self) -> Result<()> {
        let raw = self.snapshot().to_json()?;
        self.storage.set(&self.storage_key, &raw)
    }

    /// Current state as a detached snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            chats: self.conversations.clone(),
            current_chat_id: self.active_id.clone(),
        }
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!(key = %self.storage_key, error = %e, "Failed to save session snapshot");
        }
    }

    fn next_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Start a new empty conversation and make it active.
    pub fn create_conversation(&mut self) -> String {
        let id = self.next_id();
        self.conversations.push(Conversation::new(id.clone()));
        self.active_id = Some(id.clone());
        debug!(conversation_id = %id, "Created conversation");
        self.persist();
        self.notify(ChatEvent::ConversationsChanged);
        self.notify(ChatEvent::MessagesChanged);
        id
    }

    /// Remove a conversation. If it was active, the first remaining one
    /// becomes active, or none when the registry is empty.
    pub fn delete_conversation(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.conversations.remove(index);
        if self.active_id.as_deref() == Some(id) {
            self.active_id = self.conversations.first().map(|c| c.id.clone());
        }
        debug!(conversation_id = %id, active = ?self.active_id, "Deleted conversation");
        self.persist();
        self.notify(ChatEvent::ConversationsChanged);
        self.notify(ChatEvent::MessagesChanged);
        true
    }

    /// Set a conversation's title, truncated for display.
    pub fn rename_conversation(&mut self, id: &str, raw_title: &str) -> bool {
        let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        conversation.title = truncate_title(raw_title);
        self.persist();
        self.notify(ChatEvent::ConversationsChanged);
        true
    }

    /// Append to a conversation's messages. Does not save.
    pub fn append_message(&mut self, id: &str, message: Message) -> bool {
        match self.conversations.iter_mut().find(|c| c.id == id) {
            Some(conversation) => {
                conversation.messages.push(message);
                true
            }
            None => false,
        }
    }

    /// Make `id` the active conversation. Unknown ids leave the pointer alone.
    pub fn select_conversation(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.active_id = Some(id.to_string());
        self.persist();
        self.notify(ChatEvent::ConversationsChanged);
        self.notify(ChatEvent::MessagesChanged);
        true
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    /// Messages of the active conversation, empty when none is active.
    pub fn active_messages(&self) -> &[Message] {
        self.active_conversation()
            .map(|c| c.messages.as_slice())
            .unwrap_or(&[])
    }

    pub fn active_title(&self) -> Option<&str> {
        self.active_conversation().map(|c| c.title.as_str())
    }

    /// Conversations in display order.
    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.conversations
            .iter()
            .map(|c| ConversationSummary {
                id: c.id.clone(),
                title: c.title.clone(),
                message_count: c.messages.len(),
                active: self.active_id.as_deref() == Some(c.id.as_str()),
            })
            .collect()
    }

    /// Id of the conversation at `index` in display order.
    pub fn id_at(&self, index: usize) -> Option<&str> {
        self.conversations.get(index).map(|c| c.id.as_str())
    }
}
