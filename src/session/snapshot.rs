//! Persisted form of the session registry.
//!
//! The snapshot is a single JSON document
//! `{ "chats": { "<id>": Conversation, ... }, "currentChatId": "<id>" | null }`.
//! Conversations are kept in a `Vec` in memory; the map is written and read
//! in that order so display order survives a reload.

use serde::{Deserialize, Serialize};

use crate::types::Conversation;

/// Registry plus active pointer, saved and loaded as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(default, with = "ordered_chats")]
    pub chats: Vec<Conversation>,
    #[serde(default)]
    pub current_chat_id: Option<String>,
}

impl SessionSnapshot {
    /// Decode a stored snapshot and repair what would break store invariants:
    /// map keys override embedded ids, and an active id that names no
    /// conversation is dropped.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut snapshot: Self = serde_json::from_str(raw)?;
        if let Some(active) = snapshot.current_chat_id.as_deref() {
            if !snapshot.chats.iter().any(|c| c.id == active) {
                snapshot.current_chat_id = None;
            }
        }
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

mod ordered_chats {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserializer, Serializer};

    use crate::types::Conversation;

    pub fn serialize<S>(chats: &[Conversation], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(chats.iter().map(|c| (c.id.as_str(), c)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Conversation>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ChatsVisitor)
    }

    struct ChatsVisitor;

    impl<'de> Visitor<'de> for ChatsVisitor {
        type Value = Vec<Conversation>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of conversation id to conversation")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut chats: Vec<Conversation> = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((id, mut conversation)) = map.next_entry::<String, Conversation>()? {
                conversation.id = id;
                match chats.iter_mut().find(|c| c.id == conversation.id) {
                    Some(existing) => *existing = conversation,
                    None => chats.push(conversation),
                }
            }
            Ok(chats)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use pretty_assertions::assert_eq;

    #[test]
    fn keeps_document_order_on_decode() {
        let raw = r#"{
            "chats": {
                "zeta": {"id": "zeta", "title": "Z", "messages": []},
                "alpha": {"id": "alpha", "title": "A", "messages": []},
                "mid": {"id": "mid", "title": "M", "messages": []}
            },
            "currentChatId": "alpha"
        }"#;
        let snapshot = SessionSnapshot::from_json(raw).unwrap();
        let ids: Vec<&str> = snapshot.chats.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
        assert_eq!(snapshot.current_chat_id.as_deref(), Some("alpha"));
    }

    #[test]
    fn map_key_overrides_embedded_id() {
        let raw = r#"{"chats": {"key-id": {"id": "other", "title": "T"}}, "currentChatId": "key-id"}"#;
        let snapshot = SessionSnapshot::from_json(raw).unwrap();
        assert_eq!(snapshot.chats[0].id, "key-id");
        assert!(snapshot.chats[0].messages.is_empty());
        assert_eq!(snapshot.current_chat_id.as_deref(), Some("key-id"));
    }

    #[test]
    fn dangling_active_id_is_dropped() {
        let raw = r#"{"chats": {}, "currentChatId": "ghost"}"#;
        let snapshot = SessionSnapshot::from_json(raw).unwrap();
        assert!(snapshot.chats.is_empty());
        assert!(snapshot.current_chat_id.is_none());
    }

    #[test]
    fn encodes_browser_layout() {
        let mut conv = Conversation::new("c1");
        let mut msg = Message::user("hi");
        msg.timestamp = "2026-03-04T05:06:07Z".parse().unwrap();
        conv.messages.push(msg);
        let snapshot = SessionSnapshot {
            chats: vec![conv],
            current_chat_id: Some("c1".to_string()),
        };
        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "chats": {
                    "c1": {
                        "id": "c1",
                        "title": "New Chat",
                        "messages": [{
                            "role": "user",
                            "content": "hi",
                            "timestamp": "2026-03-04T05:06:07Z",
                            "isError": false
                        }]
                    }
                },
                "currentChatId": "c1"
            })
        );
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(SessionSnapshot::from_json("not json").is_err());
        assert!(SessionSnapshot::from_json(r#"{"chats": []}"#).is_err());
    }
}
