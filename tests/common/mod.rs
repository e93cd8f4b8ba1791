//! Shared test helpers: a scripted generation client and storage doubles.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use chatdeck::error::ChatError;
use chatdeck::generation::GenerationClient;
use chatdeck::session::{ChatEvent, SessionStore};
use chatdeck::storage::KeyValueStore;

/// A generation client that replays queued results and records prompts.
///
/// When the queue is empty it answers `"ok"`.
#[derive(Default)]
pub struct StubGenerationClient {
    replies: Mutex<VecDeque<Result<String, ChatError>>>,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply body.
    pub fn queue_reply(&self, body: &str) {
        self.replies.lock().unwrap().push_back(Ok(body.to_string()));
    }

    /// Queue a failure.
    pub fn queue_error(&self, error: ChatError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for StubGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }
}

/// Storage whose writes always fail; reads see nothing.
pub struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, ChatError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), ChatError> {
        Err(ChatError::Storage("quota exceeded".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), ChatError> {
        Err(ChatError::Storage("quota exceeded".to_string()))
    }
}

/// Subscribe a recorder to `store` and return the shared event log.
pub fn record_events(store: &mut SessionStore) -> Arc<Mutex<Vec<ChatEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink_log = log.clone();
    store.subscribe(Arc::new(move |event: &ChatEvent| {
        sink_log.lock().unwrap().push(*event);
    }));
    log
}
