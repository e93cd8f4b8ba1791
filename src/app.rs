//! Application state assembled once at startup.

use std::sync::Arc;

use crate::auth::AuthUser;
use crate::config::ChatConfig;
use crate::dispatch::{MessageDispatcher, SendOutcome};
use crate::error::Result;
use crate::generation::{GenerationClient, HttpGenerationClient};
use crate::session::SessionStore;
use crate::storage::KeyValueStore;

/// Everything a front end needs: the conversation store, the dispatcher,
/// and who is signed in.
#[derive(Debug)]
pub struct ChatApp {
    store: SessionStore,
    dispatcher: MessageDispatcher,
    user: AuthUser,
}

impl ChatApp {
    pub fn new(store: SessionStore, client: Arc<dyn GenerationClient>) -> Self {
        Self {
            store,
            dispatcher: MessageDispatcher::new(client),
            user: AuthUser::Unauthenticated,
        }
    }

    /// Open the stored sessions and connect to the configured generation endpoint.
    pub fn from_config(config: &ChatConfig, storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let client = HttpGenerationClient::from_config(config)?;
        Ok(Self::new(SessionStore::open(storage), Arc::new(client)))
    }

    pub fn with_user(mut self, user: AuthUser) -> Self {
        self.user = user;
        self
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn set_user(&mut self, user: AuthUser) {
        self.user = user;
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// Send `text` in the active conversation. See [`MessageDispatcher::send_message`].
    pub async fn send_message(&mut self, text: &str) -> SendOutcome {
        self.dispatcher.send_message(&mut self.store, text).await
    }
}
