//! chatdeck: a terminal chat client for a text-generation endpoint.
//!
//! Conversations live in a [`session::SessionStore`] persisted through a
//! pluggable [`storage::KeyValueStore`]. Sending a message goes through the
//! [`dispatch::MessageDispatcher`], which asks a
//! [`generation::GenerationClient`] for a reply, cleans it with
//! [`sanitize::sanitize`], and records it in the conversation. Accounts are
//! handled by an [`auth::AuthProvider`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatdeck::prelude::*;
//!
//! # async fn example() -> chatdeck::error::Result<()> {
//! let config = ChatConfig::load()?;
//! let mut app = ChatApp::from_config(&config, Arc::new(MemoryKeyValueStore::new()))?;
//! app.send_message("Hello!").await;
//! for message in app.store().active_messages() {
//!     println!("{}: {}", message.role, message.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod generation;
pub mod prelude;
pub mod sanitize;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
