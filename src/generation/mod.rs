//! Remote text-generation boundary.

pub mod http;

pub use http::HttpGenerationClient;

use async_trait::async_trait;

use crate::error::ChatError;

/// A service that turns a prompt into reply text.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Request a reply for `prompt`, returning the raw (unsanitized) body.
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;
}
