//! Plain-text generation over a single HTTP GET.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::GenerationClient;
use crate::config::ChatConfig;
use crate::error::ChatError;

/// Sends `GET <endpoint>?<param>=<prompt>` and returns the response body.
///
/// Non-2xx responses are errors. There is no retry; one request per call.
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    client: reqwest::Client,
    endpoint: String,
    query_param: String,
    timeout: Duration,
}

impl HttpGenerationClient {
    pub fn new(
        endpoint: impl Into<String>,
        query_param: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            query_param: query_param.into(),
            timeout,
        })
    }

    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        Self::new(
            config.generation_url.clone(),
            config.query_param.clone(),
            config.request_timeout,
        )
    }

    fn classify(&self, error: reqwest::Error) -> ChatError {
        if error.is_timeout() {
            ChatError::Timeout(self.timeout.as_millis() as u64)
        } else {
            ChatError::Network(error)
        }
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        debug!(endpoint = %self.endpoint, prompt_chars = prompt.chars().count(), "Requesting generation");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[(self.query_param.as_str(), prompt)])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::api(status.as_u16(), body));
        }

        response.text().await.map_err(|e| self.classify(e))
    }
}
