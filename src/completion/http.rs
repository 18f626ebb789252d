use async_trait::async_trait;
use tracing::debug;

use super::models::{CompletionRequest, CompletionResponse, WireMessage};
use super::{CompletionClient, CompletionError};

/// Completion client speaking the `{messages} -> {message} | {error}` JSON contract
pub struct HttpCompletionClient {
    client: reqwest::Client,
    url: String,
}

impl HttpCompletionClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, messages: &[WireMessage]) -> Result<String, CompletionError> {
        let request = CompletionRequest { messages };

        let response = self
            .client
            .post(&self.url)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "completion endpoint responded");

        interpret_response(status, &body)
    }
}

/// Map a status code and raw body onto the reply or a typed error
pub fn interpret_response(status: u16, body: &str) -> Result<String, CompletionError> {
    let success = (200..300).contains(&status);

    let parsed = match serde_json::from_str::<CompletionResponse>(body) {
        Ok(parsed) => parsed,
        Err(err) if success => return Err(CompletionError::Malformed(err.to_string())),
        Err(_) => return Err(CompletionError::Status(status)),
    };

    if let Some(message) = parsed.error.filter(|m| !m.trim().is_empty()) {
        return Err(CompletionError::Server { status, message });
    }

    if !success {
        return Err(CompletionError::Status(status));
    }

    parsed
        .message
        .ok_or_else(|| CompletionError::Malformed("response has no `message` field".to_string()))
}
