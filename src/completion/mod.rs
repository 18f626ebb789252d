mod http;
mod models;

pub use http::{interpret_response, HttpCompletionClient};
pub use models::WireMessage;

use async_trait::async_trait;
use thiserror::Error;

/// Text shown when the endpoint gives no usable explanation
pub const FALLBACK_ERROR: &str = "Failed to get a response. Please try again.";

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request to completion endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion endpoint returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("completion endpoint returned status {0}")]
    Status(u16),
    #[error("malformed response from completion endpoint: {0}")]
    Malformed(String),
}

impl CompletionError {
    /// Text for the user-facing notification
    pub fn user_message(&self) -> String {
        match self {
            CompletionError::Server { message, .. } => message.clone(),
            _ => FALLBACK_ERROR.to_string(),
        }
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the full history and return the assistant's reply
    async fn complete(&self, messages: &[WireMessage]) -> Result<String, CompletionError>;
}
