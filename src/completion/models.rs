use serde::{Deserialize, Serialize};

use crate::chat::{Message, Role};

/// A role/content pair as sent to the completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role(),
            content: message.content().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [WireMessage],
}

/// Either field may be present; anything else is treated as malformed
#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub message: Option<String>,
    pub error: Option<String>,
}
