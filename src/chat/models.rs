use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ThreadId = String;

/// Title shown for a thread until its first message arrives
pub const DEFAULT_TITLE: &str = "New chat";

/// Maximum number of characters kept from the first message for a title
pub const TITLE_MAX_CHARS: usize = 30;

const TITLE_ELLIPSIS: &str = "...";

/// Who authored a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One turn in a thread. Fields are private so a message cannot change
/// after it has been created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    id: String,
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// A conversation: a title plus an append-only list of messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    id: ThreadId,
    title: String,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
}

impl Thread {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Append a message, deriving the title when it is the first one
    pub(crate) fn push(&mut self, message: Message) {
        if self.messages.is_empty() {
            self.title = derive_title(message.content());
        }
        self.messages.push(message);
    }
}

impl Default for Thread {
    fn default() -> Self {
        Self::new()
    }
}

/// Title for a thread whose first message is `content`
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}{}", head, TITLE_ELLIPSIS)
    } else {
        head
    }
}
