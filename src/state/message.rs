use crate::types::{ConversationMessage, ValidationResult, WireMessage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub thinking: Option<String>,
    pub query_type: Option<String>,
    pub validation: Option<ValidationResult>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            thinking: None,
            query_type: None,
            validation: None,
        }
    }

    /// Empty assistant placeholder that streamed snapshots replace.
    pub fn assistant_placeholder() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            thinking: None,
            query_type: None,
            validation: None,
        }
    }

    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            role: self.role.as_str().to_string(),
            content: self.content.clone(),
        }
    }

    /// Converts a stored message. Roles other than user/assistant (system
    /// prompts) are not part of the visible transcript.
    pub fn from_stored(stored: ConversationMessage) -> Option<Self> {
        let role = match stored.role.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => return None,
        };
        Some(Self {
            role,
            content: stored.content,
            thinking: stored.thinking.filter(|t| !t.is_empty()),
            query_type: None,
            validation: None,
        })
    }
}

/// Ordered messages. Only the last element may change, and only while it is
/// the open assistant message of an active stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
    open: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            open: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_open_message(&self) -> bool {
        self.open
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Appends the user turn and its open assistant placeholder.
    pub fn begin_exchange(&mut self, user_input: String) {
        self.messages.push(Message::user(user_input));
        self.messages.push(Message::assistant_placeholder());
        self.open = true;
    }

    /// Replaces the open message wholesale. Returns false when no message is
    /// open, leaving the transcript untouched.
    pub fn replace_open(&mut self, snapshot: Message) -> bool {
        if !self.open {
            return false;
        }
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant && snapshot.role == Role::Assistant => {
                *last = snapshot;
                true
            }
            _ => false,
        }
    }

    pub fn close_open(&mut self) {
        self.open = false;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.open = false;
    }
}
