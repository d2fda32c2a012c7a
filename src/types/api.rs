use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One prior turn sent back to the backend as conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningMode {
    #[default]
    Auto,
    Pro,
    Fast,
}

impl ReasoningMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Pro => "pro",
            Self::Fast => "fast",
        }
    }
}

impl fmt::Display for ReasoningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasoningMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "pro" => Ok(Self::Pro),
            "fast" => Ok(Self::Fast),
            other => Err(format!(
                "unknown reasoning mode '{other}': expected auto, pro or fast"
            )),
        }
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<WireMessage>,
    pub mode: ReasoningMode,
    pub stream: bool,
    pub include_thinking: bool,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Which accumulator a `chunk` record feeds. Anything other than
/// `"thinking"` is answer text.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(from = "String")]
pub enum ChunkSection {
    Thinking,
    Answer,
}

impl From<String> for ChunkSection {
    fn from(value: String) -> Self {
        if value == "thinking" {
            Self::Thinking
        } else {
            Self::Answer
        }
    }
}

/// One decoded `data:` record of the `/chat` response body.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Conversation {
        conversation_id: String,
    },
    Classification {
        query_type: String,
    },
    Chunk {
        section: ChunkSection,
        content: String,
    },
    Validation {
        result: ValidationResult,
    },
    Error {
        message: String,
    },
}

/// Summary row returned by `GET /conversations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Stored message returned by `GET /conversations/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /config/api-key`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApiKeyRequest {
    pub model: String,
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serializes_null_conversation_id() {
        let request = ChatRequest {
            messages: vec![WireMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
            mode: ReasoningMode::Pro,
            stream: true,
            include_thinking: false,
            conversation_id: None,
        };
        let serialized = serde_json::to_value(&request).unwrap();

        assert_eq!(serialized["mode"], "pro");
        assert_eq!(serialized["stream"], true);
        assert!(serialized["conversation_id"].is_null());
        assert_eq!(serialized["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_unknown_chunk_section_is_answer_text() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"chunk","section":"final","content":"x"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Chunk {
                section: ChunkSection::Answer,
                content: "x".into(),
            }
        );
    }

    #[test]
    fn test_validation_lists_default_to_empty() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"validation","result":{"is_valid":false}}"#).unwrap();
        match event {
            StreamEvent::Validation { result } => {
                assert!(!result.is_valid);
                assert!(result.warnings.is_empty());
                assert!(result.errors.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        assert!(serde_json::from_str::<StreamEvent>(r#"{"type":"usage","tokens":3}"#).is_err());
    }

    #[test]
    fn test_reasoning_mode_parses_case_insensitively() {
        assert_eq!(" FAST ".parse::<ReasoningMode>(), Ok(ReasoningMode::Fast));
        assert!("turbo".parse::<ReasoningMode>().is_err());
    }
}
