pub mod api;

pub use api::{
    ApiKeyRequest, ChatRequest, ChunkSection, Conversation, ConversationMessage, ReasoningMode,
    StreamEvent, ValidationResult, WireMessage,
};
