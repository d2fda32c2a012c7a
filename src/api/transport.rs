use super::error::{ApiError, ApiResult};
use crate::types::{ChatRequest, Conversation, ConversationMessage};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ApiError>> + Send>>;

/// Everything the chat client needs from the backend.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends `POST /chat` and hands back the raw response body.
    async fn open_chat_stream(&self, request: &ChatRequest) -> ApiResult<ByteStream>;

    async fn get_conversations(&self) -> ApiResult<Vec<Conversation>>;

    async fn get_conversation_messages(
        &self,
        conversation_id: &str,
    ) -> ApiResult<Vec<ConversationMessage>>;

    async fn delete_conversation(&self, conversation_id: &str) -> ApiResult<bool>;

    async fn save_api_key(&self, model: &str, key: &str) -> ApiResult<bool>;
}
