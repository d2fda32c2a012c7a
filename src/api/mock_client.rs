use super::error::{ApiError, ApiResult};
use super::transport::{ByteStream, ChatTransport};
use crate::types::{ChatRequest, Conversation, ConversationMessage};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// One scripted piece of a `/chat` response body.
pub enum MockChunk {
    Data(String),
    ReadError(String),
}

#[derive(Default)]
struct MockState {
    chat_responses: VecDeque<Vec<MockChunk>>,
    chat_requests: Vec<ChatRequest>,
    conversations: Vec<Conversation>,
    stored_messages: HashMap<String, Vec<ConversationMessage>>,
    message_fetches: Vec<String>,
    deleted: Vec<String>,
    saved_keys: Vec<(String, String)>,
    rejected_key_models: Vec<String>,
}

/// Scripted backend that records every call it receives.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one chat response made of raw SSE text pieces.
    pub fn push_chat_response<S: Into<String>>(&self, pieces: Vec<S>) -> &Self {
        let chunks = pieces
            .into_iter()
            .map(|piece| MockChunk::Data(piece.into()))
            .collect();
        self.push_chat_chunks(chunks)
    }

    pub fn push_chat_chunks(&self, chunks: Vec<MockChunk>) -> &Self {
        self.state.lock().unwrap().chat_responses.push_back(chunks);
        self
    }

    pub fn store_conversation(&self, id: &str, title: &str, messages: Vec<ConversationMessage>) {
        let mut state = self.state.lock().unwrap();
        state.conversations.push(Conversation {
            id: id.to_string(),
            title: title.to_string(),
            created_at: None,
            updated_at: None,
        });
        state.stored_messages.insert(id.to_string(), messages);
    }

    pub fn reject_key_for(&self, model: &str) {
        self.state
            .lock()
            .unwrap()
            .rejected_key_models
            .push(model.to_string());
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.state.lock().unwrap().chat_requests.clone()
    }

    pub fn message_fetches(&self) -> Vec<String> {
        self.state.lock().unwrap().message_fetches.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn saved_keys(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().saved_keys.clone()
    }
}

pub fn stored_message(role: &str, content: &str) -> ConversationMessage {
    ConversationMessage {
        id: None,
        role: role.to_string(),
        content: content.to_string(),
        thinking: None,
        created_at: None,
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn open_chat_stream(&self, request: &ChatRequest) -> ApiResult<ByteStream> {
        let mut state = self.state.lock().unwrap();
        state.chat_requests.push(request.clone());
        let Some(chunks) = state.chat_responses.pop_front() else {
            return Err(ApiError::Connect {
                url: "mock://chat".to_string(),
                message: "no more responses configured".to_string(),
            });
        };

        let items: Vec<Result<Bytes, ApiError>> = chunks
            .into_iter()
            .map(|chunk| match chunk {
                MockChunk::Data(text) => Ok(Bytes::from(text)),
                MockChunk::ReadError(message) => Err(ApiError::Request {
                    url: "mock://chat".to_string(),
                    message,
                }),
            })
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }

    async fn get_conversations(&self) -> ApiResult<Vec<Conversation>> {
        Ok(self.state.lock().unwrap().conversations.clone())
    }

    async fn get_conversation_messages(
        &self,
        conversation_id: &str,
    ) -> ApiResult<Vec<ConversationMessage>> {
        let mut state = self.state.lock().unwrap();
        state.message_fetches.push(conversation_id.to_string());
        state
            .stored_messages
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                what: format!("conversation {conversation_id}"),
            })
    }

    async fn delete_conversation(&self, conversation_id: &str) -> ApiResult<bool> {
        let mut state = self.state.lock().unwrap();
        if state.stored_messages.remove(conversation_id).is_none() {
            return Err(ApiError::NotFound {
                what: format!("conversation {conversation_id}"),
            });
        }
        state.conversations.retain(|c| c.id != conversation_id);
        state.deleted.push(conversation_id.to_string());
        Ok(true)
    }

    async fn save_api_key(&self, model: &str, key: &str) -> ApiResult<bool> {
        let mut state = self.state.lock().unwrap();
        if state.rejected_key_models.iter().any(|m| m == model) {
            return Err(ApiError::Status {
                url: "mock://config/api-key".to_string(),
                status: 500,
            });
        }
        state.saved_keys.push((model.to_string(), key.to_string()));
        Ok(true)
    }
}
