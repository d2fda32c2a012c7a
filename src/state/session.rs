use super::message::{Message, Role};
use crate::api::stream::EventStream;
use crate::api::ChatTransport;
use crate::types::{ChatRequest, ChunkSection, StreamEvent, ValidationResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// What a running session reports to the conversation controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The backend minted an id for a conversation that had none.
    ConversationAssigned(String),
    /// Reconciled state of the open assistant message after one event.
    Snapshot(Message),
    /// User-visible failure; transport errors are followed by `Finished`.
    Error(String),
    /// Sent exactly once per accepted run, on every exit path.
    Finished,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a response is already streaming")]
    Busy,
}

/// Accumulators for one exchange. Created per run and dropped with it.
#[derive(Debug, Default)]
pub struct StreamBuffers {
    thinking: String,
    answer: String,
    query_type: Option<String>,
    validation: Option<ValidationResult>,
    assigned_conversation: Option<String>,
}

impl StreamBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event. Returns the update that must travel alongside the
    /// snapshot, if the event carries one.
    pub fn apply(&mut self, event: StreamEvent, started_with: Option<&str>) -> Option<SessionUpdate> {
        match event {
            StreamEvent::Conversation { conversation_id } => {
                let known = started_with == Some(conversation_id.as_str())
                    || self.assigned_conversation.as_deref() == Some(conversation_id.as_str());
                if known {
                    return None;
                }
                self.assigned_conversation = Some(conversation_id.clone());
                Some(SessionUpdate::ConversationAssigned(conversation_id))
            }
            StreamEvent::Classification { query_type } => {
                self.query_type = Some(query_type);
                None
            }
            StreamEvent::Chunk { section, content } => {
                match section {
                    ChunkSection::Thinking => self.thinking.push_str(&content),
                    ChunkSection::Answer => self.answer.push_str(&content),
                }
                None
            }
            StreamEvent::Validation { result } => {
                self.validation = Some(result);
                None
            }
            StreamEvent::Error { message } => Some(SessionUpdate::Error(message)),
        }
    }

    pub fn snapshot(&self) -> Message {
        Message {
            role: Role::Assistant,
            content: self.answer.clone(),
            thinking: (!self.thinking.is_empty()).then(|| self.thinking.clone()),
            query_type: self.query_type.clone(),
            validation: self.validation.clone(),
        }
    }
}

/// Admits one run at a time. The permit releases the gate when dropped.
#[derive(Debug, Clone, Default)]
pub struct StreamGate {
    busy: Arc<AtomicBool>,
}

impl StreamGate {
    pub fn try_acquire(&self) -> Option<StreamPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| StreamPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct StreamPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for StreamPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Drives one `/chat` exchange at a time and publishes a snapshot after
/// every decoded event.
pub struct StreamSession {
    transport: Arc<dyn ChatTransport>,
    gate: StreamGate,
    idle_timeout: Option<Duration>,
}

impl StreamSession {
    pub fn new(transport: Arc<dyn ChatTransport>, idle_timeout: Option<Duration>) -> Self {
        Self {
            transport,
            gate: StreamGate::default(),
            idle_timeout,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.gate.is_busy()
    }

    pub async fn run(
        &self,
        request: ChatRequest,
        updates: &mpsc::UnboundedSender<SessionUpdate>,
    ) -> Result<(), SessionError> {
        let _permit = self.gate.try_acquire().ok_or(SessionError::Busy)?;
        let started_with = request.conversation_id.clone();
        let mut buffers = StreamBuffers::new();

        tracing::debug!(
            conversation_id = started_with.as_deref().unwrap_or("<new>"),
            history = request.messages.len(),
            "opening chat stream"
        );

        match self.transport.open_chat_stream(&request).await {
            Ok(bytes) => {
                let mut events = EventStream::new(bytes, self.idle_timeout);
                while let Some(next) = events.next_event().await {
                    match next {
                        Ok(event) => {
                            if let Some(update) = buffers.apply(event, started_with.as_deref()) {
                                emit_session_update(updates, update);
                            }
                            emit_session_update(updates, SessionUpdate::Snapshot(buffers.snapshot()));
                        }
                        Err(error) => {
                            tracing::error!(%error, "chat stream read failed");
                            emit_session_update(updates, SessionUpdate::Error(error.to_string()));
                            break;
                        }
                    }
                }
            }
            Err(error) => {
                tracing::error!(%error, "chat request failed");
                emit_session_update(updates, SessionUpdate::Error(error.to_string()));
            }
        }

        emit_session_update(updates, SessionUpdate::Finished);
        tracing::debug!("chat stream closed");
        Ok(())
    }
}

fn emit_session_update(updates: &mpsc::UnboundedSender<SessionUpdate>, update: SessionUpdate) {
    let _ = updates.send(update);
}
