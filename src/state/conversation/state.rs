use super::super::message::Transcript;
use crate::types::{ChatRequest, ReasoningMode};

/// Which stored conversation the visible transcript belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConversationSlot {
    /// Not saved yet; the backend assigns an id on the first exchange.
    #[default]
    Unsaved,
    Bound(String),
}

impl ConversationSlot {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Unsaved => None,
            Self::Bound(id) => Some(id),
        }
    }
}

/// Every way the conversation identity can change. The variant says who is
/// changing it, so the controller never has to guess whether a new id came
/// from the user or from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityChange {
    NewChat,
    Navigate(String),
    ServerAssigned(String),
    Deleted(String),
}

/// Follow-up work the caller performs after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the stored messages of this conversation into the transcript.
    ReloadTranscript(String),
    /// Re-read the conversation list. Never touches the transcript.
    RefreshConversations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    pub mode: ReasoningMode,
    pub include_thinking: bool,
}

/// Identifies the stream an update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamTicket(pub(super) u64);

impl StreamTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// An accepted send, ready to hand to the stream session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub ticket: StreamTicket,
    pub request: ChatRequest,
}

pub(super) struct ActiveStream {
    pub(super) ticket: StreamTicket,
    pub(super) conversation: Option<String>,
    /// Set once the user moved away from the stream's transcript. Updates
    /// keep landing here instead of the visible transcript.
    pub(super) detached: Option<Transcript>,
}

impl ActiveStream {
    pub(super) fn is_attached(&self) -> bool {
        self.detached.is_none()
    }
}

/// Owner of the conversation identity and the visible transcript.
#[derive(Default)]
pub struct ConversationController {
    pub(super) slot: ConversationSlot,
    pub(super) transcript: Transcript,
    pub(super) active: Option<ActiveStream>,
    pub(super) loading: Option<String>,
    pub(super) error: Option<String>,
    pub(super) next_ticket: u64,
}

impl ConversationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self) -> &ConversationSlot {
        &self.slot
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.slot.id()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// True while any stream is open, attached to the visible transcript
    /// or not. Sending is refused until it finishes.
    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    /// True while the visible transcript is the one the open stream writes to.
    pub fn is_streaming_here(&self) -> bool {
        self.active.as_ref().is_some_and(ActiveStream::is_attached)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub(super) fn detach_active(&mut self) {
        if let Some(active) = self.active.as_mut() {
            if active.detached.is_none() {
                active.detached = Some(std::mem::take(&mut self.transcript));
            }
        }
    }
}
