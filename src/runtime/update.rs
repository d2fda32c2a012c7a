use crate::api::ApiResult;
use crate::keys::KeySyncReport;
use crate::state::{SessionUpdate, StreamTicket};
use crate::types::{Conversation, ConversationMessage};

/// Results of background work, delivered to the mode on the runtime loop.
#[derive(Debug)]
pub enum UiUpdate {
    Session {
        ticket: StreamTicket,
        update: SessionUpdate,
    },
    ConversationsLoaded(ApiResult<Vec<Conversation>>),
    TranscriptLoaded {
        id: String,
        result: ApiResult<Vec<ConversationMessage>>,
    },
    ConversationDeleted {
        id: String,
        result: ApiResult<bool>,
    },
    KeySaved {
        model: String,
        pushed: bool,
    },
    KeysSynced(KeySyncReport),
}
