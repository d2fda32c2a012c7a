use super::super::message::{Message, Transcript};
use super::{ConversationController, ConversationSlot, Effect, IdentityChange};
use crate::api::ApiError;
use crate::types::ConversationMessage;

impl ConversationController {
    pub fn transition(&mut self, change: IdentityChange) -> Vec<Effect> {
        match change {
            IdentityChange::NewChat => {
                self.detach_active();
                self.slot = ConversationSlot::Unsaved;
                self.transcript.clear();
                self.loading = None;
                self.error = None;
                Vec::new()
            }
            IdentityChange::Navigate(id) => self.navigate(id),
            IdentityChange::ServerAssigned(id) => self.assign_server_identity(id),
            IdentityChange::Deleted(id) => {
                if self.slot.id() != Some(id.as_str()) {
                    return vec![Effect::RefreshConversations];
                }
                self.detach_active();
                self.slot = ConversationSlot::Unsaved;
                self.transcript.clear();
                self.loading = None;
                vec![Effect::RefreshConversations]
            }
        }
    }

    /// Navigation is the only transition that reloads from the store.
    fn navigate(&mut self, id: String) -> Vec<Effect> {
        if let Some(active) = self.active.as_mut() {
            if active.is_attached() {
                if self.slot.id() == Some(id.as_str()) && !self.transcript.is_empty() {
                    return Vec::new();
                }
            } else if active.conversation.as_deref() == Some(id.as_str()) {
                // Back to a conversation that is still streaming in the
                // background: take its live transcript instead of the stored one.
                if let Some(live) = active.detached.take() {
                    self.transcript = live;
                    self.slot = ConversationSlot::Bound(id);
                    self.loading = None;
                    self.error = None;
                    return Vec::new();
                }
            }
        }

        self.detach_active();
        self.slot = ConversationSlot::Bound(id.clone());
        self.transcript.clear();
        self.loading = Some(id.clone());
        self.error = None;
        vec![Effect::ReloadTranscript(id)]
    }

    /// Installs stored messages. Returns false, changing nothing, when the
    /// result is for a conversation the user has since left.
    pub fn apply_transcript_loaded(&mut self, id: &str, stored: Vec<ConversationMessage>) -> bool {
        if self.loading.as_deref() != Some(id) || self.slot.id() != Some(id) {
            tracing::debug!(conversation_id = id, "discarding stale transcript load");
            return false;
        }
        self.loading = None;
        self.transcript =
            Transcript::from_messages(stored.into_iter().filter_map(Message::from_stored).collect());
        true
    }

    pub fn apply_transcript_load_failed(&mut self, id: &str, error: &ApiError) {
        if self.loading.as_deref() != Some(id) {
            return;
        }
        self.loading = None;
        if error.is_not_found() {
            self.slot = ConversationSlot::Unsaved;
            self.error = Some(format!("Conversation {id} no longer exists"));
        } else {
            self.error = Some(format!("Failed to load conversation: {error}"));
        }
    }
}
