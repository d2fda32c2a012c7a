use super::super::message::Transcript;
use super::super::session::SessionUpdate;
use super::{
    ActiveStream, ConversationController, ConversationSlot, Effect, IdentityChange, PendingSend,
    SendOptions, StreamTicket,
};
use crate::types::{ChatRequest, WireMessage};

impl ConversationController {
    /// Optimistic send. Appends the user turn and an open assistant message
    /// before any network activity and returns the request to stream.
    ///
    /// Returns `None`, changing nothing, for blank input, while a stream is
    /// open, or while a transcript load is pending. Non-blank input is kept
    /// as typed, leading indentation included.
    pub fn begin_send(&mut self, input: &str, options: SendOptions) -> Option<PendingSend> {
        if !self.can_send(input) {
            return None;
        }

        self.error = None;
        let mut messages: Vec<WireMessage> =
            self.transcript.messages().iter().map(|m| m.to_wire()).collect();
        messages.push(WireMessage {
            role: "user".to_string(),
            content: input.to_string(),
        });
        self.transcript.begin_exchange(input.to_string());

        let ticket = StreamTicket(self.next_ticket);
        self.next_ticket += 1;
        let conversation_id = self.slot.id().map(str::to_string);
        self.active = Some(ActiveStream {
            ticket,
            conversation: conversation_id.clone(),
            detached: None,
        });

        Some(PendingSend {
            ticket,
            request: ChatRequest {
                messages,
                mode: options.mode,
                stream: true,
                include_thinking: options.include_thinking,
                conversation_id,
            },
        })
    }

    pub fn can_send(&self, input: &str) -> bool {
        !input.trim().is_empty() && !self.is_streaming() && !self.is_loading()
    }

    /// Folds one session update into whichever transcript the stream owns.
    /// Updates for a stream that is no longer active are dropped.
    pub fn apply_session_update(&mut self, ticket: StreamTicket, update: SessionUpdate) -> Vec<Effect> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        if active.ticket != ticket {
            tracing::debug!(ticket = ticket.value(), "dropping update from stale stream");
            return Vec::new();
        }

        match update {
            SessionUpdate::ConversationAssigned(id) => {
                self.transition(IdentityChange::ServerAssigned(id))
            }
            SessionUpdate::Snapshot(message) => {
                stream_target(active, &mut self.transcript).replace_open(message);
                Vec::new()
            }
            SessionUpdate::Error(message) => {
                if active.is_attached() {
                    self.error = Some(message);
                } else {
                    tracing::warn!(error = %message, "error from background stream");
                }
                Vec::new()
            }
            SessionUpdate::Finished => {
                stream_target(active, &mut self.transcript).close_open();
                self.active = None;
                Vec::new()
            }
        }
    }

    /// Unsaved -> Bound for the conversation the stream started. Does not
    /// reload: the transcript already holds the streamed content.
    pub(super) fn assign_server_identity(&mut self, id: String) -> Vec<Effect> {
        let Some(active) = self.active.as_mut() else {
            tracing::warn!(conversation_id = %id, "server identity without an open stream");
            return Vec::new();
        };
        if active.conversation.is_some() {
            tracing::warn!(conversation_id = %id, "ignoring identity for an already saved conversation");
            return Vec::new();
        }

        active.conversation = Some(id.clone());
        if active.is_attached() && self.slot == ConversationSlot::Unsaved {
            self.slot = ConversationSlot::Bound(id);
        }
        vec![Effect::RefreshConversations]
    }
}

fn stream_target<'a>(active: &'a mut ActiveStream, visible: &'a mut Transcript) -> &'a mut Transcript {
    match active.detached.as_mut() {
        Some(detached) => detached,
        None => visible,
    }
}
