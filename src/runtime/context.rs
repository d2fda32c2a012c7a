use crate::api::ChatTransport;
use crate::keys::{self, ApiKeyStore};
use crate::runtime::UiUpdate;
use crate::state::{Effect, PendingSend, SessionError, SessionUpdate, StreamSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Owned handle passed into every `RuntimeMode` callback. Everything that
/// touches the network is spawned from here and reports back as a `UiUpdate`.
pub struct RuntimeContext {
    transport: Arc<dyn ChatTransport>,
    session: Arc<StreamSession>,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
}

impl RuntimeContext {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        idle_timeout: Option<Duration>,
        update_tx: mpsc::UnboundedSender<UiUpdate>,
    ) -> Self {
        let session = Arc::new(StreamSession::new(Arc::clone(&transport), idle_timeout));
        Self {
            transport,
            session,
            update_tx,
        }
    }

    /// Streams one accepted send. Every session update is forwarded as it
    /// arrives, tagged with the send's ticket.
    pub fn start_turn(&self, pending: PendingSend) {
        let session = Arc::clone(&self.session);
        let update_tx = self.update_tx.clone();
        let PendingSend { ticket, request } = pending;

        tokio::spawn(async move {
            let (session_tx, mut session_rx) = mpsc::unbounded_channel::<SessionUpdate>();
            let forward_tx = update_tx.clone();
            let forward = async move {
                while let Some(update) = session_rx.recv().await {
                    let _ = forward_tx.send(UiUpdate::Session { ticket, update });
                }
            };
            let run = async move {
                let result = session.run(request, &session_tx).await;
                drop(session_tx);
                result
            };

            let (result, ()) = tokio::join!(run, forward);
            if let Err(error @ SessionError::Busy) = result {
                tracing::warn!(ticket = ticket.value(), "send rejected: {error}");
                let _ = update_tx.send(UiUpdate::Session {
                    ticket,
                    update: SessionUpdate::Error(error.to_string()),
                });
                let _ = update_tx.send(UiUpdate::Session {
                    ticket,
                    update: SessionUpdate::Finished,
                });
            }
        });
    }

    pub fn run_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ReloadTranscript(id) => self.reload_transcript(id),
                Effect::RefreshConversations => self.refresh_conversations(),
            }
        }
    }

    pub fn reload_transcript(&self, id: String) {
        let transport = Arc::clone(&self.transport);
        let update_tx = self.update_tx.clone();
        tokio::spawn(async move {
            let result = transport.get_conversation_messages(&id).await;
            if let Err(error) = &result {
                tracing::warn!(conversation_id = %id, %error, "failed to load conversation");
            }
            let _ = update_tx.send(UiUpdate::TranscriptLoaded { id, result });
        });
    }

    pub fn refresh_conversations(&self) {
        let transport = Arc::clone(&self.transport);
        let update_tx = self.update_tx.clone();
        tokio::spawn(async move {
            let result = transport.get_conversations().await;
            if let Err(error) = &result {
                tracing::warn!(%error, "failed to list conversations");
            }
            let _ = update_tx.send(UiUpdate::ConversationsLoaded(result));
        });
    }

    pub fn delete_conversation(&self, id: String) {
        let transport = Arc::clone(&self.transport);
        let update_tx = self.update_tx.clone();
        tokio::spawn(async move {
            let result = transport.delete_conversation(&id).await;
            let _ = update_tx.send(UiUpdate::ConversationDeleted { id, result });
        });
    }

    pub fn push_api_key(&self, model: String, key: String) {
        let transport = Arc::clone(&self.transport);
        let update_tx = self.update_tx.clone();
        tokio::spawn(async move {
            let pushed = keys::push_api_key(transport.as_ref(), &model, &key).await;
            let _ = update_tx.send(UiUpdate::KeySaved { model, pushed });
        });
    }

    pub fn sync_api_keys(&self, store: ApiKeyStore) {
        let transport = Arc::clone(&self.transport);
        let update_tx = self.update_tx.clone();
        tokio::spawn(async move {
            let report = keys::sync_api_keys(transport.as_ref(), &store).await;
            let _ = update_tx.send(UiUpdate::KeysSynced(report));
        });
    }
}
