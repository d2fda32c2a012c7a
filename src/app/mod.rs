mod commands;
mod oneshot;

pub use commands::{parse_command, Command, HELP_TEXT};
pub use oneshot::{ask_once, ask_with_transport};

use crate::api::{ApiClient, ChatTransport};
use crate::config::Config;
use crate::keys::ApiKeyStore;
use crate::runtime::context::RuntimeContext;
use crate::runtime::frontend::ScrollAction;
use crate::runtime::mode::RuntimeMode;
use crate::runtime::r#loop::Runtime;
use crate::runtime::UiUpdate;
use crate::state::{ConversationController, IdentityChange, SendOptions, SessionUpdate};
use crate::types::Conversation;
use crate::ui::transcript::{conversation_list_lines, transcript_lines, HistoryLine, LineKind};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct TuiMode {
    controller: ConversationController,
    conversations: Vec<Conversation>,
    options: SendOptions,
    keys: ApiKeyStore,
    status: Option<String>,
    show_list: bool,
    scroll_back: usize,
    pending_quit: bool,
    quit_requested: bool,
}

impl TuiMode {
    pub fn new(config: &Config, keys: ApiKeyStore) -> Self {
        Self {
            controller: ConversationController::new(),
            conversations: Vec::new(),
            options: SendOptions {
                mode: config.mode,
                include_thinking: config.include_thinking,
            },
            keys,
            status: None,
            show_list: false,
            scroll_back: 0,
            pending_quit: false,
            quit_requested: false,
        }
    }

    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn options(&self) -> SendOptions {
        self.options
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Rows the history view sits above the newest line.
    pub fn history_scroll_back(&self) -> usize {
        self.scroll_back
    }

    pub fn status_line(&self) -> String {
        let conversation = match self.controller.conversation_id() {
            Some(id) => self
                .conversations
                .iter()
                .find(|c| c.id == id && !c.title.trim().is_empty())
                .map(|c| c.title.trim().to_string())
                .unwrap_or_else(|| id.to_string()),
            None => "new chat".to_string(),
        };
        let state = if self.controller.is_streaming_here() {
            "streaming"
        } else if self.controller.is_loading() {
            "loading"
        } else if self.controller.is_streaming() {
            "streaming elsewhere"
        } else {
            "ready"
        };
        let thinking = if self.options.include_thinking { "on" } else { "off" };

        let mut line = format!(
            "sigma | {conversation} | mode:{} thinking:{thinking} | {state}",
            self.options.mode
        );
        if let Some(status) = &self.status {
            line.push_str(" | ");
            line.push_str(status);
        }
        line
    }

    pub fn history_lines(&self) -> Vec<HistoryLine> {
        let mut lines = Vec::new();
        if self.show_list {
            lines.push(HistoryLine::plain("Conversations:"));
            lines.extend(conversation_list_lines(
                &self.conversations,
                self.controller.conversation_id(),
            ));
            lines.push(HistoryLine::blank());
        }

        let transcript = self.controller.transcript();
        if transcript.is_empty() && !self.controller.is_loading() && !self.show_list {
            lines.push(HistoryLine::plain(format!("Type a question, or {HELP_TEXT}")));
        }
        lines.extend(transcript_lines(transcript));

        if self.controller.is_loading() {
            lines.push(HistoryLine::new(LineKind::Notice, "[loading conversation...]"));
        }
        if self.controller.is_streaming() && !self.controller.is_streaming_here() {
            lines.push(HistoryLine::new(
                LineKind::Notice,
                "[a response is still streaming in another conversation]",
            ));
        }
        if let Some(error) = self.controller.error() {
            lines.push(HistoryLine::new(LineKind::Error, format!("[error] {error}")));
        }
        lines
    }

    fn send(&mut self, input: &str, ctx: &mut RuntimeContext) {
        match self.controller.begin_send(input, self.options) {
            Some(pending) => {
                self.show_list = false;
                self.scroll_back = 0;
                self.status = None;
                ctx.start_turn(pending);
            }
            None if self.controller.is_streaming() => {
                self.status = Some("wait for the current response to finish".to_string());
            }
            None if self.controller.is_loading() => {
                self.status = Some("conversation is still loading".to_string());
            }
            None => {}
        }
    }

    fn run_command(&mut self, command: Command, ctx: &mut RuntimeContext) {
        match command {
            Command::NewChat => {
                let effects = self.controller.transition(IdentityChange::NewChat);
                ctx.run_effects(effects);
                self.show_list = false;
                self.scroll_back = 0;
                self.status = Some("new conversation".to_string());
            }
            Command::List => {
                self.show_list = !self.show_list;
                if self.show_list {
                    ctx.refresh_conversations();
                }
            }
            Command::Open(target) => {
                let id = self.resolve_target(&target);
                let effects = self.controller.transition(IdentityChange::Navigate(id));
                ctx.run_effects(effects);
                self.show_list = false;
                self.scroll_back = 0;
                self.status = None;
            }
            Command::Delete(target) => {
                let id = self.resolve_target(&target);
                self.status = Some(format!("deleting {id}"));
                ctx.delete_conversation(id);
            }
            Command::Mode(mode) => {
                self.options.mode = mode;
                self.status = Some(format!("mode set to {mode}"));
            }
            Command::Thinking(enabled) => {
                self.options.include_thinking = enabled;
                let label = if enabled { "on" } else { "off" };
                self.status = Some(format!("thinking {label}"));
            }
            Command::Key { model, key } => {
                self.keys.set(model.clone(), key.clone());
                match self.keys.save() {
                    Ok(()) => self.status = Some(format!("saving API key for {model}")),
                    Err(error) => {
                        tracing::warn!(%error, "failed to persist API key");
                        self.status = Some(format!("could not store key locally: {error}"));
                    }
                }
                ctx.push_api_key(model, key);
            }
            Command::Help => self.status = Some(HELP_TEXT.to_string()),
            Command::Quit => self.quit_requested = true,
        }
    }

    /// `n` picks the n-th entry of the last listing; anything else is an id.
    fn resolve_target(&self, target: &str) -> String {
        target
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.conversations.get(index))
            .map(|conversation| conversation.id.clone())
            .unwrap_or_else(|| target.to_string())
    }
}

impl RuntimeMode for TuiMode {
    fn on_user_input(&mut self, input: String, ctx: &mut RuntimeContext) {
        self.pending_quit = false;
        match parse_command(&input) {
            Some(Ok(command)) => self.run_command(command, ctx),
            Some(Err(message)) => self.status = Some(message),
            None => self.send(&input, ctx),
        }
    }

    fn on_model_update(&mut self, update: UiUpdate, ctx: &mut RuntimeContext) {
        match update {
            UiUpdate::Session { ticket, update } => {
                let finished = update == SessionUpdate::Finished;
                let effects = self.controller.apply_session_update(ticket, update);
                ctx.run_effects(effects);
                if finished {
                    self.pending_quit = false;
                }
            }
            UiUpdate::ConversationsLoaded(Ok(conversations)) => {
                self.conversations = conversations;
            }
            UiUpdate::ConversationsLoaded(Err(error)) => {
                self.status = Some(format!("could not list conversations: {error}"));
            }
            UiUpdate::TranscriptLoaded { id, result } => match result {
                Ok(messages) => {
                    if self.controller.apply_transcript_loaded(&id, messages) {
                        self.scroll_back = 0;
                    }
                }
                Err(error) => self.controller.apply_transcript_load_failed(&id, &error),
            },
            UiUpdate::ConversationDeleted { id, result } => match result {
                Ok(_) => {
                    let effects = self.controller.transition(IdentityChange::Deleted(id.clone()));
                    ctx.run_effects(effects);
                    self.status = Some(format!("deleted {id}"));
                }
                Err(error) if error.is_not_found() => {
                    self.status = None;
                    self.controller
                        .set_error(format!("Conversation {id} not found"));
                    ctx.refresh_conversations();
                }
                Err(error) => {
                    self.status = None;
                    self.controller
                        .set_error(format!("Failed to delete conversation {id}: {error}"));
                }
            },
            UiUpdate::KeySaved { model, pushed } => {
                self.status = Some(if pushed {
                    format!("API key for {model} saved")
                } else {
                    format!("API key for {model} stored locally; backend did not accept it")
                });
            }
            UiUpdate::KeysSynced(report) => {
                if !report.pushed.is_empty() || !report.failed.is_empty() {
                    self.status = Some(report.summary());
                }
            }
        }
    }

    fn on_interrupt(&mut self, _ctx: &mut RuntimeContext) {
        if !self.controller.is_streaming() || self.pending_quit {
            self.quit_requested = true;
            return;
        }
        self.pending_quit = true;
        self.status = Some("a response is streaming; press Ctrl-C again to quit".to_string());
    }

    fn on_scroll(&mut self, action: ScrollAction) {
        self.scroll_back = match action {
            ScrollAction::LineUp => self.scroll_back.saturating_add(1),
            ScrollAction::LineDown => self.scroll_back.saturating_sub(1),
            ScrollAction::PageUp(step) => self.scroll_back.saturating_add(step.max(1)),
            ScrollAction::PageDown(step) => self.scroll_back.saturating_sub(step.max(1)),
            ScrollAction::Home => self.history_lines().len(),
            ScrollAction::End => 0,
        };
    }

    fn is_turn_in_progress(&self) -> bool {
        self.controller.is_streaming()
    }

    /// Valid commands always run. Malformed commands and refused sends keep
    /// the draft so it can be fixed or resent.
    fn accepts_input(&self, input: &str) -> bool {
        match parse_command(input) {
            Some(Ok(_)) => true,
            Some(Err(_)) => false,
            None => self.controller.can_send(input),
        }
    }
}

pub fn build_runtime(config: Config) -> Result<(Runtime<TuiMode>, RuntimeContext)> {
    let client = ApiClient::new(&config)?;
    Ok(build_runtime_with_transport(&config, Arc::new(client)))
}

/// Wires the mode to a transport and queues the startup work: pushing stored
/// API keys and loading the conversation list.
pub fn build_runtime_with_transport(
    config: &Config,
    transport: Arc<dyn ChatTransport>,
) -> (Runtime<TuiMode>, RuntimeContext) {
    let keys = ApiKeyStore::load(&config.keys_path).unwrap_or_else(|error| {
        tracing::warn!(error = %format!("{error:#}"), "ignoring unreadable API key file");
        ApiKeyStore::empty(&config.keys_path)
    });

    let (update_tx, update_rx) = mpsc::unbounded_channel::<UiUpdate>();
    let ctx = RuntimeContext::new(transport, config.stream_idle_timeout, update_tx);
    if !keys.is_empty() {
        ctx.sync_api_keys(keys.clone());
    }
    ctx.refresh_conversations();

    let mode = TuiMode::new(config, keys);
    (Runtime::new(mode, update_rx), ctx)
}
