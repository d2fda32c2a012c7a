use super::*;
use crate::api::ApiError;
use crate::state::{Message, Role, SessionUpdate};
use crate::types::{ConversationMessage, ReasoningMode, ValidationResult};

fn options() -> SendOptions {
    SendOptions {
        mode: ReasoningMode::Auto,
        include_thinking: true,
    }
}

fn stored(role: &str, content: &str) -> ConversationMessage {
    ConversationMessage {
        id: None,
        role: role.to_string(),
        content: content.to_string(),
        thinking: None,
        created_at: None,
    }
}

fn snapshot(content: &str) -> SessionUpdate {
    let mut message = Message::assistant_placeholder();
    message.content = content.to_string();
    SessionUpdate::Snapshot(message)
}

fn bound_controller(id: &str, messages: Vec<ConversationMessage>) -> ConversationController {
    let mut controller = ConversationController::new();
    let effects = controller.transition(IdentityChange::Navigate(id.to_string()));
    assert_eq!(effects, vec![Effect::ReloadTranscript(id.to_string())]);
    assert!(controller.apply_transcript_loaded(id, messages));
    controller
}

#[test]
fn test_send_appends_user_and_open_assistant() {
    let mut controller = ConversationController::new();
    let pending = controller
        .begin_send("hello", options())
        .expect("send accepted");

    let messages = controller.transcript().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], Message::user("hello"));
    assert_eq!(messages[1], Message::assistant_placeholder());
    assert!(controller.transcript().has_open_message());
    assert!(controller.is_streaming());

    assert_eq!(pending.request.messages.len(), 1);
    assert_eq!(pending.request.messages[0].content, "hello");
    assert_eq!(pending.request.conversation_id, None);
    assert!(pending.request.stream);
}

#[test]
fn test_send_history_excludes_placeholder() {
    let mut controller = bound_controller(
        "c1",
        vec![stored("user", "first"), stored("assistant", "reply")],
    );
    let pending = controller.begin_send("second", options()).expect("send");

    let roles: Vec<&str> = pending
        .request
        .messages
        .iter()
        .map(|m| m.role.as_str())
        .collect();
    assert_eq!(roles, vec!["user", "assistant", "user"]);
    assert_eq!(pending.request.conversation_id.as_deref(), Some("c1"));
}

#[test]
fn test_blank_send_or_send_while_streaming_is_noop() {
    let mut controller = ConversationController::new();
    assert!(controller.begin_send("   \n\t", options()).is_none());
    assert!(controller.transcript().is_empty());
    assert!(!controller.is_streaming());

    controller.begin_send("one", options()).expect("first send");
    assert!(controller.begin_send("two", options()).is_none());
    assert_eq!(controller.transcript().len(), 2);
}

#[test]
fn test_send_clears_previous_error() {
    let mut controller = ConversationController::new();
    controller.set_error("old failure");
    controller.begin_send("retry", options()).expect("send");
    assert_eq!(controller.error(), None);
}

#[test]
fn test_snapshots_replace_last_message_until_finished() {
    let mut controller = ConversationController::new();
    let ticket = controller.begin_send("q", options()).expect("send").ticket;

    controller.apply_session_update(ticket, snapshot("4"));
    controller.apply_session_update(ticket, snapshot("42"));
    assert_eq!(controller.transcript().len(), 2);
    assert_eq!(controller.transcript().last().map(|m| m.content.as_str()), Some("42"));

    controller.apply_session_update(ticket, SessionUpdate::Finished);
    assert!(!controller.is_streaming());
    assert!(!controller.transcript().has_open_message());

    controller.apply_session_update(ticket, snapshot("late"));
    assert_eq!(controller.transcript().last().map(|m| m.content.as_str()), Some("42"));
}

#[test]
fn test_validation_and_query_type_reach_transcript() {
    let mut controller = ConversationController::new();
    let ticket = controller.begin_send("q", options()).expect("send").ticket;
    let message = Message {
        role: Role::Assistant,
        content: "42".into(),
        thinking: Some("Let's see".into()),
        query_type: Some("math".into()),
        validation: Some(ValidationResult {
            is_valid: true,
            warnings: vec![],
            errors: vec![],
        }),
    };
    controller.apply_session_update(ticket, SessionUpdate::Snapshot(message.clone()));
    controller.apply_session_update(ticket, SessionUpdate::Finished);
    assert_eq!(controller.transcript().last(), Some(&message));
}

#[test]
fn test_server_assigned_identity_binds_without_reload() {
    let mut controller = ConversationController::new();
    let ticket = controller.begin_send("q", options()).expect("send").ticket;
    controller.apply_session_update(ticket, snapshot("partial"));

    let effects =
        controller.apply_session_update(ticket, SessionUpdate::ConversationAssigned("B".into()));

    assert_eq!(effects, vec![Effect::RefreshConversations]);
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::ReloadTranscript(_))));
    assert_eq!(controller.slot(), &ConversationSlot::Bound("B".into()));
    assert_eq!(controller.transcript().len(), 2);
    assert_eq!(
        controller.transcript().last().map(|m| m.content.as_str()),
        Some("partial")
    );
    assert!(controller.is_streaming_here());
}

#[test]
fn test_server_assigned_identity_ignored_for_saved_conversation() {
    let mut controller = bound_controller("A", vec![]);
    let ticket = controller.begin_send("q", options()).expect("send").ticket;

    let effects =
        controller.apply_session_update(ticket, SessionUpdate::ConversationAssigned("Z".into()));
    assert!(effects.is_empty());
    assert_eq!(controller.conversation_id(), Some("A"));
}

#[test]
fn test_send_keeps_leading_indentation() {
    let mut controller = ConversationController::new();
    let input = "    fn main() {}\n";
    let pending = controller.begin_send(input, options()).expect("send accepted");

    assert_eq!(controller.transcript().messages()[0], Message::user(input));
    assert_eq!(pending.request.messages[0].content, input);
}

#[test]
fn test_stream_assignment_matches_server_assigned_transition() {
    let mut streamed = ConversationController::new();
    let ticket = streamed.begin_send("q", options()).expect("send").ticket;
    let from_stream =
        streamed.apply_session_update(ticket, SessionUpdate::ConversationAssigned("B".into()));

    let mut direct = ConversationController::new();
    direct.begin_send("q", options()).expect("send");
    let from_transition = direct.transition(IdentityChange::ServerAssigned("B".into()));

    assert_eq!(from_stream, vec![Effect::RefreshConversations]);
    assert_eq!(from_stream, from_transition);
    assert_eq!(streamed.slot(), direct.slot());
}

#[test]
fn test_server_assigned_transition_without_stream_is_ignored() {
    let mut controller = ConversationController::new();
    let effects = controller.transition(IdentityChange::ServerAssigned("B".into()));
    assert!(effects.is_empty());
    assert_eq!(controller.slot(), &ConversationSlot::Unsaved);
}

#[test]
fn test_navigate_to_streaming_conversation_does_not_reload() {
    let mut controller = ConversationController::new();
    let ticket = controller.begin_send("q", options()).expect("send").ticket;
    controller.apply_session_update(ticket, SessionUpdate::ConversationAssigned("B".into()));

    let effects = controller.transition(IdentityChange::Navigate("B".into()));
    assert!(effects.is_empty());
    assert_eq!(controller.transcript().len(), 2);
    assert!(controller.is_streaming_here());
}

#[test]
fn test_navigate_away_mid_stream_loads_target_and_isolates_stream() {
    let mut controller = ConversationController::new();
    let ticket = controller.begin_send("q", options()).expect("send").ticket;
    controller.apply_session_update(ticket, SessionUpdate::ConversationAssigned("B".into()));
    controller.apply_session_update(ticket, snapshot("half"));

    let effects = controller.transition(IdentityChange::Navigate("A".into()));
    assert_eq!(effects, vec![Effect::ReloadTranscript("A".into())]);
    assert_eq!(controller.slot(), &ConversationSlot::Bound("A".into()));
    assert!(controller.transcript().is_empty());

    assert!(controller.apply_transcript_loaded(
        "A",
        vec![stored("user", "old question"), stored("assistant", "old answer")]
    ));
    controller.apply_session_update(ticket, snapshot("half and more"));
    controller.apply_session_update(ticket, SessionUpdate::Error("soft failure".into()));

    let visible: Vec<&str> = controller
        .transcript()
        .messages()
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(visible, vec!["old question", "old answer"]);
    assert_eq!(controller.error(), None);
    assert!(controller.is_streaming());
    assert!(!controller.is_streaming_here());

    let effects = controller.transition(IdentityChange::Navigate("B".into()));
    assert!(effects.is_empty());
    assert_eq!(
        controller.transcript().last().map(|m| m.content.as_str()),
        Some("half and more")
    );
    assert!(controller.is_streaming_here());
}

#[test]
fn test_navigate_away_before_identity_keeps_new_chat_stream_separate() {
    let mut controller = ConversationController::new();
    let ticket = controller.begin_send("q", options()).expect("send").ticket;

    controller.transition(IdentityChange::Navigate("A".into()));
    controller.apply_transcript_loaded("A", vec![stored("user", "a")]);
    let effects =
        controller.apply_session_update(ticket, SessionUpdate::ConversationAssigned("B".into()));

    assert_eq!(effects, vec![Effect::RefreshConversations]);
    assert_eq!(controller.conversation_id(), Some("A"));
    assert_eq!(controller.transcript().len(), 1);
}

#[test]
fn test_navigate_after_stream_finished_reloads() {
    let mut controller = ConversationController::new();
    let ticket = controller.begin_send("q", options()).expect("send").ticket;
    controller.apply_session_update(ticket, SessionUpdate::ConversationAssigned("B".into()));
    controller.transition(IdentityChange::Navigate("A".into()));
    controller.apply_session_update(ticket, SessionUpdate::Finished);

    let effects = controller.transition(IdentityChange::Navigate("B".into()));
    assert_eq!(effects, vec![Effect::ReloadTranscript("B".into())]);
}

#[test]
fn test_navigate_to_same_idle_conversation_reloads() {
    let mut controller = bound_controller("A", vec![stored("user", "x")]);
    let effects = controller.transition(IdentityChange::Navigate("A".into()));
    assert_eq!(effects, vec![Effect::ReloadTranscript("A".into())]);
}

#[test]
fn test_stale_transcript_load_is_discarded() {
    let mut controller = ConversationController::new();
    controller.transition(IdentityChange::Navigate("A".into()));
    controller.transition(IdentityChange::Navigate("C".into()));

    assert!(!controller.apply_transcript_loaded("A", vec![stored("user", "from A")]));
    assert!(controller.transcript().is_empty());
    assert!(controller.apply_transcript_loaded("C", vec![stored("user", "from C")]));
    assert_eq!(controller.transcript().len(), 1);
}

#[test]
fn test_send_refused_while_transcript_loading() {
    let mut controller = ConversationController::new();
    controller.transition(IdentityChange::Navigate("A".into()));
    assert!(controller.begin_send("too early", options()).is_none());
}

#[test]
fn test_load_not_found_is_reported_distinctly() {
    let mut controller = ConversationController::new();
    controller.transition(IdentityChange::Navigate("gone".into()));
    controller.apply_transcript_load_failed(
        "gone",
        &ApiError::NotFound {
            what: "conversation gone".into(),
        },
    );
    assert_eq!(controller.error(), Some("Conversation gone no longer exists"));
    assert_eq!(controller.slot(), &ConversationSlot::Unsaved);

    controller.transition(IdentityChange::Navigate("A".into()));
    controller.apply_transcript_load_failed(
        "A",
        &ApiError::Status {
            url: "http://localhost/conversations/A/messages".into(),
            status: 500,
        },
    );
    assert!(controller
        .error()
        .is_some_and(|e| e.starts_with("Failed to load conversation")));
    assert_eq!(controller.slot(), &ConversationSlot::Bound("A".into()));
}

#[test]
fn test_new_chat_resets_and_detaches_stream() {
    let mut controller = ConversationController::new();
    let ticket = controller.begin_send("q", options()).expect("send").ticket;

    assert!(controller.transition(IdentityChange::NewChat).is_empty());
    assert_eq!(controller.slot(), &ConversationSlot::Unsaved);
    assert!(controller.transcript().is_empty());

    controller.apply_session_update(ticket, snapshot("elsewhere"));
    controller.apply_session_update(ticket, SessionUpdate::ConversationAssigned("B".into()));
    assert!(controller.transcript().is_empty());
    assert_eq!(controller.slot(), &ConversationSlot::Unsaved);
}

#[test]
fn test_delete_current_conversation_clears_transcript() {
    let mut controller = bound_controller("A", vec![stored("user", "x")]);
    let effects = controller.transition(IdentityChange::Deleted("A".into()));
    assert_eq!(effects, vec![Effect::RefreshConversations]);
    assert_eq!(controller.slot(), &ConversationSlot::Unsaved);
    assert!(controller.transcript().is_empty());
}

#[test]
fn test_delete_other_conversation_keeps_transcript() {
    let mut controller = bound_controller("A", vec![stored("user", "x")]);
    controller.transition(IdentityChange::Deleted("B".into()));
    assert_eq!(controller.slot(), &ConversationSlot::Bound("A".into()));
    assert_eq!(controller.transcript().len(), 1);
}

#[test]
fn test_error_update_surfaces_and_stream_continues() {
    let mut controller = ConversationController::new();
    let ticket = controller.begin_send("q", options()).expect("send").ticket;
    controller.apply_session_update(ticket, SessionUpdate::Error("soft".into()));
    controller.apply_session_update(ticket, snapshot("after"));

    assert_eq!(controller.error(), Some("soft"));
    assert!(controller.is_streaming());
    assert_eq!(controller.transcript().last().map(|m| m.content.as_str()), Some("after"));
}
