use crate::state::{Message, Role, Transcript};
use crate::types::{Conversation, ValidationResult};
use crate::util::truncate_chars;
use std::fmt;

const TITLE_PREVIEW_CHARS: usize = 48;

/// What a history line shows. Styling keys off this, never off the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Plain,
    User,
    QueryType,
    Thinking,
    Answer,
    Validated,
    ValidationFailed,
    Warning,
    Notice,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLine {
    pub kind: LineKind,
    pub text: String,
}

impl HistoryLine {
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(LineKind::Plain, text)
    }

    pub fn blank() -> Self {
        Self::plain(String::new())
    }
}

impl fmt::Display for HistoryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Lines for one message. The open assistant message shows an ellipsis
/// until its first answer text arrives.
pub fn message_lines(message: &Message, is_open: bool) -> Vec<HistoryLine> {
    let mut lines = Vec::new();
    match message.role {
        Role::User => {
            push_prefixed(&mut lines, LineKind::User, "you: ", &message.content);
        }
        Role::Assistant => {
            if let Some(query_type) = &message.query_type {
                lines.push(HistoryLine::new(LineKind::QueryType, format!("[{query_type}]")));
            }
            if let Some(thinking) = &message.thinking {
                lines.push(HistoryLine::new(LineKind::Thinking, "thinking:"));
                for line in thinking.lines() {
                    lines.push(HistoryLine::new(LineKind::Thinking, format!("  | {line}")));
                }
            }
            if message.content.is_empty() && is_open {
                lines.push(HistoryLine::new(LineKind::Answer, "sigma: ..."));
            } else {
                push_prefixed(&mut lines, LineKind::Answer, "sigma: ", &message.content);
            }
            if let Some(validation) = &message.validation {
                lines.extend(validation_lines(validation));
            }
        }
    }
    lines
}

pub fn validation_lines(validation: &ValidationResult) -> Vec<HistoryLine> {
    let mut lines = Vec::new();
    if validation.is_valid {
        lines.push(HistoryLine::new(LineKind::Validated, "[validated]"));
    } else if validation.errors.is_empty() {
        lines.push(HistoryLine::new(LineKind::ValidationFailed, "[validation failed]"));
    } else {
        lines.push(HistoryLine::new(
            LineKind::ValidationFailed,
            format!("[validation failed: {}]", validation.errors.join("; ")),
        ));
    }
    for warning in &validation.warnings {
        lines.push(HistoryLine::new(LineKind::Warning, format!("[warning: {warning}]")));
    }
    lines
}

pub fn transcript_lines(transcript: &Transcript) -> Vec<HistoryLine> {
    let count = transcript.len();
    let mut lines = Vec::new();
    for (index, message) in transcript.messages().iter().enumerate() {
        if index > 0 {
            lines.push(HistoryLine::blank());
        }
        let is_open = transcript.has_open_message() && index + 1 == count;
        lines.extend(message_lines(message, is_open));
    }
    lines
}

/// Numbered list used by `/open <n>` and `/delete <n>`.
pub fn conversation_list_lines(conversations: &[Conversation], current: Option<&str>) -> Vec<HistoryLine> {
    if conversations.is_empty() {
        return vec![HistoryLine::new(LineKind::Notice, "(no saved conversations)")];
    }
    conversations
        .iter()
        .enumerate()
        .map(|(index, conversation)| {
            let marker = if current == Some(conversation.id.as_str()) {
                '*'
            } else {
                ' '
            };
            let title = if conversation.title.trim().is_empty() {
                "(untitled)"
            } else {
                conversation.title.trim()
            };
            HistoryLine::plain(format!(
                "{marker}{:>3}. {}  [{}]",
                index + 1,
                truncate_chars(title, TITLE_PREVIEW_CHARS),
                conversation.id
            ))
        })
        .collect()
}

fn push_prefixed(lines: &mut Vec<HistoryLine>, kind: LineKind, prefix: &str, content: &str) {
    let indent = " ".repeat(prefix.len());
    let mut content_lines = content.lines();
    lines.push(HistoryLine::new(
        kind,
        format!("{prefix}{}", content_lines.next().unwrap_or_default()),
    ));
    for line in content_lines {
        lines.push(HistoryLine::new(kind, format!("{indent}{line}")));
    }
}
