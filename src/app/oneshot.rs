use crate::api::{ApiClient, ChatTransport};
use crate::config::Config;
use crate::state::{Message, SessionUpdate, StreamSession};
use crate::types::{ChatRequest, WireMessage};
use crate::ui::transcript::validation_lines;
use anyhow::{bail, Result};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Streams a single question without the TUI: thinking and verdicts go to
/// stderr, the answer to stdout.
pub async fn ask_once(config: &Config, question: &str) -> Result<()> {
    let client = ApiClient::new(config)?;
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    ask_with_transport(Arc::new(client), config, question, &mut stdout, &mut stderr).await
}

pub async fn ask_with_transport<O: Write, E: Write>(
    transport: Arc<dyn ChatTransport>,
    config: &Config,
    question: &str,
    out: &mut O,
    err: &mut E,
) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        bail!("question is empty");
    }

    let session = StreamSession::new(transport, config.stream_idle_timeout);
    let request = ChatRequest {
        messages: vec![WireMessage {
            role: "user".to_string(),
            content: question.to_string(),
        }],
        mode: config.mode,
        stream: true,
        include_thinking: config.include_thinking,
        conversation_id: None,
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<SessionUpdate>();
    let run = async move {
        let result = session.run(request, &tx).await;
        drop(tx);
        result
    };
    let mut printer = DeltaPrinter::default();
    let print = async {
        while let Some(update) = rx.recv().await {
            printer.apply(update, &mut *out, &mut *err)?;
        }
        io::Result::Ok(())
    };

    let (result, printed) = tokio::join!(run, print);
    result?;
    printed?;

    if !printer.errors.is_empty() {
        bail!(printer.errors.join("; "));
    }
    Ok(())
}

/// Snapshots are cumulative; only the unseen suffix of each section is written.
#[derive(Default)]
struct DeltaPrinter {
    thinking_printed: usize,
    answer_printed: usize,
    query_type_printed: bool,
    last: Option<Message>,
    errors: Vec<String>,
}

impl DeltaPrinter {
    fn apply<O: Write, E: Write>(&mut self, update: SessionUpdate, out: &mut O, err: &mut E) -> io::Result<()> {
        match update {
            SessionUpdate::ConversationAssigned(id) => {
                tracing::debug!(conversation_id = %id, "one-shot exchange saved");
            }
            SessionUpdate::Snapshot(message) => {
                if !self.query_type_printed {
                    if let Some(query_type) = &message.query_type {
                        writeln!(err, "[{query_type}]")?;
                        self.query_type_printed = true;
                    }
                }
                if let Some(thinking) = &message.thinking {
                    if let Some(delta) = thinking.get(self.thinking_printed..) {
                        if !delta.is_empty() {
                            write!(err, "{delta}")?;
                            err.flush()?;
                        }
                    }
                    self.thinking_printed = thinking.len();
                }
                if let Some(delta) = message.content.get(self.answer_printed..) {
                    if !delta.is_empty() {
                        if self.thinking_printed > 0 && self.answer_printed == 0 {
                            writeln!(err)?;
                        }
                        write!(out, "{delta}")?;
                        out.flush()?;
                    }
                }
                self.answer_printed = message.content.len();
                self.last = Some(message);
            }
            SessionUpdate::Error(message) => {
                writeln!(err, "\n[error] {message}")?;
                self.errors.push(message);
            }
            SessionUpdate::Finished => {
                if self.answer_printed > 0 {
                    writeln!(out)?;
                }
                if let Some(validation) = self.last.as_ref().and_then(|m| m.validation.as_ref()) {
                    for line in validation_lines(validation) {
                        writeln!(err, "{line}")?;
                    }
                }
            }
        }
        Ok(())
    }
}
