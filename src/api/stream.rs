use super::error::{ApiError, ApiResult};
use super::logging::emit_record_parse_error;
use super::transport::ByteStream;
use crate::types::StreamEvent;
use futures::StreamExt;
use std::collections::VecDeque;
use std::time::Duration;

const RECORD_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental decoder for the `/chat` response body.
///
/// Bytes are fed in arbitrary chunks. Complete lines are decoded as they
/// arrive; the trailing fragment waits for the next chunk. Multi-byte
/// characters split across chunks are held back until they are complete.
#[derive(Default)]
pub struct EventDecoder {
    buffer: String,
    pending_bytes: Vec<u8>,
    done: bool,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the `[DONE]` terminator has been seen. Nothing is decoded
    /// after that point.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn process(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.done {
            return Vec::new();
        }

        self.decode_utf8(chunk);
        let mut events = Vec::new();
        let mut start = 0;

        while let Some(end) = self.buffer[start..].find('\n') {
            let line_end = start + end;
            let line = self.buffer[start..line_end].trim_end_matches('\r');
            start = line_end + 1;

            let Some(payload) = line.strip_prefix(RECORD_PREFIX) else {
                continue;
            };
            let payload = payload.trim();
            if payload.is_empty() {
                continue;
            }
            if payload == DONE_SENTINEL {
                self.done = true;
                self.buffer.clear();
                self.pending_bytes.clear();
                return events;
            }

            match serde_json::from_str::<StreamEvent>(payload) {
                Ok(event) => events.push(event),
                Err(error) => emit_record_parse_error(payload, &error),
            }
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        events
    }

    /// Returns whatever partial line is still buffered.
    pub fn flush(&mut self) -> String {
        self.pending_bytes.clear();
        std::mem::take(&mut self.buffer)
    }

    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.pending_bytes.extend_from_slice(chunk);
        loop {
            match std::str::from_utf8(&self.pending_bytes) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending_bytes.clear();
                    return;
                }
                Err(error) => {
                    let valid = error.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending_bytes[..valid]) {
                        self.buffer.push_str(text);
                    }
                    match error.error_len() {
                        Some(invalid) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending_bytes.drain(..valid + invalid);
                        }
                        None => {
                            // Incomplete sequence at the tail; wait for more bytes.
                            self.pending_bytes.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Lazy sequence of events read from one response body.
///
/// Finite and not restartable: once the body ends, fails, stalls or the
/// terminator arrives, `next_event` keeps returning `None`.
pub struct EventStream {
    bytes: ByteStream,
    decoder: EventDecoder,
    ready: VecDeque<StreamEvent>,
    idle_timeout: Option<Duration>,
    finished: bool,
}

impl EventStream {
    pub fn new(bytes: ByteStream, idle_timeout: Option<Duration>) -> Self {
        Self {
            bytes,
            decoder: EventDecoder::new(),
            ready: VecDeque::new(),
            idle_timeout,
            finished: false,
        }
    }

    pub async fn next_event(&mut self) -> Option<ApiResult<StreamEvent>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(Ok(event));
            }
            if self.finished || self.decoder.is_done() {
                return None;
            }

            let next = match self.idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, self.bytes.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        self.finished = true;
                        return Some(Err(ApiError::Stalled(limit)));
                    }
                },
                None => self.bytes.next().await,
            };

            match next {
                Some(Ok(chunk)) => self.ready.extend(self.decoder.process(&chunk)),
                Some(Err(error)) => {
                    self.finished = true;
                    return Some(Err(error));
                }
                None => {
                    self.finished = true;
                    let trailing = self.decoder.flush();
                    if !trailing.trim().is_empty() {
                        tracing::debug!(
                            fragment = %trailing,
                            "dropping unterminated record at end of stream"
                        );
                    }
                }
            }
        }
    }
}
