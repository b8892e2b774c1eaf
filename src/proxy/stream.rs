//! SSE decoding for streaming chat completions.
//!
//! Provides [`SseDecoder`] for line-buffered extraction of text deltas from
//! OpenAI-compatible SSE streaming responses. Handles TCP chunk boundary
//! reassembly, including multi-byte UTF-8 sequences split across chunks.

use super::failure::{FailureClass, UpstreamError};
use super::types::ChatCompletionChunk;

/// Longest single SSE line accepted before the stream is abandoned.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Something the relay must act on, decoded from the SSE stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Non-empty generated text.
    Delta(String),
    /// `data: [DONE]` was received.
    Done,
    /// The stream reported or produced an error.
    Failure(UpstreamError),
}

/// Buffers raw bytes across chunk boundaries and decodes complete SSE lines.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a chunk of bytes from the SSE stream.
    ///
    /// Returns the events completed by this chunk, in stream order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if line.len() > MAX_LINE_BYTES {
                events.push(Self::oversized_line());
            } else {
                Self::decode_line(&line, &mut events);
            }
        }

        // An unterminated line already over the cap can only grow
        if self.buffer.len() > MAX_LINE_BYTES {
            self.buffer.clear();
            events.push(Self::oversized_line());
        }

        events
    }

    fn oversized_line() -> SseEvent {
        SseEvent::Failure(UpstreamError::unclassified(format!(
            "stream line exceeded {} bytes",
            MAX_LINE_BYTES
        )))
    }

    /// Flush any remaining content in the buffer as a final line.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            Self::decode_line(&line, &mut events);
        }
        events
    }

    /// Decode a single complete SSE line.
    fn decode_line(raw: &[u8], events: &mut Vec<SseEvent>) {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim_end_matches(['\n', '\r']),
            Err(e) => {
                events.push(SseEvent::Failure(UpstreamError::unclassified(format!(
                    "stream is not valid UTF-8: {}",
                    e
                ))));
                return;
            }
        };

        // Blank lines delimit events; `event:`, `id:`, `retry:` and comments carry nothing we relay
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.strip_prefix(' ').unwrap_or(data);

        if data == "[DONE]" {
            events.push(SseEvent::Done);
            return;
        }

        match serde_json::from_str::<ChatCompletionChunk>(data) {
            Ok(chunk) => {
                if let Some(error) = &chunk.error {
                    let details = error
                        .message
                        .clone()
                        .or_else(|| error.kind.clone())
                        .unwrap_or_else(|| data.to_string());
                    events.push(SseEvent::Failure(UpstreamError::new(
                        FailureClass::ProviderApi,
                        details,
                    )));
                } else if let Some(text) = chunk.content().filter(|t| !t.is_empty()) {
                    events.push(SseEvent::Delta(text.to_string()));
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, data = %data, "Undecodable stream chunk");
                events.push(SseEvent::Failure(UpstreamError::unclassified(format!(
                    "failed to decode stream chunk: {}",
                    e
                ))));
            }
        }
    }
}
