//! Chunk relay: turns one upstream streaming call into the plain-text body.
//!
//! The relay is a small state machine driven by the response body being
//! polled. The upstream call is not issued until the first poll, and each
//! fragment is produced only when the caller's transport asks for more, so
//! backpressure comes entirely from the caller.

use std::collections::VecDeque;

use futures::{stream, Stream, StreamExt};

use super::failure::UpstreamError;
use super::stream::{SseDecoder, SseEvent};
use super::types::ChatCompletionRequest;
use super::upstream::{ByteStream, UpstreamClient};
use crate::credentials::ApiKey;

enum RelayState {
    /// Upstream call not yet issued.
    Pending {
        request: ChatCompletionRequest,
        api_key: ApiKey,
    },
    /// Reading the provider's SSE body. `body` is `None` once it is exhausted
    /// and only buffered events remain.
    Streaming {
        body: Option<ByteStream>,
        decoder: SseDecoder,
        ready: VecDeque<SseEvent>,
    },
    Finished,
}

/// How a relay ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Completed,
    Failed(UpstreamError),
}

struct Relay {
    upstream: UpstreamClient,
    state: RelayState,
    request_id: String,
    chunks: usize,
    bytes: usize,
}

impl Relay {
    /// Produce the next fragment of the response body, or `None` when done.
    async fn next_fragment(&mut self) -> Option<String> {
        loop {
            match std::mem::replace(&mut self.state, RelayState::Finished) {
                RelayState::Pending { request, api_key } => {
                    match self.upstream.open_stream(&request, &api_key).await {
                        Ok(body) => {
                            self.state = RelayState::Streaming {
                                body: Some(body),
                                decoder: SseDecoder::new(),
                                ready: VecDeque::new(),
                            };
                        }
                        Err(err) => return Some(self.fail(err)),
                    }
                }
                RelayState::Streaming {
                    mut body,
                    mut decoder,
                    mut ready,
                } => {
                    if let Some(event) = ready.pop_front() {
                        match event {
                            SseEvent::Delta(text) => {
                                self.chunks += 1;
                                self.bytes += text.len();
                                self.state = RelayState::Streaming {
                                    body,
                                    decoder,
                                    ready,
                                };
                                return Some(text);
                            }
                            SseEvent::Done => return self.complete(),
                            SseEvent::Failure(err) => return Some(self.fail(err)),
                        }
                    }

                    let Some(source) = body.as_mut() else {
                        return self.complete();
                    };

                    match source.next().await {
                        Some(Ok(bytes)) => ready.extend(decoder.feed(&bytes)),
                        Some(Err(err)) => return Some(self.fail(err)),
                        None => {
                            ready.extend(decoder.finish());
                            body = None;
                        }
                    }

                    self.state = RelayState::Streaming {
                        body,
                        decoder,
                        ready,
                    };
                }
                RelayState::Finished => return None,
            }
        }
    }

    fn complete(&mut self) -> Option<String> {
        self.finish(RelayOutcome::Completed);
        None
    }

    /// Terminate the stream with the failure's explanatory text.
    fn fail(&mut self, err: UpstreamError) -> String {
        let text = err.to_text(self.upstream.name());
        self.finish(RelayOutcome::Failed(err));
        text
    }

    fn finish(&mut self, outcome: RelayOutcome) {
        self.state = RelayState::Finished;
        match outcome {
            RelayOutcome::Completed => tracing::info!(
                request_id = %self.request_id,
                chunks = self.chunks,
                bytes = self.bytes,
                "Relay completed"
            ),
            RelayOutcome::Failed(err) => tracing::warn!(
                request_id = %self.request_id,
                chunks = self.chunks,
                class = %err.class,
                details = %err.details,
                "Relay terminated by upstream failure"
            ),
        }
    }
}

/// Lazily relay one streaming completion as a sequence of text fragments.
///
/// Fragments preserve provider order exactly. Any failure ends the sequence
/// with a single `Error: ...` fragment; content already yielded stands.
pub fn relay(
    upstream: UpstreamClient,
    request: ChatCompletionRequest,
    api_key: ApiKey,
    request_id: impl Into<String>,
) -> impl Stream<Item = String> + Send + 'static {
    let relay = Relay {
        upstream,
        state: RelayState::Pending { request, api_key },
        request_id: request_id.into(),
        chunks: 0,
        bytes: 0,
    };

    stream::unfold(relay, |mut relay| async move {
        let fragment = relay.next_fragment().await?;
        Some((fragment, relay))
    })
}
