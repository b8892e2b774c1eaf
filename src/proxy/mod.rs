//! HTTP relay module.
//!
//! Accepts a two-message chat request, forwards it to the completion
//! provider as a streaming call, and relays the generated text back as a
//! plain-text body.

pub mod failure;
mod handlers;
pub mod relay;
mod server;
pub mod stream;
pub mod types;
pub mod upstream;

pub use failure::{error_text, FailureClass, UpstreamError};
pub use relay::relay;
pub use server::{create_router, run_server, AppState, RequestId, REQUEST_ID_HEADER};
pub use stream::{SseDecoder, SseEvent};
pub use types::{ChatCompletionRequest, ChatRequest, Message, Role, ValidationError};
pub use upstream::UpstreamClient;
