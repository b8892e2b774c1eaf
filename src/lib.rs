//! chat-relay - Streaming relay for LLM chat completions
//!
//! This library provides the core functionality for the chat-relay server:
//! request validation, credential loading, the upstream streaming client,
//! and the chunk relay with its in-stream error mapping.

pub mod config;
pub mod credentials;
pub mod error;
pub mod proxy;

pub use config::Config;
pub use error::{Error, Result};
