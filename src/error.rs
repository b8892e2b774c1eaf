//! Error types for chat-relay.
//!
//! These cover failures detected before a relay starts. Failures after the
//! first byte is sent live in [`crate::proxy::failure`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::credentials::CredentialError;
use crate::proxy::types::ValidationError;

/// Result type alias for chat-relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for chat-relay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Credential(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        // `detail` is a list of field errors for validation, a message otherwise
        let body = match &self {
            Error::Validation(err) => serde_json::json!({ "detail": err.errors }),
            Error::Credential(err) => serde_json::json!({ "detail": err.to_string() }),
        };

        (status, axum::Json(body)).into_response()
    }
}
