//! In-stream failure classification and the text that replaces the rest of a stream.
//!
//! Once a `200` relay has started there is no status code left to carry an
//! error, so failures are written into the body as a trailing `Error: ...`
//! fragment. Classification is independent of the HTTP client so the mapping
//! can be tested without a provider.

use std::fmt;

/// Failure taxonomy for an upstream streaming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Quota or rate limit exceeded (HTTP 429).
    RateLimit,
    /// Credential rejected (HTTP 401).
    Authentication,
    /// Transport failure reaching or reading from the provider.
    Connectivity,
    /// Any other structured provider-side error.
    ProviderApi,
    /// Anything else that goes wrong during relay.
    Unclassified,
}

impl FailureClass {
    /// Classify a non-success HTTP status from the provider.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => FailureClass::RateLimit,
            401 => FailureClass::Authentication,
            _ => FailureClass::ProviderApi,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::RateLimit => "rate_limit",
            FailureClass::Authentication => "authentication",
            FailureClass::Connectivity => "connectivity",
            FailureClass::ProviderApi => "provider_api",
            FailureClass::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified upstream failure with the provider's raw message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{class}: {details}")]
pub struct UpstreamError {
    pub class: FailureClass,
    pub details: String,
}

impl UpstreamError {
    pub fn new(class: FailureClass, details: impl Into<String>) -> Self {
        Self {
            class,
            details: details.into(),
        }
    }

    /// Non-success HTTP response. `body` is the raw response text.
    pub fn from_status(status: u16, body: &str) -> Self {
        Self::new(
            FailureClass::from_status(status),
            format!("Error code: {} - {}", status, provider_message(body)),
        )
    }

    pub fn connectivity(err: impl fmt::Display) -> Self {
        Self::new(FailureClass::Connectivity, err.to_string())
    }

    pub fn unclassified(details: impl Into<String>) -> Self {
        Self::new(FailureClass::Unclassified, details)
    }

    /// Text written into the response body in place of further content.
    pub fn to_text(&self, provider: &str) -> String {
        error_text(self.class, provider, &self.details)
    }
}

/// Prefer the provider's `error.message`; fall back to the raw body.
fn provider_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct Envelope {
        error: super::types::ApiErrorBody,
    }

    serde_json::from_str::<Envelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Render the fixed explanatory fragment for a failure class.
pub fn error_text(class: FailureClass, provider: &str, details: &str) -> String {
    match class {
        FailureClass::RateLimit => format!(
            "Error: {} API quota exceeded. Please check your plan and billing details.\n\nDetails: {}",
            provider, details
        ),
        FailureClass::Authentication => format!(
            "Error: {} API authentication failed. Please check your API key.\n\nDetails: {}",
            provider, details
        ),
        FailureClass::Connectivity => format!(
            "Error: Failed to connect to {} API. Please check your internet connection.\n\nDetails: {}",
            provider, details
        ),
        FailureClass::ProviderApi => format!("Error: {} API error: {}", provider, details),
        FailureClass::Unclassified => format!("Error: An unexpected error occurred: {}", details),
    }
}
