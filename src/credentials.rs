//! Provider credential loading.
//!
//! The API key is looked up when a request arrives rather than once at
//! startup, so rotating the variable takes effect on the next request.

use secrecy::{ExposeSecret, SecretString};

/// API key wrapper that redacts in Debug/Display and zeroizes on drop.
///
/// Only accessible via `.expose_secret()`, which keeps every use grep-auditable.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Access the raw key value.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        ApiKey(SecretString::from(s))
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        ApiKey(SecretString::from(s))
    }
}

/// Credential lookup failures. Always reported before any upstream call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("{var} environment variable is not set. Please configure it on the server.")]
    Missing { var: String },
}

/// Source of the provider API key, consulted once per request.
pub trait CredentialSource: Send + Sync {
    fn api_key(&self) -> Result<ApiKey, CredentialError>;
}

/// Reads the key from a named environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    /// Whether the variable currently holds a usable value.
    pub fn is_set(&self) -> bool {
        self.api_key().is_ok()
    }
}

impl CredentialSource for EnvCredentials {
    fn api_key(&self) -> Result<ApiKey, CredentialError> {
        match std::env::var(&self.var) {
            Ok(value) if !value.is_empty() => Ok(ApiKey::from(value)),
            _ => Err(CredentialError::Missing {
                var: self.var.clone(),
            }),
        }
    }
}

/// Fixed credential, or a fixed absence of one.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    key: Option<ApiKey>,
    var: String,
}

impl StaticCredentials {
    pub fn new(key: impl Into<ApiKey>) -> Self {
        Self {
            key: Some(key.into()),
            var: crate::config::DEFAULT_API_KEY_ENV.to_string(),
        }
    }

    /// A source that always reports `var` as unset.
    pub fn missing(var: impl Into<String>) -> Self {
        Self {
            key: None,
            var: var.into(),
        }
    }
}

impl CredentialSource for StaticCredentials {
    fn api_key(&self) -> Result<ApiKey, CredentialError> {
        self.key.clone().ok_or_else(|| CredentialError::Missing {
            var: self.var.clone(),
        })
    }
}
