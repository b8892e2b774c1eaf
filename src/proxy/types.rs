//! Inbound chat request validation and OpenAI-compatible wire types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::InstructionRole;

/// A validated `POST /api/chat` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub developer_message: String,
    pub user_message: String,
    /// Requested model; `None` means the configured default.
    pub model: Option<String>,
}

/// One problem found in a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl FieldError {
    fn body(msg: impl Into<String>, kind: &'static str) -> Self {
        Self {
            loc: vec!["body".to_string()],
            msg: msg.into(),
            kind,
        }
    }

    fn field(name: &str, msg: &str, kind: &'static str) -> Self {
        Self {
            loc: vec!["body".to_string(), name.to_string()],
            msg: msg.to_string(),
            kind,
        }
    }
}

/// Request body rejected before any upstream call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid request body: {}", summarize(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.loc.join("."), e.msg))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ChatRequest {
    /// Parse and type-check a raw JSON body.
    ///
    /// Every field problem is collected, not just the first. Unknown fields are
    /// ignored and `"model": null` counts as absent.
    pub fn from_slice(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(body).map_err(|e| ValidationError {
            errors: vec![FieldError::body(
                format!("JSON decode error: {}", e),
                "json_invalid",
            )],
        })?;

        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let object = value.as_object().ok_or_else(|| ValidationError {
            errors: vec![FieldError::body(
                "Input should be a valid dictionary or object to extract fields from",
                "model_attributes_type",
            )],
        })?;

        let mut errors = Vec::new();
        let developer_message = required_string(object, "developer_message", &mut errors);
        let user_message = required_string(object, "user_message", &mut errors);
        let model = optional_string(object, "model", &mut errors);

        match (developer_message, user_message) {
            (Some(developer_message), Some(user_message)) if errors.is_empty() => Ok(Self {
                developer_message,
                user_message,
                model,
            }),
            _ => Err(ValidationError { errors }),
        }
    }

    /// Build the upstream streaming request: instruction first, user second.
    pub fn to_completion_request(
        &self,
        default_model: &str,
        instruction_role: InstructionRole,
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            messages: vec![
                Message {
                    role: instruction_role.into(),
                    content: self.developer_message.clone(),
                },
                Message {
                    role: Role::User,
                    content: self.user_message.clone(),
                },
            ],
            stream: true,
        }
    }
}

fn required_string(
    object: &Map<String, Value>,
    name: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match object.get(name) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(FieldError::field(
                name,
                "Input should be a valid string",
                "string_type",
            ));
            None
        }
        None => {
            errors.push(FieldError::field(name, "Field required", "missing"));
            None
        }
    }
}

fn optional_string(
    object: &Map<String, Value>,
    name: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match object.get(name) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(_) => {
            errors.push(FieldError::field(
                name,
                "Input should be a valid string",
                "string_type",
            ));
            None
        }
    }
}

/// Message author role on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Developer,
    System,
    User,
}

impl From<InstructionRole> for Role {
    fn from(role: InstructionRole) -> Self {
        match role {
            InstructionRole::Developer => Role::Developer,
            InstructionRole::System => Role::System,
        }
    }
}

/// Streaming chat completion request sent upstream.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Streaming chunk as emitted in each SSE `data:` line.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Some providers report failures inside an otherwise healthy stream.
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// A streaming choice delta.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,
}

/// Delta content in streaming response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Text of the first choice's delta, if any.
    pub fn content(&self) -> Option<&str> {
        self.choices.first()?.delta.content.as_deref()
    }
}

/// Provider error object, as found under `"error"` in error bodies and stream events.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}
