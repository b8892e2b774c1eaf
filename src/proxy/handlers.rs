//! HTTP request handlers.

use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    extract::{Extension, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;

use super::relay::relay;
use super::server::{AppState, RequestId};
use super::types::ChatRequest;
use crate::error::Error;

/// Handle POST /api/chat
///
/// The body is validated and the credential looked up before anything is
/// sent upstream; both failures are ordinary HTTP errors. After that the
/// response is always `200` and upstream failures arrive as body text.
pub async fn chat(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Response, Error> {
    let request = ChatRequest::from_slice(&body).inspect_err(|e| {
        tracing::info!(request_id = %request_id, error = %e, "Rejected chat request");
    })?;

    let settings = &state.config.upstream;
    let completion =
        request.to_completion_request(&settings.default_model, settings.instruction_role);

    tracing::info!(
        request_id = %request_id,
        model = %completion.model,
        developer_bytes = request.developer_message.len(),
        user_bytes = request.user_message.len(),
        "Received chat request"
    );

    let api_key = state.credentials.api_key().inspect_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "No provider credential");
    })?;

    let fragments = relay(
        state.upstream.clone(),
        completion,
        api_key,
        request_id.to_string(),
    );

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(fragments.map(Ok::<_, Infallible>)),
    )
        .into_response())
}

/// Handle GET /api/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_body() {
        let response = health().await.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], br#"{"status":"ok"}"#);
    }
}
