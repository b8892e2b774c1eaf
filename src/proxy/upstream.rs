//! HTTP client for the provider's streaming chat completion API.

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{header, Client};

use super::failure::UpstreamError;
use super::types::ChatCompletionRequest;
use crate::config::UpstreamConfig;
use crate::credentials::ApiKey;

/// Raw SSE body of an accepted streaming call.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

/// Client bound to one provider endpoint. Cheap to clone; shares the connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    completions_url: String,
    name: String,
}

impl UpstreamClient {
    /// Build the shared HTTP client. No request timeout is applied, since a
    /// completion may legitimately stream for minutes.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self::with_client(builder.build()?, config))
    }

    pub fn with_client(http: Client, config: &UpstreamConfig) -> Self {
        Self {
            http,
            completions_url: format!(
                "{}/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            name: config.name.clone(),
        }
    }

    /// Provider label used in error text.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }

    /// Issue one streaming completion call and return its body once the
    /// provider has accepted it.
    pub async fn open_stream(
        &self,
        request: &ChatCompletionRequest,
        api_key: &ApiKey,
    ) -> Result<ByteStream, UpstreamError> {
        let response = self
            .http
            .post(&self.completions_url)
            .header(header::ACCEPT, "text/event-stream")
            .bearer_auth(api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url = %self.completions_url, "Failed to reach provider");
                UpstreamError::connectivity(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read provider error body");
                    format!("<failed to read error body: {}>", e)
                }
            };
            tracing::error!(
                status = %status,
                provider = %self.name,
                body = %body,
                "Provider returned error"
            );
            return Err(UpstreamError::from_status(status.as_u16(), &body));
        }

        tracing::debug!(status = %status, model = %request.model, "Upstream stream opened");

        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(UpstreamError::connectivity)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::failure::FailureClass;

    #[test]
    fn test_completions_url_trims_trailing_slash() {
        let config = UpstreamConfig {
            base_url: "http://localhost:4000/v1/".to_string(),
            ..UpstreamConfig::default()
        };
        let client = UpstreamClient::new(&config).unwrap();
        assert_eq!(
            client.completions_url(),
            "http://localhost:4000/v1/chat/completions"
        );
        assert_eq!(client.name(), "OpenAI");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_connectivity_failure() {
        // Reserve a free port, then release it so nothing is listening there
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = UpstreamConfig {
            base_url: format!("http://127.0.0.1:{}/v1", port),
            ..UpstreamConfig::default()
        };
        let client = UpstreamClient::new(&config).unwrap();
        let request = ChatCompletionRequest {
            model: "gpt-4.1-mini".to_string(),
            messages: vec![],
            stream: true,
        };

        let err = match client.open_stream(&request, &ApiKey::from("sk-test")).await {
            Ok(_) => panic!("expected connection failure"),
            Err(err) => err,
        };
        assert_eq!(err.class, FailureClass::Connectivity);
    }
}
