//! HTTP client for the generative API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::config::ApiKey;
use crate::upstream::endpoint::EndpointTemplate;

/// Raw upstream answer; the relay decides how to interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: String,
}

/// Errors that prevent an upstream answer from being obtained at all.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// The URL is stripped from the inner error since it carries the key.
    #[error("{0}")]
    Transport(reqwest::Error),
}

impl UpstreamError {
    fn transport(err: reqwest::Error) -> Self {
        UpstreamError::Transport(err.without_url())
    }
}

/// Submits a JSON payload to the generative API.
#[async_trait]
pub trait GenerativeApi: Send + Sync {
    async fn generate_content(
        &self,
        payload: &Value,
        api_key: &ApiKey,
    ) -> Result<UpstreamReply, UpstreamError>;
}

/// `generateContent` client. One POST per call, no retries.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: EndpointTemplate,
}

impl GeminiClient {
    pub fn new(client: Client, endpoint: EndpointTemplate) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl GenerativeApi for GeminiClient {
    async fn generate_content(
        &self,
        payload: &Value,
        api_key: &ApiKey,
    ) -> Result<UpstreamReply, UpstreamError> {
        let url = self.endpoint.resolve(api_key)?;

        tracing::debug!(model = %self.endpoint.model(), "Sending request to upstream");

        // `json` sets Content-Type: application/json.
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(UpstreamError::transport)?;
        let status = response.status();
        let body = response.text().await.map_err(UpstreamError::transport)?;

        Ok(UpstreamReply { status, body })
    }
}
