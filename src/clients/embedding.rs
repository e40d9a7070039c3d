use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::clients::REQUEST_TIMEOUT;
use crate::config::EmbeddingConfig;
use crate::{Error, Result};

/// What an embedding will be compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Free text typed by a user
    Query,
    /// Stored recipe content
    Document,
}

/// Turns text into a fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, input_type: InputType) -> Result<Vec<f32>>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: [&'a str; 1],
    model: &'a str,
    input_type: InputType,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Voyage AI embeddings API client. One text per request, no retries.
#[derive(Clone)]
pub struct VoyageClient {
    client: Client,
    config: EmbeddingConfig,
}

impl VoyageClient {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Embedder for VoyageClient {
    async fn embed(&self, text: &str, input_type: InputType) -> Result<Vec<f32>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Service("Embedding API key is not configured".to_string()))?;

        let body = EmbeddingRequest {
            input: [text],
            model: &self.config.model,
            input_type,
        };

        debug!("Embedding request: model={} input_type={:?}", self.config.model, input_type);

        let response = self
            .client
            .post(self.endpoint())
            .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Service(format!("Embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            error!("Embedding API error: {} - {}", status, error_body);
            return Err(Error::Service(format!("Embedding API error: {status}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Service(format!("Failed to parse embedding response: {e}")))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| Error::Service("Embedding response contained no vector".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn config(base_url: String, api_key: Option<&str>) -> EmbeddingConfig {
        EmbeddingConfig {
            api_key: api_key.map(str::to_string),
            model: "voyage-lite-01-instruct".to_string(),
            base_url,
            backfill_delay_seconds: 0,
        }
    }

    #[tokio::test]
    async fn test_embed_sends_single_text_with_input_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/embeddings")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::Json(json!({
                "input": ["Ingredients: rice"],
                "model": "voyage-lite-01-instruct",
                "input_type": "query",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"embedding": [0.25, -0.5, 1.0]}]}"#)
            .create_async()
            .await;

        let client = VoyageClient::new(config(server.url(), Some("test-key"))).unwrap();
        let embedding = client
            .embed("Ingredients: rice", InputType::Query)
            .await
            .unwrap();

        assert_eq!(embedding, vec![0.25, -0.5, 1.0]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_maps_http_errors_to_service_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let client = VoyageClient::new(config(server.url(), Some("test-key"))).unwrap();
        let result = client.embed("anything", InputType::Document).await;
        assert!(matches!(result, Err(Error::Service(_))));
    }

    #[tokio::test]
    async fn test_embed_rejects_empty_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        let client = VoyageClient::new(config(server.url(), Some("test-key"))).unwrap();
        let result = client.embed("anything", InputType::Query).await;
        assert!(matches!(result, Err(Error::Service(_))));
    }

    #[tokio::test]
    async fn test_embed_without_api_key_fails_before_request() {
        let client = VoyageClient::new(config("http://127.0.0.1:9".to_string(), None)).unwrap();
        let result = client.embed("anything", InputType::Query).await;
        assert!(matches!(result, Err(Error::Service(_))));
    }
}
