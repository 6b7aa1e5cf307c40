//! Ollama embedding provider.
//!
//! Provides embeddings via Ollama's local API (`POST /api/embeddings`) using
//! models like `nomic-embed-text` or `bge-m3`. Nothing leaves the machine.

use crate::embeddings::provider::{check_dimensions, prepare_text, EmbeddingProvider};
use async_trait::async_trait;
use navigator_core::{AppError, AppResult};
use navigator_llm::RetryPolicy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Ollama embedding provider using the local API.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

/// Request payload for Ollama embeddings API
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaProvider {
    /// Create a provider. `endpoint` falls back to `OLLAMA_URL`, then localhost.
    pub fn new(
        endpoint: Option<&str>,
        model: &str,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Config(format!("Failed to create HTTP client for Ollama: {}", e))
        })?;

        let base_url = endpoint
            .map(str::to_string)
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), provider = "ollama", model = %self.model))]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let text = prepare_text(text)?;
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: &text,
        };

        debug!("Sending embedding request to {}", url);

        let response = self
            .retry
            .send("ollama embeddings", || {
                self.client.post(&url).json(&request).send()
            })
            .await
            .map_err(|e| {
                AppError::EmbeddingUnavailable(format!(
                    "Ollama at {} (is model '{}' pulled?): {}",
                    self.base_url, self.model, e
                ))
            })?;

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::EmbeddingUnavailable(format!("Failed to parse Ollama response: {}", e))
        })?;

        check_dimensions(body.embedding, self.dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OllamaProvider {
        OllamaProvider::new(
            Some("http://127.0.0.1:1/"),
            "nomic-embed-text",
            768,
            Duration::from_secs(1),
        )
        .unwrap()
        .with_retry(RetryPolicy::none())
    }

    #[test]
    fn test_provider_identity() {
        let p = provider();
        assert_eq!(p.provider_name(), "ollama");
        assert_eq!(p.model_name(), "nomic-embed-text");
        assert_eq!(p.dimensions(), 768);
        assert_eq!(p.base_url, "http://127.0.0.1:1");
    }

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(EmbeddingRequest {
            model: "nomic-embed-text",
            prompt: "hello",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"model": "nomic-embed-text", "prompt": "hello"}));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let result = provider().embed("hello").await;
        assert!(matches!(result, Err(AppError::EmbeddingUnavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_text() {
        let result = provider().embed("").await;
        assert!(matches!(result, Err(AppError::EmbeddingUnavailable(_))));
    }
}
