//! OpenAI embeddings provider.
//!
//! API: `POST {base_url}/embeddings` with `{"input": [text], "model": ...}`.
//! The default model `text-embedding-3-small` returns 1536-dim vectors.

use crate::embeddings::provider::{check_dimensions, prepare_text, EmbeddingProvider};
use async_trait::async_trait;
use navigator_core::{AppError, AppResult};
use navigator_llm::RetryPolicy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// OpenAI embedding provider.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: [&'a str; 1],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    /// Create a provider; `endpoint` defaults to the public API.
    pub fn new(
        endpoint: Option<&str>,
        api_key: impl Into<String>,
        model: &str,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Config(format!("Failed to create HTTP client for OpenAI: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: endpoint
                .unwrap_or(DEFAULT_OPENAI_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.into(),
            model: model.to_string(),
            dimensions,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn extract(&self, response: EmbeddingResponse) -> AppResult<Vec<f32>> {
        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                AppError::EmbeddingUnavailable("OpenAI returned no embedding data".to_string())
            })?;
        check_dimensions(embedding, self.dimensions)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), provider = "openai", model = %self.model))]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let text = prepare_text(text)?;
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            input: [text.as_str()],
            model: &self.model,
        };

        let response = self
            .retry
            .send("openai embeddings", || {
                self.client
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&request)
                    .send()
            })
            .await
            .map_err(|e| AppError::EmbeddingUnavailable(format!("OpenAI embeddings: {}", e)))?;

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::EmbeddingUnavailable(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let embedding = self.extract(body)?;
        debug!("Generated {} dimensional embedding", embedding.len());
        Ok(embedding)
    }
}
