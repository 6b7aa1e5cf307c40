//! Embedding provider trait and factory.

use navigator_core::config::EmbeddingSettings;
use navigator_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

use super::providers::{MockProvider, OllamaProvider, OpenAiProvider};

/// Trait for embedding providers.
///
/// `embed` must fail with `AppError::EmbeddingUnavailable` for blank input,
/// transport errors, malformed responses and vectors of the wrong length.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate the embedding for one text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

/// Replace line breaks with spaces before submission.
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Reject blank input and normalise the rest.
pub(crate) fn prepare_text(text: &str) -> AppResult<String> {
    if text.trim().is_empty() {
        return Err(AppError::EmbeddingUnavailable(
            "Cannot embed empty text".to_string(),
        ));
    }
    Ok(normalize_text(text))
}

/// Check a returned vector against the expected length.
pub(crate) fn check_dimensions(embedding: Vec<f32>, expected: usize) -> AppResult<Vec<f32>> {
    if embedding.is_empty() {
        return Err(AppError::EmbeddingUnavailable(
            "Provider returned an empty embedding".to_string(),
        ));
    }
    if embedding.len() != expected {
        return Err(AppError::EmbeddingUnavailable(format!(
            "Unexpected embedding dimensions: got {}, expected {}",
            embedding.len(),
            expected
        )));
    }
    Ok(embedding)
}

/// Embed under a deadline; a timeout counts as `EmbeddingUnavailable`.
pub async fn embed_within(
    provider: &dyn EmbeddingProvider,
    text: &str,
    timeout: Duration,
) -> AppResult<Vec<f32>> {
    match tokio::time::timeout(timeout, provider.embed(text)).await {
        Ok(result) => result,
        Err(_) => Err(AppError::EmbeddingUnavailable(format!(
            "{} embedding timed out after {}ms",
            provider.provider_name(),
            timeout.as_millis()
        ))),
    }
}

/// Create an embedding provider from the `embedding` config section.
///
/// # Errors
/// `AppError::Config` for an unknown provider name or a missing API key.
pub fn create_provider(
    settings: &EmbeddingSettings,
    timeout: Duration,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    tracing::debug!(
        provider = %settings.provider,
        model = %settings.model,
        dimensions = settings.dimensions,
        "Creating embedding provider"
    );

    match settings.provider.as_str() {
        "mock" => Ok(Arc::new(MockProvider::new(settings.dimensions))),

        "openai" => {
            let api_key = AppConfig::resolve_api_key(settings.api_key_env.as_deref())
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "OpenAI embeddings require an API key in ${}",
                        settings.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY")
                    ))
                })?;
            let provider = OpenAiProvider::new(
                settings.endpoint.as_deref(),
                api_key,
                &settings.model,
                settings.dimensions,
                timeout,
            )?;
            Ok(Arc::new(provider))
        }

        "ollama" => {
            let provider = OllamaProvider::new(
                settings.endpoint.as_deref(),
                &settings.model,
                settings.dimensions,
                timeout,
            )?;
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai, ollama, mock",
            settings.provider
        ))),
    }
}
