//! LLM provider factory.
//!
//! Resolves the configured provider name into a client, injecting the API key
//! from the environment when the provider needs one.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use navigator_core::config::LlmSettings;
use navigator_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client by provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required by OpenAI)
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required key
/// is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider: ProviderType = provider.parse()?;

    match provider {
        ProviderType::Ollama => {
            let client = match endpoint {
                Some(url) => OllamaClient::with_base_url(url),
                None => OllamaClient::new(),
            };
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => OpenAiClient::with_base_url(url, api_key),
                None => OpenAiClient::new(api_key),
            };
            Ok(Arc::new(client))
        }
    }
}

/// Create an LLM client from the `llm` config section.
pub fn create_client_from_settings(settings: &LlmSettings) -> AppResult<Arc<dyn LlmClient>> {
    let api_key = AppConfig::resolve_api_key(settings.api_key_env.as_deref());

    tracing::debug!(
        provider = %settings.provider,
        model = %settings.model,
        has_key = api_key.is_some(),
        "Creating LLM client"
    );

    create_client(
        &settings.provider,
        settings.endpoint.as_deref(),
        api_key.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("ollama", Some("http://localhost:8080"), None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_openai_client() {
        let client = create_client("openai", None, Some("sk-test")).unwrap();
        assert_eq!(client.provider_name(), "openai");
    }

    #[test]
    fn test_openai_requires_api_key() {
        match create_client("openai", None, None) {
            Err(err) => assert!(err.to_string().contains("requires API key")),
            Ok(_) => panic!("Expected error for OpenAI without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None) {
            Err(err) => assert!(err.to_string().contains("Unknown LLM provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }

    #[test]
    fn test_settings_with_unset_key_env() {
        let settings = LlmSettings {
            provider: "openai".to_string(),
            api_key_env: Some("NAVIGATOR_TEST_KEY_THAT_IS_NOT_SET".to_string()),
            ..LlmSettings::default()
        };
        assert!(create_client_from_settings(&settings).is_err());
    }
}
