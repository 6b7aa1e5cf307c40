//! Provider identifiers.

use navigator_core::{AppError, AppResult};
use std::fmt;
use std::str::FromStr;

/// Supported generative backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    Ollama,
}

impl ProviderType {
    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }

    /// Whether the provider needs an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI)
    }
}

impl FromStr for ProviderType {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(AppError::Config(format!(
                "Unknown LLM provider: {}. Supported: openai, ollama",
                other
            ))),
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!("openai".parse::<ProviderType>().unwrap(), ProviderType::OpenAI);
        assert_eq!(" Ollama ".parse::<ProviderType>().unwrap(), ProviderType::Ollama);
        assert!("claude".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for provider in [ProviderType::OpenAI, ProviderType::Ollama] {
            assert_eq!(provider.to_string().parse::<ProviderType>().unwrap(), provider);
        }
    }
}
