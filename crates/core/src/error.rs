//! Error types for Startup Navigator.
//!
//! A single error enum covers the whole pipeline. The four domain variants
//! (`DataUnavailable`, `EmbeddingUnavailable`, `DegenerateQuery`,
//! `GenerationFailed`) are the ones a user-facing surface reacts to; the rest
//! describe configuration and plumbing failures.

use thiserror::Error;

/// Unified error type for Startup Navigator.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog or vector store artifact missing, corrupt or inconsistent
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// Embedding could not be produced for a text
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Query vector has zero norm, so cosine similarity is undefined
    #[error("Degenerate query: {0}")]
    DegenerateQuery(String),

    /// The generative call failed or returned an unusable document
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// LLM provider transport errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt loading and rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Invalid user input (empty problem text, unknown stage, wrong wizard step)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the user can fix this by re-entering input and resubmitting.
    ///
    /// `DataUnavailable` and configuration errors need an operator to rebuild
    /// or reconfigure; everything raised per query can be retried.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            AppError::EmbeddingUnavailable(_)
                | AppError::DegenerateQuery(_)
                | AppError::GenerationFailed(_)
                | AppError::InvalidInput(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::DataUnavailable(format!("Malformed catalog file: {}", err))
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_correctable_classification() {
        assert!(AppError::GenerationFailed("x".into()).is_user_correctable());
        assert!(AppError::DegenerateQuery("x".into()).is_user_correctable());
        assert!(AppError::EmbeddingUnavailable("x".into()).is_user_correctable());
        assert!(!AppError::DataUnavailable("x".into()).is_user_correctable());
        assert!(!AppError::Config("x".into()).is_user_correctable());
    }

    #[test]
    fn test_display_prefixes() {
        let err = AppError::DataUnavailable("store missing".to_string());
        assert_eq!(err.to_string(), "Data unavailable: store missing");
    }
}
