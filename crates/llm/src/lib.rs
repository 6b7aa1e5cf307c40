//! LLM integration crate for Startup Navigator.
//!
//! Provides a provider-agnostic completion interface used by the
//! recommendation step.
//!
//! # Providers
//! - **OpenAI**: chat completions API (default, `gpt-4o-mini`)
//! - **Ollama**: local LLM runtime
//!
//! # Example
//! ```no_run
//! use navigator_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Reply with {}", "llama3.2").with_json_mode();
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod retry;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, create_client_from_settings};
pub use providers::{OllamaClient, OpenAiClient};
pub use retry::{RetryPolicy, SendError};
pub use types::ProviderType;
