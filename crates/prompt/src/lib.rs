//! Prompt system for Startup Navigator.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions (built-in defaults, workspace overrides)
//! - Handlebars template rendering against a JSON context

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompt, load_prompt, RECOMMEND_PROMPT_ID};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptOutputSpec,
    PromptSource,
};
