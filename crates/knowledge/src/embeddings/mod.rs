//! Embedding Provider: maps text to fixed-length vectors.
//!
//! The same provider (and model) must be used for building the index and for
//! embedding queries; the store manifest records which one was used.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, embed_within, normalize_text, EmbeddingProvider};
