//! Book catalog retrieval and recommendation.
//!
//! Offline, the catalog is embedded into a persisted vector store. At query
//! time a founder's problem is embedded, ranked against the store, and the
//! best candidates are handed to a language model that picks one book.

pub mod builder;
pub mod catalog;
pub mod embeddings;
pub mod progress;
pub mod ranker;
pub mod recommend;
pub mod store;
pub mod types;
pub mod wizard;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use builder::{combined_document, BuildReport, DropReason, DroppedEntry, IndexBuilder};
pub use catalog::{Catalog, CatalogEntry};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use progress::{BuildProgress, ProgressCallback};
pub use ranker::{cosine_similarity, rank, Retriever};
pub use recommend::{QueryPipeline, Recommender};
pub use store::{StoreManifest, VectorStore};
pub use types::{Challenge, GrowthStage, RankedCandidate, Recommendation, UserQuery};
pub use wizard::{transition, SessionContext, WizardEvent, WizardState};

use navigator_core::{AppConfig, AppError, AppResult};
use navigator_llm::create_client_from_settings;
use navigator_prompt::{load_prompt, RECOMMEND_PROMPT_ID};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn request_timeout(config: &AppConfig) -> Duration {
    Duration::from_secs(config.retrieval.request_timeout_secs)
}

/// Embed the catalog at `catalog_path` and persist the store.
pub async fn build_index(
    config: &AppConfig,
    catalog_path: &Path,
    progress: Option<ProgressCallback>,
) -> AppResult<BuildReport> {
    let catalog = Catalog::load(catalog_path)?;
    let provider = create_provider(&config.embedding, request_timeout(config))?;

    let mut builder = IndexBuilder::new(provider)
        .with_concurrency(config.retrieval.concurrency)
        .with_timeout(request_timeout(config));
    if let Some(callback) = progress {
        builder = builder.with_progress(callback);
    }

    let (vector_store, report) = builder.build(&catalog).await?;
    if vector_store.is_empty() {
        return Err(AppError::DataUnavailable(format!(
            "No catalog entry could be embedded ({} dropped); store not written",
            report.dropped.len()
        )));
    }

    store::save(&config.store_dir(), &vector_store)?;
    Ok(report)
}

/// Load the persisted store, warning when the catalog file has changed since.
pub fn load_store(config: &AppConfig) -> AppResult<Arc<VectorStore>> {
    let dir = config.store_dir();
    if !store::exists(&dir) {
        return Err(AppError::DataUnavailable(format!(
            "No vector store in {:?}. Run 'navigator build-index' first.",
            dir
        )));
    }

    let vector_store = store::load(&dir)?;

    // Staleness is advisory; the store carries its own copy of the catalog.
    match Catalog::load(&config.catalog_path()) {
        Ok(catalog) => {
            store::check_freshness(vector_store.manifest(), &catalog);
        }
        Err(e) => tracing::debug!("Skipping freshness check: {}", e),
    }

    Ok(Arc::new(vector_store))
}

/// Retrieval only; needs no language model.
pub fn open_retriever(config: &AppConfig) -> AppResult<Retriever> {
    let vector_store = load_store(config)?;
    let provider = create_provider(&config.embedding, request_timeout(config))?;
    Ok(Retriever::new(provider, vector_store, request_timeout(config)))
}

/// Everything needed to answer a `UserQuery`.
pub fn open_pipeline(config: &AppConfig) -> AppResult<QueryPipeline> {
    let retriever = open_retriever(config)?;
    let catalog = Arc::new(retriever.store().catalog()?);

    let llm = create_client_from_settings(&config.llm)?;
    let (prompt, source) = load_prompt(&config.prompts_dir(), RECOMMEND_PROMPT_ID)?;
    tracing::debug!(prompt = %prompt.id, ?source, "Using recommendation prompt");

    let recommender = Recommender::new(llm, config.llm.model.clone(), catalog, prompt)
        .with_temperature(config.llm.temperature)
        .with_max_tokens(config.llm.max_tokens)
        .with_timeout(request_timeout(config));

    Ok(QueryPipeline::new(
        retriever,
        recommender,
        config.retrieval.top_k,
    ))
}
