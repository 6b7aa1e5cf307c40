//! Similarity Ranker: exhaustive cosine scan over the vector store.

use crate::embeddings::{embed_within, EmbeddingProvider};
use crate::store::VectorStore;
use crate::types::RankedCandidate;
use navigator_core::{AppError, AppResult};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Cosine similarity clamped to [-1, 1].
///
/// Returns `None` for empty or mismatched vectors and when either vector has
/// zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    Some((dot / denom).clamp(-1.0, 1.0) as f32)
}

/// Rank every stored book against `query` and keep the best `k`.
///
/// The result has `min(k, store.len())` entries ordered by non-increasing
/// score; ties keep store order. Stored rows with zero norm score 0.0.
///
/// # Errors
/// - `DegenerateQuery` if the query has zero norm or non-finite values
/// - `DataUnavailable` if the query length differs from the store dimensions
pub fn rank(query: &[f32], store: &VectorStore, k: usize) -> AppResult<Vec<RankedCandidate>> {
    if query.iter().any(|v| !v.is_finite()) {
        return Err(AppError::DegenerateQuery(
            "Query embedding contains non-finite values".to_string(),
        ));
    }
    if query.iter().all(|v| *v == 0.0) {
        return Err(AppError::DegenerateQuery(
            "Query embedding has zero norm".to_string(),
        ));
    }
    if store.is_empty() {
        return Ok(Vec::new());
    }
    if query.len() != store.dimensions() {
        return Err(AppError::DataUnavailable(format!(
            "Query has {} dimensions but the store was built with {} ({}); rebuild the index or switch embedding model",
            query.len(),
            store.dimensions(),
            store.manifest().embedding_model
        )));
    }

    if k == 0 {
        return Ok(Vec::new());
    }

    let mut scored: Vec<(usize, f32)> = store
        .matrix()
        .iter_rows()
        .map(|row| cosine_similarity(query, row).unwrap_or(0.0))
        .enumerate()
        .collect();

    // sort_by is stable, so equal scores keep row order
    scored.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);

    let candidates: Vec<RankedCandidate> = scored
        .into_iter()
        .filter_map(|(index, score)| {
            store.rows().get(index).map(|row| RankedCandidate {
                entry: row.entry.clone(),
                score,
            })
        })
        .collect();

    tracing::debug!(
        candidates = candidates.len(),
        top_score = candidates.first().map(|c| c.score),
        "Ranked store"
    );

    Ok(candidates)
}

/// Embeds free-text queries and ranks them against a loaded store.
#[derive(Debug, Clone)]
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<VectorStore>,
    timeout: Duration,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<VectorStore>,
        timeout: Duration,
    ) -> Self {
        if provider.model_name() != store.manifest().embedding_model {
            tracing::warn!(
                store_model = %store.manifest().embedding_model,
                query_model = provider.model_name(),
                "Query embedding model differs from the one the store was built with"
            );
        }
        Self {
            provider,
            store,
            timeout,
        }
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Top `k` stored books for `text`.
    ///
    /// # Errors
    /// `EmbeddingUnavailable` when the query cannot be embedded in time, plus
    /// everything `rank` reports.
    pub async fn search(&self, text: &str, k: usize) -> AppResult<Vec<RankedCandidate>> {
        let embedding = embed_within(self.provider.as_ref(), text, self.timeout).await?;
        rank(&embedding, &self.store, k)
    }
}
