//! Vector Index Builder: embeds every catalog entry into a `VectorStore`.
//!
//! Entries are embedded with bounded concurrency; results come back in
//! catalog order so row `i` of the store is always the `i`-th surviving
//! entry. Entries without content, or whose embedding is unavailable, are
//! dropped and reported.

use crate::catalog::{Catalog, CatalogEntry};
use crate::embeddings::{embed_within, EmbeddingProvider};
use crate::progress::{BuildProgress, ProgressCallback, ProgressReporter};
use crate::store::{EmbeddingMatrix, StoreManifest, StoredBook, VectorStore, STORE_FORMAT_VERSION};
use chrono::Utc;
use futures::StreamExt;
use navigator_core::{AppError, AppResult};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The text that is embedded for one entry.
pub fn combined_document(entry: &CatalogEntry) -> String {
    format!(
        "description: {}\n\ntable of contents: {}",
        entry.description, entry.table_of_contents
    )
}

/// Why an entry did not make it into the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DropReason {
    /// Description and table of contents are both blank
    NoContent,
    /// The provider could not embed the document
    EmbeddingUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedEntry {
    pub id: usize,
    pub title: String,
    pub reason: DropReason,
}

/// Summary of a build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub total: usize,
    pub embedded: usize,
    pub dropped: Vec<DroppedEntry>,
    pub dimensions: usize,
    pub duration_secs: f64,
}

/// Offline batch job turning a catalog into a vector store.
pub struct IndexBuilder {
    provider: Arc<dyn EmbeddingProvider>,
    concurrency: usize,
    timeout: Duration,
    progress: ProgressReporter,
}

impl IndexBuilder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            progress: ProgressReporter::noop(),
        }
    }

    /// Maximum number of embedding calls in flight (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Deadline for each embedding call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = ProgressReporter::new(callback);
        self
    }

    /// Embed every entry of `catalog`.
    ///
    /// # Errors
    /// - `EmbeddingUnavailable` if a vector's length differs from the first
    ///   one (dimension drift)
    /// - any error other than `EmbeddingUnavailable` raised by the provider
    pub async fn build(&self, catalog: &Catalog) -> AppResult<(VectorStore, BuildReport)> {
        let start = Instant::now();
        let total = catalog.len();

        tracing::info!(
            books = total,
            provider = self.provider.provider_name(),
            model = self.provider.model_name(),
            concurrency = self.concurrency,
            "Building vector index"
        );

        let timeout = self.timeout;
        let mut outcomes = futures::stream::iter(catalog.entries().iter().map(|entry| {
            let provider = Arc::clone(&self.provider);
            async move {
                let document = combined_document(entry);
                if !entry.has_content() {
                    return (entry, document, None);
                }
                let result = embed_within(provider.as_ref(), &document, timeout).await;
                (entry, document, Some(result))
            }
        }))
        .buffered(self.concurrency);

        let mut rows = Vec::with_capacity(total);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(total);
        let mut dropped = Vec::new();
        let mut completed = 0usize;

        while let Some((entry, document, outcome)) = outcomes.next().await {
            completed += 1;

            match outcome {
                None => {
                    tracing::debug!(id = entry.id, title = %entry.title, "Skipping entry without content");
                    dropped.push(DroppedEntry {
                        id: entry.id,
                        title: entry.title.clone(),
                        reason: DropReason::NoContent,
                    });
                }
                Some(Err(AppError::EmbeddingUnavailable(reason))) => {
                    tracing::warn!(id = entry.id, title = %entry.title, %reason, "Dropping entry: embedding unavailable");
                    dropped.push(DroppedEntry {
                        id: entry.id,
                        title: entry.title.clone(),
                        reason: DropReason::EmbeddingUnavailable(reason),
                    });
                }
                Some(Err(other)) => return Err(other),
                Some(Ok(vector)) => {
                    if let Some(first) = vectors.first() {
                        if first.len() != vector.len() {
                            return Err(AppError::EmbeddingUnavailable(format!(
                                "Dimension drift at '{}': got {} dimensions, earlier vectors had {}",
                                entry.title,
                                vector.len(),
                                first.len()
                            )));
                        }
                    }
                    rows.push(StoredBook {
                        entry: entry.clone(),
                        combined_text: document,
                    });
                    vectors.push(vector);
                }
            }

            self.progress.emit(BuildProgress {
                completed,
                total,
                dropped: dropped.len(),
            });
        }

        let dimensions = vectors
            .first()
            .map(Vec::len)
            .unwrap_or_else(|| self.provider.dimensions());
        let matrix = EmbeddingMatrix::from_rows(&vectors, dimensions)?;

        let manifest = StoreManifest {
            format_version: STORE_FORMAT_VERSION,
            embedding_provider: self.provider.provider_name().to_string(),
            embedding_model: self.provider.model_name().to_string(),
            dimensions,
            row_count: rows.len(),
            dropped_count: dropped.len(),
            catalog_sha256: catalog.source_digest().to_string(),
            built_at: Utc::now(),
        };

        let store = VectorStore::new(manifest, rows, matrix)?;
        let report = BuildReport {
            total,
            embedded: store.len(),
            dropped,
            dimensions,
            duration_secs: start.elapsed().as_secs_f64(),
        };

        tracing::info!(
            embedded = report.embedded,
            dropped = report.dropped.len(),
            dimensions,
            "Vector index built in {:.2}s",
            report.duration_secs
        );

        Ok((store, report))
    }
}
