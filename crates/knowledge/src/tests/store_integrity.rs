//! Build, persist and reload stores; reject inconsistent artifacts.

use super::fixtures::{twenty_book_catalog, TopicProvider};
use crate::builder::IndexBuilder;
use crate::catalog::{Catalog, CatalogEntry};
use crate::embeddings::providers::MockProvider;
use crate::store::{self, EmbeddingMatrix, VectorStore, ROWS_FILE};
use navigator_core::AppError;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let catalog = twenty_book_catalog();
    let builder = IndexBuilder::new(Arc::new(MockProvider::new(32))).with_concurrency(8);

    let (first, _) = builder.build(&catalog).await.unwrap();
    let (second, _) = builder.build(&catalog).await.unwrap();

    assert_eq!(first.len(), second.len());
    assert_eq!(first.dimensions(), second.dimensions());
    assert_eq!(first.rows(), second.rows());
    assert_eq!(first.matrix(), second.matrix());
}

#[tokio::test]
async fn test_whitespace_only_entries_are_excluded() {
    let entries = vec![
        ("Lean", "validated learning", ""),
        ("Empty", "   ", "\t\n"),
        ("Zero", "", "chapter one"),
        ("Blank", "", ""),
    ]
    .into_iter()
    .enumerate()
    .map(|(id, (title, description, toc))| CatalogEntry {
        id,
        title: title.to_string(),
        author: String::new(),
        description: description.to_string(),
        table_of_contents: toc.to_string(),
    })
    .collect();
    let catalog = Catalog::from_entries(entries, String::new()).unwrap();

    let (store, report) = IndexBuilder::new(Arc::new(MockProvider::new(16)))
        .build(&catalog)
        .await
        .unwrap();

    assert_eq!(store.len(), catalog.len() - report.dropped.len());
    let titles: Vec<&str> = store.rows().iter().map(|r| r.entry.title.as_str()).collect();
    assert_eq!(titles, vec!["Lean", "Zero"]);
    assert_eq!(store.rows()[1].entry.id, 2);
}

#[tokio::test]
async fn test_saved_store_reloads_identically() {
    let temp = TempDir::new().unwrap();
    let catalog = twenty_book_catalog();
    let (built, _) = IndexBuilder::new(Arc::new(TopicProvider))
        .build(&catalog)
        .await
        .unwrap();

    store::save(temp.path(), &built).unwrap();
    let loaded = store::load(temp.path()).unwrap();

    assert_eq!(loaded.rows(), built.rows());
    assert_eq!(loaded.matrix(), built.matrix());
    assert_eq!(loaded.manifest(), built.manifest());
    assert!(store::check_freshness(loaded.manifest(), &catalog));

    let restored = loaded.catalog().unwrap();
    assert_eq!(restored.len(), 20);
    assert!(restored.find_by_title("Traction").is_some());
}

#[tokio::test]
async fn test_truncated_row_table_is_data_unavailable() {
    let temp = TempDir::new().unwrap();
    let (built, _) = IndexBuilder::new(Arc::new(TopicProvider))
        .build(&twenty_book_catalog())
        .await
        .unwrap();
    store::save(temp.path(), &built).unwrap();

    // Drop the last of the 20 rows so the table no longer matches the matrix
    let rows_path = temp.path().join(ROWS_FILE);
    let content = std::fs::read_to_string(&rows_path).unwrap();
    let kept: Vec<&str> = content.lines().take(19).collect();
    std::fs::write(&rows_path, kept.join("\n")).unwrap();

    assert!(matches!(
        store::load(temp.path()),
        Err(AppError::DataUnavailable(_))
    ));
}

#[tokio::test]
async fn test_twenty_rows_against_nineteen_vectors_is_rejected() {
    let (built, _) = IndexBuilder::new(Arc::new(TopicProvider))
        .build(&twenty_book_catalog())
        .await
        .unwrap();

    let nineteen: Vec<Vec<f32>> = built
        .matrix()
        .iter_rows()
        .take(19)
        .map(|row| row.to_vec())
        .collect();
    let matrix = EmbeddingMatrix::from_rows(&nineteen, built.dimensions()).unwrap();

    let result = VectorStore::new(built.manifest().clone(), built.rows().to_vec(), matrix);
    assert!(matches!(result, Err(AppError::DataUnavailable(_))));
}

#[test]
fn test_missing_store_is_data_unavailable() {
    let temp = TempDir::new().unwrap();
    assert!(!store::exists(temp.path()));
    assert!(matches!(
        store::load(temp.path()),
        Err(AppError::DataUnavailable(_))
    ));
}
