//! Catalog Store: the curated list of books recommendations are drawn from.
//!
//! The catalog is a CSV file with at least the columns `name`, `author`,
//! `intro` and `table`. Extra columns are ignored. Rows keep their file order
//! and a book's `id` is its zero-based row position.

use csv::ReaderBuilder;
use navigator_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 4] = ["name", "author", "intro", "table"];

/// A single book in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Row position in the source file
    pub id: usize,
    pub title: String,
    pub author: String,
    pub description: String,
    pub table_of_contents: String,
}

impl CatalogEntry {
    /// Whether the entry has any text worth embedding.
    pub fn has_content(&self) -> bool {
        !self.description.trim().is_empty() || !self.table_of_contents.trim().is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    intro: Option<String>,
    #[serde(default)]
    table: Option<String>,
}

/// Ordered, immutable collection of catalog entries with a title index.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_title: HashMap<String, usize>,
    source_digest: String,
}

impl Catalog {
    /// Load and validate a catalog CSV file.
    ///
    /// # Errors
    /// `DataUnavailable` when the file is missing or unreadable, a required
    /// column is absent, a title is empty, or two rows share a title.
    pub fn load(path: &Path) -> AppResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::DataUnavailable(format!("Cannot read catalog {:?}: {}", path, e))
        })?;

        let catalog = Self::parse(&bytes)?;
        tracing::info!(
            path = %path.display(),
            books = catalog.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Parse catalog CSV content.
    pub fn parse(bytes: &[u8]) -> AppResult<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::DataUnavailable(format!(
                "Catalog is missing required column(s): {}",
                missing.join(", ")
            )));
        }

        let mut entries = Vec::new();
        for (id, record) in reader.deserialize::<CatalogRecord>().enumerate() {
            let record = record?;
            entries.push(CatalogEntry {
                id,
                title: record.name.unwrap_or_default(),
                author: record.author.unwrap_or_default(),
                description: record.intro.unwrap_or_default(),
                table_of_contents: record.table.unwrap_or_default(),
            });
        }

        Self::from_entries(entries, digest(bytes))
    }

    /// Build a catalog from entries already in row order.
    pub fn from_entries(entries: Vec<CatalogEntry>, source_digest: String) -> AppResult<Self> {
        let mut by_title = HashMap::with_capacity(entries.len());

        for (position, entry) in entries.iter().enumerate() {
            let title = entry.title.trim();
            if title.is_empty() {
                return Err(AppError::DataUnavailable(format!(
                    "Catalog row {} has an empty title",
                    entry.id
                )));
            }
            if let Some(previous) = by_title.insert(title.to_string(), position) {
                return Err(AppError::DataUnavailable(format!(
                    "Duplicate title '{}' in catalog rows {} and {}",
                    title, entries[previous].id, entry.id
                )));
            }
        }

        Ok(Self {
            entries,
            by_title,
            source_digest,
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its row id.
    pub fn get(&self, id: usize) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Exact title lookup, ignoring surrounding whitespace.
    pub fn find_by_title(&self, title: &str) -> Option<&CatalogEntry> {
        self.by_title
            .get(title.trim())
            .and_then(|&position| self.entries.get(position))
    }

    /// SHA-256 of the source file, hex encoded.
    pub fn source_digest(&self) -> &str {
        &self.source_digest
    }
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
