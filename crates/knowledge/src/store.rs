//! VectorStore persistence.
//!
//! A built store is three artifacts in one directory:
//! - `manifest.json`: provider, model, dimensions, row count, catalog digest
//! - `vector_store.jsonl`: one catalog row per line, with its combined text
//!   and inline embedding
//! - `embeddings_matrix.bin`: `NVMX` magic, `u32` version, `u64` rows,
//!   `u64` dims (little-endian), then `rows * dims` little-endian `f32`
//!
//! Row `i` of the JSONL file corresponds to row `i` of the matrix. Loading
//! cross-checks all three and refuses anything inconsistent.

use crate::catalog::{Catalog, CatalogEntry};
use chrono::{DateTime, Utc};
use navigator_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const ROWS_FILE: &str = "vector_store.jsonl";
pub const MATRIX_FILE: &str = "embeddings_matrix.bin";

pub const STORE_FORMAT_VERSION: u32 = 1;

const MATRIX_MAGIC: &[u8; 4] = b"NVMX";
const MATRIX_HEADER_LEN: usize = 4 + 4 + 8 + 8;

/// Build metadata persisted next to the vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreManifest {
    pub format_version: u32,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub dimensions: usize,
    pub row_count: usize,
    pub dropped_count: usize,
    pub catalog_sha256: String,
    pub built_at: DateTime<Utc>,
}

/// A catalog entry that made it into the index.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBook {
    pub entry: CatalogEntry,
    pub combined_text: String,
}

/// Row-major dense matrix of embeddings.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    rows: usize,
    dimensions: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Stack equal-length vectors into a matrix.
    pub fn from_rows(vectors: &[Vec<f32>], dimensions: usize) -> AppResult<Self> {
        let mut data = Vec::with_capacity(vectors.len() * dimensions);
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(AppError::DataUnavailable(format!(
                    "Embedding row {} has {} dimensions, expected {}",
                    i,
                    vector.len(),
                    dimensions
                )));
            }
            data.extend_from_slice(vector);
        }

        Ok(Self {
            rows: vectors.len(),
            dimensions,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Borrow row `index`.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.dimensions;
        self.data.get(start..start + self.dimensions)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on zero; an empty store has no rows anyway
        self.data.chunks_exact(self.dimensions.max(1))
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(MATRIX_HEADER_LEN + self.data.len() * 4);
        bytes.extend_from_slice(MATRIX_MAGIC);
        bytes.extend_from_slice(&STORE_FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(self.rows as u64).to_le_bytes());
        bytes.extend_from_slice(&(self.dimensions as u64).to_le_bytes());
        for value in &self.data {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> AppResult<Self> {
        let corrupt = |reason: &str| {
            AppError::DataUnavailable(format!("Corrupt embeddings matrix: {}", reason))
        };

        if bytes.len() < MATRIX_HEADER_LEN {
            return Err(corrupt("file shorter than header"));
        }
        if &bytes[0..4] != MATRIX_MAGIC {
            return Err(corrupt("bad magic"));
        }

        let version = u32::from_le_bytes(read_array(&bytes[4..8]));
        if version != STORE_FORMAT_VERSION {
            return Err(corrupt(&format!("unsupported version {}", version)));
        }

        let rows = u64::from_le_bytes(read_array(&bytes[8..16])) as usize;
        let dimensions = u64::from_le_bytes(read_array(&bytes[16..24])) as usize;

        let payload = &bytes[MATRIX_HEADER_LEN..];
        let expected = rows
            .checked_mul(dimensions)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| corrupt("header dimensions overflow"))?;
        if payload.len() != expected {
            return Err(corrupt(&format!(
                "expected {} bytes of data for {}x{}, found {}",
                expected,
                rows,
                dimensions,
                payload.len()
            )));
        }

        let data = payload
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes(read_array(chunk)))
            .collect();

        Ok(Self {
            rows,
            dimensions,
            data,
        })
    }
}

fn read_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&slice[..N]);
    out
}

/// One line of `vector_store.jsonl`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRow {
    id: usize,
    name: String,
    author: String,
    intro: String,
    table: String,
    combined_text: String,
    embedding: Vec<f32>,
}

/// The persisted index: catalog rows plus their embedding matrix.
#[derive(Debug, Clone)]
pub struct VectorStore {
    manifest: StoreManifest,
    rows: Vec<StoredBook>,
    matrix: EmbeddingMatrix,
}

impl VectorStore {
    /// Assemble a store, checking that rows, matrix and manifest agree.
    pub fn new(
        manifest: StoreManifest,
        rows: Vec<StoredBook>,
        matrix: EmbeddingMatrix,
    ) -> AppResult<Self> {
        if rows.len() != matrix.rows() {
            return Err(AppError::DataUnavailable(format!(
                "Catalog table has {} rows but embeddings matrix has {}",
                rows.len(),
                matrix.rows()
            )));
        }
        if manifest.row_count != rows.len() {
            return Err(AppError::DataUnavailable(format!(
                "Manifest lists {} rows but store has {}",
                manifest.row_count,
                rows.len()
            )));
        }
        if manifest.dimensions != matrix.dimensions() {
            return Err(AppError::DataUnavailable(format!(
                "Manifest lists {} dimensions but matrix has {}",
                manifest.dimensions,
                matrix.dimensions()
            )));
        }

        Ok(Self {
            manifest,
            rows,
            matrix,
        })
    }

    pub fn manifest(&self) -> &StoreManifest {
        &self.manifest
    }

    pub fn rows(&self) -> &[StoredBook] {
        &self.rows
    }

    pub fn matrix(&self) -> &EmbeddingMatrix {
        &self.matrix
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.matrix.dimensions()
    }

    /// Catalog view over the indexed rows, used to resolve titles.
    pub fn catalog(&self) -> AppResult<Catalog> {
        Catalog::from_entries(
            self.rows.iter().map(|row| row.entry.clone()).collect(),
            self.manifest.catalog_sha256.clone(),
        )
    }
}

/// Whether a store directory holds all three artifacts.
pub fn exists(dir: &Path) -> bool {
    [MANIFEST_FILE, ROWS_FILE, MATRIX_FILE]
        .iter()
        .all(|name| dir.join(name).is_file())
}

/// Persist a store atomically.
///
/// All three artifacts are written to `.tmp` siblings first and renamed only
/// once every write has succeeded. The manifest is the commit marker: the old
/// one is removed before the data files are swapped in, and the new one is
/// renamed last, so an interrupted save never leaves a manifest describing
/// another build's rows.
pub fn save(dir: &Path, store: &VectorStore) -> AppResult<()> {
    std::fs::create_dir_all(dir)?;

    let manifest_path = dir.join(MANIFEST_FILE);
    let rows_path = dir.join(ROWS_FILE);
    let matrix_path = dir.join(MATRIX_FILE);

    let manifest_tmp = tmp_path(&manifest_path);
    let rows_tmp = tmp_path(&rows_path);
    let matrix_tmp = tmp_path(&matrix_path);

    if let Err(e) = write_artifacts(store, &manifest_tmp, &rows_tmp, &matrix_tmp) {
        for temp in [&manifest_tmp, &rows_tmp, &matrix_tmp] {
            let _ = std::fs::remove_file(temp);
        }
        return Err(e);
    }

    match std::fs::remove_file(&manifest_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    std::fs::rename(&rows_tmp, &rows_path)?;
    std::fs::rename(&matrix_tmp, &matrix_path)?;
    std::fs::rename(&manifest_tmp, &manifest_path)?;

    tracing::info!(
        dir = %dir.display(),
        rows = store.len(),
        dimensions = store.dimensions(),
        "Saved vector store"
    );
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_artifacts(
    store: &VectorStore,
    manifest_path: &Path,
    rows_path: &Path,
    matrix_path: &Path,
) -> AppResult<()> {
    std::fs::write(manifest_path, serde_json::to_vec_pretty(&store.manifest)?)?;

    let mut writer = BufWriter::new(std::fs::File::create(rows_path)?);
    for (book, vector) in store.rows.iter().zip(store.matrix.iter_rows()) {
        let row = StoredRow {
            id: book.entry.id,
            name: book.entry.title.clone(),
            author: book.entry.author.clone(),
            intro: book.entry.description.clone(),
            table: book.entry.table_of_contents.clone(),
            combined_text: book.combined_text.clone(),
            embedding: vector.to_vec(),
        };
        serde_json::to_writer(&mut writer, &row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    std::fs::write(matrix_path, store.matrix.to_bytes())?;
    Ok(())
}

/// Load and cross-validate a store.
///
/// # Errors
/// `DataUnavailable` if an artifact is missing or corrupt, or if the manifest,
/// the row table and the matrix disagree in any way.
pub fn load(dir: &Path) -> AppResult<VectorStore> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let rows_path = dir.join(ROWS_FILE);
    let matrix_path = dir.join(MATRIX_FILE);

    for path in [&manifest_path, &rows_path, &matrix_path] {
        if !path.is_file() {
            return Err(AppError::DataUnavailable(format!(
                "Vector store artifact {:?} not found. Run `navigator build-index` first.",
                path
            )));
        }
    }

    let manifest: StoreManifest = serde_json::from_slice(&read_artifact(&manifest_path)?)
        .map_err(|e| AppError::DataUnavailable(format!("Corrupt store manifest: {}", e)))?;
    if manifest.format_version != STORE_FORMAT_VERSION {
        return Err(AppError::DataUnavailable(format!(
            "Store format version {} is not supported (expected {})",
            manifest.format_version, STORE_FORMAT_VERSION
        )));
    }

    let matrix = EmbeddingMatrix::from_bytes(&read_artifact(&matrix_path)?)?;

    let file = std::fs::File::open(&rows_path).map_err(|e| unreadable(&rows_path, e))?;
    let mut rows = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| unreadable(&rows_path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let row: StoredRow = serde_json::from_str(&line).map_err(|e| {
            AppError::DataUnavailable(format!(
                "Corrupt store row at line {}: {}",
                line_no + 1,
                e
            ))
        })?;
        if row.embedding.len() != matrix.dimensions() {
            return Err(AppError::DataUnavailable(format!(
                "Store row {} has {} inline dimensions, matrix has {}",
                row.id,
                row.embedding.len(),
                matrix.dimensions()
            )));
        }
        rows.push(StoredBook {
            entry: CatalogEntry {
                id: row.id,
                title: row.name,
                author: row.author,
                description: row.intro,
                table_of_contents: row.table,
            },
            combined_text: row.combined_text,
        });
    }

    let store = VectorStore::new(manifest, rows, matrix)?;
    tracing::info!(
        dir = %dir.display(),
        rows = store.len(),
        dimensions = store.dimensions(),
        model = %store.manifest.embedding_model,
        "Loaded vector store"
    );
    Ok(store)
}

fn read_artifact(path: &Path) -> AppResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| unreadable(path, e))
}

fn unreadable(path: &Path, err: std::io::Error) -> AppError {
    AppError::DataUnavailable(format!("Cannot read store artifact {:?}: {}", path, err))
}

/// Whether the store was built from the catalog as it is now.
///
/// A stale store still works, so this only warns.
pub fn check_freshness(manifest: &StoreManifest, catalog: &Catalog) -> bool {
    let fresh = manifest.catalog_sha256 == catalog.source_digest();
    if !fresh {
        tracing::warn!(
            built_at = %manifest.built_at,
            "Catalog changed since the vector store was built; run `navigator build-index` to refresh"
        );
    }
    fresh
}
