//! On-disk layout for a persisted index
//!
//! A knowledge-base directory holds two files:
//! - `manifest.json`: human-readable summary (dimensions, metric, model, count)
//! - `index.bin`: bincode-encoded passages and embeddings
//!
//! Both are written to temporary files and renamed into place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::distance::DistanceMetric;
use crate::error::{IndexError, Result};
use crate::index::{StoredEntry, VectorIndex};
use crate::types::IndexOptions;

/// Manifest file name inside a knowledge-base directory
pub const MANIFEST_FILE: &str = "manifest.json";
/// Index file name inside a knowledge-base directory
pub const INDEX_FILE: &str = "index.bin";

const FORMAT_VERSION: u32 = 1;

/// Summary written next to the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub dimensions: usize,
    pub metric: DistanceMetric,
    pub embedding_model: Option<String>,
    /// Real passages, placeholder excluded
    pub passages: usize,
    pub saved_at: DateTime<Utc>,
}

impl IndexManifest {
    /// Read the manifest of a knowledge-base directory
    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let data = fs::read_to_string(&path).map_err(|e| {
            IndexError::storage(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&data)
            .map_err(|e| IndexError::storage(format!("corrupt manifest {}: {}", path.display(), e)))
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    format_version: u32,
    options: IndexOptions,
    entries: Vec<StoredEntry>,
}

impl VectorIndex {
    /// Write the index and its manifest into `dir`, creating it if needed
    pub fn persist(&self, dir: &Path) -> Result<IndexManifest> {
        fs::create_dir_all(dir)?;

        let persisted = PersistedIndex {
            format_version: FORMAT_VERSION,
            options: self.options().clone(),
            entries: self.entries_snapshot(),
        };
        let bytes = bincode::serde::encode_to_vec(&persisted, bincode::config::standard())?;

        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            dimensions: self.dimensions(),
            metric: self.options().metric,
            embedding_model: self.options().embedding_model.clone(),
            passages: persisted
                .entries
                .iter()
                .filter(|e| !e.passage.is_placeholder())
                .count(),
            saved_at: Utc::now(),
        };

        write_atomic(&dir.join(INDEX_FILE), &bytes)?;
        write_atomic(
            &dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?.as_bytes(),
        )?;

        tracing::info!(
            path = %dir.display(),
            passages = manifest.passages,
            bytes = bytes.len(),
            "Persisted vector index"
        );

        Ok(manifest)
    }

    /// Restore an index from `dir`.
    ///
    /// Fails with `Storage` when the directory or index file is missing or
    /// unreadable, and with `DimensionMismatch` when the stored vectors do not
    /// have `expected_dimensions` components. Never returns an empty index in
    /// place of a broken one.
    pub fn restore(dir: &Path, expected_dimensions: usize) -> Result<Self> {
        if !dir.is_dir() {
            return Err(IndexError::storage(format!(
                "knowledge base directory not found: {}",
                dir.display()
            )));
        }

        let index_path = dir.join(INDEX_FILE);
        let bytes = fs::read(&index_path).map_err(|e| {
            IndexError::storage(format!("cannot read {}: {}", index_path.display(), e))
        })?;

        let (persisted, _): (PersistedIndex, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).map_err(
                |e| IndexError::storage(format!("corrupt index {}: {}", index_path.display(), e)),
            )?;

        if persisted.format_version != FORMAT_VERSION {
            return Err(IndexError::storage(format!(
                "unsupported index format version {}",
                persisted.format_version
            )));
        }

        if persisted.options.dimensions != expected_dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: expected_dimensions,
                found: persisted.options.dimensions,
            });
        }

        if let Some(bad) = persisted
            .entries
            .iter()
            .find(|e| e.embedding.len() != persisted.options.dimensions)
        {
            return Err(IndexError::storage(format!(
                "corrupt index {}: entry with {} components in a {}-dimensional index",
                index_path.display(),
                bad.embedding.len(),
                persisted.options.dimensions
            )));
        }

        tracing::info!(
            path = %dir.display(),
            entries = persisted.entries.len(),
            "Restored vector index"
        );

        Ok(VectorIndex::from_entries(persisted.options, persisted.entries))
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp: PathBuf = path.with_extension("tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
