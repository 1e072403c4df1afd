//! Flat vector index with exact similarity ranking

use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::distance::norm;
use crate::error::{IndexError, Result};
use crate::types::{EmbeddedPassage, IndexOptions, Passage, ScoredPassage};

/// Above this many entries scoring is spread across the rayon pool
const PARALLEL_SCAN_THRESHOLD: usize = 4096;

/// Stored passage with its embedding and cached norm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredEntry {
    pub(crate) passage: Passage,
    pub(crate) embedding: Vec<f32>,
    pub(crate) norm: f32,
}

/// Vector index over passage embeddings.
///
/// Exhaustive scan: every search scores every entry, so results are exact and
/// ordering is fully deterministic (ties keep insertion order). Internally
/// synchronized; concurrent searches share a read lock and an insertion
/// becomes visible all at once.
pub struct VectorIndex {
    options: IndexOptions,
    entries: RwLock<Vec<StoredEntry>>,
}

impl VectorIndex {
    /// Create an empty index
    pub fn new(options: IndexOptions) -> Result<Self> {
        if options.dimensions == 0 {
            return Err(IndexError::InvalidVector(
                "index dimensionality must be non-zero".to_string(),
            ));
        }

        tracing::debug!(
            dimensions = options.dimensions,
            metric = ?options.metric,
            "Created vector index"
        );

        Ok(Self {
            options,
            entries: RwLock::new(Vec::new()),
        })
    }

    /// Create an index holding only the placeholder passage.
    ///
    /// The placeholder has a zero vector and is never returned by `search`.
    pub fn with_placeholder(options: IndexOptions) -> Result<Self> {
        let index = Self::new(options)?;
        let zero = vec![0.0; index.options.dimensions];
        index.entries.write().push(StoredEntry {
            passage: Passage::placeholder(),
            embedding: zero,
            norm: 0.0,
        });
        Ok(index)
    }

    pub(crate) fn from_entries(options: IndexOptions, entries: Vec<StoredEntry>) -> Self {
        Self {
            options,
            entries: RwLock::new(entries),
        }
    }

    /// Index options
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Embedding dimensionality
    pub fn dimensions(&self) -> usize {
        self.options.dimensions
    }

    /// Insert passages.
    ///
    /// The whole batch is validated before anything is stored, so either every
    /// passage becomes searchable or none does. Duplicates are not rejected.
    pub fn insert(&self, passages: Vec<EmbeddedPassage>) -> Result<usize> {
        let mut prepared = Vec::with_capacity(passages.len());

        for item in passages {
            self.validate(&item.embedding)?;
            let norm = norm(&item.embedding);
            prepared.push(StoredEntry {
                passage: item.passage,
                embedding: item.embedding,
                norm,
            });
        }

        let count = prepared.len();
        self.entries.write().extend(prepared);

        tracing::debug!(inserted = count, total = self.len(), "Inserted passages");
        Ok(count)
    }

    /// Top-`k` passages by descending similarity to `query`
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredPassage>> {
        self.validate(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_norm = norm(query);
        let metric = self.options.metric;
        let entries = self.entries.read();

        let score = |(position, entry): (usize, &StoredEntry)| {
            if entry.passage.is_placeholder() {
                return None;
            }
            let similarity = metric.similarity(query, query_norm, &entry.embedding, entry.norm);
            Some((position, similarity))
        };

        let mut scored: Vec<(usize, f32)> = if entries.len() >= PARALLEL_SCAN_THRESHOLD {
            entries.par_iter().enumerate().filter_map(score).collect()
        } else {
            entries.iter().enumerate().filter_map(score).collect()
        };

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| ScoredPassage {
                passage: entries[position].passage.clone(),
                score,
            })
            .collect())
    }

    /// Number of real (non-placeholder) passages
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .iter()
            .filter(|e| !e.passage.is_placeholder())
            .count()
    }

    /// Whether the index holds no real passages
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the real passages in insertion order
    pub fn passages(&self) -> Vec<Passage> {
        self.entries
            .read()
            .iter()
            .filter(|e| !e.passage.is_placeholder())
            .map(|e| e.passage.clone())
            .collect()
    }

    pub(crate) fn entries_snapshot(&self) -> Vec<StoredEntry> {
        self.entries.read().clone()
    }

    fn validate(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.options.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.options.dimensions,
                found: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(IndexError::InvalidVector(
                "vector contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }
}

/// Independent copy; later inserts into either index do not affect the other
impl Clone for VectorIndex {
    fn clone(&self) -> Self {
        Self::from_entries(self.options.clone(), self.entries_snapshot())
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("options", &self.options)
            .field("passages", &self.len())
            .finish()
    }
}
