//! Passage and index option types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::distance::DistanceMetric;

/// Provenance metadata attached to a passage.
///
/// Ordered so that formatting and persistence are deterministic. Used for
/// citation only, never for ranking.
pub type Metadata = BTreeMap<String, String>;

/// Metadata key/value that marks the scaffold passage of a fresh index
pub const PLACEHOLDER_MARKER: (&str, &str) = ("type", "placeholder");

/// Immutable unit of retrievable content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Cleaned passage text
    pub content: String,
    /// Source file, page/row, file type and similar provenance
    pub metadata: Metadata,
}

impl Passage {
    /// Create a passage
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// The scaffold passage a fresh index may hold
    pub fn placeholder() -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(PLACEHOLDER_MARKER.0.to_string(), PLACEHOLDER_MARKER.1.to_string());
        Self::new("placeholder", metadata)
    }

    /// Whether this is the scaffold passage
    pub fn is_placeholder(&self) -> bool {
        self.metadata.get(PLACEHOLDER_MARKER.0).map(String::as_str) == Some(PLACEHOLDER_MARKER.1)
    }

    /// Render metadata as `{key: value, ...}`
    pub fn metadata_display(&self) -> String {
        let pairs: Vec<String> = self
            .metadata
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        format!("{{{}}}", pairs.join(", "))
    }
}

/// A passage together with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedPassage {
    pub passage: Passage,
    pub embedding: Vec<f32>,
}

impl EmbeddedPassage {
    pub fn new(passage: Passage, embedding: Vec<f32>) -> Self {
        Self { passage, embedding }
    }
}

/// Search hit: a passage and its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    /// Similarity, higher is more relevant (`[-1, 1]` for cosine)
    pub score: f32,
}

/// Index construction options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Embedding dimensionality, fixed for the lifetime of the index
    pub dimensions: usize,
    /// Similarity metric
    pub metric: DistanceMetric,
    /// Name of the embedding model that produced the vectors
    pub embedding_model: Option<String>,
}

impl IndexOptions {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            metric: DistanceMetric::Cosine,
            embedding_model: None,
        }
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }
}
