//! docubuddy-core: passage store and vector index for DocuBuddy knowledge bases
//!
//! A knowledge base is a set of text passages, each carrying provenance metadata
//! and a fixed-dimensionality embedding. This crate owns the index over those
//! embeddings: insertion, ranked cosine search, and on-disk persistence.

pub mod distance;
pub mod error;
pub mod index;
pub mod storage;
pub mod types;

pub use distance::DistanceMetric;
pub use error::{IndexError, Result};
pub use index::VectorIndex;
pub use storage::{IndexManifest, INDEX_FILE, MANIFEST_FILE};
pub use types::{EmbeddedPassage, IndexOptions, Metadata, Passage, ScoredPassage, PLACEHOLDER_MARKER};
