//! Result types for ingestion and queries

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::Metadata;

/// Answer to a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer
    pub answer: String,
    /// Metadata of the passages placed in the context, in rank order
    pub sources: Vec<Metadata>,
    /// False when no passage cleared the relevance floor
    pub context_found: bool,
}

/// A file that could not be turned into passages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of an `ingest` call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Files that produced at least one passage
    pub files_processed: usize,
    /// Passages inserted into the index
    pub passages_added: usize,
    /// Files skipped, with the reason
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    /// Whether any input failed
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
