//! Error types for the RAG system

use std::path::PathBuf;
use thiserror::Error;

use docubuddy_core::IndexError;

use crate::types::IngestFailure;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration (chunk sizes, budgets, templates)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A document could not be read or parsed
    #[error("Failed to read '{}': {message}", .path.display())]
    Adapter { path: PathBuf, message: String },

    /// No adapter is registered for the file extension
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Text could not be decoded with UTF-8 or any configured fallback
    #[error("Could not decode '{}' as text", .path.display())]
    Decode { path: PathBuf },

    /// Persisted knowledge base is missing or corrupt
    #[error("Storage error: {0}")]
    Storage(String),

    /// Embeddings do not match the configured dimensionality
    #[error("Embedding dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Knowledge base was built with a different embedding model
    #[error("Knowledge base was embedded with '{found}' but the session uses '{expected}'")]
    EmbeddingModelMismatch { expected: String, found: String },

    /// Query issued before any knowledge base exists
    #[error("No knowledge base loaded. Ingest documents or load a knowledge base first")]
    NotReady,

    /// Generative model call failed
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Embedding model call failed
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Ingestion produced no passages at all
    #[error("No usable passages produced from {} input(s)", .failures.len())]
    NoUsablePassages { failures: Vec<IngestFailure> },

    /// Caller supplied an unusable argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Named knowledge base does not exist in the catalog
    #[error("Knowledge base not found: {0}")]
    KnowledgeBaseNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an adapter error
    pub fn adapter(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Adapter {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Whether this error belongs to the per-file adapter family that
    /// ingestion recovers from
    pub fn is_adapter_error(&self) -> bool {
        matches!(
            self,
            Error::Adapter { .. } | Error::UnsupportedFileType(_) | Error::Decode { .. }
        )
    }
}

impl From<IndexError> for Error {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DimensionMismatch { expected, found } => {
                Error::DimensionMismatch { expected, found }
            }
            IndexError::InvalidVector(msg) => Error::Embedding(msg),
            IndexError::Io(e) => Error::Io(e),
            other => Error::Storage(other.to_string()),
        }
    }
}
