//! docubuddy-rag: retrieval-augmented question answering over user documents
//!
//! Documents are loaded by format adapters, split into overlapping passages,
//! embedded and indexed with `docubuddy-core`. Questions are answered by
//! retrieving the most similar passages, packing them into a bounded context
//! and conditioning a language model on that context plus recent
//! conversation turns.

pub mod config;
pub mod conversation;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod session;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use generation::{PromptTemplate, NO_CONTEXT_SENTINEL};
pub use ingestion::{AdapterRegistry, DocumentAdapter, LoadedDocument, TextChunker};
pub use providers::{EmbeddingProvider, GenerationSettings, LlmProvider};
pub use retrieval::{AssembledContext, ContextAssembler};
pub use session::{RagSession, SessionState};
pub use storage::{KnowledgeBaseCatalog, KnowledgeBaseInfo};
pub use types::{IngestFailure, IngestReport, QueryResponse, Role, Turn};

/// Re-export docubuddy-core for convenience
pub use docubuddy_core;
