//! Core types for the RAG system

pub mod conversation;
pub mod response;

pub use conversation::{Role, Turn};
pub use docubuddy_core::{EmbeddedPassage, Metadata, Passage, ScoredPassage};
pub use response::{IngestFailure, IngestReport, QueryResponse};
