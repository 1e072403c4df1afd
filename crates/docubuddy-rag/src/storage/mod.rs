//! Named knowledge bases on disk

pub mod catalog;

pub use catalog::{format_size, KnowledgeBaseCatalog, KnowledgeBaseInfo};
