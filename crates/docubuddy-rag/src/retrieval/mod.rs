//! Retrieval: turning ranked search hits into bounded prompt context

pub mod context;

pub use context::{AssembledContext, ContextAssembler};
