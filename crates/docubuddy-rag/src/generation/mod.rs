//! Prompt construction for answer generation

pub mod prompt;

pub use prompt::{format_history, PromptTemplate, DEFAULT_TEMPLATE, NO_CONTEXT_SENTINEL};
