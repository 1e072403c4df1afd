//! Provider abstractions for embeddings and generation
//!
//! The session only talks to the traits; Ollama is the bundled backend.

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use llm::{GenerationSettings, LlmProvider};
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
