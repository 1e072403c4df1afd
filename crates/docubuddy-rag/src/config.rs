//! Configuration for the RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::generation::PromptTemplate;

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Row-oriented (CSV) source configuration
    pub tabular: TabularConfig,
    /// Text decoding configuration
    pub decoding: DecodingConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Retrieval and context assembly configuration
    pub retrieval: RetrievalConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Knowledge-base storage configuration
    pub storage: StorageConfig,
    /// Prompt configuration
    pub prompt: PromptConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: RagConfig = toml::from_str(&data)?;
        config.validate()?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.embeddings.validate()?;
        self.retrieval.validate()?;
        self.llm.validate()?;

        if !self.tabular.delimiter.is_ascii() {
            return Err(Error::config(format!(
                "CSV delimiter must be an ASCII character, got '{}'",
                self.tabular.delimiter
            )));
        }

        if let Some(template) = &self.prompt.template {
            PromptTemplate::new(template.clone())?;
        }

        Ok(())
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters shared by adjacent chunks; must be smaller than `chunk_size`
    pub chunk_overlap: usize,
    /// Tabular records shorter than this are coalesced with their neighbours
    pub min_record_chars: usize,
    /// Boundary separators from largest to smallest unit. Character cuts are
    /// the implicit last resort. Whitespace is collapsed before splitting, so
    /// paragraph and line breaks never survive to act as separators.
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_record_chars: 80,
            separators: vec![
                ". ".to_string(),
                "? ".to_string(),
                "! ".to_string(),
                " ".to_string(),
            ],
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than zero"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.separators.iter().any(|s| s.is_empty()) {
            return Err(Error::config("chunk separators must be non-empty"));
        }
        Ok(())
    }
}

/// Row-oriented source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularConfig {
    /// Field delimiter
    pub delimiter: char,
    /// First row holds column names
    pub has_headers: bool,
    /// Values treated as missing (case-insensitive)
    pub null_markers: Vec<String>,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_headers: true,
            null_markers: vec![
                "null".to_string(),
                "none".to_string(),
                "nan".to_string(),
                "n/a".to_string(),
            ],
        }
    }
}

/// Alternate encodings tried after strict UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// UTF-16 with a byte-order mark
    Utf16,
    /// ISO-8859-1; accepts any byte sequence
    Latin1,
}

/// Text decoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingConfig {
    /// Tried in order once UTF-8 decoding fails
    pub fallbacks: Vec<TextEncoding>,
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            fallbacks: vec![TextEncoding::Utf16],
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
    /// Texts per embedding request batch
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 32,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(Error::config("embedding dimensions must be greater than zero"));
        }
        if self.batch_size == 0 {
            return Err(Error::config("embedding batch_size must be greater than zero"));
        }
        Ok(())
    }
}

/// Retrieval and context assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Candidates fetched from the index per query
    pub top_k: usize,
    /// Passages scoring at or below this are never used
    pub relevance_floor: f32,
    /// Maximum characters of question plus context
    pub char_budget: usize,
    /// Most recent conversation turns included in the prompt
    pub history_turns: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 50,
            relevance_floor: 0.2,
            char_budget: 6000,
            history_turns: 6,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::config("top_k must be greater than zero"));
        }
        if !(-1.0..=1.0).contains(&self.relevance_floor) {
            return Err(Error::config(format!(
                "relevance_floor must lie in [-1, 1], got {}",
                self.relevance_floor
            )));
        }
        if self.char_budget == 0 {
            return Err(Error::config("char_budget must be greater than zero"));
        }
        Ok(())
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Generation model name
    pub generate_model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            generate_model: "llama3.2".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Upper bound for `LlmConfig::max_retries`
pub const MAX_RETRIES: u32 = 10;

impl LlmConfig {
    pub fn validate(&self) -> Result<()> {
        validate_temperature(self.temperature)?;
        if self.max_retries > MAX_RETRIES {
            return Err(Error::config(format!(
                "max_retries must be at most {}, got {}",
                MAX_RETRIES, self.max_retries
            )));
        }
        if self.generate_model.trim().is_empty() {
            return Err(Error::config("generate_model must not be empty"));
        }
        Ok(())
    }
}

/// Reject temperatures the generator cannot use
pub fn validate_temperature(temperature: f32) -> Result<()> {
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(Error::config(format!(
            "temperature must be a non-negative number, got {}",
            temperature
        )));
    }
    Ok(())
}

/// Knowledge-base storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per named knowledge base
    pub knowledge_base_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            knowledge_base_root: PathBuf::from("knowledge_bases"),
        }
    }
}

/// Prompt configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Custom template with `{question}`, `{context}` and optionally
    /// `{recent_history}` placeholders
    pub template: Option<String>,
}
