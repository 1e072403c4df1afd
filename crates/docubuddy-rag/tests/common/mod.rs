//! Deterministic providers and fixtures shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::Notify;

use docubuddy_rag::{
    EmbeddingProvider, Error, GenerationSettings, LlmProvider, RagConfig, RagSession, Result,
};

pub const DIMS: usize = 256;

/// Bag-of-words embedder: each lowercase word bumps one hashed component
pub struct HashEmbedder {
    dims: usize,
    model: String,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self::with_model(dims, "hash-embed")
    }

    pub fn with_model(dims: usize, model: &str) -> Self {
        Self {
            dims,
            model: model.to_string(),
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            // FNV-1a
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in word.to_lowercase().bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            v[(hash % self.dims as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// `HashEmbedder` whose batch embedding can be made to hang.
///
/// While stalled, `embed_batch` signals `entered` and never completes.
pub struct StallingEmbedder {
    inner: HashEmbedder,
    stall: AtomicBool,
    pub entered: Notify,
}

impl StallingEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            inner: HashEmbedder::new(dims),
            stall: AtomicBool::new(false),
            entered: Notify::new(),
        }
    }

    pub fn set_stalled(&self, stall: bool) {
        self.stall.store(stall, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for StallingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.stall.load(Ordering::SeqCst) {
            self.entered.notify_one();
            std::future::pending::<()>().await;
        }
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.inner.embed(text).await?);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "stalling"
    }
}

/// Records every prompt and answers with a fixed string, or fails on demand
#[derive(Default)]
pub struct RecordingLlm {
    pub prompts: Mutex<Vec<String>>,
    pub settings: Mutex<Vec<GenerationSettings>>,
    pub fail: Mutex<bool>,
}

impl RecordingLlm {
    pub fn last_prompt(&self) -> String {
        self.prompts.lock().last().cloned().unwrap_or_default()
    }

    pub fn last_settings(&self) -> Option<GenerationSettings> {
        self.settings.lock().last().cloned()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

#[async_trait]
impl LlmProvider for RecordingLlm {
    async fn generate(&self, prompt: &str, settings: &GenerationSettings) -> Result<String> {
        if *self.fail.lock() {
            return Err(Error::generation("model offline"));
        }
        self.prompts.lock().push(prompt.to_string());
        self.settings.lock().push(settings.clone());
        Ok(format!("answer #{}", self.prompts.lock().len()))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Small chunks and a catalog rooted in `root`
pub fn test_config(root: &Path, dims: usize) -> RagConfig {
    let mut config = RagConfig::default();
    config.chunking.chunk_size = 400;
    config.chunking.chunk_overlap = 50;
    config.embeddings.dimensions = dims;
    config.embeddings.batch_size = 2;
    config.storage.knowledge_base_root = root.join("knowledge_bases");
    config
}

pub struct Fixture {
    pub dir: TempDir,
    pub session: RagSession,
    pub llm: Arc<RecordingLlm>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(RecordingLlm::default());
        let session = session_in(dir.path(), DIMS, Arc::new(HashEmbedder::new(DIMS)), llm.clone());
        Self { dir, session, llm }
    }

    pub fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        write_file(self.dir.path(), name, contents)
    }
}

pub fn session_in(
    root: &Path,
    dims: usize,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<RecordingLlm>,
) -> RagSession {
    RagSession::new(test_config(root, dims), embedder, llm).unwrap()
}

pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

pub const RUST_TEXT: &str = "Rust ownership rules: each value has a single owner. \
    The borrow checker enforces the ownership rules at compile time.";

pub const BREAD_TEXT: &str = "Bake the sourdough loaf in a hot oven until the crust turns golden.";

/// Bytes that are neither UTF-8 nor BOM-marked UTF-16
pub const CORRUPT_TEXT: &[u8] = &[0xC3, 0x28, 0xA0, 0xA1, 0xFF, 0x00, 0x9F];
