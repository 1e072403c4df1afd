//! RAG session: ingestion, querying and knowledge-base lifecycle
//!
//! A session owns at most one vector index, the conversation history and the
//! current generation settings. It is constructed explicitly and shared by
//! reference; there is no process-wide instance.
//!
//! Mutations of the index (`ingest`, `load`, `save`, `create_knowledge_base`)
//! take the index write lock; `query` only reads. Embeddings for an ingest are
//! computed before the lock is taken and inserted in one step, so a cancelled
//! call never leaves a partial batch visible to searches.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock as AsyncRwLock;

use docubuddy_core::{IndexManifest, IndexOptions, VectorIndex};

use crate::config::{validate_temperature, RagConfig};
use crate::conversation::Conversation;
use crate::error::{Error, Result};
use crate::generation::{format_history, PromptTemplate};
use crate::ingestion::{AdapterRegistry, TextChunker};
use crate::providers::{EmbeddingProvider, GenerationSettings, LlmProvider};
use crate::retrieval::ContextAssembler;
use crate::storage::{KnowledgeBaseCatalog, KnowledgeBaseInfo};
use crate::types::{EmbeddedPassage, IngestFailure, IngestReport, Passage, QueryResponse, Turn};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No index yet; queries fail with `NotReady`
    Ready,
    /// An index exists (built, created or loaded)
    Active,
}

/// Retrieval-augmented question answering over one knowledge base
pub struct RagSession {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    registry: Arc<AdapterRegistry>,
    chunker: TextChunker,
    assembler: ContextAssembler,
    template: PromptTemplate,
    catalog: KnowledgeBaseCatalog,
    index: AsyncRwLock<Option<VectorIndex>>,
    active_kb: RwLock<Option<String>>,
    conversation: Conversation,
    settings: RwLock<GenerationSettings>,
}

impl RagSession {
    /// Build a session in the `Ready` state
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        config.validate()?;

        if embedder.dimensions() != config.embeddings.dimensions {
            return Err(Error::config(format!(
                "embedding provider '{}' produces {} dimensions but the configuration expects {}",
                embedder.name(),
                embedder.dimensions(),
                config.embeddings.dimensions
            )));
        }

        let template = match &config.prompt.template {
            Some(source) => PromptTemplate::new(source.clone())?,
            None => PromptTemplate::default(),
        };

        let settings = GenerationSettings {
            model: config.llm.generate_model.clone(),
            temperature: config.llm.temperature,
        };

        tracing::info!(
            embedder = embedder.name(),
            embedding_model = embedder.model(),
            llm = llm.name(),
            model = %settings.model,
            "RAG session created"
        );

        Ok(Self {
            registry: Arc::new(AdapterRegistry::with_defaults(&config)),
            chunker: TextChunker::new(&config.chunking)?,
            assembler: ContextAssembler::from_config(&config.retrieval),
            catalog: KnowledgeBaseCatalog::new(config.storage.knowledge_base_root.clone()),
            template,
            embedder,
            llm,
            index: AsyncRwLock::new(None),
            active_kb: RwLock::new(None),
            conversation: Conversation::new(),
            settings: RwLock::new(settings),
            config,
        })
    }

    /// Replace the adapter registry
    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn catalog(&self) -> &KnowledgeBaseCatalog {
        &self.catalog
    }

    /// `Active` once an index exists
    pub async fn state(&self) -> SessionState {
        if self.index.read().await.is_some() {
            SessionState::Active
        } else {
            SessionState::Ready
        }
    }

    /// Real passages in the current index
    pub async fn passage_count(&self) -> usize {
        self.index.read().await.as_ref().map_or(0, |index| index.len())
    }

    /// Name of the catalog entry the index was created, loaded or saved as
    pub fn active_knowledge_base(&self) -> Option<String> {
        self.active_kb.read().clone()
    }

    fn index_options(&self) -> IndexOptions {
        IndexOptions::new(self.embedder.dimensions()).with_embedding_model(self.embedder.model())
    }

    /// Start a fresh index holding only the placeholder passage.
    ///
    /// With a name, the empty knowledge base is also written to the catalog.
    pub async fn create_knowledge_base(&self, name: Option<&str>) -> Result<()> {
        let dir = name.map(|n| self.catalog.path_for(n)).transpose()?;
        let index = VectorIndex::with_placeholder(self.index_options())?;

        let mut guard = self.index.write().await;
        if let Some(dir) = &dir {
            index.persist(dir)?;
        }
        *guard = Some(index);
        *self.active_kb.write() = name.map(str::to_string);

        tracing::info!(name = ?name, "Created empty knowledge base");
        Ok(())
    }

    /// Load, chunk, embed and index `paths`.
    ///
    /// Files that cannot be read are reported in the returned
    /// [`IngestReport`] and do not stop the others. The call fails with
    /// `NoUsablePassages` only when no file produced a passage.
    ///
    /// Without `kb_name` the passages join the current index. With
    /// `kb_name` they join that knowledge base (the active one if it has
    /// that name, else the stored entry, else a new one), which is saved to
    /// the catalog and becomes the current index. Any failure, including
    /// the save, leaves the current index as it was.
    pub async fn ingest<P: AsRef<Path>>(
        &self,
        paths: &[P],
        kb_name: Option<&str>,
    ) -> Result<IngestReport> {
        let kb_dir = kb_name.map(|n| self.catalog.path_for(n)).transpose()?;

        let mut report = IngestReport::default();
        let mut passages: Vec<Passage> = Vec::new();

        for path in paths {
            let path = path.as_ref();
            match self.load_passages(path).await {
                Ok(file_passages) if file_passages.is_empty() => {
                    tracing::warn!(path = %path.display(), "No text content found");
                    report.failures.push(IngestFailure {
                        path: path.to_path_buf(),
                        error: "no text content found".to_string(),
                    });
                }
                Ok(file_passages) => {
                    tracing::info!(
                        path = %path.display(),
                        passages = file_passages.len(),
                        "Processed document"
                    );
                    report.files_processed += 1;
                    passages.extend(file_passages);
                }
                Err(e) if e.is_adapter_error() => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping document");
                    report.failures.push(IngestFailure {
                        path: path.to_path_buf(),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if passages.is_empty() {
            return Err(Error::NoUsablePassages {
                failures: report.failures,
            });
        }

        let embedded = self.embed_passages(passages).await?;

        let mut guard = self.index.write().await;
        let total = match (kb_name, &kb_dir) {
            (Some(name), Some(dir)) => {
                // Published only after the save succeeds
                let staged = self.named_target(name, dir, guard.as_ref())?;
                report.passages_added = staged.insert(embedded)?;
                staged.persist(dir)?;
                let total = staged.len();
                *guard = Some(staged);
                *self.active_kb.write() = Some(name.to_string());
                total
            }
            _ => {
                let existed = guard.is_some();
                let index = match guard.take() {
                    Some(index) => index,
                    None => VectorIndex::new(self.index_options())?,
                };
                let inserted = index.insert(embedded);
                let total = index.len();
                // A rejected batch leaves the index as it was, or absent
                if existed || inserted.is_ok() {
                    *guard = Some(index);
                }
                report.passages_added = inserted?;
                total
            }
        };

        tracing::info!(
            files = report.files_processed,
            passages = report.passages_added,
            failures = report.failures.len(),
            total,
            "Ingestion complete"
        );

        Ok(report)
    }

    /// Copy of the index a named ingest grows: the live index when it is
    /// already `name`, else the stored catalog entry, else a fresh index
    fn named_target(
        &self,
        name: &str,
        dir: &Path,
        current: Option<&VectorIndex>,
    ) -> Result<VectorIndex> {
        let is_active = self.active_kb.read().as_deref() == Some(name);
        match current {
            Some(index) if is_active => Ok(index.clone()),
            _ if dir.is_dir() => self.restore(dir),
            _ => Ok(VectorIndex::new(self.index_options())?),
        }
    }

    async fn load_passages(&self, path: &Path) -> Result<Vec<Passage>> {
        let registry = Arc::clone(&self.registry);
        let owned: PathBuf = path.to_path_buf();

        let doc = tokio::task::spawn_blocking(move || registry.load(&owned))
            .await
            .map_err(|e| Error::adapter(path, format!("adapter task failed: {}", e)))??;

        Ok(self.chunker.chunk_document(doc))
    }

    async fn embed_passages(&self, passages: Vec<Passage>) -> Result<Vec<EmbeddedPassage>> {
        let batch_size = self.config.embeddings.batch_size;
        let mut embedded = Vec::with_capacity(passages.len());

        for batch in passages.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|p| p.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;

            if vectors.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "provider returned {} embeddings for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }

            for (passage, vector) in batch.iter().zip(vectors) {
                self.check_dimensions(&vector)?;
                embedded.push(EmbeddedPassage::new(passage.clone(), vector));
            }

            tracing::debug!(done = embedded.len(), total = passages.len(), "Embedded batch");
        }

        Ok(embedded)
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        let expected = self.embedder.dimensions();
        if vector.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                found: vector.len(),
            });
        }
        Ok(())
    }

    /// Answer `question` from the current index.
    ///
    /// Fails with `NotReady` before any index exists. Finding no relevant
    /// passage is not an error: the prompt then carries the no-context
    /// sentinel and `context_found` is false. Both turns are recorded only
    /// after generation succeeds.
    pub async fn query(&self, question: &str) -> Result<QueryResponse> {
        if question.trim().is_empty() {
            return Err(Error::InvalidInput("question cannot be empty".to_string()));
        }
        if self.index.read().await.is_none() {
            return Err(Error::NotReady);
        }

        let query_vector = self.embedder.embed(question).await?;
        self.check_dimensions(&query_vector)?;

        let candidates = {
            let guard = self.index.read().await;
            let index = guard.as_ref().ok_or(Error::NotReady)?;
            index.search(&query_vector, self.config.retrieval.top_k)?
        };

        let context = self.assembler.assemble(question, &candidates);
        let history = format_history(&self.conversation.recent(self.config.retrieval.history_turns));
        let prompt = self.template.render(question, &context.text, &history);
        let settings = self.generation_settings();

        tracing::info!(
            candidates = candidates.len(),
            used = context.used.len(),
            prompt_chars = prompt.chars().count(),
            "Retrieved context"
        );

        let answer = self.llm.generate(&prompt, &settings).await?;
        let sources = context.sources();

        self.conversation.extend([
            Turn::user(question),
            Turn::assistant(answer.clone(), sources.clone()),
        ]);

        Ok(QueryResponse {
            answer,
            context_found: context.context_found(),
            sources,
        })
    }

    /// Persist the current index into `dir`
    pub async fn save(&self, dir: &Path) -> Result<IndexManifest> {
        let guard = self.index.write().await;
        let index = guard.as_ref().ok_or(Error::NotReady)?;
        Ok(index.persist(dir)?)
    }

    /// Replace the current index with the one stored in `dir`.
    ///
    /// Fails with `Storage` for a missing or corrupt directory,
    /// `DimensionMismatch` when the stored vectors do not match the embedding
    /// provider, and `EmbeddingModelMismatch` when the index records a
    /// different embedding model. The current index is untouched on failure.
    pub async fn load(&self, dir: &Path) -> Result<()> {
        let mut guard = self.index.write().await;
        let index = self.restore(dir)?;
        *guard = Some(index);
        *self.active_kb.write() = None;
        Ok(())
    }

    fn restore(&self, dir: &Path) -> Result<VectorIndex> {
        let index = VectorIndex::restore(dir, self.embedder.dimensions())?;

        if let Some(model) = &index.options().embedding_model {
            if model != self.embedder.model() {
                return Err(Error::EmbeddingModelMismatch {
                    expected: self.embedder.model().to_string(),
                    found: model.clone(),
                });
            }
        }

        tracing::info!(
            path = %dir.display(),
            passages = index.len(),
            "Loaded knowledge base"
        );
        Ok(index)
    }

    /// Save the current index to the catalog under `name`
    pub async fn save_named(&self, name: &str) -> Result<IndexManifest> {
        let dir = self.catalog.path_for(name)?;
        let manifest = self.save(&dir).await?;
        *self.active_kb.write() = Some(name.to_string());
        Ok(manifest)
    }

    /// Load the catalog entry `name`
    pub async fn load_named(&self, name: &str) -> Result<()> {
        let dir = self.catalog.path_for(name)?;
        if !dir.is_dir() {
            return Err(Error::KnowledgeBaseNotFound(name.to_string()));
        }

        let mut guard = self.index.write().await;
        let index = self.restore(&dir)?;
        *guard = Some(index);
        *self.active_kb.write() = Some(name.to_string());
        Ok(())
    }

    /// Stored knowledge bases
    pub fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBaseInfo>> {
        self.catalog.list()
    }

    /// Delete a stored knowledge base other than the active one
    pub fn delete_knowledge_base(&self, name: &str) -> Result<()> {
        if self.active_kb.read().as_deref() == Some(name) {
            return Err(Error::InvalidInput(format!(
                "cannot delete the active knowledge base '{}'",
                name
            )));
        }
        self.catalog.delete(name)
    }

    /// Conversation so far, oldest first
    pub fn history(&self) -> Vec<Turn> {
        self.conversation.history()
    }

    /// Forget the conversation; the index is untouched
    pub fn clear_memory(&self) {
        self.conversation.clear();
        tracing::info!("Conversation memory cleared");
    }

    /// Model and temperature used for the next query
    pub fn generation_settings(&self) -> GenerationSettings {
        self.settings.read().clone()
    }

    /// Switch the generation model
    pub fn update_model(&self, model: &str) -> Result<()> {
        let model = model.trim();
        if model.is_empty() {
            return Err(Error::InvalidInput("model name cannot be empty".to_string()));
        }
        self.settings.write().model = model.to_string();
        tracing::info!(model, "Generation model updated");
        Ok(())
    }

    /// Change the sampling temperature
    pub fn update_temperature(&self, temperature: f32) -> Result<()> {
        validate_temperature(temperature)?;
        self.settings.write().temperature = temperature;
        tracing::info!(temperature, "Generation temperature updated");
        Ok(())
    }
}
