//! Per-session facade
//!
//! One [`ContractRag`] per user session owns the Document Store, the vector
//! index and the conversation memory. Callers construct it once and pass it
//! to every request handler; nothing here is global.

use crate::config::RagConfig;
use crate::error::RagError;
use crate::extract::{ExtractionOutcome, StructuredExtractor};
use crate::generator::Generator;
use crate::qa::QaEngine;
use crate::rerank::RerankPolicy;
use crate::summarize::{Summarizer, SummaryOutcome};
use leasewise_domain::traits::{EmbeddingModel, LlmProvider};
use leasewise_domain::{
    AnswerWithSources, CacheEntry, ConversationMemory, DocumentStats, SummaryKind, Usage,
};
use leasewise_ingest::{BackendSelector, Chunker, Fingerprint, Ingestor};
use leasewise_store::{ActiveDocument, CacheKey, ChunkCache, DocumentStore, StoreState};
use serde::Serialize;
use std::fmt::{self, Display};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// How a load was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Extracted, chunked and indexed
    Loaded,
    /// Already the active document; nothing changed
    AlreadyLoaded,
    /// Chunks came from the cache; only the index was rebuilt
    FromCache,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadStatus::Loaded => "loaded",
            LoadStatus::AlreadyLoaded => "already loaded",
            LoadStatus::FromCache => "loaded from cache",
        })
    }
}

/// Result of [`ContractRag::load`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Document id (canonical path)
    pub doc_id: String,
    /// How the load was satisfied
    pub status: LoadStatus,
    /// Extraction statistics
    pub stats: DocumentStats,
}

/// Session counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// File name of the active document
    pub active_document: Option<String>,
    /// Documents held (0 or 1)
    pub loaded_contracts: usize,
    /// Chunks in the store
    pub total_chunks: usize,
    /// Vectors in the index
    pub vector_index_size: usize,
    /// Turns in conversation memory
    pub memory_turns: usize,
}

/// Rental-contract RAG session
///
/// # Examples
///
/// ```no_run
/// use leasewise_rag::{ContractRag, RagConfig};
/// use leasewise_llm::MockProvider;
/// use leasewise_store::HashingEmbedder;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), leasewise_rag::RagError> {
/// let mut rag = ContractRag::new(MockProvider::default(), HashingEmbedder::default(), RagConfig::default())?;
/// rag.load(Path::new("lease.pdf"))?;
/// let answer = rag.ask("What is the monthly rent?").await?;
/// println!("{}", answer.answer);
/// # Ok(())
/// # }
/// ```
pub struct ContractRag<L, E> {
    config: RagConfig,
    ingestor: Ingestor,
    cache: Option<ChunkCache>,
    store: DocumentStore<E>,
    qa: QaEngine<L>,
    summarizer: Summarizer<L>,
    extractor: StructuredExtractor<L>,
}

impl<L, E> ContractRag<L, E>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel,
    E::Error: Display,
{
    /// Create a session with no cache
    pub fn new(llm: L, embedder: E, config: RagConfig) -> Result<Self, RagError> {
        config.validate().map_err(RagError::Config)?;

        let generator = Generator::new(Arc::new(llm), config.llm_timeout(), config.cost_per_1k_tokens);
        let ingestor = Ingestor::new(
            BackendSelector::default(),
            Chunker::new(config.chunk_size, config.chunk_overlap),
        );

        Ok(Self {
            qa: QaEngine::new(generator.clone(), &config),
            summarizer: Summarizer::new(generator.clone(), config.summary_chunk_limit),
            extractor: StructuredExtractor::new(
                generator,
                config.backfill_parallel,
                config.backfill_workers,
            ),
            ingestor,
            cache: None,
            store: DocumentStore::new(embedder),
            config,
        })
    }

    /// Use a chunk cache
    pub fn with_cache(mut self, cache: ChunkCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the ingestor (backends and chunker)
    pub fn with_ingestor(mut self, ingestor: Ingestor) -> Self {
        self.ingestor = ingestor;
        self
    }

    /// Replace the citation policy
    pub fn with_rerank_policy(mut self, policy: RerankPolicy) -> Self {
        self.qa = self.qa.with_policy(policy);
        self
    }

    /// The session configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Lifecycle state of the Document Store
    pub fn state(&self) -> StoreState {
        self.store.state()
    }

    /// The active document
    pub fn active_document(&self) -> Option<&ActiveDocument> {
        self.store.active()
    }

    /// The conversation so far
    pub fn memory(&self) -> &ConversationMemory {
        self.qa.memory()
    }

    /// The Document Store
    pub fn store(&self) -> &DocumentStore<E> {
        &self.store
    }

    /// Load a contract, honouring the configured cache setting
    pub fn load(&mut self, path: &Path) -> Result<LoadReport, RagError> {
        self.load_with(path, self.config.use_cache)
    }

    /// Load a contract and make it the only active document
    ///
    /// Loading the active document again is a no-op. Loading any other
    /// document first clears the store, the index and the conversation
    /// memory. When `use_cache` is set, a valid cache entry skips
    /// extraction and chunking; a fresh extraction is written back.
    pub fn load_with(&mut self, path: &Path, use_cache: bool) -> Result<LoadReport, RagError> {
        let fingerprint = Fingerprint::of(path)?;

        if let Some(active) = self.store.active() {
            if active.document.id == fingerprint.id {
                info!("{} is already active", active.stats.file_name);
                return Ok(LoadReport {
                    doc_id: fingerprint.id,
                    status: LoadStatus::AlreadyLoaded,
                    stats: active.stats.clone(),
                });
            }
        }

        self.clear();

        let cache = self.cache.as_ref().filter(|_| use_cache);
        let key = CacheKey::new(&fingerprint.id, fingerprint.byte_size, fingerprint.modified_ns);

        let cached = cache.and_then(|c| c.get(&key, fingerprint.byte_size, fingerprint.modified_ns));

        let (entry, status) = match cached {
            Some(entry) => (entry, LoadStatus::FromCache),
            None => {
                let ingested = self.ingestor.ingest_fingerprinted(&fingerprint)?;
                let entry = CacheEntry::new(ingested.document, ingested.chunks, ingested.stats);
                if let Some(cache) = cache {
                    if let Err(e) = cache.put(&key, &entry) {
                        warn!("Failed to cache chunks, continuing: {}", e);
                    }
                }
                (entry, LoadStatus::Loaded)
            }
        };

        let stats = entry.stats.clone();
        self.store.replace(entry.document, entry.stats, entry.chunks)?;

        info!("{} {} ({} chunks)", stats.file_name, status, stats.chunks);
        Ok(LoadReport {
            doc_id: fingerprint.id,
            status,
            stats,
        })
    }

    /// Drop the active document, its index and the conversation
    pub fn clear(&mut self) {
        if let StoreState::Active(id) = self.store.state() {
            info!("Clearing {}", id);
        }
        self.store.clear();
        self.qa.clear_memory();
    }

    /// Forget the conversation but keep the document
    pub fn clear_memory(&mut self) {
        self.qa.clear_memory();
    }

    /// Answer a question about the active contract
    ///
    /// With nothing loaded the answer is the fixed "no contract loaded"
    /// notice, not an error.
    pub async fn ask(&mut self, question: &str) -> Result<AnswerWithSources, RagError> {
        self.qa.ask(&self.store, question).await
    }

    /// Summarize the active contract
    pub async fn summarize(&self, kind: SummaryKind) -> Result<SummaryOutcome, RagError> {
        if self.store.active().is_none() {
            return Err(RagError::NoActiveDocument);
        }
        self.summarizer.summarize(self.store.chunks(), kind).await
    }

    /// Extract the structured record for the active contract
    pub async fn extract(&self) -> Result<ExtractionOutcome, RagError> {
        if self.store.active().is_none() {
            return Err(RagError::NoActiveDocument);
        }

        let mut usage = Usage::default();
        let summary = self.summarize(SummaryKind::Comprehensive).await?;
        usage += summary.usage;

        let (mut record, extraction_usage) = self.extractor.from_summary(&summary.text).await?;
        usage += extraction_usage;

        let (backfilled, backfill_usage) = self
            .extractor
            .backfill(&self.qa, &self.store, &mut record)
            .await?;
        usage += backfill_usage;

        Ok(ExtractionOutcome {
            record,
            backfilled,
            usage,
        })
    }

    /// Choose sequential or parallel backfill for later extractions
    pub fn set_parallel_backfill(&mut self, parallel: bool) {
        self.extractor.set_parallel(parallel);
    }

    /// Session counters
    pub fn statistics(&self) -> SessionStats {
        SessionStats {
            active_document: self.store.active().map(|a| a.stats.file_name.clone()),
            loaded_contracts: self.store.document_count(),
            total_chunks: self.store.chunks().len(),
            vector_index_size: self.store.index().map_or(0, |i| i.len()),
            memory_turns: self.qa.memory().len(),
        }
    }

    /// One-line description of what is loaded
    pub fn current_document_info(&self) -> String {
        match self.store.active() {
            Some(active) => format!("`{}`: {} chunks", active.stats.file_name, self.store.chunks().len()),
            None => "No documents loaded".to_string(),
        }
    }

    /// Serialize the active document's index
    pub fn save_index(&self, path: &Path) -> Result<(), RagError> {
        if self.store.active().is_none() {
            return Err(RagError::NoActiveDocument);
        }
        self.store.save_index(path)?;
        Ok(())
    }

    /// Load a serialized index and make its document active
    ///
    /// Refuses unless `allow_unsafe_deserialization` is set; enable it only
    /// for indexes this system wrote. The conversation is cleared.
    pub fn load_index(
        &mut self,
        path: &Path,
        allow_unsafe_deserialization: bool,
    ) -> Result<LoadReport, RagError> {
        self.store.load_index(path, allow_unsafe_deserialization)?;
        self.qa.clear_memory();

        let active = self.store.active().ok_or(RagError::NoActiveDocument)?;
        Ok(LoadReport {
            doc_id: active.document.id.clone(),
            status: LoadStatus::Loaded,
            stats: active.stats.clone(),
        })
    }
}
