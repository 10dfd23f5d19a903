//! One user's working session: the contract pipeline plus its on-disk state.
//!
//! A [`Workspace`] wires a [`ContractRag`] session to the user's chunk
//! cache, serialized indexes and metadata database. Summaries and
//! extraction records are served from the database while the file's
//! content hash is unchanged; every answered question is appended to the
//! stored history.

use crate::config::{Config, UserPaths};
use crate::embedder::Embedder;
use crate::error::{CliError, Result};
use leasewise_domain::traits::{
    DocumentRecord, EmbeddingModel, LlmProvider, MetadataStore, QaRecord,
};
use leasewise_domain::{AnswerStatus, AnswerWithSources, SummaryKind, Usage};
use leasewise_llm::OllamaProvider;
use leasewise_rag::{
    ContractRag, ExtractionOutcome, LoadReport, RagConfig, SessionStats, SummaryOutcome,
};
use leasewise_store::{ChunkCache, SqliteMetadataStore};
use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A result that may have come from the metadata database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cached<T> {
    /// The result
    #[serde(flatten)]
    pub value: T,
    /// Served from storage without calling the model
    pub cached: bool,
}

/// Workspace backed by Ollama and the configured embedder.
pub type DefaultWorkspace = Workspace<OllamaProvider, Embedder>;

/// One user's session and storage.
pub struct Workspace<L, E> {
    user: String,
    paths: UserPaths,
    rag: ContractRag<L, E>,
    metadata: SqliteMetadataStore,
    stored_results_valid: bool,
}

impl DefaultWorkspace {
    /// Open the active user's workspace with the configured backends.
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm = OllamaProvider::new(&config.llm.endpoint, &config.llm.model)?
            .with_temperature(config.llm.temperature)
            .with_max_retries(config.llm.max_retries);
        let embedder = Embedder::from_settings(&config.embedding, &config.llm)
            .map_err(|e| CliError::Config(e.to_string()))?;
        Self::open(
            &config.active_user,
            config.user_paths()?,
            llm,
            embedder,
            config.rag.clone(),
        )
    }
}

impl<L, E> Workspace<L, E>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel,
    E::Error: Display,
{
    /// Open a workspace rooted at `paths`.
    pub fn open(user: &str, paths: UserPaths, llm: L, embedder: E, rag: RagConfig) -> Result<Self> {
        paths.create()?;
        let cache = ChunkCache::new(&paths.cache)?;
        let metadata = SqliteMetadataStore::new(&paths.metadata_db)?;
        let rag = ContractRag::new(llm, embedder, rag)?.with_cache(cache);
        debug!("Opened workspace for {} at {}", user, paths.root.display());

        Ok(Self {
            user: user.to_string(),
            paths,
            rag,
            metadata,
            stored_results_valid: false,
        })
    }

    /// The user this workspace belongs to.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The user's directory layout.
    pub fn paths(&self) -> &UserPaths {
        &self.paths
    }

    /// The underlying session.
    pub fn rag(&self) -> &ContractRag<L, E> {
        &self.rag
    }

    /// Load a contract and record it in the metadata database.
    pub fn load(&mut self, path: &Path) -> Result<LoadReport> {
        self.load_with(path, self.rag.config().use_cache)
    }

    /// Load a contract, reading and writing the chunk cache only if `use_cache`.
    pub fn load_with(&mut self, path: &Path, use_cache: bool) -> Result<LoadReport> {
        let report = self.rag.load_with(path, use_cache)?;

        let active = self.rag.active_document().ok_or(CliError::NotLoaded)?;
        let content_hash = active.document.content_hash.clone();
        let previous = self.metadata.document(&report.doc_id)?;
        self.stored_results_valid = previous
            .as_ref()
            .is_some_and(|p| p.content_hash == content_hash);

        let index_path = previous
            .filter(|_| self.stored_results_valid)
            .and_then(|p| p.index_path);
        self.metadata.save_document(&DocumentRecord {
            doc_id: report.doc_id.clone(),
            user_id: self.user.clone(),
            content_hash,
            stats: report.stats.clone(),
            index_path,
        })?;
        Ok(report)
    }

    fn active_id(&self) -> Result<String> {
        self.rag
            .active_document()
            .map(|a| a.document.id.clone())
            .ok_or(CliError::NotLoaded)
    }

    /// Ask a question; answered questions are appended to the stored history.
    pub async fn ask(&mut self, question: &str) -> Result<AnswerWithSources> {
        let answer = self.rag.ask(question).await?;
        if answer.status == AnswerStatus::Answered {
            let record = QaRecord::new(
                &self.user,
                self.active_id()?,
                question,
                &answer.answer,
                answer.usage,
            );
            self.metadata.save_qa(&record)?;
        }
        Ok(answer)
    }

    /// Summarize, reusing a stored summary of the same file contents.
    pub async fn summarize(&self, kind: SummaryKind, refresh: bool) -> Result<Cached<SummaryOutcome>> {
        let doc_id = self.active_id()?;
        if self.stored_results_valid && !refresh {
            if let Some(text) = self.metadata.cached_summary(&doc_id, kind)? {
                info!("Using stored {} summary", kind);
                let chunks = self.rag.store().chunks().len();
                return Ok(Cached {
                    value: SummaryOutcome {
                        kind,
                        text,
                        chunks_used: chunks.min(self.rag.config().summary_chunk_limit),
                        total_chunks: chunks,
                        usage: Usage::default(),
                    },
                    cached: true,
                });
            }
        }

        let outcome = self.rag.summarize(kind).await?;
        self.metadata
            .save_summary(&doc_id, kind, &outcome.text, outcome.usage)?;
        Ok(Cached {
            value: outcome,
            cached: false,
        })
    }

    /// Extract the structured record, reusing a stored one when possible.
    pub async fn extract(&mut self, parallel: bool, refresh: bool) -> Result<Cached<ExtractionOutcome>> {
        let doc_id = self.active_id()?;
        if self.stored_results_valid && !refresh {
            if let Some(record) = self.metadata.cached_extraction(&doc_id)? {
                info!("Using stored extraction");
                return Ok(Cached {
                    value: ExtractionOutcome {
                        record,
                        backfilled: Vec::new(),
                        usage: Usage::default(),
                    },
                    cached: true,
                });
            }
        }

        self.rag.set_parallel_backfill(parallel);
        let outcome = self.rag.extract().await?;
        self.metadata.save_extraction(&doc_id, &outcome.record)?;
        Ok(Cached {
            value: outcome,
            cached: false,
        })
    }

    /// Stored questions and answers for the active contract, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<QaRecord>> {
        Ok(self.metadata.qa_history(&self.user, &self.active_id()?, limit)?)
    }

    /// Session statistics.
    pub fn statistics(&self) -> SessionStats {
        self.rag.statistics()
    }

    /// Forget the conversation, keeping the contract.
    pub fn clear_memory(&mut self) {
        self.rag.clear_memory();
    }

    /// Unload the contract.
    pub fn clear(&mut self) {
        self.rag.clear();
        self.stored_results_valid = false;
    }

    /// Write the active index under `vector_stores/` and remember where.
    pub fn save_index(&self) -> Result<PathBuf> {
        let active = self.rag.active_document().ok_or(CliError::NotLoaded)?;
        let hash = &active.document.content_hash;
        let name = format!("{}.json", &hash[..hash.len().min(16)]);
        let path = self.paths.vector_stores.join(name);
        self.rag.save_index(&path)?;

        if let Some(mut record) = self.metadata.document(&active.document.id)? {
            record.index_path = Some(path.to_string_lossy().into_owned());
            self.metadata.save_document(&record)?;
        }
        info!("Saved index to {}", path.display());
        Ok(path)
    }
}
