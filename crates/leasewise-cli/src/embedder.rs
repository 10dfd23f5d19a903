//! Embedding backend chosen from configuration.

use crate::config::{EmbeddingBackend, EmbeddingSettings, LlmSettings};
use leasewise_domain::traits::EmbeddingModel;
use leasewise_llm::{LlmError, OllamaEmbedder};
use leasewise_store::{EmbeddingError, HashingEmbedder};
use thiserror::Error;

/// Errors from either embedding backend.
#[derive(Debug, Error)]
pub enum EmbedderError {
    /// Local hashing embedder
    #[error(transparent)]
    Hashing(#[from] EmbeddingError),

    /// Ollama embedding API
    #[error(transparent)]
    Ollama(#[from] LlmError),
}

/// The embedding model a session uses.
pub enum Embedder {
    /// Local feature hashing
    Hashing(HashingEmbedder),
    /// Ollama embedding model
    Ollama(OllamaEmbedder),
}

impl Embedder {
    /// Build the configured backend.
    pub fn from_settings(
        embedding: &EmbeddingSettings,
        llm: &LlmSettings,
    ) -> Result<Self, EmbedderError> {
        Ok(match embedding.backend {
            EmbeddingBackend::Hashing => Embedder::Hashing(HashingEmbedder::new(embedding.dimension)),
            EmbeddingBackend::Ollama => Embedder::Ollama(
                OllamaEmbedder::new(&llm.endpoint, &embedding.model, embedding.dimension)?
                    .with_max_retries(llm.max_retries),
            ),
        })
    }
}

impl EmbeddingModel for Embedder {
    type Error = EmbedderError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        match self {
            Embedder::Hashing(model) => Ok(model.embed(text)?),
            Embedder::Ollama(model) => Ok(model.embed(text)?),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            Embedder::Hashing(model) => model.dimension(),
            Embedder::Ollama(model) => model.dimension(),
        }
    }
}
