//! Error types for the RAG pipeline

use leasewise_ingest::ExtractionError;
use leasewise_store::StoreError;
use thiserror::Error;

/// Errors that can occur in a RAG session
#[derive(Error, Debug)]
pub enum RagError {
    /// The operation needs a loaded contract
    #[error("No contract loaded. Load a contract first.")]
    NoActiveDocument,

    /// The question was blank
    #[error("Question is empty")]
    EmptyQuestion,

    /// No backend could read the document
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Index or metadata failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Answering a question failed; conversation memory was not changed
    #[error("Answer generation failed: {0}")]
    AnswerGeneration(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// A language-model call exceeded the configured timeout
    #[error("LLM call timed out after {0}s")]
    Timeout(u64),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
