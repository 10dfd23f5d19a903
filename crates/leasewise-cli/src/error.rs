//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline error (loading, answering, summarizing, extracting)
    #[error(transparent)]
    Rag(#[from] leasewise_rag::RagError),

    /// Cache, index or metadata error
    #[error(transparent)]
    Store(#[from] leasewise_store::StoreError),

    /// Chunk cache directory could not be opened
    #[error(transparent)]
    Cache(#[from] leasewise_store::CacheError),

    /// LLM backend could not be set up
    #[error("LLM error: {0}")]
    Llm(#[from] leasewise_llm::LlmError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No contract loaded in this session
    #[error("No contract loaded. Use 'load <file>' first.")]
    NotLoaded,
}
