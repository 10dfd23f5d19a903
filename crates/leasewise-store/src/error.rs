use crate::vector_index::VectorIndexError;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Embedding backend failure
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Vector index failure
    #[error(transparent)]
    Index(#[from] VectorIndexError),

    /// Operation needs an active document
    #[error("No document is active")]
    NoActiveDocument,

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data in storage
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
