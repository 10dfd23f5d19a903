//! Error types for document ingestion

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a document
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The file exists but could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A single backend could not read the file
    #[error("{backend} failed: {reason}")]
    Backend {
        /// Backend name
        backend: &'static str,
        /// Why it failed
        reason: String,
    },

    /// Every configured backend failed or produced no text
    #[error("No backend could extract text from {}: {}", .path.display(), .attempts.join("; "))]
    AllBackendsFailed {
        /// File being read
        path: PathBuf,
        /// One message per backend attempt, in order
        attempts: Vec<String>,
    },
}

impl ExtractionError {
    pub(crate) fn backend(backend: &'static str, reason: impl Into<String>) -> Self {
        ExtractionError::Backend {
            backend,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ExtractionError::FileNotFound(path)
        } else {
            ExtractionError::Io { path, source }
        }
    }
}
