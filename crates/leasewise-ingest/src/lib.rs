//! Leasewise Ingest
//!
//! Turns a contract file into normalized, overlapping chunks.
//!
//! # Architecture
//!
//! ```text
//! file → BackendSelector → normalize → Chunker → chunks + stats
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use leasewise_ingest::{Ingestor, BackendSelector, Chunker};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), leasewise_ingest::ExtractionError> {
//! let ingestor = Ingestor::new(BackendSelector::default(), Chunker::new(2000, 200));
//! let ingested = ingestor.ingest(Path::new("lease.pdf"))?;
//! println!("{} chunks via {}", ingested.chunks.len(), ingested.document.backend);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
pub mod backend;
pub mod chunker;
pub mod normalize;

pub use backend::{
    BackendSelector, ExtractedPages, LopdfBackend, PageExtractor, PdfExtractBackend,
    PlainTextBackend,
};
pub use chunker::{reassemble, Chunker};
pub use error::ExtractionError;
pub use normalize::normalize;

use leasewise_domain::{Chunk, DocumentStats, RawDocument};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::info;

/// Identity and change-detection attributes of a file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// Canonical absolute path
    pub path: PathBuf,
    /// Document identifier derived from the canonical path
    pub id: String,
    /// Size in bytes
    pub byte_size: u64,
    /// Modification time, nanoseconds since the Unix epoch
    pub modified_ns: u64,
}

impl Fingerprint {
    /// Read the fingerprint of a file
    ///
    /// # Errors
    ///
    /// [`ExtractionError::FileNotFound`] when the path does not exist.
    pub fn of(path: &Path) -> Result<Self, ExtractionError> {
        let canonical = fs::canonicalize(path).map_err(|e| ExtractionError::io(path, e))?;
        let metadata = fs::metadata(&canonical).map_err(|e| ExtractionError::io(&canonical, e))?;
        let modified_ns = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);

        Ok(Self {
            id: canonical.to_string_lossy().into_owned(),
            path: canonical,
            byte_size: metadata.len(),
            modified_ns,
        })
    }
}

/// Lowercase hex SHA-256 of a file's bytes
pub fn content_hash(path: &Path) -> Result<String, ExtractionError> {
    let bytes = fs::read(path).map_err(|e| ExtractionError::io(path, e))?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// A document read, normalized and chunked
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    /// The source document
    pub document: RawDocument,
    /// Its chunks, in order
    pub chunks: Vec<Chunk>,
    /// Extraction statistics
    pub stats: DocumentStats,
}

/// Extraction, normalization and chunking in one step
pub struct Ingestor {
    selector: BackendSelector,
    chunker: Chunker,
}

impl Ingestor {
    /// Create an ingestor
    pub fn new(selector: BackendSelector, chunker: Chunker) -> Self {
        Self { selector, chunker }
    }

    /// The chunker in use
    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// The backend selector in use
    pub fn selector(&self) -> &BackendSelector {
        &self.selector
    }

    /// Ingest the file at `path`
    pub fn ingest(&self, path: &Path) -> Result<IngestedDocument, ExtractionError> {
        let fingerprint = Fingerprint::of(path)?;
        self.ingest_fingerprinted(&fingerprint)
    }

    /// Ingest a file whose fingerprint was already taken
    pub fn ingest_fingerprinted(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<IngestedDocument, ExtractionError> {
        let extracted = self.selector.extract(&fingerprint.path)?;
        let pages: Vec<String> = extracted.pages.iter().map(|p| normalize(p)).collect();
        let characters = pages.iter().map(|p| p.chars().count()).sum();

        let document = RawDocument {
            id: fingerprint.id.clone(),
            byte_size: fingerprint.byte_size,
            modified_ns: fingerprint.modified_ns,
            page_count: pages.len(),
            backend: extracted.backend.to_string(),
            content_hash: content_hash(&fingerprint.path)?,
        };
        let chunks = self.chunker.split(&document.id, extracted.backend, &pages);
        let stats = DocumentStats::from_chunks(&document, characters, &chunks);

        info!(
            "Ingested {}: {} pages, {} characters, {} chunks (avg {})",
            stats.file_name, stats.pages, stats.characters, stats.chunks, stats.avg_chunk_size
        );

        Ok(IngestedDocument {
            document,
            chunks,
            stats,
        })
    }
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(BackendSelector::default(), Chunker::default())
    }
}
