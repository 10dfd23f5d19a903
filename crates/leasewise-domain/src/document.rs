//! Source documents, their extraction statistics, and cache snapshots

use crate::Chunk;
use serde::{Deserialize, Serialize};

/// A document that has been successfully read by an extraction backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Stable identifier, the canonical absolute path of the file
    pub id: String,

    /// File size in bytes at extraction time
    pub byte_size: u64,

    /// Modification time at extraction time, nanoseconds since the Unix epoch
    pub modified_ns: u64,

    /// Number of pages the backend produced
    pub page_count: usize,

    /// Name of the backend that produced the text
    pub backend: String,

    /// Lowercase hex SHA-256 of the file bytes
    pub content_hash: String,
}

impl RawDocument {
    /// File name component of the identifier
    pub fn file_name(&self) -> &str {
        self.id
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.id.as_str())
    }
}

/// Extraction statistics reported back to callers after a load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// File name of the document
    pub file_name: String,
    /// Pages extracted
    pub pages: usize,
    /// Characters of normalized text across all pages
    pub characters: usize,
    /// Number of chunks produced
    pub chunks: usize,
    /// Backend that produced the text
    pub backend: String,
    /// Mean chunk length in characters
    pub avg_chunk_size: usize,
}

impl DocumentStats {
    /// Compute statistics for a freshly chunked document
    pub fn from_chunks(document: &RawDocument, characters: usize, chunks: &[Chunk]) -> Self {
        let total: usize = chunks.iter().map(|c| c.char_len).sum();
        Self {
            file_name: document.file_name().to_string(),
            pages: document.page_count,
            characters,
            chunks: chunks.len(),
            backend: document.backend.clone(),
            avg_chunk_size: if chunks.is_empty() { 0 } else { total / chunks.len() },
        }
    }
}

/// A serialized chunk list plus the stats it was produced with
///
/// Valid only while the source file keeps the size and modification time
/// recorded in `document`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The document the chunks were cut from
    pub document: RawDocument,
    /// Chunk list snapshot
    pub chunks: Vec<Chunk>,
    /// Extraction statistics
    pub stats: DocumentStats,
    /// Creation time, seconds since the Unix epoch
    pub created_at: u64,
}

impl CacheEntry {
    /// Snapshot a document's chunks and stats
    pub fn new(document: RawDocument, chunks: Vec<Chunk>, stats: DocumentStats) -> Self {
        Self {
            document,
            chunks,
            stats,
            created_at: crate::unix_now(),
        }
    }

    /// Whether the entry still describes a file with the given size and mtime
    pub fn matches(&self, byte_size: u64, modified_ns: u64) -> bool {
        self.document.byte_size == byte_size && self.document.modified_ns == modified_ns
    }
}
