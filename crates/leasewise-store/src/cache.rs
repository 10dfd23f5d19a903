//! Content-addressable chunk cache
//!
//! Entries are keyed by a SHA-256 over `(absolute path, byte size,
//! modification time)` and stored as one JSON file per key. Any I/O or
//! decoding problem is reported and treated as a miss.

use leasewise_domain::CacheEntry;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from cache reads and writes
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem error
    #[error("Cache I/O error on {path}: {source}")]
    Io {
        /// File or directory that was accessed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Entry could not be encoded or decoded
    #[error("Cache entry {path} is unreadable: {source}")]
    Serialization {
        /// Entry file
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Hash of a file's identity and change-detection attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a file
    pub fn new(path: &str, byte_size: u64, modified_ns: u64) -> Self {
        let material = format!("{path}_{byte_size}_{modified_ns}");
        Self(format!("{:x}", Sha256::digest(material.as_bytes())))
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// On-disk chunk cache rooted at one directory
#[derive(Debug, Clone)]
pub struct ChunkCache {
    dir: PathBuf,
}

impl ChunkCache {
    /// Open (and create if needed) a cache directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    /// Look up an entry; errors and stale entries are logged and read as a miss
    ///
    /// `byte_size` and `modified_ns` are re-checked against the entry so a
    /// colliding or hand-edited file can never produce a stale hit.
    pub fn get(&self, key: &CacheKey, byte_size: u64, modified_ns: u64) -> Option<CacheEntry> {
        match self.try_get(key) {
            Ok(Some(entry)) if entry.matches(byte_size, modified_ns) => {
                debug!("Cache hit for {}", entry.document.id);
                Some(entry)
            }
            Ok(Some(entry)) => {
                warn!("Stale cache entry for {}, ignoring", entry.document.id);
                None
            }
            Ok(None) => {
                debug!("Cache miss for key {}", key.as_str());
                None
            }
            Err(e) => {
                warn!("Cache read failed, treating as miss: {}", e);
                None
            }
        }
    }

    /// Look up an entry, surfacing I/O and decoding errors
    pub fn try_get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| CacheError::Serialization { path, source })
    }

    /// Store an entry, replacing any existing one for `key`
    ///
    /// Writes go to a temporary file that is renamed into place, so readers
    /// never see a partial entry.
    pub fn put(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key.as_str()));
        let json = serde_json::to_vec(entry).map_err(|source| CacheError::Serialization {
            path: path.clone(),
            source,
        })?;
        fs::write(&tmp, json).map_err(|e| CacheError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| CacheError::io(&path, e))?;
        debug!("Cached {} chunks for {}", entry.chunks.len(), entry.document.id);
        Ok(())
    }
}
