//! HNSW Vector Index for Semantic Search
//!
//! A wrapper around the HNSW algorithm for nearest-neighbor search over
//! chunk embeddings, plus the on-disk format used by `save_index` /
//! `load_index`.
//!
//! # Architecture
//!
//! - Rebuilt from scratch on every Document Store mutation
//! - Internal ids are positions in the flattened chunk list
//! - Raw vectors are kept beside the graph for MMR and persistence
//!
//! # HNSW Parameters
//!
//! - **M**: Number of bi-directional links per node (default: 16)
//! - **efConstruction**: Size of dynamic candidate list during construction (default: 200)
//! - **efSearch**: `max(64, 2k)` per query

use hnsw_rs::prelude::*;
use leasewise_domain::{Chunk, DocumentStats, RawDocument};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 100_000;
const MIN_EF_SEARCH: usize = 64;

/// Current persisted index format version
pub const FORMAT_VERSION: u32 = 1;

/// Errors that can occur during vector index operations
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Loading a persisted index without opting in
    #[error(
        "Refusing to load index from {0}: deserialization must be explicitly allowed for indexes this system produced"
    )]
    UnsafeDeserialization(PathBuf),

    /// Persisted index is unreadable or inconsistent
    #[error("Corrupt index at {path}: {reason}")]
    Corrupt {
        /// File that was read
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Filesystem error while saving or loading
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File that was accessed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

/// HNSW index over the embeddings of the live chunks
///
/// # Examples
///
/// ```
/// use leasewise_store::vector_index::VectorIndex;
///
/// let index = VectorIndex::build(3, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).unwrap();
/// let results = index.search(&[1.0, 0.1, 0.0], 1).unwrap();
/// assert_eq!(results[0].0, 0);
/// ```
pub struct VectorIndex {
    /// Expected embedding dimension
    dimension: usize,

    /// HNSW graph; hnsw_rs owns copies of the inserted data
    hnsw: Hnsw<'static, f32, DistCosine>,

    /// Vectors by internal id
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimension`
    pub fn new(dimension: usize) -> Self {
        // Calculate number of layers based on expected data size
        let nb_layer = 16.min((DEFAULT_MAX_ELEMENTS as f32).ln().trunc() as usize);

        let hnsw = Hnsw::<'static, f32, DistCosine>::new(
            DEFAULT_M,
            DEFAULT_MAX_ELEMENTS,
            nb_layer,
            DEFAULT_EF_CONSTRUCTION,
            DistCosine {},
        );

        Self {
            dimension,
            hnsw,
            vectors: Vec::new(),
        }
    }

    /// Build an index whose internal ids are the positions in `vectors`
    pub fn build(dimension: usize, vectors: Vec<Vec<f32>>) -> Result<Self, VectorIndexError> {
        let mut index = Self::new(dimension);
        for vector in vectors {
            index.add(vector)?;
        }
        Ok(index)
    }

    /// Append a vector, returning its internal id
    pub fn add(&mut self, embedding: Vec<f32>) -> Result<usize, VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let id = self.vectors.len();
        self.hnsw.insert((&embedding, id));
        self.vectors.push(embedding);
        Ok(id)
    }

    /// The k nearest neighbors of `query` as (internal id, cosine similarity),
    /// most similar first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, VectorIndexError> {
        if query.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        let k = k.min(self.vectors.len());
        let ef_search = MIN_EF_SEARCH.max(2 * k);

        let mut results: Vec<(usize, f32)> = self
            .hnsw
            .search(query, k, ef_search)
            .into_iter()
            .filter(|neighbour| neighbour.d_id < self.vectors.len())
            // HNSW returns cosine distance, we want similarity (1 - distance)
            .map(|neighbour| (neighbour.d_id, 1.0 - neighbour.distance))
            .collect();

        results.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(results)
    }

    /// The stored vector for an internal id
    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        self.vectors.get(id).map(Vec::as_slice)
    }

    /// Embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// All vectors in id order
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }
}

/// Serialized form of an active document's index
///
/// Vectors are positionally aligned with `chunks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedIndex {
    /// Format version
    pub version: u32,
    /// Embedding dimension
    pub dimension: usize,
    /// The document the chunks belong to
    pub document: RawDocument,
    /// Its extraction statistics
    pub stats: DocumentStats,
    /// Chunks in index order
    pub chunks: Vec<Chunk>,
    /// One vector per chunk
    pub vectors: Vec<Vec<f32>>,
}

impl PersistedIndex {
    /// Write the index to `path` as JSON, creating parent directories
    pub fn write(&self, path: &Path) -> Result<(), VectorIndexError> {
        let io = |source| VectorIndexError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io)?;
        }
        let json = serde_json::to_vec(self).map_err(|e| VectorIndexError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, json).map_err(io)
    }

    /// Read an index from `path`
    ///
    /// Refuses unless `allow_unsafe_deserialization` is set; only indexes
    /// written by [`PersistedIndex::write`] should be loaded.
    pub fn read(path: &Path, allow_unsafe_deserialization: bool) -> Result<Self, VectorIndexError> {
        if !allow_unsafe_deserialization {
            return Err(VectorIndexError::UnsafeDeserialization(path.to_path_buf()));
        }

        let bytes = fs::read(path).map_err(|source| VectorIndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let corrupt = |reason: String| VectorIndexError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };
        let persisted: Self = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;

        if persisted.version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported version {}", persisted.version)));
        }
        if persisted.vectors.len() != persisted.chunks.len() {
            return Err(corrupt(format!(
                "{} vectors for {} chunks",
                persisted.vectors.len(),
                persisted.chunks.len()
            )));
        }
        if let Some(bad) = persisted.vectors.iter().find(|v| v.len() != persisted.dimension) {
            return Err(corrupt(format!(
                "vector of dimension {} in index of dimension {}",
                bad.len(),
                persisted.dimension
            )));
        }

        Ok(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dimension: usize, hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; dimension];
        v[hot] = 1.0;
        v
    }

    #[test]
    fn test_search_finds_nearest() {
        let index = VectorIndex::build(4, (0..4).map(|i| unit(4, i)).collect()).unwrap();

        let results = index.search(&[0.0, 0.9, 0.1, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = VectorIndex::new(3);
        let result = index.add(vec![1.0, 0.0]);
        assert!(matches!(
            result,
            Err(VectorIndexError::DimensionMismatch { expected: 3, actual: 2 })
        ));
        assert!(index.search(&[1.0], 1).is_err());
    }

    #[test]
    fn test_k_larger_than_index() {
        let index = VectorIndex::build(2, vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(index.search(&[1.0, 1.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_index() {
        let index = VectorIndex::new(2);
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_vector_lookup() {
        let index = VectorIndex::build(2, vec![vec![0.6, 0.8]]).unwrap();
        assert_eq!(index.vector(0), Some(&[0.6, 0.8][..]));
        assert_eq!(index.vector(1), None);
    }

    fn persisted(vectors: Vec<Vec<f32>>) -> PersistedIndex {
        let document = RawDocument {
            id: "/tmp/lease.txt".to_string(),
            byte_size: 10,
            modified_ns: 1,
            page_count: 1,
            backend: "plain-text".to_string(),
            content_hash: "abc".to_string(),
        };
        let chunks: Vec<Chunk> = (0..vectors.len())
            .map(|i| Chunk::new(&document.id, i, format!("chunk {i}"), "plain-text"))
            .collect();
        let stats = DocumentStats::from_chunks(&document, 14, &chunks);
        PersistedIndex {
            version: FORMAT_VERSION,
            dimension: 2,
            document,
            stats,
            chunks,
            vectors,
        }
    }

    #[test]
    fn test_read_requires_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        persisted(vec![vec![1.0, 0.0]]).write(&path).unwrap();

        let refused = PersistedIndex::read(&path, false);
        assert!(matches!(refused, Err(VectorIndexError::UnsafeDeserialization(_))));

        let loaded = PersistedIndex::read(&path, true).unwrap();
        assert_eq!(loaded, persisted(vec![vec![1.0, 0.0]]));
    }

    #[test]
    fn test_read_rejects_misaligned_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.json");
        let mut index = persisted(vec![vec![1.0, 0.0]]);
        index.vectors.push(vec![0.0, 1.0]);
        index.write(&path).unwrap();

        assert!(matches!(
            PersistedIndex::read(&path, true),
            Err(VectorIndexError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_read_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, b"not json").unwrap();

        assert!(matches!(
            PersistedIndex::read(&path, true),
            Err(VectorIndexError::Corrupt { .. })
        ));
    }
}
