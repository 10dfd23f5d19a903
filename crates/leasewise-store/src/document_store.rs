//! Document Store and index lifecycle
//!
//! Holds the chunks of the live documents and the one vector index built
//! over all of them. The store enforces the single-active-document rule:
//! installing a document clears everything else first, and the index is
//! rebuilt from the flattened chunk list on every mutation.
//!
//! ```text
//!            replace(d)                 replace(d2)
//!  Empty ────────────────▶ Active(d) ───────────────▶ Active(d2)
//!    ▲                        │
//!    └────────── clear() ─────┘
//! ```

use crate::error::StoreError;
use crate::vector_index::{PersistedIndex, VectorIndex, FORMAT_VERSION};
use leasewise_domain::traits::EmbeddingModel;
use leasewise_domain::{Chunk, DocumentStats, RawDocument};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;
use tracing::{debug, info, warn};

/// Lifecycle state of a [`DocumentStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreState {
    /// Nothing loaded
    Empty,
    /// The given document id is loaded and indexed
    Active(String),
}

/// The loaded document and its statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    /// Source document
    pub document: RawDocument,
    /// Extraction statistics
    pub stats: DocumentStats,
}

struct StoredDocument {
    active: ActiveDocument,
    chunks: Vec<Chunk>,
}

/// Chunks plus the vector index derived from them
pub struct DocumentStore<E> {
    embedder: E,
    documents: BTreeMap<String, StoredDocument>,
    chunks: Vec<Chunk>,
    index: Option<VectorIndex>,
}

impl<E> DocumentStore<E>
where
    E: EmbeddingModel,
    E::Error: Display,
{
    /// Create an empty store that embeds with `embedder`
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            documents: BTreeMap::new(),
            chunks: Vec::new(),
            index: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> StoreState {
        match self.documents.keys().next() {
            Some(id) => StoreState::Active(id.clone()),
            None => StoreState::Empty,
        }
    }

    /// The active document, if any
    pub fn active(&self) -> Option<&ActiveDocument> {
        self.documents.values().next().map(|d| &d.active)
    }

    /// Whether `doc_id` is the active document
    pub fn is_active(&self, doc_id: &str) -> bool {
        self.documents.contains_key(doc_id)
    }

    /// Number of documents held (0 or 1)
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Make `document` the only live document and rebuild the index
    ///
    /// On failure the store is left [`StoreState::Empty`].
    pub fn replace(
        &mut self,
        document: RawDocument,
        stats: DocumentStats,
        chunks: Vec<Chunk>,
    ) -> Result<(), StoreError> {
        if let StoreState::Active(previous) = self.state() {
            if previous != document.id {
                info!("Evicting {} for {}", previous, document.id);
            }
        }
        self.clear();

        let id = document.id.clone();
        self.documents.insert(
            id,
            StoredDocument {
                active: ActiveDocument { document, stats },
                chunks,
            },
        );

        if let Err(e) = self.rebuild() {
            warn!("Index rebuild failed, clearing store: {}", e);
            self.clear();
            return Err(e);
        }
        Ok(())
    }

    /// Install a persisted index without re-embedding
    pub fn adopt(&mut self, persisted: PersistedIndex) -> Result<(), StoreError> {
        let expected = self.embedder.dimension();
        if persisted.dimension != expected {
            return Err(StoreError::InvalidData(format!(
                "persisted index has dimension {}, embedder produces {}",
                persisted.dimension, expected
            )));
        }

        self.clear();
        let index = VectorIndex::build(persisted.dimension, persisted.vectors)?;
        self.chunks = persisted.chunks.clone();
        self.index = Some(index);
        self.documents.insert(
            persisted.document.id.clone(),
            StoredDocument {
                active: ActiveDocument {
                    document: persisted.document,
                    stats: persisted.stats,
                },
                chunks: persisted.chunks,
            },
        );
        info!("Adopted persisted index with {} chunks", self.chunks.len());
        Ok(())
    }

    /// Drop every document, chunk and the index
    pub fn clear(&mut self) {
        self.documents.clear();
        self.chunks.clear();
        self.index = None;
    }

    /// Flatten all held chunks, embed them and build one combined index
    pub fn rebuild(&mut self) -> Result<(), StoreError> {
        self.index = None;
        self.chunks = self
            .documents
            .values()
            .flat_map(|d| d.chunks.iter().cloned())
            .collect();

        if self.chunks.is_empty() {
            debug!("Nothing to index");
            return Ok(());
        }

        let vectors = self
            .chunks
            .iter()
            .map(|chunk| self.embed(&chunk.text))
            .collect::<Result<Vec<_>, _>>()?;
        let index = VectorIndex::build(self.embedder.dimension(), vectors)?;

        info!("Rebuilt vector index over {} chunks", index.len());
        self.index = Some(index);
        Ok(())
    }

    /// Flattened chunks in index order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The vector index, if one has been built
    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    /// Embed a query with the store's embedder
    pub fn embed_query(&self, query: &str) -> Result<Vec<f32>, StoreError> {
        self.embed(query)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        self.embedder
            .embed(text)
            .map_err(|e| StoreError::Embedding(e.to_string()))
    }

    /// Serialize the active document's index to `path`
    pub fn save_index(&self, path: &Path) -> Result<(), StoreError> {
        let active = self.active().ok_or(StoreError::NoActiveDocument)?;
        let index = self.index.as_ref().ok_or(StoreError::NoActiveDocument)?;

        let persisted = PersistedIndex {
            version: FORMAT_VERSION,
            dimension: index.dimension(),
            document: active.document.clone(),
            stats: active.stats.clone(),
            chunks: self.chunks.clone(),
            vectors: index.vectors().to_vec(),
        };
        persisted.write(path)?;
        info!("Saved index for {} to {}", active.document.id, path.display());
        Ok(())
    }

    /// Load a serialized index from `path` and make its document active
    ///
    /// See [`PersistedIndex::read`] for the meaning of
    /// `allow_unsafe_deserialization`.
    pub fn load_index(
        &mut self,
        path: &Path,
        allow_unsafe_deserialization: bool,
    ) -> Result<(), StoreError> {
        let persisted = PersistedIndex::read(path, allow_unsafe_deserialization)?;
        self.adopt(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::vector_index::VectorIndexError;

    fn document(id: &str, texts: &[&str]) -> (RawDocument, DocumentStats, Vec<Chunk>) {
        let document = RawDocument {
            id: id.to_string(),
            byte_size: 100,
            modified_ns: 1,
            page_count: 1,
            backend: "plain-text".to_string(),
            content_hash: "hash".to_string(),
        };
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(id, i, *t, "plain-text"))
            .collect();
        let characters = texts.iter().map(|t| t.len()).sum();
        let stats = DocumentStats::from_chunks(&document, characters, &chunks);
        (document, stats, chunks)
    }

    #[test]
    fn test_starts_empty() {
        let store = DocumentStore::new(HashingEmbedder::new(64));
        assert_eq!(store.state(), StoreState::Empty);
        assert!(store.index().is_none());
        assert!(store.chunks().is_empty());
    }

    #[test]
    fn test_replace_activates_and_indexes() {
        let mut store = DocumentStore::new(HashingEmbedder::new(64));
        let (doc, stats, chunks) = document("/a", &["rent is $2,500", "deposit is $5,000"]);
        store.replace(doc, stats, chunks).unwrap();

        assert_eq!(store.state(), StoreState::Active("/a".to_string()));
        assert!(store.is_active("/a"));
        assert_eq!(store.index().unwrap().len(), 2);
    }

    #[test]
    fn test_replace_evicts_previous_document() {
        let mut store = DocumentStore::new(HashingEmbedder::new(64));
        let (a, sa, ca) = document("/a", &["alpha clause", "alpha schedule"]);
        let (b, sb, cb) = document("/b", &["bravo clause"]);
        store.replace(a, sa, ca).unwrap();
        store.replace(b, sb, cb).unwrap();

        assert_eq!(store.document_count(), 1);
        assert!(!store.is_active("/a"));
        assert!(store.chunks().iter().all(|c| c.doc_id == "/b"));
        assert_eq!(store.index().unwrap().len(), 1);
    }

    #[test]
    fn test_clear_returns_to_empty() {
        let mut store = DocumentStore::new(HashingEmbedder::new(64));
        let (doc, stats, chunks) = document("/a", &["text"]);
        store.replace(doc, stats, chunks).unwrap();
        store.clear();

        assert_eq!(store.state(), StoreState::Empty);
        assert!(store.active().is_none());
        assert!(store.index().is_none());
    }

    #[test]
    fn test_failed_rebuild_leaves_store_empty() {
        let mut store = DocumentStore::new(HashingEmbedder::new(64));
        let (doc, stats, mut chunks) = document("/a", &["fine"]);
        chunks.push(Chunk::new("/a", 1, "   ", "plain-text"));

        assert!(matches!(
            store.replace(doc, stats, chunks),
            Err(StoreError::Embedding(_))
        ));
        assert_eq!(store.state(), StoreState::Empty);
    }

    #[test]
    fn test_save_and_load_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vector_stores").join("a.json");

        let mut store = DocumentStore::new(HashingEmbedder::new(64));
        let (doc, stats, chunks) = document("/a", &["rent is due monthly", "pets allowed"]);
        store.replace(doc, stats, chunks).unwrap();
        store.save_index(&path).unwrap();

        let mut restored = DocumentStore::new(HashingEmbedder::new(64));
        assert!(matches!(
            restored.load_index(&path, false),
            Err(StoreError::Index(VectorIndexError::UnsafeDeserialization(_)))
        ));
        restored.load_index(&path, true).unwrap();

        assert_eq!(restored.state(), StoreState::Active("/a".to_string()));
        assert_eq!(restored.chunks(), store.chunks());
        assert_eq!(
            restored.index().unwrap().vectors(),
            store.index().unwrap().vectors()
        );
    }

    #[test]
    fn test_load_index_rejects_dimension_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");

        let mut store = DocumentStore::new(HashingEmbedder::new(64));
        let (doc, stats, chunks) = document("/a", &["text"]);
        store.replace(doc, stats, chunks).unwrap();
        store.save_index(&path).unwrap();

        let mut other = DocumentStore::new(HashingEmbedder::new(32));
        assert!(matches!(
            other.load_index(&path, true),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_save_without_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(HashingEmbedder::new(64));
        assert!(matches!(
            store.save_index(&dir.path().join("x.json")),
            Err(StoreError::NoActiveDocument)
        ));
    }
}
