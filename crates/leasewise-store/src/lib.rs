//! Leasewise Storage Layer
//!
//! Everything that holds state for one user's session: the chunk cache, the
//! Document Store with its vector index, retrieval, and the SQLite metadata
//! collaborator.
//!
//! # Architecture
//!
//! - **ChunkCache**: content-addressed JSON entries, failures degrade to misses
//! - **DocumentStore**: single-active-document chunks + HNSW index, rebuilt per mutation
//! - **Retriever**: similarity or MMR search over the active index
//! - **SqliteMetadataStore**: documents, summaries, extractions and Q&A history
//!
//! # Example Usage
//!
//! ```no_run
//! use leasewise_store::{DocumentStore, HashingEmbedder, Retriever, SearchMode};
//!
//! let store = DocumentStore::new(HashingEmbedder::default());
//! let hits = Retriever::new(&store).retrieve("monthly rent", 5, SearchMode::Similarity).unwrap();
//! assert!(hits.is_empty()); // nothing loaded yet
//! ```

#![warn(missing_docs)]

mod error;
mod metadata;
pub mod cache;
pub mod document_store;
pub mod embedding;
pub mod retriever;
pub mod vector_index;

pub use cache::{CacheError, CacheKey, ChunkCache};
pub use document_store::{ActiveDocument, DocumentStore, StoreState};
pub use embedding::{cosine_similarity, EmbeddingError, HashingEmbedder};
pub use error::StoreError;
pub use metadata::SqliteMetadataStore;
pub use retriever::{Retrieved, Retriever, SearchMode};
pub use vector_index::{PersistedIndex, VectorIndex, VectorIndexError};
