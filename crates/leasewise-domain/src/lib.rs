//! Leasewise Domain Layer
//!
//! Core data model for the rental-contract question answering pipeline.
//! Every other crate depends on this one; it carries no I/O and only the
//! trait definitions that infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **Chunk**: a bounded slice of normalized contract text, the unit of retrieval
//! - **RawDocument**: the file a set of chunks was extracted from
//! - **ConversationMemory**: the bounded window of recent question/answer turns
//! - **AnswerWithSources**: a generated answer plus the chunks cited for it
//! - **ExtractionRecord**: the fixed schema of contract fields
//!
//! ## Architecture
//!
//! - Pure data and value objects
//! - Trait definitions for the language model, embedding and metadata backends
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod answer;
pub mod chunk;
pub mod document;
pub mod extraction;
pub mod memory;
pub mod summary;
pub mod traits;

// Re-exports for convenience
pub use answer::{AnswerStatus, AnswerWithSources, ScoredSource, Usage};
pub use chunk::Chunk;
pub use document::{CacheEntry, DocumentStats, RawDocument};
pub use extraction::{ContractField, ExtractionRecord, NOT_MENTIONED};
pub use memory::{ConversationMemory, Turn};
pub use summary::SummaryKind;

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch, saturating to zero for clocks set before 1970
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
