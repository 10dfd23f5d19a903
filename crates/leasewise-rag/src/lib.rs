//! Leasewise RAG Pipeline
//!
//! Question answering, summarization and structured extraction over one
//! rental contract at a time.
//!
//! # Architecture
//!
//! - **ContractRag**: per-session facade owning the Document Store and memory
//! - **QaEngine**: condensed-question retrieval QA with bounded memory
//! - **rerank**: salient-token source attribution over retrieved chunks
//! - **Summarizer**: brief, key-point and comprehensive summaries
//! - **StructuredExtractor**: summary-grounded record plus per-field backfill
//!
//! Every language-model call runs on a blocking thread under a timeout; a
//! slow provider surfaces as [`RagError::Timeout`] instead of hanging.
//!
//! # Example Usage
//!
//! ```no_run
//! use leasewise_rag::{ContractRag, RagConfig};
//! use leasewise_domain::SummaryKind;
//! use leasewise_llm::MockProvider;
//! use leasewise_store::HashingEmbedder;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), leasewise_rag::RagError> {
//! let mut rag = ContractRag::new(MockProvider::default(), HashingEmbedder::default(), RagConfig::default())?;
//! rag.load(Path::new("lease.pdf"))?;
//!
//! let summary = rag.summarize(SummaryKind::Brief).await?;
//! let record = rag.extract().await?;
//! println!("{}\n{:?}", summary.text, record.record);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod generator;
pub mod config;
pub mod extract;
pub mod parser;
pub mod prompt;
pub mod qa;
pub mod rerank;
pub mod session;
pub mod simplify;
pub mod summarize;

pub use config::{RagConfig, SearchStrategy};
pub use error::RagError;
pub use extract::{ExtractionOutcome, StructuredExtractor};
pub use generator::Generator;
pub use parser::{parse_extraction, parse_extraction_or_default, MalformedExtraction};
pub use qa::{PreparedQuestion, QaEngine};
pub use rerank::{rerank, RerankPolicy, SalientTokens};
pub use session::{ContractRag, LoadReport, LoadStatus, SessionStats};
pub use summarize::{SummaryOutcome, Summarizer};
