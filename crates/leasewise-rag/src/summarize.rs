//! Contract summaries
//!
//! Long documents are summarized from their first `summary_chunk_limit`
//! chunks only. The outcome reports how many chunks were used so callers
//! can tell the user the summary covers part of the document.

use crate::error::RagError;
use crate::generator::Generator;
use crate::prompt::summary_prompt;
use leasewise_domain::traits::{LlmProvider, LlmRequest};
use leasewise_domain::{Chunk, SummaryKind, Usage};
use leasewise_ingest::reassemble;
use serde::Serialize;
use std::fmt::Display;
use tracing::info;

/// A generated summary and what it was generated from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryOutcome {
    /// Kind requested
    pub kind: SummaryKind,
    /// Summary text
    pub text: String,
    /// Chunks fed to the model
    pub chunks_used: usize,
    /// Chunks in the document
    pub total_chunks: usize,
    /// Tokens consumed
    pub usage: Usage,
}

impl SummaryOutcome {
    /// Whether only part of the document was summarized
    pub fn is_partial(&self) -> bool {
        self.chunks_used < self.total_chunks
    }
}

/// Generates the three summary kinds
pub struct Summarizer<L> {
    generator: Generator<L>,
    chunk_limit: usize,
}

impl<L> Summarizer<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    /// Create a summarizer using at most `chunk_limit` chunks
    pub fn new(generator: Generator<L>, chunk_limit: usize) -> Self {
        Self {
            generator,
            chunk_limit: chunk_limit.max(1),
        }
    }

    /// Summarize `chunks` (a document in order) as `kind`
    pub async fn summarize(
        &self,
        chunks: &[Chunk],
        kind: SummaryKind,
    ) -> Result<SummaryOutcome, RagError> {
        if chunks.is_empty() {
            return Err(RagError::NoActiveDocument);
        }

        let used = &chunks[..chunks.len().min(self.chunk_limit)];
        if used.len() < chunks.len() {
            info!(
                "Summarizing the first {} of {} chunks",
                used.len(),
                chunks.len()
            );
        }

        let text = reassemble(used).join("\n\n");
        let response = self
            .generator
            .generate(LlmRequest::new(summary_prompt(kind, &text)))
            .await?;

        info!("Generated {} summary ({} tokens)", kind, response.usage.total_tokens());

        Ok(SummaryOutcome {
            kind,
            text: response.text.trim().to_string(),
            chunks_used: used.len(),
            total_chunks: chunks.len(),
            usage: response.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leasewise_llm::MockProvider;
    use std::sync::Arc;
    use std::time::Duration;

    fn summarizer(provider: &MockProvider, limit: usize) -> Summarizer<MockProvider> {
        let generator = Generator::new(Arc::new(provider.clone()), Duration::from_secs(5), 0.0);
        Summarizer::new(generator, limit)
    }

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk::new("/lease.txt", i, format!("Clause {i}."), "plain-text").at(i + 1, 0))
            .collect()
    }

    #[tokio::test]
    async fn test_uses_kind_template() {
        let mut provider = MockProvider::default();
        provider.add_response("Key Points:", "1. Rent is $2,500");
        let outcome = summarizer(&provider, 10)
            .summarize(&chunks(2), SummaryKind::KeyPoints)
            .await
            .unwrap();

        assert_eq!(outcome.text, "1. Rent is $2,500");
        assert!(!outcome.is_partial());
    }

    #[tokio::test]
    async fn test_long_document_is_partial() {
        let provider = MockProvider::new("Summary.");
        let outcome = summarizer(&provider, 10)
            .summarize(&chunks(12), SummaryKind::Brief)
            .await
            .unwrap();

        assert!(outcome.is_partial());
        assert_eq!(outcome.chunks_used, 10);
        assert_eq!(outcome.total_chunks, 12);

        let prompt = provider.last_request().unwrap().prompt;
        assert!(prompt.contains("Clause 9."));
        assert!(!prompt.contains("Clause 10."));
    }

    #[tokio::test]
    async fn test_empty_document() {
        let provider = MockProvider::default();
        let result = summarizer(&provider, 10).summarize(&[], SummaryKind::Brief).await;
        assert!(matches!(result, Err(RagError::NoActiveDocument)));
    }
}
