//! Structured field extraction
//!
//! Two passes:
//!
//! 1. One structured call over a comprehensive summary fills whatever the
//!    summary states; unparsable output leaves every field at the sentinel.
//! 2. Each field still missing gets one targeted question through the QA
//!    engine (no compression, history read but not written). Answers that
//!    are not "unknown" are simplified per field before being stored.
//!
//! Backfill runs sequentially by default. The parallel variant fans the
//! model calls out over a bounded worker pool; fields are disjoint so the
//! merge is order-independent.

use crate::error::RagError;
use crate::generator::Generator;
use crate::parser::parse_extraction_or_default;
use crate::prompt::{extraction_prompt, extraction_schema};
use crate::qa::{PreparedQuestion, QaEngine};
use crate::simplify::simplify;
use leasewise_domain::traits::{EmbeddingModel, LlmProvider, LlmRequest, LlmResponse};
use leasewise_domain::{ContractField, ExtractionRecord, Usage};
use leasewise_store::DocumentStore;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// The extracted record and how it was obtained
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionOutcome {
    /// Every schema field, value or sentinel
    pub record: ExtractionRecord,
    /// Fields recovered by targeted questions
    pub backfilled: Vec<ContractField>,
    /// Tokens consumed across summary, extraction and backfill
    pub usage: Usage,
}

/// Structured extraction plus per-field backfill
pub struct StructuredExtractor<L> {
    generator: Generator<L>,
    parallel: bool,
    workers: usize,
}

impl<L> StructuredExtractor<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    /// Create an extractor
    pub fn new(generator: Generator<L>, parallel: bool, workers: usize) -> Self {
        Self {
            generator,
            parallel,
            workers: workers.max(1),
        }
    }

    /// Override sequential/parallel backfill
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// First pass: ask for the record grounded only in `summary`
    pub async fn from_summary(&self, summary: &str) -> Result<(ExtractionRecord, Usage), RagError> {
        let request = LlmRequest::new(extraction_prompt(summary));
        let response = self
            .generator
            .generate_structured(request, &extraction_schema())
            .await?;

        let record = parse_extraction_or_default(&response.text);
        info!(
            "Summary extraction filled {} of {} fields",
            ContractField::ALL.len() - record.missing_fields().len(),
            ContractField::ALL.len()
        );
        Ok((record, response.usage))
    }

    /// Second pass: targeted questions for every field still at the sentinel
    ///
    /// Returns the fields that were filled and the usage spent. A failed
    /// question leaves its field at the sentinel.
    pub async fn backfill<E>(
        &self,
        qa: &QaEngine<L>,
        store: &DocumentStore<E>,
        record: &mut ExtractionRecord,
    ) -> Result<(Vec<ContractField>, Usage), RagError>
    where
        E: EmbeddingModel,
        E::Error: Display,
    {
        let missing = record.missing_fields();
        if missing.is_empty() {
            return Ok((Vec::new(), Usage::default()));
        }
        info!(
            "Backfilling {} fields ({})",
            missing.len(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        let history = qa.memory().snapshot();
        let mut prepared = Vec::with_capacity(missing.len());
        for field in missing {
            match qa.prepare(store, field.query(), history.clone())? {
                Some(question) => prepared.push((field, question)),
                None => return Err(RagError::NoActiveDocument),
            }
        }

        let answers = if self.parallel {
            self.answer_parallel(prepared).await
        } else {
            self.answer_sequential(prepared).await
        };

        let mut filled = Vec::new();
        let mut usage = Usage::default();
        for (field, result) in answers {
            match result {
                Ok(response) => {
                    usage += response.usage;
                    match simplify(field, &response.text) {
                        Some(value) => {
                            debug!("Backfilled {}: {}", field, value);
                            record.set(field, value);
                            filled.push(field);
                        }
                        None => debug!("No value for {} in answer", field),
                    }
                }
                Err(e) => warn!("Backfill for {} failed: {}", field, e),
            }
        }
        filled.sort();

        info!("Backfill recovered {} fields", filled.len());
        Ok((filled, usage))
    }

    async fn answer_sequential(
        &self,
        prepared: Vec<(ContractField, PreparedQuestion)>,
    ) -> Vec<(ContractField, Result<LlmResponse, RagError>)> {
        let mut answers = Vec::with_capacity(prepared.len());
        for (field, question) in prepared {
            answers.push((field, self.generator.generate(question.request).await));
        }
        answers
    }

    async fn answer_parallel(
        &self,
        prepared: Vec<(ContractField, PreparedQuestion)>,
    ) -> Vec<(ContractField, Result<LlmResponse, RagError>)> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut set = JoinSet::new();

        for (field, question) in prepared {
            let semaphore = Arc::clone(&semaphore);
            let generator = self.generator.clone();
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (field, generator.generate(question.request).await)
            });
        }

        let mut answers = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(answer) => answers.push(answer),
                Err(e) => warn!("Backfill task failed: {}", e),
            }
        }
        answers.sort_by_key(|(field, _)| *field);
        answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RagConfig;
    use leasewise_domain::{Chunk, DocumentStats, RawDocument, NOT_MENTIONED};
    use leasewise_llm::MockProvider;
    use leasewise_store::HashingEmbedder;
    use std::time::Duration;

    fn store() -> DocumentStore<HashingEmbedder> {
        let document = RawDocument {
            id: "/lease.txt".to_string(),
            byte_size: 1,
            modified_ns: 1,
            page_count: 1,
            backend: "plain-text".to_string(),
            content_hash: String::new(),
        };
        let chunks = vec![
            Chunk::new(&document.id, 0, "Monthly rent: $2,500, due on the 1st.", "plain-text"),
            Chunk::new(&document.id, 1, "Security deposit: $5,000.", "plain-text"),
        ];
        let stats = DocumentStats::from_chunks(&document, 0, &chunks);
        let mut store = DocumentStore::new(HashingEmbedder::new(128));
        store.replace(document, stats, chunks).unwrap();
        store
    }

    fn parts(provider: &MockProvider, parallel: bool) -> (StructuredExtractor<MockProvider>, QaEngine<MockProvider>) {
        let generator = Generator::new(Arc::new(provider.clone()), Duration::from_secs(5), 0.0);
        (
            StructuredExtractor::new(generator.clone(), parallel, 3),
            QaEngine::new(generator, &RagConfig::default()),
        )
    }

    fn scripted() -> MockProvider {
        let mut provider = MockProvider::new("The contract does not mention this.");
        provider.add_response("JSON:", r#"{"rent_amount": "$2,500"}"#);
        provider.add_response("security deposit amount", "The security deposit is $5,000.");
        provider.add_response("rent due each month", "Rent is due on the 1st of each month.");
        provider.add_error("pet policy");
        provider
    }

    #[tokio::test]
    async fn test_from_summary_parses_record() {
        let provider = scripted();
        let (extractor, _) = parts(&provider, false);

        let (record, _) = extractor.from_summary("Rent is $2,500.").await.unwrap();
        assert_eq!(&record[ContractField::RentAmount], "$2,500");
        assert_eq!(&record[ContractField::Parking], NOT_MENTIONED);
    }

    #[tokio::test]
    async fn test_malformed_summary_extraction_defaults() {
        let mut provider = MockProvider::default();
        provider.add_response("JSON:", "I cannot help with that.");
        let (extractor, _) = parts(&provider, false);

        let (record, _) = extractor.from_summary("anything").await.unwrap();
        assert_eq!(record, ExtractionRecord::new());
    }

    async fn backfilled(parallel: bool) -> (ExtractionRecord, Vec<ContractField>) {
        let provider = scripted();
        let (extractor, qa) = parts(&provider, parallel);
        let mut record = ExtractionRecord::new();
        record.set(ContractField::RentAmount, "$2,500");

        let (filled, _) = extractor.backfill(&qa, &store(), &mut record).await.unwrap();
        assert_eq!(provider.call_count(), ContractField::ALL.len() - 1);
        assert!(qa.memory().is_empty());
        (record, filled)
    }

    #[tokio::test]
    async fn test_sequential_backfill() {
        let (record, filled) = backfilled(false).await;

        assert_eq!(filled, vec![ContractField::SecurityDeposit, ContractField::PaymentDueDate]);
        assert_eq!(&record[ContractField::SecurityDeposit], "$5,000");
        assert_eq!(&record[ContractField::PaymentDueDate], "1st of each month");
        assert_eq!(&record[ContractField::PetPolicy], NOT_MENTIONED);
        assert_eq!(&record[ContractField::Parking], NOT_MENTIONED);
    }

    #[tokio::test]
    async fn test_parallel_backfill_matches_sequential() {
        assert_eq!(backfilled(true).await, backfilled(false).await);
    }

    #[tokio::test]
    async fn test_nothing_missing_makes_no_calls() {
        let provider = scripted();
        let (extractor, qa) = parts(&provider, false);
        let mut record = ExtractionRecord::new();
        for field in ContractField::ALL {
            record.set(field, "known");
        }

        let (filled, _) = extractor.backfill(&qa, &store(), &mut record).await.unwrap();
        assert!(filled.is_empty());
        assert_eq!(provider.call_count(), 0);
    }
}
