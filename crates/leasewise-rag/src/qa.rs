//! Conversational question answering
//!
//! The engine owns the conversation memory. History is read before a
//! question is answered and the new turn is written only after the model
//! call succeeds, so a failed call leaves the transcript untouched.

use crate::config::RagConfig;
use crate::error::RagError;
use crate::generator::Generator;
use crate::prompt::{compression_prompt, question_prompt, NO_OUTPUT, QA_SYSTEM};
use crate::rerank::{rerank, RerankPolicy};
use leasewise_domain::traits::{EmbeddingModel, LlmProvider, LlmRequest};
use leasewise_domain::{AnswerStatus, AnswerWithSources, Chunk, ConversationMemory, Turn, Usage};
use leasewise_store::{DocumentStore, Retriever, SearchMode};
use std::fmt::Display;
use tracing::{debug, info, warn};

/// A question with its retrieved context, ready for the model
#[derive(Debug, Clone)]
pub struct PreparedQuestion {
    /// The question as asked
    pub question: String,
    /// Retrieved chunks, in retrieval order
    pub retrieved: Vec<Chunk>,
    /// The request that will be sent
    pub request: LlmRequest,
    /// Usage spent preparing (compression)
    pub usage: Usage,
}

/// Retrieval + generation + citation over the active document
pub struct QaEngine<L> {
    generator: Generator<L>,
    memory: ConversationMemory,
    policy: RerankPolicy,
    retrieval_k: usize,
    search_mode: SearchMode,
    use_compression: bool,
}

impl<L> QaEngine<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    /// Create an engine with empty memory
    pub fn new(generator: Generator<L>, config: &RagConfig) -> Self {
        Self {
            generator,
            memory: ConversationMemory::new(config.memory_window),
            policy: RerankPolicy::default(),
            retrieval_k: config.retrieval_k,
            search_mode: config.search_mode(),
            use_compression: config.use_compression,
        }
    }

    /// Replace the citation policy
    pub fn with_policy(mut self, policy: RerankPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The conversation so far
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Forget the conversation
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    /// Answer `question` and record the turn on success
    ///
    /// With nothing loaded this returns the fixed "no contract loaded"
    /// answer and leaves memory alone.
    pub async fn ask<E>(
        &mut self,
        store: &DocumentStore<E>,
        question: &str,
    ) -> Result<AnswerWithSources, RagError>
    where
        E: EmbeddingModel,
        E::Error: Display,
    {
        let history = self.memory.snapshot();
        let answer = self
            .answer(store, question, history, self.use_compression)
            .await?;

        if answer.status == AnswerStatus::Answered {
            self.memory.record(question, answer.answer.clone());
        }
        Ok(answer)
    }

    /// Answer without touching memory
    pub async fn answer<E>(
        &self,
        store: &DocumentStore<E>,
        question: &str,
        history: Vec<Turn>,
        use_compression: bool,
    ) -> Result<AnswerWithSources, RagError>
    where
        E: EmbeddingModel,
        E::Error: Display,
    {
        let Some(mut prepared) = self.prepare(store, question, history)? else {
            return Ok(AnswerWithSources::no_contract());
        };
        if use_compression {
            self.compress(&mut prepared).await;
        }
        self.complete(prepared).await
    }

    /// Retrieve context and build the request
    ///
    /// `None` when no document is active. A blank question is an error
    /// rather than a "nothing loaded" answer.
    pub fn prepare<E>(
        &self,
        store: &DocumentStore<E>,
        question: &str,
        history: Vec<Turn>,
    ) -> Result<Option<PreparedQuestion>, RagError>
    where
        E: EmbeddingModel,
        E::Error: Display,
    {
        if store.active().is_none() {
            debug!("No active document for {:?}", question);
            return Ok(None);
        }
        if question.trim().is_empty() {
            return Err(RagError::EmptyQuestion);
        }

        let retrieved: Vec<Chunk> = Retriever::new(store)
            .retrieve(question, self.retrieval_k, self.search_mode)?
            .into_iter()
            .map(|r| r.chunk)
            .collect();

        let request = LlmRequest::new(question_prompt(question))
            .with_system(QA_SYSTEM)
            .with_history(history)
            .with_context(retrieved.iter().map(|c| c.text.clone()).collect());

        Ok(Some(PreparedQuestion {
            question: question.to_string(),
            retrieved,
            request,
            usage: Usage::default(),
        }))
    }

    /// Trim each context passage to the parts relevant to the question
    ///
    /// Passages reduced to nothing are dropped. Failures keep the passage
    /// unchanged. Sources still cite the full chunks.
    pub async fn compress(&self, prepared: &mut PreparedQuestion) {
        let mut kept = Vec::with_capacity(prepared.retrieved.len());
        for chunk in &prepared.retrieved {
            let request = LlmRequest::new(compression_prompt(&prepared.question, &chunk.text));
            match self.generator.generate(request).await {
                Ok(response) => {
                    prepared.usage += response.usage;
                    let text = response.text.trim();
                    if text.is_empty() || text.contains(NO_OUTPUT) {
                        debug!("Compression dropped chunk {}", chunk.id());
                    } else {
                        kept.push(text.to_string());
                    }
                }
                Err(e) => {
                    warn!("Compression failed for chunk {}, keeping it whole: {}", chunk.id(), e);
                    kept.push(chunk.text.clone());
                }
            }
        }
        prepared.request.context = kept;
    }

    /// Call the model for a prepared question and attach citations
    pub async fn complete(&self, prepared: PreparedQuestion) -> Result<AnswerWithSources, RagError> {
        let response = self
            .generator
            .generate(prepared.request)
            .await
            .map_err(generation_failed)?;

        let answer = response.text.trim().to_string();
        let sources = rerank(&answer, &prepared.retrieved, &self.policy);
        let mut usage = prepared.usage;
        usage += response.usage;

        info!(
            "Answered from {} retrieved chunks, citing {}",
            prepared.retrieved.len(),
            sources.len()
        );

        Ok(AnswerWithSources {
            answer,
            sources,
            usage,
            status: AnswerStatus::Answered,
        })
    }
}

fn generation_failed(error: RagError) -> RagError {
    match error {
        RagError::Llm(message) => RagError::AnswerGeneration(message),
        RagError::Timeout(secs) => RagError::AnswerGeneration(format!("timed out after {}s", secs)),
        other => other,
    }
}
