//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its
//! backends. Implementations live in other crates.

use crate::{ContractField, DocumentStats, ExtractionRecord, SummaryKind, Turn, Usage};
use serde::{Deserialize, Serialize};

/// A single call to a language model
///
/// The backend decides how to lay the parts out (chat messages, a flat
/// prompt, ...). [`LlmRequest::render`] gives the canonical flat layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// System instructions
    pub system: Option<String>,
    /// The user prompt
    pub prompt: String,
    /// Prior turns, oldest first
    pub history: Vec<Turn>,
    /// Retrieved passages the answer must be grounded in
    pub context: Vec<String>,
}

impl LlmRequest {
    /// A request carrying only a prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the system instructions
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the chat history
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    /// Set the retrieved context
    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = context;
        self
    }

    /// Flatten the request into one prompt string
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(system) = &self.system {
            out.push_str(system);
            out.push_str("\n\n");
        }
        if !self.context.is_empty() {
            out.push_str("Context:\n");
            for passage in &self.context {
                out.push_str(passage);
                out.push_str("\n\n");
            }
        }
        if !self.history.is_empty() {
            out.push_str("Chat History:\n");
            for turn in &self.history {
                out.push_str("Human: ");
                out.push_str(&turn.question);
                out.push_str("\nAssistant: ");
                out.push_str(&turn.answer);
                out.push('\n');
            }
            out.push('\n');
        }
        out.push_str(&self.prompt);
        out
    }
}

/// Generated text plus its usage accounting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text
    pub text: String,
    /// Tokens consumed by the call
    pub usage: Usage,
}

impl LlmResponse {
    /// Create a response
    pub fn new(text: impl Into<String>, usage: Usage) -> Self {
        Self {
            text: text.into(),
            usage,
        }
    }
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (leasewise-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate a completion
    fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, Self::Error>;

    /// Generate output constrained to a JSON schema (if supported)
    fn generate_structured(
        &self,
        request: &LlmRequest,
        _schema: &str,
    ) -> Result<LlmResponse, Self::Error> {
        self.generate(request)
    }
}

/// Trait for text embedding backends
///
/// Implemented by leasewise-store (local hashing) and leasewise-llm (Ollama)
pub trait EmbeddingModel {
    /// Error type for embedding operations
    type Error;

    /// Embed one passage into a vector of `dimension()` floats
    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error>;

    /// Dimension of every produced vector
    fn dimension(&self) -> usize;
}

/// Per-document row kept by the metadata store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Opaque document identifier
    pub doc_id: String,
    /// Owning user
    pub user_id: String,
    /// Lowercase hex SHA-256 of the file bytes
    pub content_hash: String,
    /// Extraction statistics
    pub stats: DocumentStats,
    /// Where the serialized index was written, if it was
    pub index_path: Option<String>,
}

/// One persisted question/answer exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRecord {
    /// UUIDv7 row identifier
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Document the question was asked against
    pub doc_id: String,
    /// The question
    pub question: String,
    /// The answer
    pub answer: String,
    /// Tokens consumed
    pub usage: Usage,
    /// Seconds since the Unix epoch
    pub asked_at: u64,
}

impl QaRecord {
    /// Create a record stamped with a fresh id and the current time
    pub fn new(
        user_id: impl Into<String>,
        doc_id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        usage: Usage,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            doc_id: doc_id.into(),
            question: question.into(),
            answer: answer.into(),
            usage,
            asked_at: crate::unix_now(),
        }
    }
}

/// Trait for the relational metadata collaborator
///
/// Implemented by the infrastructure layer (leasewise-store)
pub trait MetadataStore {
    /// Error type for store operations
    type Error;

    /// Insert or replace a document row
    fn save_document(&self, record: &DocumentRecord) -> Result<(), Self::Error>;

    /// Look a document up by id
    fn document(&self, doc_id: &str) -> Result<Option<DocumentRecord>, Self::Error>;

    /// Most recently saved documents for a user
    fn recent_documents(&self, user_id: &str, limit: usize)
        -> Result<Vec<DocumentRecord>, Self::Error>;

    /// Store a summary, replacing any earlier one of the same kind
    fn save_summary(
        &self,
        doc_id: &str,
        kind: SummaryKind,
        text: &str,
        usage: Usage,
    ) -> Result<(), Self::Error>;

    /// Latest stored summary of the given kind
    fn cached_summary(&self, doc_id: &str, kind: SummaryKind)
        -> Result<Option<String>, Self::Error>;

    /// Store an extraction record, replacing any earlier one
    fn save_extraction(&self, doc_id: &str, record: &ExtractionRecord) -> Result<(), Self::Error>;

    /// Latest stored extraction record
    fn cached_extraction(&self, doc_id: &str) -> Result<Option<ExtractionRecord>, Self::Error>;

    /// Append a question/answer exchange
    fn save_qa(&self, record: &QaRecord) -> Result<(), Self::Error>;

    /// Most recent exchanges for a user and document, newest first
    fn qa_history(
        &self,
        user_id: &str,
        doc_id: &str,
        limit: usize,
    ) -> Result<Vec<QaRecord>, Self::Error>;
}

/// Keys of every schema field, in order
pub fn schema_keys() -> Vec<&'static str> {
    ContractField::ALL.iter().map(|f| f.key()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_layout() {
        let request = LlmRequest::new("Question: What is the rent?")
            .with_system("You answer questions about a lease.")
            .with_context(vec!["Monthly rent: $2,500".to_string()])
            .with_history(vec![Turn::new("Who is the landlord?", "Acme Rentals")]);

        let rendered = request.render();
        let system_at = rendered.find("You answer").unwrap();
        let context_at = rendered.find("Monthly rent").unwrap();
        let history_at = rendered.find("Human: Who is the landlord?").unwrap();
        let prompt_at = rendered.find("Question: What is the rent?").unwrap();
        assert!(system_at < context_at);
        assert!(context_at < history_at);
        assert!(history_at < prompt_at);
    }

    #[test]
    fn test_render_prompt_only() {
        assert_eq!(LlmRequest::new("hello").render(), "hello");
    }

    #[test]
    fn test_qa_record_ids_are_unique() {
        let a = QaRecord::new("u", "d", "q", "a", Usage::default());
        let b = QaRecord::new("u", "d", "q", "a", Usage::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_schema_keys() {
        let keys = schema_keys();
        assert_eq!(keys.len(), 10);
        assert_eq!(keys[0], "rent_amount");
    }
}
