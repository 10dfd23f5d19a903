//! Answers, cited sources and usage accounting

use crate::Chunk;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Fixed answer returned when a question arrives before any contract is loaded
pub const NO_CONTRACT_ANSWER: &str = "No contract loaded. Please upload a PDF contract first.";

/// Token and cost accounting for one or more language-model calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens sent to the model
    pub prompt_tokens: u64,
    /// Tokens generated by the model
    pub completion_tokens: u64,
    /// Estimated cost in the configured currency
    pub cost: f64,
}

impl Usage {
    /// Usage for a single call
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            cost: 0.0,
        }
    }

    /// Prompt plus completion tokens
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    /// Attach a cost computed from a per-1K-token price
    pub fn priced(mut self, cost_per_1k_tokens: f64) -> Self {
        self.cost = self.total_tokens() as f64 / 1000.0 * cost_per_1k_tokens;
        self
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.cost += other.cost;
    }
}

/// A chunk selected as a citation, with the evidence for selecting it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSource {
    /// The cited chunk
    pub chunk: Chunk,
    /// Weighted overlap score against the answer, 0 for fallback citations
    pub score: u32,
    /// Salient answer tokens found in the chunk
    pub matched: Vec<String>,
}

impl ScoredSource {
    /// Truncated preview of the chunk text
    pub fn preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.chunk.text.chars().take(max_chars).collect();
        if self.chunk.char_len > max_chars {
            preview.push_str("...");
        }
        preview
    }
}

/// Whether an answer was generated or short-circuited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// The model produced an answer from retrieved context
    Answered,
    /// Nothing is loaded, the answer is a fixed notice
    NoContractLoaded,
}

/// Generated answer text plus its filtered citations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerWithSources {
    /// Answer text
    pub answer: String,
    /// Cited chunks, best first
    pub sources: Vec<ScoredSource>,
    /// Accounting for the calls that produced the answer
    pub usage: Usage,
    /// Whether the answer came from the model
    pub status: AnswerStatus,
}

impl AnswerWithSources {
    /// The structured result for a question asked with nothing loaded
    pub fn no_contract() -> Self {
        Self {
            answer: NO_CONTRACT_ANSWER.to_string(),
            sources: Vec::new(),
            usage: Usage::default(),
            status: AnswerStatus::NoContractLoaded,
        }
    }

    /// Whether this is the "no contract loaded" result
    pub fn is_no_contract(&self) -> bool {
        self.status == AnswerStatus::NoContractLoaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_accumulates() {
        let mut total = Usage::default();
        total += Usage::new(100, 20);
        total += Usage::new(50, 5).priced(2.0);
        assert_eq!(total.prompt_tokens, 150);
        assert_eq!(total.completion_tokens, 25);
        assert_eq!(total.total_tokens(), 175);
        assert!((total.cost - 0.11).abs() < 1e-9);
    }

    #[test]
    fn test_no_contract_answer() {
        let answer = AnswerWithSources::no_contract();
        assert!(answer.is_no_contract());
        assert!(answer.sources.is_empty());
        assert_eq!(answer.answer, NO_CONTRACT_ANSWER);
    }

    #[test]
    fn test_preview_truncates() {
        let source = ScoredSource {
            chunk: Chunk::new("doc", 0, "x".repeat(300), "plain-text"),
            score: 0,
            matched: Vec::new(),
        };
        assert_eq!(source.preview(200).chars().count(), 203);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&AnswerStatus::NoContractLoaded).unwrap();
        assert_eq!(json, "\"no_contract_loaded\"");
    }
}
