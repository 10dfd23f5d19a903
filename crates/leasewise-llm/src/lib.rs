//! Leasewise LLM Provider Layer
//!
//! Pluggable language-model and embedding backends.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` and
//! `EmbeddingModel` traits from `leasewise-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic pattern-matched responses for testing
//! - `OllamaProvider`: Local Ollama chat API integration
//! - `OllamaEmbedder`: Local Ollama embedding API integration
//!
//! # Examples
//!
//! ```
//! use leasewise_llm::MockProvider;
//! use leasewise_domain::traits::{LlmProvider, LlmRequest};
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate(&LlmRequest::new("test prompt")).unwrap();
//! assert_eq!(result.text, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod ollama;

use leasewise_domain::traits::{LlmProvider as LlmProviderTrait, LlmRequest, LlmResponse};
use leasewise_domain::Usage;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub use ollama::{OllamaEmbedder, OllamaProvider};

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

const ERROR_SENTINEL: &str = "ERROR";

/// Mock LLM provider for deterministic testing
///
/// Responses are chosen by substring rules checked in insertion order
/// against the rendered request; the first rule whose pattern occurs wins.
/// Every request is recorded so tests can inspect what the pipeline sent.
///
/// # Examples
///
/// ```
/// use leasewise_llm::MockProvider;
/// use leasewise_domain::traits::{LlmProvider, LlmRequest};
///
/// let mut provider = MockProvider::default();
/// provider.add_response("monthly rent", "The rent is $2,500.");
/// let answer = provider.generate(&LlmRequest::new("Question: What is the monthly rent?")).unwrap();
/// assert_eq!(answer.text, "The rent is $2,500.");
/// assert_eq!(provider.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    rules: Arc<Mutex<Vec<(String, String)>>>,
    requests: Arc<Mutex<Vec<LlmRequest>>>,
    latency: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            latency: None,
        }
    }

    /// Respond with `response` whenever the rendered request contains `pattern`
    pub fn add_response(&mut self, pattern: impl Into<String>, response: impl Into<String>) {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((pattern.into(), response.into()));
    }

    /// Configure to return an error whenever the request contains `pattern`
    pub fn add_error(&mut self, pattern: impl Into<String>) {
        self.add_response(pattern, ERROR_SENTINEL);
    }

    /// Sleep this long before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<LlmRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Forget recorded requests
    pub fn reset_call_count(&self) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn respond(&self, rendered: &str) -> Option<String> {
        let rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        rules
            .iter()
            .find(|(pattern, _)| rendered.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

fn word_count(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, Self::Error> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        let rendered = request.render();
        let text = self
            .respond(&rendered)
            .unwrap_or_else(|| self.default_response.clone());
        if text == ERROR_SENTINEL {
            return Err(LlmError::Other("Mock error".to_string()));
        }

        let usage = Usage::new(word_count(&rendered), word_count(&text));
        Ok(LlmResponse::new(text, usage))
    }
}
