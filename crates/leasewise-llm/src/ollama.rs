//! Ollama Provider Implementation
//!
//! Integration with Ollama's local chat and embedding APIs, so contracts
//! never leave the machine.
//!
//! # Features
//!
//! - Chat endpoint with system, history and context messages
//! - Token usage from `prompt_eval_count` / `eval_count`
//! - Retry logic with exponential backoff
//! - Timeout handling
//!
//! Requests use reqwest's blocking client on a scoped thread, so the
//! providers are safe to call from plain threads, `spawn_blocking` tasks
//! and code running under an async runtime alike.
//!
//! # Examples
//!
//! ```no_run
//! use leasewise_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1").unwrap();
//! ```

use crate::LlmError;
use leasewise_domain::traits::{
    EmbeddingModel, LlmProvider as LlmProviderTrait, LlmRequest, LlmResponse,
};
use leasewise_domain::Usage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for LLM requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default sampling temperature; contract answers should be repeatable
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Clone)]
struct OllamaClient {
    endpoint: String,
    client: reqwest::blocking::Client,
    max_retries: u32,
}

impl OllamaClient {
    fn new(endpoint: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build client: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    fn post<B, R>(&self, path: &str, body: &B, model: &str) -> Result<R, LlmError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.post_with_retry(path, body, model))
                .join()
                .unwrap_or_else(|_| Err(LlmError::Other("Request thread panicked".to_string())))
        })
    }

    fn post_with_retry<B, R>(&self, path: &str, body: &B, model: &str) -> Result<R, LlmError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.endpoint, path);

        // Retry logic with exponential backoff
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(body).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<R>().map_err(|e| {
                            LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                        });
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(model.to_string()));
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(LlmError::RateLimitExceeded);
                    } else {
                        let error_text = response
                            .text()
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error = Some(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!("Ollama request to {} failed, retrying in {:?}", url, delay);
                std::thread::sleep(delay);
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    inner: OllamaClient,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

/// Request body for the Ollama chat API
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    options: ChatOptions,
}

/// Response from the Ollama chat API
#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3.1", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            inner: OllamaClient::new(endpoint.into(), Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Create a new Ollama provider on `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.inner.max_retries = max_retries.max(1);
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Model name
    pub fn model(&self) -> &str {
        &self.model
    }

    fn messages(request: &LlmRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.history.len() * 2 + 2);

        let mut system = request.system.clone().unwrap_or_default();
        if !request.context.is_empty() {
            if !system.is_empty() {
                system.push_str("\n\n");
            }
            system.push_str("Context:\n");
            system.push_str(&request.context.join("\n\n"));
        }
        if !system.is_empty() {
            messages.push(ChatMessage::new("system", system));
        }

        for turn in &request.history {
            messages.push(ChatMessage::new("user", turn.question.as_str()));
            messages.push(ChatMessage::new("assistant", turn.answer.as_str()));
        }
        messages.push(ChatMessage::new("user", request.prompt.as_str()));
        messages
    }

    fn chat(&self, request: &LlmRequest, format: Option<String>) -> Result<LlmResponse, LlmError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: Self::messages(request),
            stream: false,
            format,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };
        debug!("Ollama chat with {} messages", body.messages.len());

        let response: ChatResponse = self.inner.post("/api/chat", &body, &self.model)?;
        let usage = Usage::new(
            response.prompt_eval_count.unwrap_or(0),
            response.eval_count.unwrap_or(0),
        );
        Ok(LlmResponse::new(response.message.content, usage))
    }
}

impl LlmProviderTrait for OllamaProvider {
    type Error = LlmError;

    fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, Self::Error> {
        self.chat(request, None)
    }

    fn generate_structured(
        &self,
        request: &LlmRequest,
        _schema: &str,
    ) -> Result<LlmResponse, Self::Error> {
        // Ollama's JSON mode constrains output to valid JSON; the schema
        // itself travels in the prompt.
        self.chat(request, Some("json".to_string()))
    }
}

/// Ollama embedding backend
pub struct OllamaEmbedder {
    inner: OllamaClient,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// Create an embedder for `model`, which must produce `dimension` floats
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            inner: OllamaClient::new(endpoint.into(), Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
            model: model.into(),
            dimension,
        })
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.inner.max_retries = max_retries.max(1);
        self
    }
}

impl EmbeddingModel for OllamaEmbedder {
    type Error = LlmError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        let body = EmbedRequest {
            model: &self.model,
            input: text,
        };
        let response: EmbedResponse = self.inner.post("/api/embed", &body, &self.model)?;
        let embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No embedding returned".to_string()))?;

        if embedding.len() != self.dimension {
            return Err(LlmError::InvalidResponse(format!(
                "Expected {} dimensions, got {}",
                self.dimension,
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
