//! Timed, priced language-model calls

use crate::error::RagError;
use leasewise_domain::traits::{LlmProvider, LlmRequest, LlmResponse};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Shared handle for calling the language model off the async runtime
pub struct Generator<L> {
    llm: Arc<L>,
    timeout: Duration,
    cost_per_1k_tokens: f64,
}

impl<L> Clone for Generator<L> {
    fn clone(&self) -> Self {
        Self {
            llm: Arc::clone(&self.llm),
            timeout: self.timeout,
            cost_per_1k_tokens: self.cost_per_1k_tokens,
        }
    }
}

impl<L> Generator<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    /// Wrap a provider
    pub fn new(llm: Arc<L>, timeout: Duration, cost_per_1k_tokens: f64) -> Self {
        Self {
            llm,
            timeout,
            cost_per_1k_tokens,
        }
    }

    /// The wrapped provider
    pub fn provider(&self) -> &Arc<L> {
        &self.llm
    }

    /// Generate a completion
    pub async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, RagError> {
        self.call(request, None).await
    }

    /// Generate a completion constrained to `schema`
    pub async fn generate_structured(
        &self,
        request: LlmRequest,
        schema: &str,
    ) -> Result<LlmResponse, RagError> {
        self.call(request, Some(schema.to_string())).await
    }

    async fn call(
        &self,
        request: LlmRequest,
        schema: Option<String>,
    ) -> Result<LlmResponse, RagError> {
        debug!("Prompt length: {} chars", request.render().len());

        let mut response =
            call_llm(Arc::clone(&self.llm), request, schema, self.timeout).await?;
        response.usage = response.usage.priced(self.cost_per_1k_tokens);

        debug!("LLM response length: {} chars", response.text.len());
        Ok(response)
    }
}

/// Run one blocking provider call on the blocking pool under a timeout
async fn call_llm<L>(
    llm: Arc<L>,
    request: LlmRequest,
    schema: Option<String>,
    limit: Duration,
) -> Result<LlmResponse, RagError>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    // LlmProvider is not async
    let task = tokio::task::spawn_blocking(move || {
        let result = match schema {
            Some(schema) => llm.generate_structured(&request, &schema),
            None => llm.generate(&request),
        };
        result.map_err(|e| RagError::Llm(e.to_string()))
    });

    timeout(limit, task)
        .await
        .map_err(|_| RagError::Timeout(limit.as_secs()))?
        .map_err(|e| RagError::Llm(format!("Task join error: {}", e)))?
}
