//! Configuration for the RAG pipeline

use leasewise_store::SearchMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retrieval strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Plain top-k similarity
    Similarity,
    /// Maximum marginal relevance over `fetch_k` candidates
    #[default]
    Mmr,
}

/// Configuration for a [`ContractRag`](crate::ContractRag) session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Target chunk length in characters
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,

    /// Chunks retrieved per question
    pub retrieval_k: usize,

    /// Candidate pool for MMR
    pub fetch_k: usize,

    /// Retrieval strategy
    pub search_mode: SearchStrategy,

    /// MMR relevance/diversity balance (1.0 = relevance only)
    pub mmr_lambda: f32,

    /// Conversation turns kept in memory
    pub memory_window: usize,

    /// Trim retrieved chunks to the relevant sentences before answering
    pub use_compression: bool,

    /// Chunks fed to the summarizer before it reports a partial summary
    pub summary_chunk_limit: usize,

    /// Maximum time for a single language-model call (seconds)
    pub llm_timeout_secs: u64,

    /// Fan backfill questions out concurrently
    pub backfill_parallel: bool,

    /// Concurrent backfill calls when `backfill_parallel` is set
    pub backfill_workers: usize,

    /// Read and write the chunk cache on load
    pub use_cache: bool,

    /// Price per 1K tokens used for cost estimates
    pub cost_per_1k_tokens: f64,
}

impl RagConfig {
    /// Get the language-model timeout as a Duration
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// The retriever mode these settings describe
    pub fn search_mode(&self) -> SearchMode {
        match self.search_mode {
            SearchStrategy::Similarity => SearchMode::Similarity,
            SearchStrategy::Mmr => SearchMode::Mmr {
                fetch_k: self.fetch_k,
                lambda: self.mmr_lambda,
            },
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err("chunk_overlap must be smaller than chunk_size".to_string());
        }
        if self.retrieval_k == 0 {
            return Err("retrieval_k must be greater than 0".to_string());
        }
        if self.fetch_k < self.retrieval_k {
            return Err("fetch_k cannot be smaller than retrieval_k".to_string());
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err("mmr_lambda must be between 0.0 and 1.0".to_string());
        }
        if self.summary_chunk_limit == 0 {
            return Err("summary_chunk_limit must be greater than 0".to_string());
        }
        if self.llm_timeout_secs == 0 {
            return Err("llm_timeout_secs must be greater than 0".to_string());
        }
        if self.backfill_workers == 0 {
            return Err("backfill_workers must be greater than 0".to_string());
        }
        if self.cost_per_1k_tokens < 0.0 {
            return Err("cost_per_1k_tokens cannot be negative".to_string());
        }
        Ok(())
    }

    /// Fast preset: smaller chunks, fewer sources, parallel backfill
    pub fn fast() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            retrieval_k: 3,
            fetch_k: 6,
            search_mode: SearchStrategy::Similarity,
            llm_timeout_secs: 60,
            backfill_parallel: true,
            backfill_workers: 8,
            ..Self::default()
        }
    }

    /// Thorough preset: wider retrieval, compression, longer summaries
    pub fn thorough() -> Self {
        Self {
            retrieval_k: 8,
            fetch_k: 20,
            use_compression: true,
            summary_chunk_limit: 20,
            llm_timeout_secs: 300,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
            retrieval_k: 5,
            fetch_k: 10,
            search_mode: SearchStrategy::Mmr,
            mmr_lambda: 0.5,
            memory_window: 5,
            use_compression: false,
            summary_chunk_limit: 10,
            llm_timeout_secs: 120,
            backfill_parallel: false,
            backfill_workers: 4,
            use_cache: true,
            cost_per_1k_tokens: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RagConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(RagConfig::fast().validate().is_ok());
        assert!(RagConfig::thorough().validate().is_ok());
    }

    #[test]
    fn test_invalid_overlap() {
        let config = RagConfig {
            chunk_overlap: 2000,
            ..RagConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("chunk_overlap"));
    }

    #[test]
    fn test_invalid_fetch_k() {
        let config = RagConfig {
            retrieval_k: 8,
            fetch_k: 4,
            ..RagConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_lambda() {
        let config = RagConfig {
            mmr_lambda: 1.5,
            ..RagConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_mode_mapping() {
        assert_eq!(
            RagConfig::default().search_mode(),
            SearchMode::Mmr {
                fetch_k: 10,
                lambda: 0.5
            }
        );
        assert_eq!(RagConfig::fast().search_mode(), SearchMode::Similarity);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = RagConfig::thorough();
        let toml_str = config.to_toml().unwrap();
        assert_eq!(RagConfig::from_toml(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = RagConfig::from_toml("retrieval_k = 3\nsearch_mode = \"similarity\"").unwrap();
        assert_eq!(config.retrieval_k, 3);
        assert_eq!(config.search_mode, SearchStrategy::Similarity);
        assert_eq!(config.chunk_size, 2000);
    }

    #[test]
    fn test_llm_timeout() {
        assert_eq!(RagConfig::default().llm_timeout(), Duration::from_secs(120));
    }
}
