//! Embedding Model for Text Vectorization
//!
//! Text-to-vector conversion for the vector index. The default backend is
//! local and dependency-free so contracts never leave the machine.
//!
//! # Architecture
//!
//! - **HashingEmbedder**: feature-hashed bag of words, deterministic
//! - **OllamaEmbedder** (leasewise-llm): neural embeddings from a local model
//!
//! # Examples
//!
//! ```rust
//! use leasewise_store::embedding::HashingEmbedder;
//! use leasewise_domain::traits::EmbeddingModel;
//!
//! let model = HashingEmbedder::new(384);
//! let embedding = model.embed("Monthly rent is due on the first").unwrap();
//! assert_eq!(embedding.len(), 384);
//!
//! // Same text always produces same embedding
//! assert_eq!(embedding, model.embed("Monthly rent is due on the first").unwrap());
//! ```

use leasewise_domain::traits::EmbeddingModel;
use thiserror::Error;

/// Default embedding dimension
pub const DEFAULT_DIMENSION: usize = 384;

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model inference error
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
}

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "do", "does", "for", "from", "how", "in",
    "is", "it", "of", "on", "or", "the", "this", "to", "was", "what", "when", "which", "who",
    "will", "with",
];

/// Feature-hashing embedding model
///
/// Each lowercase alphanumeric token (minus a few stop words) is hashed
/// with FNV-1a into one signed bucket; the bucket counts are then
/// normalized to unit length. The hash is stable across platforms and
/// compiler versions, so persisted vectors stay comparable with fresh
/// query embeddings.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a new hashing embedder
    ///
    /// # Parameters
    ///
    /// - `dimension`: The embedding dimension, at least 1
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn tokens(text: &str) -> Vec<String> {
        let all: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();
        let content: Vec<String> = all
            .iter()
            .filter(|t| !STOPWORDS.contains(&t.as_str()))
            .cloned()
            .collect();
        if content.is_empty() {
            all
        } else {
            content
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

impl EmbeddingModel for HashingEmbedder {
    type Error = EmbeddingError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let mut tokens = Self::tokens(trimmed);
        if tokens.is_empty() {
            // Punctuation-only passages still need a vector
            tokens.push(trimmed.to_string());
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for token in &tokens {
            let hash = fnv1a(token);
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        // Normalize to unit length for cosine similarity
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        } else {
            // Colliding tokens cancelled out
            let bucket = (fnv1a(trimmed) % self.dimension as u64) as usize;
            embedding[bucket] = 1.0;
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns a value in [-1, 1]; 0.0 when either vector has zero length or
/// the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_deterministic() {
        let model = HashingEmbedder::new(384);

        let text = "The tenant shall pay rent on the first day of each month";
        assert_eq!(model.embed(text).unwrap(), model.embed(text).unwrap());
    }

    #[test]
    fn test_embedding_dimension() {
        let model = HashingEmbedder::new(128);

        let embedding = model.embed("test").unwrap();
        assert_eq!(embedding.len(), 128);
        assert_eq!(model.dimension(), 128);
    }

    #[test]
    fn test_embedding_normalized() {
        let model = HashingEmbedder::default();

        let embedding = model.embed("security deposit of two months").unwrap();
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.0001, "Embedding should be normalized");
    }

    #[test]
    fn test_empty_text_rejected() {
        let model = HashingEmbedder::default();

        let result = model.embed("   ");
        assert!(result.unwrap_err().to_string().contains("Empty text"));
    }

    #[test]
    fn test_punctuation_only_text() {
        let model = HashingEmbedder::default();
        let embedding = model.embed("...").unwrap();
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_shared_words_score_higher() {
        let model = HashingEmbedder::default();

        let query = model.embed("What is the monthly rent?").unwrap();
        let rent = model.embed("Monthly rent: $2,500, due on the 1st.").unwrap();
        let pets = model.embed("Pets are not permitted without consent.").unwrap();

        assert!(cosine_similarity(&query, &rent) > cosine_similarity(&query, &pets));
    }

    #[test]
    fn test_case_insensitive() {
        let model = HashingEmbedder::default();
        assert_eq!(model.embed("RENT").unwrap(), model.embed("rent").unwrap());
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let vec = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&vec, &vec) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let similarity = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(similarity.abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_length_mismatch() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
