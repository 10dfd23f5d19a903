//! Similarity and maximum-marginal-relevance retrieval over a [`DocumentStore`]

use crate::document_store::DocumentStore;
use crate::embedding::cosine_similarity;
use crate::error::StoreError;
use leasewise_domain::traits::EmbeddingModel;
use leasewise_domain::Chunk;
use std::fmt::Display;
use tracing::debug;

/// How candidates are chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchMode {
    /// Plain top-k by cosine similarity
    Similarity,
    /// Greedy MMR over a larger candidate pool
    Mmr {
        /// Size of the candidate pool (raised to k when smaller)
        fetch_k: usize,
        /// 1.0 is pure relevance, 0.0 pure diversity
        lambda: f32,
    },
}

impl Default for SearchMode {
    fn default() -> Self {
        Self::Mmr {
            fetch_k: 10,
            lambda: 0.5,
        }
    }
}

/// A retrieved chunk and its similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieved {
    /// The chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query
    pub similarity: f32,
}

/// Query-side view of a [`DocumentStore`]
pub struct Retriever<'a, E> {
    store: &'a DocumentStore<E>,
}

impl<'a, E> Retriever<'a, E>
where
    E: EmbeddingModel,
    E::Error: Display,
{
    /// Retrieve from `store`
    pub fn new(store: &'a DocumentStore<E>) -> Self {
        Self { store }
    }

    /// Up to `k` chunks for `query`
    ///
    /// Returns an empty list when no index exists or the query is blank.
    pub fn retrieve(
        &self,
        query: &str,
        k: usize,
        mode: SearchMode,
    ) -> Result<Vec<Retrieved>, StoreError> {
        let Some(index) = self.store.index() else {
            return Ok(Vec::new());
        };
        if k == 0 || query.trim().is_empty() || index.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.store.embed_query(query)?;
        let chunks = self.store.chunks();

        let selected: Vec<(usize, f32)> = match mode {
            SearchMode::Similarity => index.search(&query_vector, k)?,
            SearchMode::Mmr { fetch_k, lambda } => {
                let pool = index.search(&query_vector, fetch_k.max(k))?;
                let candidates: Vec<(usize, f32, &[f32])> = pool
                    .into_iter()
                    .filter_map(|(id, sim)| index.vector(id).map(|v| (id, sim, v)))
                    .collect();
                mmr_select(&candidates, k, lambda)
            }
        };

        debug!("Retrieved {} chunks ({:?})", selected.len(), mode);

        Ok(selected
            .into_iter()
            .filter_map(|(id, similarity)| {
                chunks.get(id).map(|chunk| Retrieved {
                    chunk: chunk.clone(),
                    similarity,
                })
            })
            .collect())
    }
}

/// Greedy maximum-marginal-relevance selection
///
/// `candidates` are `(id, similarity to query, vector)` in relevance order.
/// Each round picks the candidate maximizing
/// `lambda * relevance - (1 - lambda) * max similarity to anything picked`;
/// ties go to the earlier candidate.
pub fn mmr_select(candidates: &[(usize, f32, &[f32])], k: usize, lambda: f32) -> Vec<(usize, f32)> {
    let lambda = lambda.clamp(0.0, 1.0);
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut picked: Vec<usize> = Vec::with_capacity(k.min(candidates.len()));

    while picked.len() < k && !remaining.is_empty() {
        let mut best: Option<(usize, f32)> = None;
        for (slot, &candidate) in remaining.iter().enumerate() {
            let (_, relevance, vector) = candidates[candidate];
            let redundancy = picked
                .iter()
                .map(|&p| cosine_similarity(vector, candidates[p].2))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if picked.is_empty() { 0.0 } else { redundancy };
            let score = lambda * relevance - (1.0 - lambda) * redundancy;

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((slot, score));
            }
        }

        match best {
            Some((slot, _)) => picked.push(remaining.remove(slot)),
            None => break,
        }
    }

    picked
        .into_iter()
        .map(|i| (candidates[i].0, candidates[i].1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use leasewise_domain::{DocumentStats, RawDocument};

    fn store_with(texts: &[&str]) -> DocumentStore<HashingEmbedder> {
        let document = RawDocument {
            id: "/lease.txt".to_string(),
            byte_size: 1,
            modified_ns: 1,
            page_count: 1,
            backend: "plain-text".to_string(),
            content_hash: String::new(),
        };
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new("/lease.txt", i, *t, "plain-text"))
            .collect();
        let stats = DocumentStats::from_chunks(&document, 0, &chunks);
        let mut store = DocumentStore::new(HashingEmbedder::new(256));
        store.replace(document, stats, chunks).unwrap();
        store
    }

    #[test]
    fn test_no_index_returns_empty() {
        let store = DocumentStore::new(HashingEmbedder::new(64));
        let results = Retriever::new(&store)
            .retrieve("monthly rent", 3, SearchMode::Similarity)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_similarity_ranks_matching_chunk_first() {
        let store = store_with(&[
            "Pets are not permitted on the premises.",
            "Monthly rent: $2,500, due on the 1st.",
            "The tenant maintains the garden.",
        ]);
        let results = Retriever::new(&store)
            .retrieve("What is the monthly rent?", 2, SearchMode::Similarity)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].chunk.text.contains("2,500"));
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[test]
    fn test_mmr_prefers_diverse_results() {
        let store = store_with(&[
            "monthly rent payment schedule",
            "monthly rent payment schedule",
            "rent deposit refund conditions",
        ]);
        let results = Retriever::new(&store)
            .retrieve(
                "monthly rent payment",
                2,
                SearchMode::Mmr {
                    fetch_k: 3,
                    lambda: 0.3,
                },
            )
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_ne!(results[0].chunk.text, results[1].chunk.text);
    }

    #[test]
    fn test_blank_query_returns_empty() {
        let store = store_with(&["anything"]);
        let results = Retriever::new(&store)
            .retrieve("  ", 3, SearchMode::default())
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_mmr_select_lambda_one_is_relevance_order() {
        let a = [1.0, 0.0];
        let b = [0.9, 0.1];
        let c = [0.0, 1.0];
        let candidates: Vec<(usize, f32, &[f32])> =
            vec![(7, 0.9, &a[..]), (8, 0.8, &b[..]), (9, 0.1, &c[..])];

        let picked = mmr_select(&candidates, 3, 1.0);
        assert_eq!(picked.iter().map(|p| p.0).collect::<Vec<_>>(), vec![7, 8, 9]);
    }

    #[test]
    fn test_mmr_select_penalizes_duplicates() {
        let a = [1.0, 0.0];
        let c = [0.0, 1.0];
        let candidates: Vec<(usize, f32, &[f32])> =
            vec![(0, 0.9, &a[..]), (1, 0.9, &a[..]), (2, 0.5, &c[..])];

        let picked = mmr_select(&candidates, 2, 0.5);
        assert_eq!(picked.iter().map(|p| p.0).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_mmr_select_ties_go_to_earliest() {
        let a = [1.0, 0.0];
        let candidates: Vec<(usize, f32, &[f32])> = vec![(4, 0.5, &a[..]), (5, 0.5, &a[..])];
        assert_eq!(mmr_select(&candidates, 1, 0.5)[0].0, 4);
    }
}
