//! Candidates flowing through the pipeline and their attached per-signal scores.

use serde::{Deserialize, Serialize};

use super::item::{Embedding, ItemAttrs, ItemId};

/// A retrieved item paired with its retrieval distance and attributes,
/// as produced by Stage 1 (the Retriever).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub item_id: ItemId,
    /// Nonnegative cosine distance in `[0, 2]`.
    pub retrieval_distance: f64,
    pub attrs: ItemAttrs,
    pub embedding: Embedding,
}

impl Candidate {
    /// `semantic_similarity = 1 - distance / 2`, mapped into `[0, 1]`.
    ///
    /// This fixes the Retriever contract's convention (§3): distance is a
    /// true cosine distance in `[0, 2]`, not an already-complemented
    /// similarity.
    pub fn semantic_similarity(&self) -> f64 {
        (1.0 - self.retrieval_distance / 2.0).clamp(0.0, 1.0)
    }
}

/// Per-signal scores attached to a candidate after Stage 2 (Scorer).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalScores {
    pub semantic: f64,
    pub popularity: f64,
    pub exploration: f64,
    pub freshness: f64,
    pub composite: f64,
}

/// A candidate with its composite score and, once Stage 2.5 has run, its
/// blended score.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub item_id: ItemId,
    pub attrs: ItemAttrs,
    pub embedding: Embedding,
    pub scores: SignalScores,
    /// `blended = composite` until the reranker runs.
    pub blended: f64,
}

impl ScoredCandidate {
    /// Relevance input to MMR — always the current blended score (§4.8).
    pub fn relevance(&self) -> f64 {
        self.blended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn candidate(distance: f64) -> Candidate {
        Candidate {
            item_id: ItemId::new(Uuid::new_v4()),
            retrieval_distance: distance,
            attrs: ItemAttrs::new(None, None, None, None, None),
            embedding: Embedding::new(vec![1.0, 0.0]),
        }
    }

    #[test]
    fn semantic_similarity_maps_distance_range() {
        assert_eq!(candidate(0.0).semantic_similarity(), 1.0);
        assert_eq!(candidate(2.0).semantic_similarity(), 0.0);
        assert!((candidate(1.0).semantic_similarity() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn semantic_similarity_clamps_out_of_range_distance() {
        // Retriever contract bounds distance to [0, 2]; defend anyway.
        assert_eq!(candidate(-1.0).semantic_similarity(), 1.0);
        assert_eq!(candidate(3.0).semantic_similarity(), 0.0);
    }
}
