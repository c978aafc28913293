//! Stage 1 retrieval boundary (§2, out of scope: the retriever's own
//! internals — ANN index, embedding lookup, filter pushdown).
//!
//! This crate only depends on the narrow contract: given a query
//! embedding, a candidate budget and optional filters, return up to `k`
//! candidates with a cosine distance in `[0, 2]`.

use async_trait::async_trait;

use crate::error::RankingResult;
use crate::models::{Candidate, Embedding, SearchFilters};

#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(
        &self,
        query_embedding: &Embedding,
        k: usize,
        filters: &SearchFilters,
    ) -> RankingResult<Vec<Candidate>>;
}

/// Deterministic in-memory retriever used by tests and local demos: holds
/// a fixed catalog, applies filters exactly, and ranks by true cosine
/// distance against the query embedding.
pub struct InMemoryRetriever {
    catalog: Vec<Candidate>,
}

impl InMemoryRetriever {
    pub fn new(catalog: Vec<Candidate>) -> Self {
        Self { catalog }
    }

    fn matches(candidate: &Candidate, filters: &SearchFilters) -> bool {
        if let Some(genre) = &filters.genre {
            if &candidate.attrs.genre != genre {
                return false;
            }
        }
        if let Some(mood) = &filters.mood {
            if candidate.attrs.mood.as_deref() != Some(mood.as_str()) {
                return false;
            }
        }
        if let Some(format) = &filters.format {
            if candidate.attrs.format.as_deref() != Some(format.as_str()) {
                return false;
            }
        }
        if let Some(bpm_min) = filters.bpm_min {
            if candidate.attrs.bpm.map_or(true, |bpm| bpm < bpm_min) {
                return false;
            }
        }
        if let Some(bpm_max) = filters.bpm_max {
            if candidate.attrs.bpm.map_or(true, |bpm| bpm > bpm_max) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn retrieve(
        &self,
        query_embedding: &Embedding,
        k: usize,
        filters: &SearchFilters,
    ) -> RankingResult<Vec<Candidate>> {
        let mut matches: Vec<Candidate> = self
            .catalog
            .iter()
            .filter(|candidate| Self::matches(candidate, filters))
            .map(|candidate| {
                let similarity = query_embedding.cosine_similarity(&candidate.embedding);
                let distance = (1.0 - similarity).clamp(0.0, 2.0);
                Candidate {
                    item_id: candidate.item_id,
                    retrieval_distance: distance,
                    attrs: candidate.attrs.clone(),
                    embedding: candidate.embedding.clone(),
                }
            })
            .collect();

        matches.sort_by(|a, b| a.retrieval_distance.total_cmp(&b.retrieval_distance));
        matches.truncate(k);
        Ok(matches)
    }
}
