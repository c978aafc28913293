//! Stage 2.5 neural reranking boundary (§5, out of scope: the reranker's
//! own internals — cross-encoder inference, batching, model serving).
//!
//! The pipeline blends this signal with the Stage 2 composite score
//! (§4.8) rather than replacing it outright, and falls back to the pure
//! composite ordering whenever the reranker is disabled or fails (§7).

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::RankingResult;
use crate::models::ItemId;

#[async_trait]
pub trait Reranker: Send + Sync {
    /// Score each `(item_id, text)` pair against `query`. Missing entries
    /// in the returned map are treated by the caller as "not reranked".
    async fn rerank(
        &self,
        query: &str,
        candidates: &[(ItemId, String)],
    ) -> RankingResult<HashMap<ItemId, f64>>;
}

/// Deterministic reranker for tests: scores by a caller-supplied function
/// of `(query, text)`, so test suites can simulate anything from "agrees
/// with retrieval" to "reorders everything".
pub struct StubReranker<F>
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    score_fn: F,
}

impl<F> StubReranker<F>
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    pub fn new(score_fn: F) -> Self {
        Self { score_fn }
    }
}

#[async_trait]
impl<F> Reranker for StubReranker<F>
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    async fn rerank(
        &self,
        query: &str,
        candidates: &[(ItemId, String)],
    ) -> RankingResult<HashMap<ItemId, f64>> {
        Ok(candidates
            .iter()
            .map(|(item_id, text)| (*item_id, (self.score_fn)(query, text)))
            .collect())
    }
}

/// Always-fails reranker, used to exercise the pipeline's degradation
/// path (§7, §8 scenario 5).
pub struct FailingReranker;

#[async_trait]
impl Reranker for FailingReranker {
    async fn rerank(
        &self,
        _query: &str,
        _candidates: &[(ItemId, String)],
    ) -> RankingResult<HashMap<ItemId, f64>> {
        Err(crate::error::RankingError::RerankFailed(
            "reranker unavailable".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn stub_reranker_scores_every_candidate() {
        let reranker = StubReranker::new(|_query, text| text.len() as f64);
        let candidates = vec![
            (ItemId::new(Uuid::new_v4()), "short".to_string()),
            (ItemId::new(Uuid::new_v4()), "a much longer text".to_string()),
        ];
        let scores = reranker.rerank("q", &candidates).await.unwrap();
        assert_eq!(scores.len(), 2);
    }

    #[tokio::test]
    async fn failing_reranker_always_errs() {
        let reranker = FailingReranker;
        let err = reranker.rerank("q", &[]).await.unwrap_err();
        assert!(matches!(err, crate::error::RankingError::RerankFailed(_)));
    }
}
