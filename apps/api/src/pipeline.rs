//! Orchestrates the full search: retrieve, score, rerank, diversify
//! (§4.9). Suspension only happens at the two I/O boundaries — the
//! Retriever and the Reranker — both under a soft `tokio::time::timeout`
//! deadline; everything else here is synchronous CPU work.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::config::RankingConfig;
use crate::diversifier::Diversifier;
use crate::error::{RankingError, RankingResult};
use crate::models::{
    FeedbackEvent, FeedbackKind, ItemId, ResultItem, SearchRequest, SearchResponse, Timings,
};
use crate::reranker::Reranker;
use crate::retriever::Retriever;
use crate::scorer::Scorer;
use crate::signals::PositionBiasModel;
use crate::stats::StatisticsStore;

/// Soft deadline for the Retriever call. Exceeding it aborts the request
/// (§7: retrieval failure is the only failure with no local recovery).
const RETRIEVAL_TIMEOUT: Duration = Duration::from_millis(800);

/// Soft deadline for the Reranker call. Exceeding it degrades to the pure
/// composite ordering rather than failing the request.
const RERANK_TIMEOUT: Duration = Duration::from_millis(300);

pub struct PipelineCoordinator {
    config: RankingConfig,
    retriever: Arc<dyn Retriever>,
    reranker: Arc<dyn Reranker>,
    stats_store: Arc<dyn StatisticsStore>,
    scorer: Scorer,
    diversifier: Diversifier,
}

impl PipelineCoordinator {
    pub fn new(
        config: RankingConfig,
        retriever: Arc<dyn Retriever>,
        reranker: Arc<dyn Reranker>,
        stats_store: Arc<dyn StatisticsStore>,
        exploration_seed: u64,
    ) -> Self {
        let scorer = Scorer::new(&config, exploration_seed);
        let diversifier = Diversifier::new(&config);
        Self {
            config,
            retriever,
            reranker,
            stats_store,
            scorer,
            diversifier,
        }
    }

    /// Run the whole Stage 1 -> 2 -> 2.5 -> 3 pipeline for one request.
    pub async fn search(
        &self,
        request: &SearchRequest,
        query_embedding: &crate::models::Embedding,
    ) -> RankingResult<SearchResponse> {
        request
            .validate()
            .map_err(|msg| RankingError::InvalidInput(msg.to_string()))?;

        let total_start = Instant::now();

        let retrieval_start = Instant::now();
        let candidates = tokio::time::timeout(
            RETRIEVAL_TIMEOUT,
            self.retriever
                .retrieve(query_embedding, self.config.retrieval_k, &request.filters),
        )
        .await
        .map_err(|_| RankingError::RetrievalFailed("retrieval timed out".to_string()))??;
        let retrieval_ms = retrieval_start.elapsed().as_millis() as u64;

        let ranking_start = Instant::now();
        let (scored, stats_degraded) = self
            .scorer
            .score(candidates, self.stats_store.as_ref(), Utc::now(), self.config.rerank_k)
            .await;
        let ranking_ms = ranking_start.elapsed().as_millis() as u64;

        let rerank_start = Instant::now();
        let (blended, rerank_skipped) = self.rerank(request, scored).await;
        let rerank_ms = rerank_start.elapsed().as_millis() as u64;

        // The per-request `limit` (§6, validated to 1..=100 above) wins
        // over the configured default `result_n`, but can never exceed the
        // `rerank_k` candidates that survived to diversify over.
        let target_n = (request.limit as usize).min(self.config.rerank_k);

        let diversity_start = Instant::now();
        let diversified = self.diversifier.diversify(blended, target_n);
        let diversity_ms = diversity_start.elapsed().as_millis() as u64;

        let results: Vec<ResultItem> = diversified
            .into_iter()
            .enumerate()
            .map(|(idx, (candidate, mmr))| {
                let rank = (idx + 1) as u32;
                ResultItem {
                    item_id: candidate.item_id,
                    rank,
                    genre: candidate.attrs.genre,
                    composite: request.include_scores.then_some(candidate.scores.composite),
                    blended: request.include_scores.then_some(candidate.blended),
                    semantic: request.include_scores.then_some(candidate.scores.semantic),
                    popularity: request.include_scores.then_some(candidate.scores.popularity),
                    exploration: request.include_scores.then_some(candidate.scores.exploration),
                    freshness: request.include_scores.then_some(candidate.scores.freshness),
                    mmr: request.include_scores.then_some(mmr),
                }
            })
            .collect();

        self.record_impressions(&results);

        let total_ms = total_start.elapsed().as_millis() as u64;

        Ok(SearchResponse {
            results,
            timings: Timings {
                retrieval_ms,
                ranking_ms,
                rerank_ms,
                diversity_ms,
                total_ms,
            },
            rerank_skipped,
            stats_degraded,
        })
    }

    /// Blend Stage 2.5 reranker scores into the composite (§4.8). Any
    /// failure or disablement degrades to the unmodified composite
    /// ordering rather than failing the request.
    async fn rerank(
        &self,
        request: &SearchRequest,
        scored: Vec<crate::models::ScoredCandidate>,
    ) -> (Vec<crate::models::ScoredCandidate>, bool) {
        if !self.config.rerank_enabled {
            return (scored, true);
        }

        let candidate_texts: Vec<(ItemId, String)> = scored
            .iter()
            .map(|c| (c.item_id, rerank_text(c)))
            .collect();

        let rerank_result = tokio::time::timeout(
            RERANK_TIMEOUT,
            self.reranker.rerank(&request.query, &candidate_texts),
        )
        .await;

        let rerank_scores: HashMap<ItemId, f64> = match rerank_result {
            Ok(Ok(scores)) => scores,
            Ok(Err(err)) => {
                err.log();
                return (scored, true);
            }
            Err(_) => {
                RankingError::RerankFailed("rerank timed out".to_string()).log();
                return (scored, true);
            }
        };

        let blend = self.config.rerank_blend;
        let blended: Vec<_> = scored
            .into_iter()
            .map(|mut candidate| {
                if let Some(&rerank_score) = rerank_scores.get(&candidate.item_id) {
                    candidate.blended =
                        blend * rerank_score + (1.0 - blend) * candidate.scores.composite;
                }
                candidate
            })
            .collect();

        (blended, false)
    }

    /// Fire-and-forget impression recording (§4.9): the response does not
    /// wait on the StatisticsStore write completing.
    fn record_impressions(&self, results: &[ResultItem]) {
        let store = Arc::clone(&self.stats_store);
        let events: Vec<FeedbackEvent> = results
            .iter()
            .map(|item| FeedbackEvent {
                item_id: item.item_id,
                action: FeedbackKind::Impression,
                position_shown: item.rank,
                timestamp: Utc::now(),
            })
            .collect();

        tokio::spawn(async move {
            for event in events {
                if let Err(err) = store.record(&event).await {
                    err.log();
                }
            }
        });
    }

    /// Ingest one caller-reported feedback event (§6 "Feedback event
    /// (boundary format)"): a click or an impression observed at a given
    /// display position. Validated synchronously so a malformed event is
    /// rejected as `InvalidInput` rather than silently corrupting a
    /// statistics row; the write itself is the caller's synchronous
    /// round trip to the StatisticsStore (distinct from the pipeline's
    /// own fire-and-forget impression recording in `search`, which the
    /// caller never waits on). A write failure surfaces as
    /// `StatisticsWriteFailed` — retries are the caller's responsibility
    /// (§7).
    pub async fn record_feedback(&self, event: &FeedbackEvent) -> RankingResult<()> {
        event
            .validate()
            .map_err(|msg| RankingError::InvalidInput(msg.to_string()))?;
        self.stats_store.record(event).await
    }

    pub fn position_bias_model(&self) -> &PositionBiasModel {
        self.stats_store.position_bias_model()
    }
}

fn rerank_text(candidate: &crate::models::ScoredCandidate) -> String {
    format!(
        "{} {}",
        candidate.attrs.genre,
        candidate.attrs.mood.as_deref().unwrap_or("")
    )
}
