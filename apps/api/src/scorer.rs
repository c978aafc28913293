//! Stage 2: composite scoring (§4).
//!
//! Combines the four per-candidate signals into one composite score and
//! keeps the top `rerank_k` (K2) candidates, the way the teacher's
//! `SimilarityService` merges semantic/acoustic/categorical weights into
//! one blended score.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::RankingConfig;
use crate::models::{Candidate, ScoredCandidate, SignalScores};
use crate::signals::{ExplorationEstimator, FreshnessEstimator, PopularityEstimator};
use crate::stats::StatisticsStore;

pub struct Scorer {
    weights: crate::config::ScoreWeights,
    popularity: PopularityEstimator,
    exploration: ExplorationEstimator,
    freshness: FreshnessEstimator,
}

impl Scorer {
    pub fn new(config: &RankingConfig, exploration_seed: u64) -> Self {
        Self {
            weights: config.weights,
            popularity: PopularityEstimator::new(config.prior_alpha, config.prior_beta),
            exploration: ExplorationEstimator::new(
                config.exploration_mode,
                config.prior_alpha,
                config.prior_beta,
                exploration_seed,
            ),
            freshness: FreshnessEstimator::new(config.freshness_half_life_days),
        }
    }

    /// Score every candidate and keep the top `top_k` by composite score.
    ///
    /// Fetches statistics for the whole candidate set in one batched
    /// `get_many` call (§4.2, §4.9 step 3) rather than one round trip per
    /// candidate. Returns the scored, truncated, strictly-ordered
    /// candidate list and a `stats_degraded` flag set when the batched
    /// read failed and was treated as all-zero for every candidate (§7).
    pub async fn score(
        &self,
        candidates: Vec<Candidate>,
        stats_store: &dyn StatisticsStore,
        now: DateTime<Utc>,
        top_k: usize,
    ) -> (Vec<ScoredCandidate>, bool) {
        let item_ids: Vec<_> = candidates.iter().map(|c| c.item_id).collect();
        let (stats_by_item, stats_degraded) = match stats_store.get_many(&item_ids).await {
            Ok(stats) => {
                let map: HashMap<_, _> = item_ids.iter().copied().zip(stats).collect();
                (map, false)
            }
            Err(err) => {
                err.log();
                (HashMap::new(), true)
            }
        };

        let mut scored = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let stats = stats_by_item
                .get(&candidate.item_id)
                .copied()
                .unwrap_or_else(crate::models::ItemStatistics::zero);

            let semantic = candidate.semantic_similarity();
            let popularity = self.popularity.estimate(&stats);
            let exploration = self.exploration.estimate(&stats);
            let freshness = self.freshness.estimate(candidate.attrs.created_at, now);

            let composite = self.weights.semantic * semantic
                + self.weights.popularity * popularity
                + self.weights.exploration * exploration
                + self.weights.freshness * freshness;

            scored.push(ScoredCandidate {
                item_id: candidate.item_id,
                attrs: candidate.attrs,
                embedding: candidate.embedding,
                scores: SignalScores {
                    semantic,
                    popularity,
                    exploration,
                    freshness,
                    composite,
                },
                blended: composite,
            });
        }

        scored.sort_by(|a, b| {
            b.scores
                .composite
                .total_cmp(&a.scores.composite)
                .then_with(|| b.scores.semantic.total_cmp(&a.scores.semantic))
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        scored.truncate(top_k);

        (scored, stats_degraded)
    }
}
