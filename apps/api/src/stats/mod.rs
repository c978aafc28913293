//! Feedback aggregation: the click/impression ledger behind the
//! Popularity and Exploration signals (§3).

mod in_memory;

pub use in_memory::InMemoryStatisticsStore;

use async_trait::async_trait;

use crate::error::RankingResult;
use crate::models::{FeedbackEvent, ItemId, ItemStatistics};
use crate::signals::position_bias::PositionBiasModel;

/// Durable (or at least process-lifetime) storage for per-item feedback
/// statistics.
///
/// Implementations must give each item's statistics row linearizable
/// updates (§8 scenario 6: N concurrent `record` calls against one item
/// never lose an update), but impose no ordering between different
/// items' rows.
#[async_trait]
pub trait StatisticsStore: Send + Sync {
    /// Record a single feedback event, applying IPW debiasing (§3) using
    /// the position-bias model the store was constructed with.
    async fn record(&self, event: &FeedbackEvent) -> RankingResult<()>;

    /// Current statistics for one item, or all-zero if the item has never
    /// received feedback (cold start, §3 Lifecycle).
    async fn get(&self, item_id: ItemId) -> RankingResult<ItemStatistics>;

    /// Batched form of [`StatisticsStore::get`] for scoring a whole
    /// candidate set without one round-trip per item.
    async fn get_many(&self, item_ids: &[ItemId]) -> RankingResult<Vec<ItemStatistics>> {
        let mut out = Vec::with_capacity(item_ids.len());
        for &id in item_ids {
            out.push(self.get(id).await?);
        }
        Ok(out)
    }

    /// The position-bias model this store debiases with, exposed so
    /// callers constructing a fresh store share one model instance.
    fn position_bias_model(&self) -> &PositionBiasModel;
}

/// Always-fails statistics store, used to exercise the Scorer's
/// `StatisticsReadFailed` recovery path (§7: treated as all-zero
/// statistics, `stats_degraded` flagged rather than aborting the
/// request).
#[cfg(test)]
pub struct FailingStatisticsStore {
    position_bias: PositionBiasModel,
}

#[cfg(test)]
impl Default for FailingStatisticsStore {
    fn default() -> Self {
        Self {
            position_bias: PositionBiasModel::default(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl StatisticsStore for FailingStatisticsStore {
    async fn record(&self, _event: &FeedbackEvent) -> RankingResult<()> {
        Err(crate::error::RankingError::StatisticsWriteFailed(
            "statistics backend unreachable".to_string(),
        ))
    }

    async fn get(&self, _item_id: ItemId) -> RankingResult<ItemStatistics> {
        Err(crate::error::RankingError::StatisticsReadFailed(
            "statistics backend unreachable".to_string(),
        ))
    }

    async fn get_many(&self, _item_ids: &[ItemId]) -> RankingResult<Vec<ItemStatistics>> {
        Err(crate::error::RankingError::StatisticsReadFailed(
            "statistics backend unreachable".to_string(),
        ))
    }

    fn position_bias_model(&self) -> &PositionBiasModel {
        &self.position_bias
    }
}
