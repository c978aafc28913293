//! In-process [`StatisticsStore`] backed by a sharded concurrent map.
//!
//! Grounded on the teacher's `UserConnectionState` (`DashMap<String,
//! ConnectionHandle>`): one lock-protected row per key, so concurrent
//! writers against *different* items never contend, and concurrent
//! writers against the *same* item serialize through that item's own
//! `parking_lot::Mutex` rather than a store-wide lock.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::StatisticsStore;
use crate::error::RankingResult;
use crate::models::{FeedbackEvent, FeedbackKind, ItemId, ItemStatistics};
use crate::signals::position_bias::PositionBiasModel;

#[derive(Default)]
struct Row {
    stats: ItemStatistics,
}

pub struct InMemoryStatisticsStore {
    rows: DashMap<ItemId, Mutex<Row>>,
    position_bias: PositionBiasModel,
}

impl InMemoryStatisticsStore {
    pub fn new(position_bias: PositionBiasModel) -> Self {
        Self {
            rows: DashMap::new(),
            position_bias,
        }
    }
}

impl Default for InMemoryStatisticsStore {
    fn default() -> Self {
        Self::new(PositionBiasModel::default())
    }
}

#[async_trait]
impl StatisticsStore for InMemoryStatisticsStore {
    async fn record(&self, event: &FeedbackEvent) -> RankingResult<()> {
        let weight = self.position_bias.weight(event.position_shown);

        let entry = self.rows.entry(event.item_id).or_default();
        let mut row = entry.lock();

        match event.action {
            FeedbackKind::Impression => {
                row.stats.impression_count += 1;
                row.stats.debiased_impressions += weight;
            }
            FeedbackKind::Click => {
                row.stats.click_count += 1;
                row.stats.debiased_clicks += weight;
            }
        }
        row.stats.last_event_at = Some(event.timestamp);

        Ok(())
    }

    async fn get(&self, item_id: ItemId) -> RankingResult<ItemStatistics> {
        Ok(self
            .rows
            .get(&item_id)
            .map(|entry| entry.lock().stats)
            .unwrap_or_else(ItemStatistics::zero))
    }

    /// One pass over `item_ids`, not a `get()` per item relayed through
    /// `.await` N times — the "one read amplification unit" contract of
    /// §4.2 applies even to an in-process map, since a real backing store
    /// (a transactional row store) would turn per-item awaits into N
    /// network round trips.
    async fn get_many(&self, item_ids: &[ItemId]) -> RankingResult<Vec<ItemStatistics>> {
        Ok(item_ids
            .iter()
            .map(|id| {
                self.rows
                    .get(id)
                    .map(|entry| entry.lock().stats)
                    .unwrap_or_else(ItemStatistics::zero)
            })
            .collect())
    }

    fn position_bias_model(&self) -> &PositionBiasModel {
        &self.position_bias
    }
}
