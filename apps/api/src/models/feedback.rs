//! Feedback event boundary format (§6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::ItemId;
use super::statistics::FeedbackKind;

/// A click or impression event reported by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub item_id: ItemId,
    pub action: FeedbackKind,
    /// 1-based display rank the item occupied when the event was observed.
    pub position_shown: u32,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackEvent {
    /// `Err` for a non-positive rank — the boundary layer should reject
    /// this as `InvalidInput` before it ever reaches the StatisticsStore.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.position_shown == 0 {
            return Err("position_shown must be >= 1");
        }
        Ok(())
    }
}
