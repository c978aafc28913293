//! Per-item click/impression statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of an item's accumulated feedback statistics.
///
/// Invariants (§3): `debiased_impressions >= debiased_clicks >= 0`;
/// `impression_count`/`click_count` only ever increase. A fresh row (no
/// feedback yet) is all-zero with `last_event_at = None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemStatistics {
    pub impression_count: u64,
    pub click_count: u64,
    pub debiased_impressions: f64,
    pub debiased_clicks: f64,
    pub last_event_at: Option<DateTime<Utc>>,
}

impl Default for ItemStatistics {
    fn default() -> Self {
        Self {
            impression_count: 0,
            click_count: 0,
            debiased_impressions: 0.0,
            debiased_clicks: 0.0,
            last_event_at: None,
        }
    }
}

impl ItemStatistics {
    /// Zeroed statistics, returned for items without a row (§3 Lifecycle).
    pub fn zero() -> Self {
        Self::default()
    }
}

/// The kind of feedback event recorded against an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Impression,
    Click,
}
