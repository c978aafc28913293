//! Freshness signal (§4.5).
//!
//! Exponential decay from an item's `created_at`: `exp(-age / tau)`, where
//! `tau = half_life_days / ln(2)` so the score is exactly `0.5` at one
//! half-life. Items with no known creation date score `0.5` — neither
//! rewarded nor penalized for an attribute we can't observe.

use chrono::{DateTime, Utc};

pub const UNKNOWN_CREATION_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct FreshnessEstimator {
    tau_days: f64,
}

impl FreshnessEstimator {
    pub fn new(half_life_days: f64) -> Self {
        Self {
            tau_days: half_life_days / std::f64::consts::LN_2,
        }
    }

    pub fn estimate(&self, created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        let Some(created_at) = created_at else {
            return UNKNOWN_CREATION_SCORE;
        };
        let age_days = (now - created_at).num_milliseconds() as f64 / 86_400_000.0;
        let age_days = age_days.max(0.0);
        (-age_days / self.tau_days).exp()
    }
}

impl Default for FreshnessEstimator {
    fn default() -> Self {
        Self::new(30.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn missing_created_at_scores_midpoint() {
        let estimator = FreshnessEstimator::default();
        assert_eq!(estimator.estimate(None, Utc::now()), UNKNOWN_CREATION_SCORE);
    }

    #[test]
    fn brand_new_item_scores_near_one() {
        let estimator = FreshnessEstimator::default();
        let now = Utc::now();
        assert!((estimator.estimate(Some(now), now) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn one_half_life_old_scores_one_half() {
        let estimator = FreshnessEstimator::new(30.0);
        let now = Utc::now();
        let created_at = now - Duration::days(30);
        assert!((estimator.estimate(Some(created_at), now) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn future_created_at_is_clamped_to_zero_age() {
        let estimator = FreshnessEstimator::default();
        let now = Utc::now();
        let created_at = now + Duration::days(5);
        assert!((estimator.estimate(Some(created_at), now) - 1.0).abs() < 1e-9);
    }
}
