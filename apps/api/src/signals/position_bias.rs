//! Position-bias model backing IPW debiasing (§3, §4.3).
//!
//! A click on the item shown at rank 1 is far more likely to reflect true
//! relevance than a click at rank 50 — users rarely scroll that far
//! regardless of quality. `PositionBiasModel` estimates the probability a
//! user examines a given rank, so the StatisticsStore can reweight raw
//! impressions/clicks into a debiased popularity estimate.

/// `p(rank) = max(floor, 1 / rank^alpha)`; `weight(rank) = 1 / p(rank)`.
#[derive(Debug, Clone, Copy)]
pub struct PositionBiasModel {
    alpha: f64,
    floor: f64,
}

impl PositionBiasModel {
    pub fn new(alpha: f64, floor: f64) -> Self {
        Self { alpha, floor }
    }

    /// Estimated examination probability at a 1-based display rank.
    pub fn examination_probability(&self, rank: u32) -> f64 {
        let rank = rank.max(1) as f64;
        (1.0 / rank.powf(self.alpha)).max(self.floor)
    }

    /// Inverse propensity weight applied to a single impression/click
    /// observed at `rank`.
    pub fn weight(&self, rank: u32) -> f64 {
        1.0 / self.examination_probability(rank)
    }
}

impl Default for PositionBiasModel {
    fn default() -> Self {
        Self::new(1.0, 0.01)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1.0)]
    #[case(2, 0.5)]
    #[case(4, 0.25)]
    fn examination_probability_matches_inverse_rank(#[case] rank: u32, #[case] expected: f64) {
        let model = PositionBiasModel::new(1.0, 0.0);
        assert!((model.examination_probability(rank) - expected).abs() < 1e-9);
    }

    #[test]
    fn rank_one_has_full_examination_probability() {
        let model = PositionBiasModel::default();
        assert!((model.examination_probability(1) - 1.0).abs() < 1e-9);
        assert!((model.weight(1) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn probability_decreases_with_rank() {
        let model = PositionBiasModel::default();
        assert!(model.examination_probability(10) < model.examination_probability(2));
    }

    #[test]
    fn rank_100_hits_the_default_floor() {
        let model = PositionBiasModel::default();
        assert!((model.examination_probability(100) - 0.01).abs() < 1e-9);
    }

    #[test]
    fn probability_never_drops_below_floor() {
        let model = PositionBiasModel::new(1.0, 0.05);
        assert!((model.examination_probability(10_000) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn weight_is_inverse_of_probability() {
        let model = PositionBiasModel::default();
        let rank = 7;
        let p = model.examination_probability(rank);
        assert!((model.weight(rank) - 1.0 / p).abs() < 1e-9);
    }
}
