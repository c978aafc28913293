//! Debiased popularity signal (§4.2).
//!
//! Point estimate of click-through rate under a Beta(prior_alpha,
//! prior_beta) prior, computed from IPW-debiased impression/click totals
//! rather than raw counts — an item shown mostly at rank 50 and clicked
//! once looks far more popular once its impressions are reweighted up to
//! match.

use crate::models::ItemStatistics;

#[derive(Debug, Clone, Copy)]
pub struct PopularityEstimator {
    prior_alpha: f64,
    prior_beta: f64,
}

impl PopularityEstimator {
    pub fn new(prior_alpha: f64, prior_beta: f64) -> Self {
        Self {
            prior_alpha,
            prior_beta,
        }
    }

    /// `(debiased_clicks + alpha) / (debiased_impressions + alpha + beta)`,
    /// clamped to `[0, 1]` to absorb any floating-point drift at the
    /// boundaries.
    pub fn estimate(&self, stats: &ItemStatistics) -> f64 {
        let numerator = stats.debiased_clicks + self.prior_alpha;
        let denominator = stats.debiased_impressions + self.prior_alpha + self.prior_beta;
        (numerator / denominator).clamp(0.0, 1.0)
    }
}
