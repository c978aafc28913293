//! Ranking engine configuration (§6 "Configuration (enumerated)").
//!
//! Loaded from environment variables in the teacher's
//! `get_env_or_default`/`parse_env` style, then validated eagerly —
//! a bad configuration is a startup-time `ConfigurationInvalid`, never a
//! runtime surprise.

use resonance_shared_config::parse_env;

use crate::error::{RankingError, RankingResult};

/// Which posterior summary the ExplorationEstimator reports (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorationMode {
    /// Deterministic UCB point estimate. Default: two identical queries at
    /// the same instant return identical orderings.
    Ucb,
    /// Draw once per request from the Beta posterior.
    Thompson,
}

impl ExplorationMode {
    fn from_env_str(s: &str) -> RankingResult<Self> {
        match s.to_lowercase().as_str() {
            "ucb" => Ok(Self::Ucb),
            "thompson" => Ok(Self::Thompson),
            other => Err(RankingError::ConfigurationInvalid(format!(
                "unknown exploration_mode '{other}', expected 'ucb' or 'thompson'"
            ))),
        }
    }
}

/// The four composite-score weights. Must sum to `1 ± 1e-6` (§4.6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub semantic: f64,
    pub popularity: f64,
    pub exploration: f64,
    pub freshness: f64,
}

impl ScoreWeights {
    const SUM_TOLERANCE: f64 = 1e-6;

    pub fn sum(&self) -> f64 {
        self.semantic + self.popularity + self.exploration + self.freshness
    }

    fn validate(&self) -> RankingResult<()> {
        if (self.sum() - 1.0).abs() > Self::SUM_TOLERANCE {
            return Err(RankingError::ConfigurationInvalid(format!(
                "score weights must sum to 1.0 (+/- {:e}), got {}",
                Self::SUM_TOLERANCE,
                self.sum()
            )));
        }
        Ok(())
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            semantic: 0.50,
            popularity: 0.25,
            exploration: 0.15,
            freshness: 0.10,
        }
    }
}

/// Full ranking engine configuration.
#[derive(Debug, Clone)]
pub struct RankingConfig {
    pub weights: ScoreWeights,

    /// K1: candidates returned by the Retriever.
    pub retrieval_k: usize,
    /// K2: candidates surviving to rerank/diversify.
    pub rerank_k: usize,
    /// N: final result count.
    pub result_n: usize,

    pub mmr_lambda: f64,
    pub rerank_blend: f64,
    pub rerank_enabled: bool,
    pub min_per_genre: usize,

    pub prior_alpha: f64,
    pub prior_beta: f64,

    pub freshness_half_life_days: f64,

    pub position_bias_alpha: f64,
    pub position_bias_floor: f64,

    pub exploration_mode: ExplorationMode,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            retrieval_k: 500,
            rerank_k: 50,
            result_n: 20,
            mmr_lambda: 0.70,
            rerank_blend: 0.60,
            rerank_enabled: true,
            min_per_genre: 2,
            prior_alpha: 1.0,
            prior_beta: 9.0,
            freshness_half_life_days: 30.0,
            position_bias_alpha: 1.0,
            position_bias_floor: 0.01,
            exploration_mode: ExplorationMode::Ucb,
        }
    }
}

impl RankingConfig {
    /// Load configuration from environment variables, falling back to spec
    /// defaults, then validate.
    pub fn from_env() -> RankingResult<Self> {
        let defaults = Self::default();

        let weights = ScoreWeights {
            semantic: env_f64("RANKING_WEIGHT_SEMANTIC", defaults.weights.semantic)?,
            popularity: env_f64("RANKING_WEIGHT_POPULARITY", defaults.weights.popularity)?,
            exploration: env_f64("RANKING_WEIGHT_EXPLORATION", defaults.weights.exploration)?,
            freshness: env_f64("RANKING_WEIGHT_FRESHNESS", defaults.weights.freshness)?,
        };

        let config = Self {
            weights,
            retrieval_k: env_usize("RANKING_RETRIEVAL_K", defaults.retrieval_k)?,
            rerank_k: env_usize("RANKING_RERANK_K", defaults.rerank_k)?,
            result_n: env_usize("RANKING_RESULT_N", defaults.result_n)?,
            mmr_lambda: env_f64("RANKING_MMR_LAMBDA", defaults.mmr_lambda)?,
            rerank_blend: env_f64("RANKING_RERANK_BLEND", defaults.rerank_blend)?,
            rerank_enabled: env_bool("RANKING_RERANK_ENABLED", defaults.rerank_enabled)?,
            min_per_genre: env_usize("RANKING_MIN_PER_GENRE", defaults.min_per_genre)?,
            prior_alpha: env_f64("RANKING_PRIOR_ALPHA", defaults.prior_alpha)?,
            prior_beta: env_f64("RANKING_PRIOR_BETA", defaults.prior_beta)?,
            freshness_half_life_days: env_f64(
                "RANKING_FRESHNESS_HALF_LIFE_DAYS",
                defaults.freshness_half_life_days,
            )?,
            position_bias_alpha: env_f64("RANKING_POSITION_BIAS_ALPHA", defaults.position_bias_alpha)?,
            position_bias_floor: env_f64("RANKING_POSITION_BIAS_FLOOR", defaults.position_bias_floor)?,
            exploration_mode: ExplorationMode::from_env_str(&resonance_shared_config::get_env_or_default(
                "RANKING_EXPLORATION_MODE",
                "ucb",
            ))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants (§6, §4.6); called eagerly by
    /// `from_env` and by callers constructing a config by hand.
    pub fn validate(&self) -> RankingResult<()> {
        self.weights.validate()?;

        if self.retrieval_k < self.rerank_k {
            return Err(RankingError::ConfigurationInvalid(format!(
                "retrieval_k ({}) must be >= rerank_k ({})",
                self.retrieval_k, self.rerank_k
            )));
        }
        if self.rerank_k < self.result_n {
            return Err(RankingError::ConfigurationInvalid(format!(
                "rerank_k ({}) must be >= result_n ({})",
                self.rerank_k, self.result_n
            )));
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(RankingError::ConfigurationInvalid(
                "mmr_lambda must be within [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.rerank_blend) {
            return Err(RankingError::ConfigurationInvalid(
                "rerank_blend must be within [0, 1]".to_string(),
            ));
        }
        if self.min_per_genre == 0 {
            return Err(RankingError::ConfigurationInvalid(
                "min_per_genre must be >= 1".to_string(),
            ));
        }
        if self.prior_alpha <= 0.0 || self.prior_beta <= 0.0 {
            return Err(RankingError::ConfigurationInvalid(
                "prior_alpha and prior_beta must be positive".to_string(),
            ));
        }
        if self.freshness_half_life_days <= 0.0 {
            return Err(RankingError::ConfigurationInvalid(
                "freshness_half_life_days must be positive".to_string(),
            ));
        }
        if self.position_bias_alpha <= 0.0 {
            return Err(RankingError::ConfigurationInvalid(
                "position_bias_alpha must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.position_bias_floor) || self.position_bias_floor == 0.0 {
            return Err(RankingError::ConfigurationInvalid(
                "position_bias_floor must be within (0, 1]".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_f64(name: &str, default: f64) -> RankingResult<f64> {
    parse_env(name, default)
        .map_err(|e| RankingError::ConfigurationInvalid(format!("{name}: {e}")))
}

fn env_usize(name: &str, default: usize) -> RankingResult<usize> {
    parse_env(name, default)
        .map_err(|e| RankingError::ConfigurationInvalid(format!("{name}: {e}")))
}

fn env_bool(name: &str, default: bool) -> RankingResult<bool> {
    parse_env(name, default)
        .map_err(|e| RankingError::ConfigurationInvalid(format!("{name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let weights = ScoreWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(RankingConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let mut config = RankingConfig::default();
        config.weights = ScoreWeights {
            semantic: 0.5,
            popularity: 0.25,
            exploration: 0.15,
            freshness: 0.11,
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, RankingError::ConfigurationInvalid(_)));
    }

    #[test]
    fn rejects_retrieval_k_below_rerank_k() {
        let mut config = RankingConfig::default();
        config.retrieval_k = 10;
        config.rerank_k = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_rerank_k_below_result_n() {
        let mut config = RankingConfig::default();
        config.rerank_k = 5;
        config.result_n = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_mmr_lambda() {
        let mut config = RankingConfig::default();
        config.mmr_lambda = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn exploration_mode_parses_known_strings() {
        assert_eq!(
            ExplorationMode::from_env_str("ucb").unwrap(),
            ExplorationMode::Ucb
        );
        assert_eq!(
            ExplorationMode::from_env_str("Thompson").unwrap(),
            ExplorationMode::Thompson
        );
        assert!(ExplorationMode::from_env_str("bogus").is_err());
    }
}
