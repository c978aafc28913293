//! The four Stage 2 signals combined by [`crate::scorer::Scorer`] into a
//! composite score.

pub mod exploration;
pub mod freshness;
pub mod popularity;
pub mod position_bias;

pub use exploration::ExplorationEstimator;
pub use freshness::FreshnessEstimator;
pub use popularity::PopularityEstimator;
pub use position_bias::PositionBiasModel;
