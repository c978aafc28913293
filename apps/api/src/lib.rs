//! Resonance ranking engine
//!
//! Composite scoring, click-feedback debiasing and MMR diversification for
//! search results. Retrieval and neural reranking live behind the
//! [`retriever::Retriever`] and [`reranker::Reranker`] traits; this crate
//! only implements what happens between and after them.

pub mod config;
pub mod diversifier;
pub mod embedding;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod reranker;
pub mod retriever;
pub mod scorer;
pub mod signals;
pub mod stats;

pub use config::{ExplorationMode, RankingConfig, ScoreWeights};
pub use error::{RankingError, RankingResult, StatusClass};
pub use pipeline::PipelineCoordinator;
