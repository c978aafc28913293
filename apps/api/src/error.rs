//! Error taxonomy for the ranking engine (§7).
//!
//! Mirrors the teacher's `ApiError`: one variant per failure mode, a
//! `status_class()` for an eventual HTTP layer to map without re-deriving
//! the classification, and a `log()` that dispatches by severity.

use thiserror::Error;

/// Broad class of failure, independent of any particular transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Client sent something invalid; no partial results.
    ClientError,
    /// Fatal at startup.
    ConfigurationError,
    /// Upstream/external collaborator unreachable; no fallback possible.
    UpstreamUnavailable,
    /// Unexpected internal failure.
    Internal,
}

/// Ranking engine error taxonomy.
#[derive(Error, Debug)]
pub enum RankingError {
    /// Weights don't sum to 1, out-of-range lambda, K1 < K2, etc. Fatal at
    /// startup.
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),

    /// Embedding provider or retriever unreachable. No fallback — this is
    /// the only failure that aborts the whole request (§7 propagation
    /// policy).
    #[error("retrieval failed: {0}")]
    RetrievalFailed(String),

    /// Neural reranker unreachable or returned malformed output. Recovered
    /// locally by the pipeline (`blended = composite`); this variant exists
    /// so the recovery path has something concrete to log.
    #[error("rerank failed: {0}")]
    RerankFailed(String),

    /// Statistics backend could not be read for one or more items.
    /// Recovered locally as all-zero statistics (cold-start behavior).
    #[error("statistics read failed: {0}")]
    StatisticsReadFailed(String),

    /// Statistics backend could not durably record a feedback event.
    /// Surfaced to the feedback-ingestion caller; never affects an
    /// in-flight search.
    #[error("statistics write failed: {0}")]
    StatisticsWriteFailed(String),

    /// Empty query, limit out of range, or an unknown filter value.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl RankingError {
    pub fn status_class(&self) -> StatusClass {
        match self {
            Self::ConfigurationInvalid(_) => StatusClass::ConfigurationError,
            Self::RetrievalFailed(_) => StatusClass::UpstreamUnavailable,
            Self::RerankFailed(_) | Self::StatisticsReadFailed(_) => StatusClass::Internal,
            Self::StatisticsWriteFailed(_) => StatusClass::Internal,
            Self::InvalidInput(_) => StatusClass::ClientError,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigurationInvalid(_) => "CONFIGURATION_INVALID",
            Self::RetrievalFailed(_) => "RETRIEVAL_FAILED",
            Self::RerankFailed(_) => "RERANK_FAILED",
            Self::StatisticsReadFailed(_) => "STATISTICS_READ_FAILED",
            Self::StatisticsWriteFailed(_) => "STATISTICS_WRITE_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    /// Log this error at a severity matching its class, the way
    /// `ApiError::log()` dispatches by status code.
    pub fn log(&self) {
        match self.status_class() {
            StatusClass::Internal | StatusClass::UpstreamUnavailable => {
                tracing::error!(error = %self, code = self.error_code(), "ranking pipeline error");
            }
            StatusClass::ConfigurationError => {
                tracing::error!(error = %self, code = self.error_code(), "configuration error");
            }
            StatusClass::ClientError => {
                tracing::debug!(error = %self, code = self.error_code(), "invalid request");
            }
        }
    }
}

/// Result type alias for ranking engine operations.
pub type RankingResult<T> = Result<T, RankingError>;
