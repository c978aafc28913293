//! Search request/response boundary formats (§6).
//!
//! These mirror the JSON shapes in the spec so a future HTTP layer (out of
//! scope here) can deserialize directly into them; this crate exposes no
//! HTTP routes of its own.

use serde::{Deserialize, Serialize};

use super::item::ItemId;

fn default_limit() -> u32 {
    20
}

/// Optional categorical/numeric filters passed through to the Retriever.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub format: Option<String>,
    pub bpm_min: Option<u32>,
    pub bpm_max: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub include_scores: bool,
    #[serde(default)]
    pub filters: SearchFilters,
}

impl SearchRequest {
    /// `InvalidInput` per §7: empty query or out-of-range limit.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.query.trim().is_empty() {
            return Err("query must not be empty");
        }
        if !(1..=100).contains(&self.limit) {
            return Err("limit must be between 1 and 100");
        }
        Ok(())
    }
}

/// Per-stage wall-clock timings, always returned (§4.9, §6).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Timings {
    pub retrieval_ms: u64,
    pub ranking_ms: u64,
    pub rerank_ms: u64,
    pub diversity_ms: u64,
    pub total_ms: u64,
}

/// A single ranked result item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    pub item_id: ItemId,
    pub rank: u32,
    pub genre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blended: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exploration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freshness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mmr: Option<f64>,
}

/// The ordered, diversified response to a search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<ResultItem>,
    pub timings: Timings,
    /// Set when the neural reranker failed or was disabled and the
    /// pipeline fell back to the pure-composite ordering (§7).
    pub rerank_skipped: bool,
    /// Set when one or more candidates' statistics could not be read and
    /// were treated as all-zero (cold-start fallback, §7).
    pub stats_degraded: bool,
}
