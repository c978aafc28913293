//! Catalog item types: identifiers, embeddings, and ranking attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel genre used when an item has no genre assigned.
pub const UNKNOWN_GENRE: &str = "__unknown__";

/// Opaque catalog item identifier.
///
/// The spec allows either a stable string or a 128-bit id; we use a `Uuid`
/// newtype so statistics rows can key off it directly with `Eq + Hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ItemId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// A fixed-dimension dense embedding vector.
///
/// Caches its L2 norm at construction so repeated cosine-similarity calls
/// during diversification don't re-derive it every round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    values: Vec<f32>,
    norm: f32,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        let norm = l2_norm(&values);
        Self { values, norm }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn norm(&self) -> f32 {
        self.norm
    }

    /// Cosine similarity with another embedding. Returns `0.0` if either
    /// vector is zero-length (avoids division by zero rather than NaN).
    pub fn cosine_similarity(&self, other: &Embedding) -> f64 {
        if self.norm == 0.0 || other.norm == 0.0 || self.values.len() != other.values.len() {
            return 0.0;
        }
        let dot: f32 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum();
        (dot / (self.norm * other.norm)) as f64
    }
}

fn l2_norm(values: &[f32]) -> f32 {
    values.iter().map(|v| v * v).sum::<f32>().sqrt()
}

/// Additional categorical/numeric attributes opaque to the ranking core,
/// but used by the Retriever's filter contract and by the Diversifier's
/// genre bucketing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemAttrs {
    pub genre: String,
    pub mood: Option<String>,
    pub format: Option<String>,
    pub bpm: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ItemAttrs {
    /// Construct attrs, normalizing a missing/empty genre to the sentinel
    /// bucket once at construction time rather than at every read site.
    pub fn new(
        genre: Option<String>,
        mood: Option<String>,
        format: Option<String>,
        bpm: Option<u32>,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        let genre = match genre {
            Some(g) if !g.trim().is_empty() => g,
            _ => UNKNOWN_GENRE.to_string(),
        };
        Self {
            genre,
            mood,
            format,
            bpm,
            created_at,
        }
    }
}

/// A catalog item as seen by the ranking core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    pub embedding: Embedding,
    pub attrs: ItemAttrs,
}
