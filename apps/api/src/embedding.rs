//! Embedding-provider boundary (§6, out of scope: the provider's own
//! internals — calling out to Ollama/OpenAI/whatever embedding model the
//! deployment picks).
//!
//! Declared as a narrow trait so `PipelineCoordinator::search` could be
//! wired to call it directly; today callers compute the query embedding
//! themselves and pass it to `search`, so this trait exists for a future
//! caller to implement rather than being invoked from inside this crate.

use async_trait::async_trait;

use crate::error::RankingResult;
use crate::models::Embedding;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed free text into the model's fixed-dimension vector space.
    /// Errors surface as `RetrievalFailed` (§7): an unreachable embedding
    /// provider aborts the request same as an unreachable retriever.
    async fn embed(&self, text: &str) -> RankingResult<Embedding>;
}

/// Deterministic in-memory embedding provider for tests: hashes the text
/// into a fixed-dimension vector so the same input always embeds
/// identically without a real model call.
pub struct HashEmbeddingProvider {
    dimension: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> RankingResult<Embedding> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut values = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let bits = hasher.finish();
            // Map into [-1.0, 1.0] so cosine similarity behaves sanely.
            values.push(((bits % 2000) as f32 / 1000.0) - 1.0);
        }
        Ok(Embedding::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let provider = HashEmbeddingProvider::new(16);
        let a = provider.embed("late night lofi").await.unwrap();
        let b = provider.embed("late night lofi").await.unwrap();
        assert_eq!(a.values(), b.values());
    }

    #[tokio::test]
    async fn different_text_embeds_differently() {
        let provider = HashEmbeddingProvider::new(16);
        let a = provider.embed("lofi beats").await.unwrap();
        let b = provider.embed("death metal").await.unwrap();
        assert_ne!(a.values(), b.values());
    }

    #[tokio::test]
    async fn respects_configured_dimension() {
        let provider = HashEmbeddingProvider::new(32);
        let embedding = provider.embed("anything").await.unwrap();
        assert_eq!(embedding.dimension(), 32);
    }
}
