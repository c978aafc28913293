//! Ranking engine binary: loads configuration, wires an in-memory demo
//! catalog behind the Retriever/Reranker traits, and runs a handful of
//! searches against it so the pipeline can be exercised end to end
//! without the external services (embedding provider, ANN index, neural
//! reranker) this crate treats as out of scope.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use resonance_ranking::models::{Candidate, Embedding, ItemAttrs, ItemId, SearchFilters, SearchRequest};
use resonance_ranking::reranker::StubReranker;
use resonance_ranking::retriever::InMemoryRetriever;
use resonance_ranking::signals::PositionBiasModel;
use resonance_ranking::stats::InMemoryStatisticsStore;
use resonance_ranking::{PipelineCoordinator, RankingConfig};

fn demo_catalog() -> Vec<Candidate> {
    let genres = ["lofi", "jazz", "ambient", "rock"];
    (0..40)
        .map(|i| {
            let genre = genres[i % genres.len()];
            Candidate {
                item_id: ItemId::new(Uuid::new_v4()),
                retrieval_distance: 0.0,
                attrs: ItemAttrs::new(Some(genre.to_string()), None, None, Some(90 + i as u32), None),
                embedding: Embedding::new(vec![(i % 7) as f32, (i % 5) as f32, (i % 3) as f32]),
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resonance_ranking=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = RankingConfig::from_env()?;
    tracing::info!(
        exploration_mode = ?config.exploration_mode,
        retrieval_k = config.retrieval_k,
        "ranking engine configured"
    );

    let retriever = Arc::new(InMemoryRetriever::new(demo_catalog()));
    let reranker = Arc::new(StubReranker::new(|_query, text| text.len() as f64 / 20.0));
    let stats_store = Arc::new(InMemoryStatisticsStore::new(PositionBiasModel::new(
        config.position_bias_alpha,
        config.position_bias_floor,
    )));

    let pipeline = PipelineCoordinator::new(config, retriever, reranker, stats_store, rand::random());

    let request = SearchRequest {
        query: "late night lofi".to_string(),
        limit: 10,
        include_scores: true,
        filters: SearchFilters::default(),
    };
    let query_embedding = Embedding::new(vec![1.0, 2.0, 0.0]);

    let response = pipeline.search(&request, &query_embedding).await?;

    tracing::info!(
        results = response.results.len(),
        total_ms = response.timings.total_ms,
        rerank_skipped = response.rerank_skipped,
        "search complete"
    );
    for item in &response.results {
        tracing::info!(
            item_id = %item.item_id,
            rank = item.rank,
            genre = %item.genre,
            blended = ?item.blended,
            "result"
        );
    }

    // Simulate a click on the top result feeding back into future rankings.
    if let Some(top) = response.results.first() {
        let click = resonance_ranking::models::FeedbackEvent {
            item_id: top.item_id,
            action: resonance_ranking::models::FeedbackKind::Click,
            position_shown: top.rank,
            timestamp: chrono::Utc::now(),
        };
        pipeline.record_feedback(&click).await?;
        tracing::info!(item_id = %top.item_id, "recorded click feedback");
    }

    Ok(())
}
