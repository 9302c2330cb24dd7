//! Core RankingEngine: loads the record set and turns it into a recommendation list

use crate::clock::{Clock, SystemClock};
use crate::error::RankError;
use crate::evaluation::{evaluate, EvaluationReport};
use crate::ranking::{rank_posts, ranked_ids};
use crate::scoring::score_batch;
use crate::store::RecordStore;
use crate::types::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Main ranking engine (thread-safe via Arc).
///
/// Holds no derived state: every call reloads the store and rescores from
/// scratch against a single reading of the clock.
pub struct RankingEngine {
    pub store: Arc<dyn RecordStore>,
    pub clock: Arc<dyn Clock>,
    pub weights: ScoreWeights,
}

pub type SharedRankingEngine = Arc<RankingEngine>;

impl RankingEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        weights: ScoreWeights,
    ) -> SharedRankingEngine {
        Arc::new(Self { store, clock, weights })
    }

    /// Engine over the wall clock and default weights
    pub fn with_store(store: Arc<dyn RecordStore>) -> SharedRankingEngine {
        Self::new(store, Arc::new(SystemClock), ScoreWeights::default())
    }

    /// Main entry point: rank every post in the store
    pub async fn rank(&self, req: RankRequest) -> Result<RankResponse, RankError> {
        let start = Instant::now();

        info!(
            "Ranking posts: viewer={:?}, limit={:?}, explain={}",
            req.viewer, req.limit, req.explain
        );

        // Step 1: Score the full batch
        let scored = self.score_current(req.viewer).await?;

        // Step 2: Order and dedup
        let mut ranked = rank_posts(scored);
        if let Some(limit) = req.limit {
            ranked.truncate(limit);
        }

        let recommended_post_ids = ranked_ids(&ranked);

        info!(
            "Ranking complete: {} posts in {} ms",
            recommended_post_ids.len(),
            start.elapsed().as_millis()
        );

        Ok(RankResponse {
            recommended_post_ids,
            scores: if req.explain { Some(ranked) } else { None },
        })
    }

    /// Load and score the current record set, in ingestion order
    pub async fn score_current(
        &self,
        viewer: Option<ViewerLocation>,
    ) -> Result<Vec<ScoredPost>, RankError> {
        let records = self.store.load_all().await.map_err(|e| {
            warn!("Failed to load records from {}: {}", self.store.name(), e);
            RankError::from(e)
        })?;

        if records.is_empty() {
            warn!("Record store {} is empty", self.store.name());
            return Err(RankError::DataUnavailable(format!(
                "record store '{}' holds no posts",
                self.store.name()
            )));
        }

        let now = self.clock.now();
        debug!("Scoring {} records at {}", records.len(), now);

        score_batch(&records, now, viewer, &self.weights)
    }

    /// Score without a viewer location and evaluate the resulting ranking
    pub async fn evaluate(&self, k_values: &[usize]) -> Result<EvaluationReport, RankError> {
        let scored = self.score_current(None).await?;
        let ranked = ranked_ids(&rank_posts(scored.clone()));
        Ok(evaluate(&scored, &ranked, k_values))
    }
}
