//! Core type definitions for post ranking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed post, as persisted in the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub post_id: String,
    pub title: String,         // informational only
    pub impressions: u64,
    pub likes_count: u64,
    pub comments_count: u64,
    pub created_at: DateTime<Utc>,
    pub is_business_post: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl PostRecord {
    /// Coordinates of the post's origin, when both halves are known
    pub fn coordinates(&self) -> Option<ViewerLocation> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(ViewerLocation { latitude, longitude }),
            _ => None,
        }
    }
}

/// Unvalidated post as received at the ingestion boundary.
///
/// Every field is optional so that a missing field surfaces as a
/// validation error naming it, instead of an opaque decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub post_id: Option<String>,
    pub title: Option<String>,
    pub impressions: Option<i64>,
    pub likes_count: Option<i64>,
    pub comments_count: Option<i64>,
    pub created_at: Option<String>,
    pub is_business_post: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Geographic point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Post plus every signal derived during a ranking run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredPost {
    #[serde(flatten)]
    pub post: PostRecord,

    pub likes_norm: f64,
    pub comments_norm: f64,
    pub impressions_norm: f64,
    pub engagement_score: f64,
    pub days_since_posted: i64, // negative for future-dated posts
    pub recency_score: f64,
    pub business_weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_user: Option<f64>, // km
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_norm: Option<f64>,
    pub final_score_base: f64,
    pub final_score: f64,
}

/// Fixed weights of the scoring pipeline
#[derive(Debug, Clone)]
pub struct ScoreWeights {
    // engagement blend
    pub likes: f64,
    pub comments: f64,
    pub impressions: f64,

    // final score blend
    pub engagement: f64,
    pub recency: f64,
    pub business: f64,

    pub recency_decay: f64,  // lambda, per day
    pub business_boost: f64, // weight carried by business posts
    pub distance: f64,       // delta, share of the final score given to proximity
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            likes: 0.5,
            comments: 0.3,
            impressions: 0.2,
            engagement: 0.6,
            recency: 0.3,
            business: 0.1,
            recency_decay: 0.1,
            business_boost: 1.5,
            distance: 0.2,
        }
    }
}

/// Request to rank the current record set
#[derive(Debug, Clone, Default)]
pub struct RankRequest {
    pub viewer: Option<ViewerLocation>,
    pub limit: Option<usize>,
    pub explain: bool,
}

/// Result of a ranking run
#[derive(Debug, Clone, Serialize)]
pub struct RankResponse {
    pub recommended_post_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<ScoredPost>>,
}
