//! foodrank - popularity and proximity ranking of food posts
//!
//! Turns raw post records plus an optional viewer location into a totally
//! ordered recommendation list:
//! - Min-max normalized engagement (likes, comments, impressions)
//! - Exponential recency decay and a fixed business-post boost
//! - Optional batch-relative proximity blend (haversine distance)
//! - Stable sort + dedup by post ID

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod geo;
pub mod ingestion;
pub mod ranking;
pub mod scoring;
pub mod server;
pub mod store;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ServiceConfig;
pub use engine::{RankingEngine, SharedRankingEngine};
pub use error::{IngestError, RankError, StoreError};
pub use evaluation::{evaluate, EvaluationReport};
pub use ingestion::Ingestion;
pub use store::{InMemoryStore, JsonLinesStore, RecordStore};
pub use types::*;
