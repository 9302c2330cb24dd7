//! Error taxonomy for ingestion, storage and ranking

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a [`crate::store::RecordStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("post '{0}' already exists in the record store")]
    DuplicateId(String),

    #[error("record store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt record at {path}:{line}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record '{post_id}': {source}")]
    Encode {
        post_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures at the ingestion boundary
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid post: {0}")]
    Validation(String),

    #[error("post '{0}' already exists")]
    DuplicateId(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateId(id) => IngestError::DuplicateId(id),
            other => IngestError::Store(other),
        }
    }
}

/// Failures of a ranking run. Scoring is all-or-nothing: any of these means no
/// ranking was produced.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("no posts available: {0}")]
    DataUnavailable(String),

    #[error("invalid ranking request: {0}")]
    InvalidRequest(String),

    #[error("scoring failed: {0}")]
    Computation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
