//! Record stores holding ingested posts

use crate::error::StoreError;
use crate::types::PostRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Trait for pluggable record stores.
///
/// Appends must be serialized by the store and must reject a `post_id` that
/// is already present. Reads are a full snapshot.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load_all(&self) -> Result<Vec<PostRecord>, StoreError>;

    async fn append(&self, record: PostRecord) -> Result<(), StoreError>;
}

/// In-memory store for tests and seeding
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<PostRecord>>,
}

impl InMemoryStore {
    pub fn new(records: Vec<PostRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn load_all(&self) -> Result<Vec<PostRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn append(&self, record: PostRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.post_id == record.post_id) {
            return Err(StoreError::DuplicateId(record.post_id));
        }
        records.push(record);
        Ok(())
    }
}

/// Append-only JSON Lines file, one `PostRecord` per line
pub struct JsonLinesStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read_content(&self) -> Result<String, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            // A store that was never written to holds no posts
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Record store {} does not exist yet", self.path.display());
                Ok(String::new())
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn parse_records(&self, content: &str) -> Result<Vec<PostRecord>, StoreError> {
        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                line: idx + 1,
                source,
            })?;
            records.push(record);
        }

        Ok(records)
    }
}

#[async_trait]
impl RecordStore for JsonLinesStore {
    fn name(&self) -> &'static str {
        "jsonl_file"
    }

    async fn load_all(&self) -> Result<Vec<PostRecord>, StoreError> {
        let content = self.read_content().await?;
        let records = self.parse_records(&content)?;
        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    async fn append(&self, record: PostRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let content = self.read_content().await?;
        let existing = self.parse_records(&content)?;
        if existing.iter().any(|r| r.post_id == record.post_id) {
            return Err(StoreError::DuplicateId(record.post_id));
        }

        let encoded = serde_json::to_string(&record).map_err(|source| StoreError::Encode {
            post_id: record.post_id.clone(),
            source,
        })?;

        // An unterminated last line would otherwise be glued to the new record
        let mut line = String::with_capacity(encoded.len() + 2);
        if !content.is_empty() && !content.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(&encoded);
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;

        debug!("Appended post {} to {}", record.post_id, self.path.display());
        Ok(())
    }
}
