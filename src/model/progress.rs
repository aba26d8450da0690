//! Last-watched position persistence

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Where the orchestrator keeps per-content playback positions
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn saved_position(&self, content_id: &str) -> Option<Duration>;
    async fn save_position(&self, content_id: &str, position: Duration);
    async fn clear(&self, content_id: &str);
}

/// In-process store, also used by tests
#[derive(Clone, Default)]
pub struct MemoryProgressStore {
    positions: Arc<RwLock<HashMap<String, Duration>>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.positions.read().await.is_empty()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn saved_position(&self, content_id: &str) -> Option<Duration> {
        self.positions.read().await.get(content_id).copied()
    }

    async fn save_position(&self, content_id: &str, position: Duration) {
        self.positions
            .write()
            .await
            .insert(content_id.to_string(), position);
    }

    async fn clear(&self, content_id: &str) {
        self.positions.write().await.remove(content_id);
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ProgressRecord {
    position_ms: u64,
    updated_at: DateTime<Utc>,
}

/// JSON file backed store, written through on every change
#[derive(Clone)]
pub struct JsonProgressStore {
    path: PathBuf,
    records: Arc<RwLock<HashMap<String, ProgressRecord>>>,
}

impl JsonProgressStore {
    /// Open the store, loading existing records if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };

        tracing::debug!(path = %path.display(), entries = records.len(), "Progress store opened");

        Ok(Self {
            path,
            records: Arc::new(RwLock::new(records)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save_to_disk(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        let content = {
            let records = self.records.read().await;
            serde_json::to_string_pretty(&*records)?
        };
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    async fn persist(&self) {
        if let Err(e) = self.save_to_disk().await {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write progress store");
        }
    }
}

#[async_trait]
impl ProgressStore for JsonProgressStore {
    async fn saved_position(&self, content_id: &str) -> Option<Duration> {
        self.records
            .read()
            .await
            .get(content_id)
            .map(|record| Duration::from_millis(record.position_ms))
    }

    async fn save_position(&self, content_id: &str, position: Duration) {
        let record = ProgressRecord {
            position_ms: position.as_millis() as u64,
            updated_at: Utc::now(),
        };
        self.records
            .write()
            .await
            .insert(content_id.to_string(), record);
        self.persist().await;
    }

    async fn clear(&self, content_id: &str) {
        let removed = self.records.write().await.remove(content_id).is_some();
        if removed {
            self.persist().await;
        }
    }
}
