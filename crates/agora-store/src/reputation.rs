//! Reputation store
//!
//! Document shape on disk: a map from worker id to its stats record. Raw
//! counters are persisted; success rate and average score are derived on
//! read (see `WorkerStats`), so the document must always originate from
//! this store, never hand-edits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use agora_types::{AgoraError, Result, WorkerId, WorkerStats};
use tokio::sync::Mutex;
use tracing::info;

/// Persistent per-worker performance statistics
pub struct ReputationStore {
    path: PathBuf,
    doc: Mutex<HashMap<String, WorkerStats>>,
}

impl ReputationStore {
    /// Open the store at `path`, initializing an empty map when the file
    /// does not exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| AgoraError::store(path.display().to_string(), e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(AgoraError::store(path.display().to_string(), e.to_string())),
        };
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    async fn persist(&self, doc: &HashMap<String, WorkerStats>) -> Result<()> {
        let raw = serde_json::to_string_pretty(doc)
            .map_err(|e| AgoraError::store(self.path.display().to_string(), e.to_string()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| AgoraError::store(self.path.display().to_string(), e.to_string()))
    }

    /// Current stats for a worker, if any have been recorded
    pub async fn stats(&self, worker_id: &WorkerId) -> Option<WorkerStats> {
        self.doc.lock().await.get(worker_id.as_str()).cloned()
    }

    /// Record one settled task for a worker, lazily creating zeroed stats
    /// on first sight. Returns the updated record.
    pub async fn update(
        &self,
        worker_id: &WorkerId,
        success: bool,
        score: f64,
    ) -> Result<WorkerStats> {
        let mut doc = self.doc.lock().await;
        let stats = doc
            .entry(worker_id.as_str().to_string())
            .or_insert_with(|| WorkerStats::new(worker_id.clone()));
        stats.record(success, score);
        let updated = stats.clone();

        self.persist(&doc).await?;
        info!(
            worker = %worker_id,
            success,
            score,
            tasks = updated.tasks_completed,
            "reputation updated"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fresh_store(dir: &tempfile::TempDir) -> ReputationStore {
        ReputationStore::open(dir.path().join("reputation_db.json"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_worker_has_no_stats() {
        let dir = tempfile::tempdir().unwrap();
        let store = fresh_store(&dir).await;
        assert!(store.stats(&WorkerId::new("worker_ghost")).await.is_none());
    }

    #[tokio::test]
    async fn test_mean_and_rate_are_exact() {
        let dir = tempfile::tempdir().unwrap();
        let store = fresh_store(&dir).await;
        let worker = WorkerId::new("worker_balanced");

        store.update(&worker, true, 80.0).await.unwrap();
        store.update(&worker, true, 60.0).await.unwrap();
        let stats = store.update(&worker, false, 100.0).await.unwrap();

        assert_eq!(stats.tasks_completed, 3);
        assert_eq!(stats.avg_score(), 80.0);
        assert_eq!(stats.success_rate(), 2.0 / 3.0);
    }

    #[tokio::test]
    async fn test_counters_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reputation_db.json");
        let worker = WorkerId::new("worker_premium");

        {
            let store = ReputationStore::open(&path).await.unwrap();
            store.update(&worker, true, 95.0).await.unwrap();
        }

        let reopened = ReputationStore::open(&path).await.unwrap();
        let stats = reopened.update(&worker, false, 45.0).await.unwrap();
        assert_eq!(stats.tasks_completed, 2);
        assert_eq!(stats.avg_score(), 70.0);
        assert_eq!(stats.success_rate(), 0.5);
    }
}
