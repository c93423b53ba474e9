//! Worker reputation statistics
//!
//! Raw counters are the persisted truth; success rate and average score are
//! derived on read. Reconstructing an implied success count from a stored
//! floating rate accumulates error over many updates, so the rate is never
//! an input. The serialized document still carries `success_rate` and
//! `avg_score` for readers of the raw file, but deserialization ignores
//! them and rebuilds both from the counters.

use crate::WorkerId;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Running performance statistics for one worker
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkerStats {
    pub worker_id: WorkerId,
    /// Total settled tasks (successes and failures)
    #[serde(default)]
    pub tasks_completed: u64,
    /// Tasks that settled with a release
    #[serde(default)]
    pub successes: u64,
    /// Sum of all validation scores received
    #[serde(default)]
    pub score_total: f64,
    /// Dispute count. Persisted shape only: no update path increments it yet.
    #[serde(default)]
    pub disputes: u64,
}

impl WorkerStats {
    /// Zero-initialized stats for a worker seen for the first time
    pub fn new(worker_id: WorkerId) -> Self {
        Self {
            worker_id,
            tasks_completed: 0,
            successes: 0,
            score_total: 0.0,
            disputes: 0,
        }
    }

    /// Fraction of settled tasks that succeeded, in [0,1]. Zero for a
    /// worker with no history.
    pub fn success_rate(&self) -> f64 {
        if self.tasks_completed == 0 {
            0.0
        } else {
            self.successes as f64 / self.tasks_completed as f64
        }
    }

    /// Exact arithmetic mean of all validation scores. Zero for a worker
    /// with no history.
    pub fn avg_score(&self) -> f64 {
        if self.tasks_completed == 0 {
            0.0
        } else {
            self.score_total / self.tasks_completed as f64
        }
    }

    /// Record one settled task
    pub fn record(&mut self, success: bool, score: f64) {
        self.tasks_completed += 1;
        self.score_total += score;
        if success {
            self.successes += 1;
        }
    }
}

// Counters plus the derived aggregates; the latter are output-only and
// never read back (unknown fields are skipped on deserialization).
impl Serialize for WorkerStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("WorkerStats", 7)?;
        s.serialize_field("worker_id", &self.worker_id)?;
        s.serialize_field("tasks_completed", &self.tasks_completed)?;
        s.serialize_field("successes", &self.successes)?;
        s.serialize_field("score_total", &self.score_total)?;
        s.serialize_field("disputes", &self.disputes)?;
        s.serialize_field("success_rate", &self.success_rate())?;
        s.serialize_field("avg_score", &self.avg_score())?;
        s.end()
    }
}
