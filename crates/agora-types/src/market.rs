//! Task and bid records
//!
//! A `TaskSpec` is immutable once the broker has created it. Bids are
//! immutable too: the negotiator never rewrites a bid in place, it issues a
//! new revision linked through `revises` so audit trails keep every price
//! the worker ever quoted.

use crate::{BidId, TaskId, WorkerId};
use serde::{Deserialize, Serialize};

/// A structured unit of work with budget, deadline, and acceptance criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Unique identifier for the task request
    pub task_id: TaskId,
    /// Detailed description of the task
    pub description: String,
    /// Specific criteria to verify success, in order
    pub acceptance_criteria: Vec<String>,
    /// Maximum budget for the task (positive)
    pub budget: f64,
    /// Deadline, opaque to the core
    pub deadline: String,
    /// Required skills
    #[serde(default)]
    pub required_skills: Vec<String>,
}

/// A worker's priced, timed proposal to perform a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// Unique ID for this bid revision
    pub bid_id: BidId,
    /// Task this bid answers
    pub task_id: TaskId,
    /// Worker who made the bid
    pub worker_id: WorkerId,
    /// Proposed price (positive)
    pub price: f64,
    /// Proposed timeline, opaque to the core
    pub timeline: String,
    /// Self-reported confidence, [0,1] by convention. Not clamped: the
    /// scorer uses it as-is and out-of-range values propagate.
    pub confidence: f64,
    /// High-level execution plan
    pub plan: String,
    /// Prior revision this bid supersedes, set by the negotiator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revises: Option<BidId>,
}

impl Bid {
    /// Create the next revision of this bid at a new price, annotating the
    /// plan with the negotiation step
    pub fn revised(&self, new_price: f64, annotation: impl AsRef<str>) -> Self {
        Self {
            bid_id: BidId::new(),
            task_id: self.task_id.clone(),
            worker_id: self.worker_id.clone(),
            price: new_price,
            timeline: self.timeline.clone(),
            confidence: self.confidence,
            plan: format!("{} {}", self.plan, annotation.as_ref()),
            revises: Some(self.bid_id.clone()),
        }
    }
}
