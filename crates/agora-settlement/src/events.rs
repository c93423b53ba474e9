//! Pipeline progress events
//!
//! The event stream is the sole channel through which the core reports
//! progress: an ordered, forward-only sequence, one event per observable
//! step, terminated by a `Final` event carrying overall success or failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline stage an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Broker,
    Workers,
    Negotiator,
    Contract,
    Escrow,
    Executor,
    Validator,
    Reputation,
    Final,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Broker => "BROKER",
            Self::Workers => "WORKERS",
            Self::Negotiator => "NEGOTIATOR",
            Self::Contract => "CONTRACT",
            Self::Escrow => "ESCROW",
            Self::Executor => "EXECUTOR",
            Self::Validator => "VALIDATOR",
            Self::Reputation => "REPUTATION",
            Self::Final => "FINAL",
        };
        write!(f, "{}", s)
    }
}

/// Status tag on an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Stage started
    Active,
    /// A worker is formulating a bid
    Thinking,
    /// A bid arrived
    Bid,
    /// Bid scores computed
    Scoring,
    /// Stage finished normally
    Done,
    /// Non-fatal anomaly (over budget, ledger inconsistency)
    Warning,
    /// Funds released to the worker
    Release,
    /// Funds refunded to the requester
    Refund,
    /// Reputation record updated
    Update,
    /// Terminal: run succeeded
    Success,
    /// Terminal or halting failure
    Failed,
}

/// One structured progress event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub stage: Stage,
    pub status: EventStatus,
    /// Human-readable message for display
    pub message: String,
    /// Optional payload mirroring one of the data-model records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl PipelineEvent {
    pub fn new(stage: Stage, status: EventStatus, message: impl Into<String>) -> Self {
        Self {
            stage,
            status,
            message: message.into(),
            data: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a record payload
    pub fn with_data(mut self, data: &impl Serialize) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }

    /// Whether this event terminates the stream
    pub fn is_final(&self) -> bool {
        self.stage == Stage::Final
    }

    /// Short description for logs
    pub fn summary(&self) -> String {
        format!("[{}/{:?}] {}", self.stage, self.status, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = PipelineEvent::new(Stage::Escrow, EventStatus::Release, "Funds released")
            .with_data(&serde_json::json!({"amount": 60.0}));

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("ESCROW"));
        assert!(json.contains("release"));

        let back: PipelineEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stage, Stage::Escrow);
        assert!(back.data.is_some());
    }

    #[test]
    fn test_final_detection() {
        assert!(PipelineEvent::new(Stage::Final, EventStatus::Success, "done").is_final());
        assert!(!PipelineEvent::new(Stage::Broker, EventStatus::Active, "go").is_final());
    }
}
