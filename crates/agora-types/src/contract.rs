//! Contract, execution, and validation records
//!
//! A contract binds one worker to one task at an agreed payment. Its status
//! is driven externally by the settlement state machine; the contract record
//! itself never transitions.

use crate::{ContractId, TaskId, WorkerId};
use serde::{Deserialize, Serialize};

/// Status of a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    /// Drafted, funds not yet locked
    Pending,
    /// Funds locked, work in progress
    Active,
    /// Validation passed, funds released
    Completed,
    /// Validation failed, funds refunded
    Failed,
    /// Under dispute
    Disputed,
}

/// The finalized agreement binding one worker to one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Unique contract ID
    pub contract_id: ContractId,
    /// Task being contracted
    pub task_id: TaskId,
    /// Worker selected by negotiation
    pub selected_worker: WorkerId,
    /// Deliverables, in order
    pub deliverables: Vec<String>,
    /// Acceptance tests, in order
    pub tests: Vec<String>,
    /// Agreed payment. Must equal the negotiated bid price at creation.
    pub payment: f64,
    /// Penalty rules for late delivery or failure
    pub penalty_rules: Vec<String>,
    /// Current status, driven by the settlement state machine
    pub status: ContractStatus,
}

/// Output produced by the worker for a contract. One per contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub task_id: TaskId,
    pub worker_id: WorkerId,
    /// The produced content (code, text, plan)
    pub output: String,
    /// References to produced artifacts
    #[serde(default)]
    pub artifacts: Vec<String>,
}

/// Verdict on an execution result. One per execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub task_id: TaskId,
    /// Whether the work satisfied the contract. This is the sole branch
    /// point for settlement: release on pass, refund on fail.
    pub passed: bool,
    /// Quality score, [0,100] by convention
    pub score: f64,
    /// Issues found by the validator
    #[serde(default)]
    pub issues: Vec<String>,
    /// Whether a retry would be allowed. Carried for completeness; the
    /// settlement gate does not consult it.
    pub retry_allowed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_status_serializes_lowercase() {
        let json = serde_json::to_string(&ContractStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }

    #[test]
    fn test_contract_roundtrip() {
        let contract = Contract {
            contract_id: ContractId::new(),
            task_id: TaskId::new(),
            selected_worker: WorkerId::new("worker_premium"),
            deliverables: vec!["Draft".to_string(), "Final".to_string()],
            tests: vec!["Compiles".to_string()],
            payment: 90.0,
            penalty_rules: vec!["10% per late day".to_string()],
            status: ContractStatus::Pending,
        };

        let json = serde_json::to_string(&contract).unwrap();
        let back: Contract = serde_json::from_str(&json).unwrap();
        assert_eq!(back, contract);
    }
}
