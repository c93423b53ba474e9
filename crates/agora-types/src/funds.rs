//! Escrow ledger entries
//!
//! A ledger entry is addressable by contract id only while funds are locked.
//! On release or refund it moves to an append-only history list and the
//! contract id stops resolving - a lock against a settled contract id must
//! fail deterministically.

use crate::{ContractId, TaskId, WorkerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of escrowed funds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundsStatus {
    /// Funds held pending settlement
    Locked,
    /// Funds paid out to the worker
    Released,
    /// Funds returned to the requester
    Refunded,
}

impl FundsStatus {
    /// Whether this is a terminal (settled) status
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Released | Self::Refunded)
    }
}

/// A single escrow record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Contract the funds are held for
    pub contract_id: ContractId,
    /// Escrowed amount
    pub amount: f64,
    /// Task the contract belongs to
    pub task_id: TaskId,
    /// Current status
    pub status: FundsStatus,
    /// Recipient, stamped on release only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<WorkerId>,
    /// When the funds were locked
    pub locked_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a freshly locked entry
    pub fn locked(contract_id: ContractId, amount: f64, task_id: TaskId) -> Self {
        Self {
            contract_id,
            amount,
            task_id,
            status: FundsStatus::Locked,
            recipient: None,
            locked_at: Utc::now(),
        }
    }
}
