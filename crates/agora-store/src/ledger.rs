//! Escrow ledger
//!
//! Document shape on disk:
//!
//! ```json
//! {
//!   "locked_funds": { "<contract_id>": { "amount": 100.0, ... } },
//!   "history": [ { "status": "RELEASED", "recipient": "worker_x", ... } ]
//! }
//! ```
//!
//! An entry is addressable by contract id only while locked. Settlement
//! moves it into the append-only history, after which the id no longer
//! resolves and a lock against it fails.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use agora_types::{AgoraError, ContractId, FundsStatus, LedgerEntry, Result, TaskId, WorkerId};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// On-disk ledger document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerDoc {
    #[serde(default)]
    locked_funds: HashMap<String, LedgerEntry>,
    #[serde(default)]
    history: Vec<LedgerEntry>,
}

/// Persistent record of escrowed funds per contract and settlement history
#[derive(Debug)]
pub struct EscrowLedger {
    path: PathBuf,
    doc: Mutex<LedgerDoc>,
}

impl EscrowLedger {
    /// Open the ledger at `path`, initializing an empty document when the
    /// file does not exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| AgoraError::store(path.display().to_string(), e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerDoc::default(),
            Err(e) => return Err(AgoraError::store(path.display().to_string(), e.to_string())),
        };
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    async fn persist(&self, doc: &LedgerDoc) -> Result<()> {
        let raw = serde_json::to_string_pretty(doc)
            .map_err(|e| AgoraError::store(self.path.display().to_string(), e.to_string()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| AgoraError::store(self.path.display().to_string(), e.to_string()))
    }

    /// Lock `amount` for `contract_id`.
    ///
    /// Re-locking a currently locked contract id overwrites the entry; that
    /// is an upstream logic error, surfaced in the log rather than silently
    /// repaired here. Locking a contract id that already settled fails:
    /// settled entries live only in history and are no longer addressable.
    pub async fn lock(&self, contract_id: &ContractId, amount: f64, task_id: &TaskId) -> Result<()> {
        let mut doc = self.doc.lock().await;

        if doc.history.iter().any(|e| &e.contract_id == contract_id) {
            return Err(AgoraError::invalid_record(
                "contract_id",
                format!("contract {} already settled", contract_id),
            ));
        }
        if doc
            .locked_funds
            .insert(
                contract_id.to_string(),
                LedgerEntry::locked(contract_id.clone(), amount, task_id.clone()),
            )
            .is_some()
        {
            warn!(contract = %contract_id, "overwrote existing locked entry");
        }

        self.persist(&doc).await?;
        info!(contract = %contract_id, amount, "funds locked");
        Ok(())
    }

    /// Release locked funds to `recipient`.
    ///
    /// Returns `Ok(false)` when no locked entry exists for the contract id;
    /// callers treat that as a recoverable anomaly, not a crash.
    pub async fn release(&self, contract_id: &ContractId, recipient: &WorkerId) -> Result<bool> {
        let mut doc = self.doc.lock().await;

        let Some(mut entry) = doc.locked_funds.remove(&contract_id.to_string()) else {
            warn!(contract = %contract_id, "release requested with no locked entry");
            return Ok(false);
        };
        entry.status = FundsStatus::Released;
        entry.recipient = Some(recipient.clone());
        doc.history.push(entry);

        self.persist(&doc).await?;
        info!(contract = %contract_id, recipient = %recipient, "funds released");
        Ok(true)
    }

    /// Refund locked funds to the requester. Same shape as release but the
    /// entry is stamped REFUNDED and carries no recipient.
    pub async fn refund(&self, contract_id: &ContractId) -> Result<bool> {
        let mut doc = self.doc.lock().await;

        let Some(mut entry) = doc.locked_funds.remove(&contract_id.to_string()) else {
            warn!(contract = %contract_id, "refund requested with no locked entry");
            return Ok(false);
        };
        entry.status = FundsStatus::Refunded;
        entry.recipient = None;
        doc.history.push(entry);

        self.persist(&doc).await?;
        info!(contract = %contract_id, "funds refunded");
        Ok(true)
    }

    /// Amount currently locked for a contract, if any
    pub async fn locked_amount(&self, contract_id: &ContractId) -> Option<f64> {
        let doc = self.doc.lock().await;
        doc.locked_funds
            .get(&contract_id.to_string())
            .map(|e| e.amount)
    }

    /// Snapshot of the settlement history, oldest first
    pub async fn history(&self) -> Vec<LedgerEntry> {
        self.doc.lock().await.history.clone()
    }
}
