//! Escrow engine - locks contract funds and settles on validation
//!
//! The validation gate is the sole branch point for the settlement
//! outcome: pass releases to the worker, fail refunds the requester, and
//! reputation records the same verdict. `ValidationResult.retry_allowed`
//! is intentionally not consulted here - there is no re-execution loop.

use std::sync::Arc;

use agora_store::{EscrowLedger, ReputationStore};
use agora_types::{AgoraError, Contract, Result, ValidationResult, WorkerStats};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Terminal disposition of escrowed funds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    /// Funds paid to the worker
    Released,
    /// Funds returned to the requester
    Refunded,
}

/// Result of settling one contract
#[derive(Debug, Clone)]
pub struct Settlement {
    pub outcome: SettlementOutcome,
    /// `FundsNotFound` when the ledger had no locked entry for the
    /// contract - a recoverable anomaly the caller surfaces as a warning,
    /// not a failure of the settlement itself.
    pub anomaly: Option<AgoraError>,
    /// Worker stats after the reputation update
    pub stats: WorkerStats,
}

/// Drives ledger and reputation side effects for the settlement machine
pub struct EscrowEngine {
    ledger: Arc<EscrowLedger>,
    reputation: Arc<ReputationStore>,
}

impl EscrowEngine {
    pub fn new(ledger: Arc<EscrowLedger>, reputation: Arc<ReputationStore>) -> Self {
        Self { ledger, reputation }
    }

    pub fn ledger(&self) -> &Arc<EscrowLedger> {
        &self.ledger
    }

    pub fn reputation(&self) -> &Arc<ReputationStore> {
        &self.reputation
    }

    /// Lock the contract payment into escrow
    pub async fn lock_for(&self, contract: &Contract) -> Result<()> {
        self.ledger
            .lock(&contract.contract_id, contract.payment, &contract.task_id)
            .await
    }

    /// Settle the contract according to the validation verdict
    pub async fn settle(
        &self,
        contract: &Contract,
        validation: &ValidationResult,
    ) -> Result<Settlement> {
        let (outcome, ledger_ok) = if validation.passed {
            let ok = self
                .ledger
                .release(&contract.contract_id, &contract.selected_worker)
                .await?;
            (SettlementOutcome::Released, ok)
        } else {
            let ok = self.ledger.refund(&contract.contract_id).await?;
            (SettlementOutcome::Refunded, ok)
        };

        let anomaly = (!ledger_ok).then(|| AgoraError::FundsNotFound {
            contract_id: contract.contract_id.to_string(),
        });
        if let Some(anomaly) = &anomaly {
            warn!(contract = %contract.contract_id, %anomaly, "settlement anomaly");
        }

        let stats = self
            .reputation
            .update(&contract.selected_worker, validation.passed, validation.score)
            .await?;

        info!(
            contract = %contract.contract_id,
            worker = %contract.selected_worker,
            ?outcome,
            "contract settled"
        );

        Ok(Settlement {
            outcome,
            anomaly,
            stats,
        })
    }
}
