//! Contract drafter - turns the winning bid into a signed contract
//!
//! Payment is forced to the negotiated bid price regardless of what the
//! generator proposed; that equality is a core invariant, not content.

use std::sync::Arc;

use agora_llm::{GenerationRequest, Generator};
use agora_types::{Bid, Contract, ContractId, ContractStatus, Result, TaskSpec};
use serde::Deserialize;
use tracing::info;

use crate::{gen_error, parse_error};

const SYSTEM: &str = "You are a Contract Finalizer. Draft a strict contract: split the task \
into 3-5 deliverables, write 2-3 acceptance tests, and 1-2 penalty rules for late delivery \
or failure. Output valid JSON only.\n\n\
Schema:\n{\n  \"contract_id\": \"uuid\",\n  \"deliverables\": [\"...\"],\n  \
\"tests\": [\"...\"],\n  \"penalty_rules\": [\"...\"]\n}";

#[derive(Debug, Deserialize)]
struct ContractDraft {
    #[serde(default)]
    contract_id: Option<String>,
    #[serde(default)]
    deliverables: Vec<String>,
    #[serde(default)]
    tests: Vec<String>,
    #[serde(default)]
    penalty_rules: Vec<String>,
}

/// The contract-drafting agent
pub struct ContractDrafter {
    generator: Arc<dyn Generator>,
}

impl ContractDrafter {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Draft the contract binding the winning bidder to the task
    pub async fn draft(&self, task: &TaskSpec, bid: &Bid) -> Result<Contract> {
        let prompt = format!(
            "Task: {}\nAgreed Bid: {} by {}\nTimeline: {}\n\nCreate the contract.",
            task.description, bid.price, bid.worker_id, bid.timeline
        );

        let raw = self
            .generator
            .generate(
                GenerationRequest::new(prompt)
                    .with_system(SYSTEM)
                    .with_json_mode(),
            )
            .await
            .map_err(|e| gen_error("contract", e))?;
        let draft: ContractDraft =
            serde_json::from_str(&raw).map_err(|e| parse_error("contract", e))?;

        let contract_id = draft
            .contract_id
            .as_deref()
            .and_then(|s| ContractId::parse(s).ok())
            .filter(|id| !id.is_nil())
            .unwrap_or_default();

        info!(contract = %contract_id, payment = bid.price, "contract drafted");

        Ok(Contract {
            contract_id,
            task_id: task.task_id.clone(),
            selected_worker: bid.worker_id.clone(),
            deliverables: draft.deliverables,
            tests: draft.tests,
            payment: bid.price,
            penalty_rules: draft.penalty_rules,
            status: ContractStatus::Pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_llm::CannedProvider;
    use agora_types::{BidId, TaskId, WorkerId};

    fn task_and_bid() -> (TaskSpec, Bid) {
        let task = TaskSpec {
            task_id: TaskId::new(),
            description: "Write a poem".to_string(),
            acceptance_criteria: vec![],
            budget: 100.0,
            deadline: "2026-09-15".to_string(),
            required_skills: vec![],
        };
        let bid = Bid {
            bid_id: BidId::new(),
            task_id: task.task_id.clone(),
            worker_id: WorkerId::new("worker_balanced"),
            price: 85.0,
            timeline: "3 days".to_string(),
            confidence: 0.85,
            plan: "plan".to_string(),
            revises: None,
        };
        (task, bid)
    }

    #[tokio::test]
    async fn test_payment_equals_bid_price() {
        let provider = Arc::new(CannedProvider::new());
        // The generator tries to sneak in a different payment; the drafter
        // ignores it.
        provider
            .push(r#"{"deliverables": ["Draft", "Final"], "tests": ["Rhymes"], "penalty_rules": ["10% per late day"], "payment": 999.0}"#)
            .await;

        let (task, bid) = task_and_bid();
        let drafter = ContractDrafter::new(provider);
        let contract = drafter.draft(&task, &bid).await.unwrap();

        assert_eq!(contract.payment, bid.price);
        assert_eq!(contract.task_id, task.task_id);
        assert_eq!(contract.selected_worker, bid.worker_id);
        assert_eq!(contract.status, ContractStatus::Pending);
        assert!(!contract.contract_id.is_nil());
    }

    #[tokio::test]
    async fn test_contract_id_backfilled_when_missing() {
        let provider = Arc::new(CannedProvider::new());
        provider.push(r#"{"deliverables": ["Work"]}"#).await;

        let (task, bid) = task_and_bid();
        let contract = ContractDrafter::new(provider).draft(&task, &bid).await.unwrap();
        assert!(!contract.contract_id.is_nil());
    }
}
