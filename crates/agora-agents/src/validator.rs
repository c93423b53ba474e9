//! Validator agent - checks delivered work against the contract

use std::sync::Arc;

use agora_llm::{GenerationRequest, Generator};
use agora_types::{Contract, ExecutionResult, Result, ValidationResult};
use serde::Deserialize;
use tracing::info;

use crate::{gen_error, parse_error};

const SYSTEM: &str = "You are a QA Validator. Strictly compare the execution result against \
the contract deliverables and tests. Be critical. Assign a score from 0-100 and decide \
whether the criteria are met. Output valid JSON only.\n\n\
Schema:\n{\n  \"passed\": true,\n  \"score\": 85.0,\n  \"issues\": [\"...\"],\n  \
\"retry_allowed\": false\n}";

#[derive(Debug, Deserialize)]
struct VerdictDraft {
    passed: bool,
    score: f64,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    retry_allowed: bool,
}

/// The validation agent
pub struct Validator {
    generator: Arc<dyn Generator>,
}

impl Validator {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Validate delivered work against the contract
    pub async fn validate(
        &self,
        contract: &Contract,
        result: &ExecutionResult,
    ) -> Result<ValidationResult> {
        let prompt = format!(
            "Contract Tests: {:?}\nDeliverables: {:?}\n\nWork Output:\n{}\n\n\
Did the worker satisfy the requirements?",
            contract.tests, contract.deliverables, result.output
        );

        let raw = self
            .generator
            .generate(
                GenerationRequest::new(prompt)
                    .with_system(SYSTEM)
                    .with_json_mode(),
            )
            .await
            .map_err(|e| gen_error("validator", e))?;
        let draft: VerdictDraft =
            serde_json::from_str(&raw).map_err(|e| parse_error("validator", e))?;

        info!(
            contract = %contract.contract_id,
            passed = draft.passed,
            score = draft.score,
            "validation verdict"
        );

        Ok(ValidationResult {
            task_id: contract.task_id.clone(),
            passed: draft.passed,
            score: draft.score,
            issues: draft.issues,
            retry_allowed: draft.retry_allowed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_llm::CannedProvider;
    use agora_types::{ContractId, ContractStatus, TaskId, WorkerId};

    fn contract_and_result() -> (Contract, ExecutionResult) {
        let contract = Contract {
            contract_id: ContractId::new(),
            task_id: TaskId::new(),
            selected_worker: WorkerId::new("worker_premium"),
            deliverables: vec!["Poem".to_string()],
            tests: vec!["Rhymes".to_string()],
            payment: 95.0,
            penalty_rules: vec![],
            status: ContractStatus::Active,
        };
        let result = ExecutionResult {
            task_id: contract.task_id.clone(),
            worker_id: contract.selected_worker.clone(),
            output: "A fine poem".to_string(),
            artifacts: vec![],
        };
        (contract, result)
    }

    #[tokio::test]
    async fn test_passing_verdict() {
        let provider = Arc::new(CannedProvider::new());
        provider
            .push(r#"{"passed": true, "score": 92.0, "issues": [], "retry_allowed": false}"#)
            .await;

        let (contract, result) = contract_and_result();
        let verdict = Validator::new(provider)
            .validate(&contract, &result)
            .await
            .unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.score, 92.0);
        assert_eq!(verdict.task_id, contract.task_id);
    }

    #[tokio::test]
    async fn test_failing_verdict_carries_issues() {
        let provider = Arc::new(CannedProvider::new());
        provider
            .push(r#"{"passed": false, "score": 30.0, "issues": ["Does not rhyme"], "retry_allowed": true}"#)
            .await;

        let (contract, result) = contract_and_result();
        let verdict = Validator::new(provider)
            .validate(&contract, &result)
            .await
            .unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.issues.len(), 1);
        assert!(verdict.retry_allowed);
    }
}
