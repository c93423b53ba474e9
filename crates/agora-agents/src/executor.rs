//! Executor agent - performs the contracted work
//!
//! The output is free text, not JSON: whatever the generator produces is
//! the deliverable.

use std::sync::Arc;

use agora_llm::{GenerationRequest, Generator};
use agora_types::{Contract, ExecutionResult, Result};
use tracing::info;

use crate::gen_error;

const SYSTEM: &str = "You are a Task Executor. Read the contract deliverables carefully and \
generate the required output (code, text, plan).";

/// The execution agent
pub struct Executor {
    generator: Arc<dyn Generator>,
}

impl Executor {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Execute the contract and return the produced work
    pub async fn execute(&self, contract: &Contract) -> Result<ExecutionResult> {
        let prompt = format!(
            "Execute this contract:\nDeliverables: {:?}\n\nGenerate the actual content required.",
            contract.deliverables
        );

        let output = self
            .generator
            .generate(GenerationRequest::new(prompt).with_system(SYSTEM))
            .await
            .map_err(|e| gen_error("executor", e))?;

        info!(contract = %contract.contract_id, bytes = output.len(), "work complete");

        Ok(ExecutionResult {
            task_id: contract.task_id.clone(),
            worker_id: contract.selected_worker.clone(),
            output,
            artifacts: vec!["result.txt".to_string()],
        })
    }
}
