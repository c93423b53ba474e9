//! Broker agent - turns an informal request into a structured task

use std::sync::Arc;

use agora_llm::{GenerationRequest, Generator};
use agora_types::{Result, TaskId, TaskSpec};
use serde::Deserialize;
use tracing::info;

use crate::{gen_error, parse_error};

const SYSTEM: &str = "You are a Task Broker. You analyze loose user requests and convert them \
into structured professional task specifications. Extract or infer description, budget, \
deadline, and objective, testable acceptance criteria; estimate reasonable defaults when \
budget or deadline are unspecified. Output valid JSON only.\n\n\
Schema:\n{\n  \"task_id\": \"uuid\",\n  \"description\": \"...\",\n  \
\"acceptance_criteria\": [\"...\"],\n  \"budget\": 100.0,\n  \"deadline\": \"...\",\n  \
\"required_skills\": [\"...\"]\n}";

/// Raw task shape as returned by the generator; the id may be absent or
/// malformed and gets repaired during conversion.
#[derive(Debug, Deserialize)]
struct TaskDraft {
    #[serde(default)]
    task_id: Option<String>,
    description: String,
    #[serde(default)]
    acceptance_criteria: Vec<String>,
    budget: f64,
    deadline: String,
    #[serde(default)]
    required_skills: Vec<String>,
}

/// The Broker agent
pub struct Broker {
    generator: Arc<dyn Generator>,
}

impl Broker {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Create a task specification from an informal user request
    pub async fn create_task(&self, user_request: &str) -> Result<TaskSpec> {
        let request = GenerationRequest::new(format!(
            "Create a strict task specification for: {}",
            user_request
        ))
        .with_system(SYSTEM)
        .with_json_mode();

        let raw = self
            .generator
            .generate(request)
            .await
            .map_err(|e| gen_error("broker", e))?;
        let draft: TaskDraft = serde_json::from_str(&raw).map_err(|e| parse_error("broker", e))?;

        let task_id = repair_task_id(draft.task_id.as_deref());
        info!(task = %task_id, budget = draft.budget, "task created");

        Ok(TaskSpec {
            task_id,
            description: draft.description,
            acceptance_criteria: draft.acceptance_criteria,
            budget: draft.budget,
            deadline: draft.deadline,
            required_skills: draft.required_skills,
        })
    }
}

/// Parse a generator-supplied task id, minting a fresh one when it is
/// missing, nil, or not a UUID at all.
fn repair_task_id(raw: Option<&str>) -> TaskId {
    raw.and_then(|s| TaskId::parse(s).ok())
        .filter(|id| !id.is_nil())
        .unwrap_or_default()
}
