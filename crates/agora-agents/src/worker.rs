//! Worker agents - evaluate tasks and formulate bids
//!
//! Each worker has a persona shaping its pricing and confidence. The bid's
//! `task_id` and `worker_id` are always forced to the authoritative values,
//! whatever the generator echoed back.

use std::sync::Arc;

use agora_llm::{GenerationRequest, Generator};
use agora_types::{Bid, BidId, Result, TaskSpec, WorkerId};
use serde::Deserialize;
use tracing::info;

use crate::{gen_error, parse_error};

/// Raw bid shape as returned by the generator
#[derive(Debug, Deserialize)]
struct BidDraft {
    #[serde(default)]
    bid_id: Option<String>,
    price: f64,
    timeline: String,
    confidence: f64,
    plan: String,
}

/// A worker agent with a pricing persona
pub struct Worker {
    worker_id: WorkerId,
    persona: String,
    generator: Arc<dyn Generator>,
}

impl Worker {
    pub fn new(
        worker_id: impl Into<WorkerId>,
        persona: impl Into<String>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            persona: persona.into(),
            generator,
        }
    }

    pub fn worker_id(&self) -> &WorkerId {
        &self.worker_id
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Evaluate a task and produce a bid
    pub async fn generate_bid(&self, task: &TaskSpec) -> Result<Bid> {
        let system = format!(
            "You are a Worker Agent with the following persona: {}. Analyze the task \
specification and create a realistic bid reflecting your persona. Output valid JSON only.\n\n\
Schema:\n{{\n  \"bid_id\": \"uuid\",\n  \"price\": 80.0,\n  \"timeline\": \"...\",\n  \
\"confidence\": 0.8,\n  \"plan\": \"...\"\n}}",
            self.persona
        );
        let prompt = format!(
            "Review this task:\nDescription: {}\nBudget: {}\nDeadline: {}\nCriteria: {:?}\n\n\
Generate a bid for this task.",
            task.description, task.budget, task.deadline, task.acceptance_criteria
        );

        let raw = self
            .generator
            .generate(
                GenerationRequest::new(prompt)
                    .with_system(system)
                    .with_json_mode(),
            )
            .await
            .map_err(|e| gen_error("worker", e))?;
        let draft: BidDraft = serde_json::from_str(&raw).map_err(|e| parse_error("worker", e))?;

        let bid_id = draft
            .bid_id
            .as_deref()
            .and_then(|s| BidId::parse(s).ok())
            .filter(|id| !id.is_nil())
            .unwrap_or_default();

        info!(worker = %self.worker_id, price = draft.price, "bid formulated");

        Ok(Bid {
            bid_id,
            task_id: task.task_id.clone(),
            worker_id: self.worker_id.clone(),
            price: draft.price,
            timeline: draft.timeline,
            confidence: draft.confidence,
            plan: draft.plan,
            revises: None,
        })
    }
}

/// The default worker team: three personas spanning the price/quality range
pub fn worker_team(generator: Arc<dyn Generator>) -> Vec<Worker> {
    vec![
        Worker::new(
            "worker_fast_cheap",
            "Fast and Cheap. You prioritize speed and low cost. You might cut corners. \
You charge 50-70% of budget.",
            generator.clone(),
        ),
        Worker::new(
            "worker_premium",
            "Premium and Thorough. You are expensive and take your time, but produce high \
quality. You charge 90-110% of budget.",
            generator.clone(),
        ),
        Worker::new(
            "worker_balanced",
            "Balanced and Reliable. You offer a fair price for good work. You charge \
75-90% of budget.",
            generator,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_llm::CannedProvider;
    use agora_types::TaskId;

    fn task() -> TaskSpec {
        TaskSpec {
            task_id: TaskId::new(),
            description: "Write a poem".to_string(),
            acceptance_criteria: vec!["Rhymes".to_string()],
            budget: 100.0,
            deadline: "2026-09-15".to_string(),
            required_skills: vec![],
        }
    }

    #[tokio::test]
    async fn test_bid_ids_are_forced_to_authoritative_values() {
        let provider = Arc::new(CannedProvider::new());
        provider
            .push(r#"{"price": 60.0, "timeline": "2 days", "confidence": 0.8, "plan": "Draft and deliver."}"#)
            .await;

        let worker = Worker::new("worker_fast_cheap", "Fast and Cheap.", provider);
        let task = task();
        let bid = worker.generate_bid(&task).await.unwrap();

        assert_eq!(bid.task_id, task.task_id);
        assert_eq!(bid.worker_id, WorkerId::new("worker_fast_cheap"));
        assert!(!bid.bid_id.is_nil());
        assert_eq!(bid.price, 60.0);
        assert!(bid.revises.is_none());
    }

    #[tokio::test]
    async fn test_default_team_has_three_personas() {
        let provider: Arc<dyn Generator> = Arc::new(CannedProvider::new());
        let team = worker_team(provider);
        assert_eq!(team.len(), 3);
        assert_eq!(team[0].worker_id(), &WorkerId::new("worker_fast_cheap"));
        assert_eq!(team[1].worker_id(), &WorkerId::new("worker_premium"));
        assert_eq!(team[2].worker_id(), &WorkerId::new("worker_balanced"));
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let provider = Arc::new(CannedProvider::new()); // empty queue
        let worker = Worker::new("worker_balanced", "Balanced.", provider);
        let err = worker.generate_bid(&task()).await.unwrap_err();
        assert_eq!(err.error_code(), "GENERATION_FAILED");
    }
}
