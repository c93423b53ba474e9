//! Marketplace pipeline
//!
//! Wires the collaborator agents, the market, and the escrow engine into a
//! single run: request, bids, negotiation, contract, escrow, execution,
//! validation, settlement, reputation. Progress is yielded lazily as
//! `PipelineEvent`s; nothing executes until the stream is polled, and the
//! stream always ends with a `Final` event.

use std::collections::HashMap;
use std::sync::Arc;

use agora_agents::{worker_team, Broker, ContractDrafter, Executor, Validator, Worker};
use agora_llm::Generator;
use agora_market::{negotiate, rank_bids};
use agora_store::{EscrowLedger, ReputationStore};
use agora_types::{AgoraError, Bid, ContractStatus, WorkerStats};
use async_stream::stream;
use futures::future::join_all;
use futures::{Stream, StreamExt};
use serde_json::json;
use tracing::info;

use crate::escrow::{EscrowEngine, SettlementOutcome};
use crate::events::{EventStatus, PipelineEvent, Stage};
use crate::phase::TaskPhase;

/// The full marketplace run, from loose request to settled contract
pub struct MarketPipeline {
    broker: Broker,
    workers: Vec<Worker>,
    drafter: ContractDrafter,
    executor: Executor,
    validator: Validator,
    escrow: EscrowEngine,
}

/// Drained result of one pipeline run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub events: Vec<PipelineEvent>,
    pub succeeded: bool,
}

/// A collaborator failure halts the run: emit the stage failure and the
/// terminal event.
fn halt(stage: Stage, err: &AgoraError) -> [PipelineEvent; 2] {
    [
        PipelineEvent::new(stage, EventStatus::Failed, err.to_string()),
        PipelineEvent::new(Stage::Final, EventStatus::Failed, "Marketplace run halted"),
    ]
}

impl MarketPipeline {
    pub fn new(
        generator: Arc<dyn Generator>,
        ledger: Arc<EscrowLedger>,
        reputation: Arc<ReputationStore>,
    ) -> Self {
        Self {
            broker: Broker::new(generator.clone()),
            workers: worker_team(generator.clone()),
            drafter: ContractDrafter::new(generator.clone()),
            executor: Executor::new(generator.clone()),
            validator: Validator::new(generator),
            escrow: EscrowEngine::new(ledger, reputation),
        }
    }

    /// Run the marketplace for one request, yielding progress events.
    pub fn run_stream(
        &self,
        user_request: impl Into<String>,
    ) -> impl Stream<Item = PipelineEvent> + '_ {
        let user_request = user_request.into();
        stream! {
            let mut phase = TaskPhase::Created;

            // Broker: informal request to structured task
            yield PipelineEvent::new(
                Stage::Broker,
                EventStatus::Active,
                "Broker analyzing request...",
            );
            let task = match self.broker.create_task(&user_request).await {
                Ok(task) => task,
                Err(e) => {
                    phase.advance(TaskPhase::Failed);
                    for ev in halt(Stage::Broker, &e) {
                        yield ev;
                    }
                    return;
                }
            };
            yield PipelineEvent::new(
                Stage::Broker,
                EventStatus::Done,
                format!("Task created: {} (budget ${})", task.description, task.budget),
            )
            .with_data(&task);

            // Workers: concurrent bid fan-out
            phase.advance(TaskPhase::Bidding);
            yield PipelineEvent::new(
                Stage::Workers,
                EventStatus::Active,
                "Broadcasting task to worker network...",
            );
            for worker in &self.workers {
                yield PipelineEvent::new(
                    Stage::Workers,
                    EventStatus::Thinking,
                    format!("{} evaluating task...", worker.worker_id()),
                );
            }
            let results = join_all(self.workers.iter().map(|w| w.generate_bid(&task))).await;
            let mut bids: Vec<Bid> = Vec::with_capacity(results.len());
            for result in results {
                match result {
                    Ok(bid) => bids.push(bid),
                    Err(e) => {
                        phase.advance(TaskPhase::Failed);
                        for ev in halt(Stage::Workers, &e) {
                            yield ev;
                        }
                        return;
                    }
                }
            }
            for bid in &bids {
                yield PipelineEvent::new(
                    Stage::Workers,
                    EventStatus::Bid,
                    format!(
                        "{} bids ${} (confidence {:.0}%)",
                        bid.worker_id,
                        bid.price,
                        bid.confidence * 100.0
                    ),
                )
                .with_data(bid);
            }

            // Negotiator: score, select, haggle
            yield PipelineEvent::new(
                Stage::Negotiator,
                EventStatus::Active,
                "Scoring bids against budget and reputation...",
            );
            let mut stats_map: HashMap<String, WorkerStats> = HashMap::new();
            for bid in &bids {
                if let Some(stats) = self.escrow.reputation().stats(&bid.worker_id).await {
                    stats_map.insert(bid.worker_id.as_str().to_string(), stats);
                }
            }
            let ranked = rank_bids(&bids, task.budget, |b| stats_map.get(b.worker_id.as_str()));
            let table: Vec<_> = ranked
                .iter()
                .map(|s| {
                    json!({
                        "worker": s.bid.worker_id,
                        "price": s.bid.price,
                        "score": s.score,
                    })
                })
                .collect();
            yield PipelineEvent::new(Stage::Negotiator, EventStatus::Scoring, "Bids scored")
                .with_data(&table);

            let outcome =
                match negotiate(&task, &bids, |b| stats_map.get(b.worker_id.as_str())) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        phase.advance(TaskPhase::Failed);
                        for ev in halt(Stage::Negotiator, &e) {
                            yield ev;
                        }
                        return;
                    }
                };
            for (round, revision) in outcome.revisions.iter().skip(1).enumerate() {
                yield PipelineEvent::new(
                    Stage::Negotiator,
                    EventStatus::Active,
                    format!(
                        "Round {}: {} drops price to ${:.2}",
                        round + 1,
                        revision.worker_id,
                        revision.price
                    ),
                );
            }
            if outcome.over_budget {
                let over = AgoraError::BudgetExceeded {
                    price: outcome.winning_bid.price,
                    budget: task.budget,
                };
                yield PipelineEvent::new(Stage::Negotiator, EventStatus::Warning, over.to_string());
            }
            let winner = outcome.winning_bid;
            phase.advance(TaskPhase::Negotiated);
            yield PipelineEvent::new(
                Stage::Negotiator,
                EventStatus::Done,
                format!(
                    "Winner: {} at ${} (score {:.3})",
                    winner.worker_id, winner.price, outcome.score
                ),
            )
            .with_data(&winner);

            // Contract: bind the winner
            yield PipelineEvent::new(
                Stage::Contract,
                EventStatus::Active,
                "Drafting contract...",
            );
            let mut contract = match self.drafter.draft(&task, &winner).await {
                Ok(contract) => contract,
                Err(e) => {
                    phase.advance(TaskPhase::Failed);
                    for ev in halt(Stage::Contract, &e) {
                        yield ev;
                    }
                    return;
                }
            };
            contract.status = ContractStatus::Active;
            phase.advance(TaskPhase::Contracted);
            yield PipelineEvent::new(
                Stage::Contract,
                EventStatus::Done,
                format!("Contract {} signed", contract.contract_id),
            )
            .with_data(&contract);

            // Escrow: lock the payment
            yield PipelineEvent::new(
                Stage::Escrow,
                EventStatus::Active,
                "Locking funds in escrow...",
            );
            if let Err(e) = self.escrow.lock_for(&contract).await {
                phase.advance(TaskPhase::Failed);
                for ev in halt(Stage::Escrow, &e) {
                    yield ev;
                }
                return;
            }
            phase.advance(TaskPhase::Escrowed);
            yield PipelineEvent::new(
                Stage::Escrow,
                EventStatus::Done,
                format!("${} locked in escrow", contract.payment),
            );

            // Executor: do the work
            yield PipelineEvent::new(
                Stage::Executor,
                EventStatus::Active,
                format!("{} executing contract...", contract.selected_worker),
            );
            let work = match self.executor.execute(&contract).await {
                Ok(work) => work,
                Err(e) => {
                    phase.advance(TaskPhase::Failed);
                    for ev in halt(Stage::Executor, &e) {
                        yield ev;
                    }
                    return;
                }
            };
            phase.advance(TaskPhase::Executed);
            yield PipelineEvent::new(
                Stage::Executor,
                EventStatus::Done,
                "Work delivered",
            )
            .with_data(&work);

            // Validator: verdict on the delivered work
            yield PipelineEvent::new(
                Stage::Validator,
                EventStatus::Active,
                "Validating deliverables against contract...",
            );
            let verdict = match self.validator.validate(&contract, &work).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    phase.advance(TaskPhase::Failed);
                    for ev in halt(Stage::Validator, &e) {
                        yield ev;
                    }
                    return;
                }
            };
            phase.advance(TaskPhase::Validated);
            let verdict_status = if verdict.passed {
                EventStatus::Done
            } else {
                EventStatus::Warning
            };
            yield PipelineEvent::new(
                Stage::Validator,
                verdict_status,
                format!(
                    "Validation {}: score {}/100",
                    if verdict.passed { "passed" } else { "failed" },
                    verdict.score
                ),
            )
            .with_data(&verdict);

            // Settlement: release or refund, then reputation
            let settlement = match self.escrow.settle(&contract, &verdict).await {
                Ok(settlement) => settlement,
                Err(e) => {
                    phase.advance(TaskPhase::Failed);
                    for ev in halt(Stage::Escrow, &e) {
                        yield ev;
                    }
                    return;
                }
            };
            match settlement.outcome {
                SettlementOutcome::Released => {
                    yield PipelineEvent::new(
                        Stage::Escrow,
                        EventStatus::Release,
                        format!(
                            "${} released to {}",
                            contract.payment, contract.selected_worker
                        ),
                    );
                }
                SettlementOutcome::Refunded => {
                    yield PipelineEvent::new(
                        Stage::Escrow,
                        EventStatus::Refund,
                        format!("${} refunded to requester", contract.payment),
                    );
                }
            }
            if let Some(anomaly) = &settlement.anomaly {
                yield PipelineEvent::new(Stage::Escrow, EventStatus::Warning, anomaly.to_string());
            }
            yield PipelineEvent::new(
                Stage::Reputation,
                EventStatus::Update,
                format!(
                    "{}: {} tasks, {:.0}% success, avg score {:.1}",
                    contract.selected_worker,
                    settlement.stats.tasks_completed,
                    settlement.stats.success_rate() * 100.0,
                    settlement.stats.avg_score()
                ),
            )
            .with_data(&settlement.stats);

            phase.advance(TaskPhase::Settled(settlement.outcome));
            info!(task = %task.task_id, contract = %contract.contract_id, ?phase, "run finished");
            if verdict.passed {
                yield PipelineEvent::new(
                    Stage::Final,
                    EventStatus::Success,
                    "Task completed and settled",
                );
            } else {
                yield PipelineEvent::new(
                    Stage::Final,
                    EventStatus::Failed,
                    "Task failed validation; funds refunded",
                );
            }
        }
    }

    /// Run the pipeline to completion, draining the event stream.
    pub async fn run(&self, user_request: impl Into<String>) -> RunReport {
        let stream = self.run_stream(user_request);
        let events: Vec<PipelineEvent> = stream.collect().await;
        let succeeded = events
            .last()
            .map(|e| e.is_final() && e.status == EventStatus::Success)
            .unwrap_or(false);
        RunReport { events, succeeded }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_llm::CannedProvider;

    async fn pipeline_with(provider: Arc<CannedProvider>, dir: &tempfile::TempDir) -> MarketPipeline {
        let ledger = Arc::new(
            EscrowLedger::open(dir.path().join("escrow_ledger.json"))
                .await
                .unwrap(),
        );
        let reputation = Arc::new(
            ReputationStore::open(dir.path().join("reputation_db.json"))
                .await
                .unwrap(),
        );
        MarketPipeline::new(provider, ledger, reputation)
    }

    #[tokio::test]
    async fn test_broker_failure_halts_with_final_event() {
        let dir = tempfile::tempdir().unwrap();
        // Empty queue: the broker's generation fails immediately.
        let pipeline = pipeline_with(Arc::new(CannedProvider::new()), &dir).await;

        let report = pipeline.run("write a poem").await;
        assert!(!report.succeeded);

        let last = report.events.last().unwrap();
        assert!(last.is_final());
        assert_eq!(last.status, EventStatus::Failed);

        let failures: Vec<_> = report
            .events
            .iter()
            .filter(|e| e.status == EventStatus::Failed)
            .collect();
        assert_eq!(failures[0].stage, Stage::Broker);
    }

    #[tokio::test]
    async fn test_worker_failure_halts_before_scoring() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(CannedProvider::new());
        // Only the broker response is queued; every bid generation fails.
        provider
            .push(r#"{"description": "Write a poem", "budget": 100.0, "deadline": "soon"}"#)
            .await;
        let pipeline = pipeline_with(provider, &dir).await;

        let report = pipeline.run("write a poem").await;
        assert!(!report.succeeded);
        assert!(report
            .events
            .iter()
            .any(|e| e.stage == Stage::Workers && e.status == EventStatus::Failed));
        assert!(!report
            .events
            .iter()
            .any(|e| e.status == EventStatus::Scoring));
    }

    #[tokio::test]
    async fn test_over_budget_winner_surfaces_budget_warning() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(CannedProvider::new());
        provider
            .push(r#"{"description": "Big job", "budget": 100.0, "deadline": "soon"}"#)
            .await;
        // Every bid so far over budget that three reduction rounds cannot
        // close the gap (200 * 0.9^3 = 145.8).
        for _ in 0..3 {
            provider
                .push(r#"{"price": 200.0, "timeline": "1 week", "confidence": 0.8, "plan": "Do it."}"#)
                .await;
        }
        let pipeline = pipeline_with(provider, &dir).await;

        let report = pipeline.run("a very big job").await;
        let warning = report
            .events
            .iter()
            .find(|e| e.stage == Stage::Negotiator && e.status == EventStatus::Warning)
            .unwrap();
        assert!(warning.message.contains("exceeds budget"));
    }

    #[tokio::test]
    async fn test_stream_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with(Arc::new(CannedProvider::new()), &dir).await;

        // Building the stream must not run the broker; only polling does.
        let stream = pipeline.run_stream("write a poem");
        drop(stream);

        let report = pipeline.run("write a poem").await;
        assert!(!report.events.is_empty());
    }
}
