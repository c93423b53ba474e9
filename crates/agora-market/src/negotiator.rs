//! Price negotiation
//!
//! Selects the highest-scoring bid and, when it is over budget, runs up to
//! three rounds of 10% price reduction clamped at the budget. Each round
//! produces a new bid revision rather than mutating the original, so the
//! full price history survives in the revision chain.

use agora_types::{AgoraError, Bid, Result, TaskSpec, WorkerStats};
use tracing::{debug, warn};

use crate::scorer::rank_bids;

/// Maximum price-reduction rounds
pub const MAX_ROUNDS: u32 = 3;

/// Per-round reduction factor asked of the worker
pub const REDUCTION_FACTOR: f64 = 0.90;

/// Result of negotiating a task's bid set
#[derive(Debug, Clone)]
pub struct NegotiationOutcome {
    /// The bid the pipeline proceeds with (last revision)
    pub winning_bid: Bid,
    /// Score of the winning bid at selection time
    pub score: f64,
    /// Every revision created during negotiation, oldest first, starting
    /// with the worker's original bid
    pub revisions: Vec<Bid>,
    /// Rounds actually run
    pub rounds: u32,
    /// True when the final price still exceeds the budget. Soft failure:
    /// the caller proceeds but surfaces a warning.
    pub over_budget: bool,
}

/// Negotiate a winner from `bids` for `task`.
///
/// Fails with `NoBids` on an empty bid set. Never reduces a price below the
/// task budget: each round sets `price = max(price * 0.90, budget)` and
/// stops as soon as the price reaches the budget.
pub fn negotiate<'a, F>(task: &TaskSpec, bids: &[Bid], stats_for: F) -> Result<NegotiationOutcome>
where
    F: Fn(&Bid) -> Option<&'a WorkerStats>,
{
    let ranked = rank_bids(bids, task.budget, stats_for);
    let best = ranked.first().ok_or_else(|| AgoraError::NoBids {
        task_id: task.task_id.to_string(),
    })?;

    let mut revisions = vec![best.bid.clone()];
    let mut current = best.bid.clone();
    let mut rounds = 0;

    while current.price > task.budget && rounds < MAX_ROUNDS {
        rounds += 1;
        let target = current.price * REDUCTION_FACTOR;
        let new_price = target.max(task.budget);
        debug!(
            worker = %current.worker_id,
            round = rounds,
            price = new_price,
            "negotiation round"
        );
        current = current.revised(
            new_price,
            format!("[Negotiated: dropped price to {}]", new_price),
        );
        revisions.push(current.clone());
    }

    let over_budget = current.price > task.budget;
    if over_budget {
        warn!(
            task = %task.task_id,
            price = current.price,
            budget = task.budget,
            "negotiation finished over budget"
        );
    }

    Ok(NegotiationOutcome {
        score: best.score,
        winning_bid: current,
        revisions,
        rounds,
        over_budget,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::{BidId, TaskId, WorkerId};

    fn task(budget: f64) -> TaskSpec {
        TaskSpec {
            task_id: TaskId::new(),
            description: "Write a short poem about coding".to_string(),
            acceptance_criteria: vec!["Rhymes".to_string()],
            budget,
            deadline: "2026-09-15".to_string(),
            required_skills: vec![],
        }
    }

    fn bid(worker: &str, price: f64, confidence: f64) -> Bid {
        Bid {
            bid_id: BidId::new(),
            task_id: TaskId::new(),
            worker_id: WorkerId::new(worker),
            price,
            timeline: "2 days".to_string(),
            confidence,
            plan: "Draft, revise, deliver.".to_string(),
            revises: None,
        }
    }

    #[test]
    fn test_empty_bid_set_fails() {
        let err = negotiate(&task(100.0), &[], |_| None).unwrap_err();
        assert_eq!(err.error_code(), "NO_BIDS");
    }

    #[test]
    fn test_within_budget_bid_returned_unrevised() {
        let b = bid("worker_fast_cheap", 60.0, 0.8);
        let outcome = negotiate(&task(100.0), &[b.clone()], |_| None).unwrap();

        assert_eq!(outcome.winning_bid.bid_id, b.bid_id);
        assert_eq!(outcome.rounds, 0);
        assert_eq!(outcome.revisions.len(), 1);
        assert!(!outcome.over_budget);
    }

    #[test]
    fn test_reduction_clamps_at_budget() {
        // 105 * 0.9 = 94.5 < 100, so round one clamps to exactly the budget
        let b = bid("worker_premium", 105.0, 0.9);
        let outcome = negotiate(&task(100.0), &[b], |_| None).unwrap();

        assert_eq!(outcome.winning_bid.price, 100.0);
        assert_eq!(outcome.rounds, 1);
        assert!(!outcome.over_budget);
    }

    #[test]
    fn test_three_rounds_then_soft_failure() {
        // 200 * 0.9^3 = 145.8, still over a 100 budget
        let b = bid("worker_premium", 200.0, 0.9);
        let outcome = negotiate(&task(100.0), &[b], |_| None).unwrap();

        assert_eq!(outcome.rounds, MAX_ROUNDS);
        assert!(outcome.over_budget);
        let expected = 200.0 * 0.9 * 0.9 * 0.9;
        assert!((outcome.winning_bid.price - expected).abs() < 1e-9);
        // Never below budget via reduction
        assert!(outcome.winning_bid.price >= 100.0);
    }

    #[test]
    fn test_revision_chain_is_linked() {
        let b = bid("worker_premium", 150.0, 0.9);
        let outcome = negotiate(&task(100.0), &[b.clone()], |_| None).unwrap();

        // 150 -> 135 -> 121.5 -> 109.35: three rounds, still over budget
        assert!(outcome.over_budget);
        assert_eq!(outcome.revisions.len(), 4);
        assert!(outcome.revisions[0].revises.is_none());
        for pair in outcome.revisions.windows(2) {
            assert_eq!(pair[1].revises, Some(pair[0].bid_id.clone()));
            assert!(pair[1].price < pair[0].price);
        }
        // The original bid was never touched
        assert_eq!(outcome.revisions[0].price, 150.0);
        assert_eq!(b.price, 150.0);
    }

    #[test]
    fn test_cheapest_bid_wins_at_equal_confidence() {
        let bids = vec![
            bid("worker_fast_cheap", 60.0, 0.8),
            bid("worker_balanced", 95.0, 0.8),
            bid("worker_premium", 150.0, 0.8),
        ];
        let outcome = negotiate(&task(100.0), &bids, |_| None).unwrap();
        assert_eq!(outcome.winning_bid.worker_id, WorkerId::new("worker_fast_cheap"));
        assert_eq!(outcome.winning_bid.price, 60.0);
    }
}
