//! Bid scoring
//!
//! Deterministic weighted sum over price, reputation, and confidence.
//! Weights are fixed constants, not configuration.

use agora_types::{Bid, WorkerStats};

const W_PRICE: f64 = 0.4;
const W_REP: f64 = 0.3;
const W_CONF: f64 = 0.3;

/// A bid together with its computed score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredBid {
    pub bid: Bid,
    pub score: f64,
}

/// Score a single bid against the task budget and the bidder's history.
///
/// Price component: `min(budget / max(price, 1.0), 2.0) / 2.0` - a bid at
/// budget scores 0.5, a bid at half budget scores the maximum 1.0, anything
/// cheaper is capped. Reputation component: average validation score over
/// 100 when the worker has history, otherwise a neutral 0.5 so new workers
/// are neither penalized nor favored. Confidence is the bid's own
/// self-reported value, used as-is.
pub fn score_bid(bid: &Bid, task_budget: f64, stats: Option<&WorkerStats>) -> f64 {
    let price_score = (task_budget / bid.price.max(1.0)).min(2.0) / 2.0;

    let rep_score = match stats {
        Some(s) if s.tasks_completed > 0 => s.avg_score() / 100.0,
        _ => 0.5,
    };

    let conf_score = bid.confidence;

    W_PRICE * price_score + W_REP * rep_score + W_CONF * conf_score
}

/// Rank bids for a single task, best first.
///
/// The sort is stable: ties keep input order, so the ranking is
/// deterministic for identical inputs.
pub fn rank_bids<'a, F>(bids: &[Bid], task_budget: f64, stats_for: F) -> Vec<ScoredBid>
where
    F: Fn(&Bid) -> Option<&'a WorkerStats>,
{
    let mut scored: Vec<ScoredBid> = bids
        .iter()
        .map(|b| ScoredBid {
            score: score_bid(b, task_budget, stats_for(b)),
            bid: b.clone(),
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored
}
