//! Agora Market - Bid scoring and negotiation
//!
//! Two pieces: a pure scoring function that ranks bids against a task's
//! budget and the bidder's history, and a bounded price-negotiation protocol
//! applied to the winner. Neither touches I/O; reputation is passed in.

pub mod negotiator;
pub mod scorer;

pub use negotiator::{negotiate, NegotiationOutcome, MAX_ROUNDS, REDUCTION_FACTOR};
pub use scorer::{rank_bids, score_bid, ScoredBid};
