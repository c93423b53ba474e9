//! Task phase state machine
//!
//! A task run moves strictly forward:
//!
//! ```text
//! Created -> Bidding -> Negotiated -> Contracted -> Escrowed
//!         -> Executed -> Validated -> Settled(Released | Refunded)
//! ```
//!
//! with `Failed` reachable from any non-terminal phase (no bids, or a
//! collaborator failure). Every transition is validated; the pipeline
//! advancing out of order is a bug, not a runtime condition.

use crate::escrow::SettlementOutcome;
use serde::{Deserialize, Serialize};

/// Phase of a single task run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPhase {
    Created,
    Bidding,
    Negotiated,
    Contracted,
    Escrowed,
    Executed,
    Validated,
    Settled(SettlementOutcome),
    Failed,
}

impl TaskPhase {
    /// Whether this phase ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled(_) | Self::Failed)
    }

    /// Whether `next` is a legal successor of this phase
    pub fn can_advance_to(&self, next: TaskPhase) -> bool {
        if next == Self::Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Self::Created, Self::Bidding)
                | (Self::Bidding, Self::Negotiated)
                | (Self::Negotiated, Self::Contracted)
                | (Self::Contracted, Self::Escrowed)
                | (Self::Escrowed, Self::Executed)
                | (Self::Executed, Self::Validated)
                | (Self::Validated, Self::Settled(_))
        )
    }

    /// Advance to `next`, panicking on an illegal transition. Transitions
    /// are driven only by the pipeline, which visits phases in order; a
    /// violation here is a programming error.
    pub fn advance(&mut self, next: TaskPhase) {
        assert!(
            self.can_advance_to(next),
            "illegal phase transition {:?} -> {:?}",
            self,
            next
        );
        *self = next;
    }
}
