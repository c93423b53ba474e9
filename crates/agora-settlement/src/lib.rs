//! Agora Settlement - Escrow settlement and the marketplace pipeline
//!
//! Drives a task from creation through bidding, negotiation, contracting,
//! escrow, execution, and validation to a terminal release or refund,
//! invoking the collaborator agents at each step and persisting side
//! effects through the injected stores. Progress is reported through a
//! lazy, forward-only event stream terminated by a Final event.

pub mod escrow;
pub mod events;
pub mod phase;
pub mod pipeline;

pub use escrow::{EscrowEngine, Settlement, SettlementOutcome};
pub use events::{EventStatus, PipelineEvent, Stage};
pub use phase::TaskPhase;
pub use pipeline::{MarketPipeline, RunReport};
