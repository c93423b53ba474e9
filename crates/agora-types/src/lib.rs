//! Agora Types - Canonical domain types for the task marketplace
//!
//! This crate defines the records that flow through a marketplace round:
//! task specifications, bids, contracts, execution and validation results,
//! escrow ledger entries, and worker reputation statistics. It has no
//! dependencies on other agora crates.

pub mod contract;
pub mod error;
pub mod funds;
pub mod identity;
pub mod market;
pub mod reputation;

pub use contract::{Contract, ContractStatus, ExecutionResult, ValidationResult};
pub use error::{AgoraError, Result};
pub use funds::{FundsStatus, LedgerEntry};
pub use identity::{BidId, ContractId, TaskId, WorkerId};
pub use market::{Bid, TaskSpec};
pub use reputation::WorkerStats;
