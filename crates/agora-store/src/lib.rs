//! Agora Store - Persistent escrow ledger and reputation database
//!
//! Both stores are JSON documents on disk, fully rewritten on every
//! mutating call. A missing file initializes to an empty default. Each
//! store serializes its read-modify-write cycle behind a mutex; there is no
//! cross-process locking, callers in a single process share one store
//! instance.

pub mod ledger;
pub mod reputation;

pub use ledger::EscrowLedger;
pub use reputation::ReputationStore;
