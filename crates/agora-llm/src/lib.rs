//! Agora LLM - Content-generation collaborator abstraction
//!
//! Everything the marketplace cannot compute itself - task specs drafted
//! from informal requests, bids, contracts, executed output, validation
//! verdicts - comes from a `Generator`. The core never assumes determinism
//! from it and validates every returned record before use.
//!
//! Providers:
//! - Ollama (default local): `http://localhost:11434`
//! - Canned fixtures: deterministic responses for tests and offline runs
//!
//! Generator calls are timeout-bound and cancellable; cancelling one call
//! never corrupts state shared with another.

pub mod provider;
pub mod types;

pub use provider::{CannedProvider, Generator, OllamaConfig, OllamaProvider};
pub use types::{GenError, GenerationRequest, ProviderKind, Result};
