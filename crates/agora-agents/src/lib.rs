//! Agora Agents - Collaborator agents around the content generator
//!
//! Each agent owns a role prompt, hands it to the shared `Generator`, and
//! parses the response into a typed record. Identifier fields the generator
//! left missing or malformed are backfilled with fresh IDs rather than
//! failing the run - generated content is untrusted, the structure is not.

pub mod broker;
pub mod contractor;
pub mod executor;
pub mod validator;
pub mod worker;

pub use broker::Broker;
pub use contractor::ContractDrafter;
pub use executor::Executor;
pub use validator::Validator;
pub use worker::{worker_team, Worker};

use agora_types::AgoraError;

pub(crate) fn gen_error(stage: &str, err: agora_llm::GenError) -> AgoraError {
    AgoraError::generation(stage, err.to_string())
}

pub(crate) fn parse_error(stage: &str, err: serde_json::Error) -> AgoraError {
    AgoraError::generation(stage, format!("malformed response: {}", err))
}
