//! Error types for Agora
//!
//! Every failure mode the core can hit is explicit. Nothing in the core
//! retries automatically; the 3-round negotiation is a value-adjustment
//! loop, not error recovery.

use thiserror::Error;

/// Result type for Agora operations
pub type Result<T> = std::result::Result<T, AgoraError>;

/// Agora error types
#[derive(Debug, Clone, Error)]
pub enum AgoraError {
    /// Content generation collaborator failed or returned malformed output.
    /// Always pipeline-halting.
    #[error("Content generation failed at {stage}: {message}")]
    Generation { stage: String, message: String },

    /// No bids were received for a task; contract/escrow steps are never
    /// attempted.
    #[error("No bids received for task {task_id}")]
    NoBids { task_id: String },

    /// Negotiation finished over budget. Non-fatal: the pipeline proceeds
    /// at the negotiated price and surfaces a warning event.
    #[error("Negotiated price {price} exceeds budget {budget}")]
    BudgetExceeded { price: f64, budget: f64 },

    /// Release or refund requested for a contract id with no locked entry.
    /// Recoverable anomaly, reported to the caller.
    #[error("No locked funds for contract {contract_id}")]
    FundsNotFound { contract_id: String },

    /// Store file could not be read, written, or parsed
    #[error("Store error at {path}: {message}")]
    Store { path: String, message: String },

    /// A structured record violated an invariant
    #[error("Invalid record: {field} - {reason}")]
    InvalidRecord { field: String, reason: String },
}

impl AgoraError {
    /// Create a generation error
    pub fn generation(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid record error
    pub fn invalid_record(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error halts the pipeline (as opposed to being surfaced
    /// as a warning while the run continues)
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::BudgetExceeded { .. } | Self::FundsNotFound { .. }
        )
    }

    /// Get an error code for events and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Generation { .. } => "GENERATION_FAILED",
            Self::NoBids { .. } => "NO_BIDS",
            Self::BudgetExceeded { .. } => "BUDGET_EXCEEDED",
            Self::FundsNotFound { .. } => "FUNDS_NOT_FOUND",
            Self::Store { .. } => "STORE_ERROR",
            Self::InvalidRecord { .. } => "INVALID_RECORD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AgoraError::NoBids {
            task_id: "task_1".to_string(),
        };
        assert_eq!(err.error_code(), "NO_BIDS");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(AgoraError::generation("broker", "connection refused").is_fatal());
        assert!(!AgoraError::BudgetExceeded {
            price: 120.0,
            budget: 100.0
        }
        .is_fatal());
        assert!(!AgoraError::FundsNotFound {
            contract_id: "contract_1".to_string()
        }
        .is_fatal());
    }
}
