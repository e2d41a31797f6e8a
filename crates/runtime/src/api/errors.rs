//! Unified error types surfaced by the runtime API.
//!
//! Every failure maps to an [`ErrorKind`] so callers can branch on the kind
//! while showing the `Display` text to people.
use serde::Serialize;
use thiserror::Error;

use chain_core::TransactionId;
use prover_client::{ProverError, SessionError};

use crate::broadcaster::BroadcastError;
use crate::config::ConfigError;
use crate::registry::RegistryError;
use crate::state::Status;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Machine-readable failure category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    SessionUnavailable,
    ProverUnavailable,
    RegistrationFailed,
    BroadcastRejected,
    ProofGenerationFailed,
    SubmissionInProgress,
    Cancelled,
    Configuration,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid upload: {0}")]
    InvalidInput(String),

    #[error("prover session unavailable")]
    Session(#[source] SessionError),

    #[error("no prover session is held")]
    NoSession,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error("proof generation failed")]
    ProofGeneration(#[source] ProverError),

    #[error("prover proved {echoed} but the submission broadcast {expected}")]
    ProofMismatch {
        expected: TransactionId,
        echoed: TransactionId,
    },

    #[error("operation not allowed while {status}")]
    SubmissionInProgress { status: Status },

    #[error("submission cancelled")]
    Cancelled,

    #[error("orchestrator requires a {0} before building")]
    MissingComponent(&'static str),

    #[error("invalid configuration")]
    Config(#[from] ConfigError),
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::InvalidInput(_) => ErrorKind::InvalidInput,
            RuntimeError::Session(_) | RuntimeError::NoSession => ErrorKind::SessionUnavailable,
            RuntimeError::Registry(err) => err.kind(),
            RuntimeError::Broadcast(_) => ErrorKind::BroadcastRejected,
            RuntimeError::ProofGeneration(_) | RuntimeError::ProofMismatch { .. } => {
                ErrorKind::ProofGenerationFailed
            }
            RuntimeError::SubmissionInProgress { .. } => ErrorKind::SubmissionInProgress,
            RuntimeError::Cancelled => ErrorKind::Cancelled,
            RuntimeError::MissingComponent(_) | RuntimeError::Config(_) => {
                ErrorKind::Configuration
            }
        }
    }

    /// Message including the source chain, for state snapshots and logs.
    pub fn detail(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_walks_sources() {
        let err = RuntimeError::ProofGeneration(ProverError::ProofGeneration(
            "claim not satisfied".to_string(),
        ));
        assert_eq!(err.kind(), ErrorKind::ProofGenerationFailed);
        assert_eq!(
            err.detail(),
            "proof generation failed: Proof generation failed: claim not satisfied"
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::ProverUnavailable.to_string(), "prover_unavailable");
        assert_eq!(ErrorKind::SubmissionInProgress.as_ref(), "submission_in_progress");
    }
}
