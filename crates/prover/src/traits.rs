//! Prover-side seams used by the submission runtime.

use async_trait::async_trait;

use chain_core::TransactionId;

use crate::config::ConfigError;
use crate::types::{
    ArtifactKind, GeneratedProof, Session, SessionId, UploadRequest, VerificationArtifact,
};

/// Session management errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Prover session unavailable: {0}")]
    Unavailable(String),

    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid prover configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Prover instance errors.
#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    #[error("Prover unreachable: {0}")]
    Unreachable(String),

    #[error("Failed to fetch verification artifact: {0}")]
    Artifact(String),

    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),

    #[error("Prover rejected the upload: {0}")]
    Rejected(String),

    #[error("Invalid prover response: {0}")]
    InvalidResponse(String),
}

/// Lifecycle of dedicated prover instances.
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Request a new isolated prover instance.
    async fn acquire(&self) -> Result<Session, SessionError>;

    /// Tear a prover instance down.
    ///
    /// Callers treat failures as best-effort: a leaked session costs the
    /// session server resources but never affects submission correctness.
    async fn release(&self, session: &Session) -> Result<(), SessionError>;

    /// Mark the session as active so the server does not reap it.
    async fn heartbeat(&self, _session: &Session) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Operations against one session's prover instance.
#[async_trait]
pub trait ProverService: Send + Sync {
    /// Single readiness probe. `Ok` once the instance answers HTTP at all.
    async fn probe(&self, session: &Session) -> Result<(), ProverError>;

    /// Fetch the artifact needed to register the verifier contract.
    async fn fetch_artifact(
        &self,
        session: &Session,
        kind: ArtifactKind,
    ) -> Result<VerificationArtifact, ProverError>;

    /// Prove that `upload` establishes its claim, bound to `tx_hash`.
    ///
    /// Long-running (minutes); callers race it against cancellation rather
    /// than a timeout.
    async fn generate_proof(
        &self,
        session: &Session,
        upload: &UploadRequest,
        tx_hash: &TransactionId,
    ) -> Result<GeneratedProof, ProverError>;
}
