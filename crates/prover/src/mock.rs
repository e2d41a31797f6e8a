//! Scriptable session manager and prover for testing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use chain_core::TransactionId;
use chain_core::mock::Gate;

use crate::traits::{ProverError, ProverService, SessionError, SessionManager};
use crate::types::{
    ArtifactKind, GeneratedProof, ProverEndpoint, Session, SessionId, UploadRequest,
    VerificationArtifact,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct SessionState {
    counter: u32,
    acquired: Vec<SessionId>,
    released: Vec<SessionId>,
    heartbeats: Vec<SessionId>,
    acquire_failure: Option<String>,
    release_failure: Option<String>,
}

/// In-memory session manager that records every acquire and release.
#[derive(Clone, Default)]
pub struct MockSessionManager {
    state: Arc<Mutex<SessionState>>,
}

impl MockSessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_acquire(&self, reason: impl Into<String>) {
        lock(&self.state).acquire_failure = Some(reason.into());
    }

    pub fn fail_release(&self, reason: impl Into<String>) {
        lock(&self.state).release_failure = Some(reason.into());
    }

    /// Clear scripted failures.
    pub fn recover(&self) {
        let mut state = lock(&self.state);
        state.acquire_failure = None;
        state.release_failure = None;
    }

    pub fn acquired(&self) -> Vec<SessionId> {
        lock(&self.state).acquired.clone()
    }

    pub fn released(&self) -> Vec<SessionId> {
        lock(&self.state).released.clone()
    }

    pub fn heartbeats(&self) -> usize {
        lock(&self.state).heartbeats.len()
    }
}

#[async_trait]
impl SessionManager for MockSessionManager {
    async fn acquire(&self) -> Result<Session, SessionError> {
        let mut state = lock(&self.state);
        if let Some(reason) = &state.acquire_failure {
            return Err(SessionError::Unavailable(reason.clone()));
        }

        state.counter += 1;
        let session = Session {
            id: SessionId::new(format!("session-{}", state.counter)),
            endpoint: ProverEndpoint::from_host_port("mock-prover", 9000 + state.counter as u16),
        };
        state.acquired.push(session.id.clone());
        Ok(session)
    }

    async fn release(&self, session: &Session) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        // Recorded even when failing: the attempt is what callers guarantee.
        state.released.push(session.id.clone());
        match &state.release_failure {
            Some(reason) => Err(SessionError::Network(reason.clone())),
            None => Ok(()),
        }
    }

    async fn heartbeat(&self, session: &Session) -> Result<(), SessionError> {
        lock(&self.state).heartbeats.push(session.id.clone());
        Ok(())
    }
}

struct ProverState {
    /// Probe number (1-based) from which the instance answers; `None` never
    ready_on_probe: Option<u32>,
    probes: u32,
    artifact: Vec<u8>,
    artifact_failure: Option<String>,
    artifact_requests: Vec<ArtifactKind>,
    proof: Vec<u8>,
    proof_failure: Option<String>,
    echo_tx_hash: Option<TransactionId>,
    proof_requests: Vec<TransactionId>,
    gate: Option<Gate>,
}

impl Default for ProverState {
    fn default() -> Self {
        Self {
            ready_on_probe: Some(1),
            probes: 0,
            artifact: vec![0x5a; 32],
            artifact_failure: None,
            artifact_requests: Vec::new(),
            proof: vec![0xab; 128],
            proof_failure: None,
            echo_tx_hash: None,
            proof_requests: Vec::new(),
            gate: None,
        }
    }
}

/// In-memory prover instance.
///
/// Ready on the first probe and returns 128 proof bytes unless scripted
/// otherwise.
#[derive(Clone, Default)]
pub struct MockProver {
    state: Arc<Mutex<ProverState>>,
}

impl MockProver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer probes from the `probe`-th one on.
    pub fn ready_after(self, probe: u32) -> Self {
        lock(&self.state).ready_on_probe = Some(probe);
        self
    }

    /// Never answer probes.
    pub fn never_ready(self) -> Self {
        lock(&self.state).ready_on_probe = None;
        self
    }

    pub fn with_artifact(self, bytes: Vec<u8>) -> Self {
        lock(&self.state).artifact = bytes;
        self
    }

    pub fn with_proof(self, bytes: Vec<u8>) -> Self {
        lock(&self.state).proof = bytes;
        self
    }

    /// Echo this transaction hash with every proof.
    pub fn echoing(self, tx_hash: impl Into<String>) -> Self {
        lock(&self.state).echo_tx_hash = Some(TransactionId::new(tx_hash));
        self
    }

    /// Park proof requests at `gate` before answering.
    pub fn with_gate(self, gate: Gate) -> Self {
        lock(&self.state).gate = Some(gate);
        self
    }

    pub fn fail_artifact(&self, reason: impl Into<String>) {
        lock(&self.state).artifact_failure = Some(reason.into());
    }

    pub fn fail_proof(&self, reason: impl Into<String>) {
        lock(&self.state).proof_failure = Some(reason.into());
    }

    /// Clear scripted failures.
    pub fn recover(&self) {
        let mut state = lock(&self.state);
        state.artifact_failure = None;
        state.proof_failure = None;
    }

    pub fn probes(&self) -> u32 {
        lock(&self.state).probes
    }

    pub fn artifact_requests(&self) -> Vec<ArtifactKind> {
        lock(&self.state).artifact_requests.clone()
    }

    /// Transaction hashes proofs were requested for.
    pub fn proof_requests(&self) -> Vec<TransactionId> {
        lock(&self.state).proof_requests.clone()
    }
}

#[async_trait]
impl ProverService for MockProver {
    async fn probe(&self, session: &Session) -> Result<(), ProverError> {
        let mut state = lock(&self.state);
        state.probes += 1;
        match state.ready_on_probe {
            Some(threshold) if state.probes >= threshold => Ok(()),
            _ => Err(ProverError::Unreachable(format!(
                "{} refused connection",
                session.endpoint
            ))),
        }
    }

    async fn fetch_artifact(
        &self,
        _session: &Session,
        kind: ArtifactKind,
    ) -> Result<VerificationArtifact, ProverError> {
        let mut state = lock(&self.state);
        state.artifact_requests.push(kind);
        if let Some(reason) = &state.artifact_failure {
            return Err(ProverError::Artifact(reason.clone()));
        }
        Ok(VerificationArtifact {
            kind,
            bytes: state.artifact.clone(),
        })
    }

    async fn generate_proof(
        &self,
        _session: &Session,
        _upload: &UploadRequest,
        tx_hash: &TransactionId,
    ) -> Result<GeneratedProof, ProverError> {
        let gate = {
            let mut state = lock(&self.state);
            state.proof_requests.push(tx_hash.clone());
            state.gate.clone()
        };

        if let Some(gate) = gate {
            gate.pass().await;
        }

        let state = lock(&self.state);
        if let Some(reason) = &state.proof_failure {
            return Err(ProverError::ProofGeneration(reason.clone()));
        }
        Ok(GeneratedProof {
            bytes: state.proof.clone(),
            tx_hash: state.echo_tx_hash.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_are_distinct_and_recorded() {
        let manager = MockSessionManager::new();
        let first = manager.acquire().await.unwrap();
        let second = manager.acquire().await.unwrap();
        assert_ne!(first.id, second.id);

        manager.release(&first).await.unwrap();
        assert_eq!(manager.released(), vec![first.id]);
    }

    #[tokio::test]
    async fn test_prover_becomes_ready_on_scripted_probe() {
        let manager = MockSessionManager::new();
        let session = manager.acquire().await.unwrap();
        let prover = MockProver::new().ready_after(3);

        assert!(prover.probe(&session).await.is_err());
        assert!(prover.probe(&session).await.is_err());
        assert!(prover.probe(&session).await.is_ok());
        assert_eq!(prover.probes(), 3);
    }
}
