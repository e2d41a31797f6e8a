//! Idempotent verifier contract registration.
//!
//! ```text
//! is_registered? ── yes ──────────────────────────► AlreadyRegistered
//!      │ no
//!      ▼
//! probe prover (attempts × interval) ── exhausted ─► ProverUnavailable
//!      │ ready
//!      ▼
//! fetch artifact ─► register contract ────────────► Registered
//! ```
//!
//! Check-then-register is not atomic. A concurrent registration by another
//! client surfaces as a registration failure from the chain.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use chain_core::{ChainError, ChainTransport, ContractName, ContractRegistration, VerifierKind};
use prover_client::{ArtifactKind, ProverError, ProverService, Session};

use crate::api::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to look up contract {contract}")]
    Lookup {
        contract: ContractName,
        #[source]
        source: ChainError,
    },

    #[error("prover did not become ready after {attempts} attempts")]
    ProverUnavailable {
        attempts: u32,
        #[source]
        source: ProverError,
    },

    #[error("failed to fetch verification artifact")]
    Artifact(#[source] ProverError),

    #[error("failed to register contract {contract}")]
    Registration {
        contract: ContractName,
        #[source]
        source: ChainError,
    },
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::ProverUnavailable { .. } => ErrorKind::ProverUnavailable,
            _ => ErrorKind::RegistrationFailed,
        }
    }
}

/// How long to wait for a fresh prover instance to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    AlreadyRegistered,
    Registered,
}

/// Makes sure the verifier contract exists before anything is broadcast.
#[derive(Clone)]
pub struct ContractRegistry {
    chain: Arc<dyn ChainTransport>,
    prover: Arc<dyn ProverService>,
    verifier: VerifierKind,
    artifact: ArtifactKind,
    readiness: ReadinessPolicy,
}

impl ContractRegistry {
    pub fn new(chain: Arc<dyn ChainTransport>, prover: Arc<dyn ProverService>) -> Self {
        Self {
            chain,
            prover,
            verifier: VerifierKind::default(),
            artifact: ArtifactKind::default(),
            readiness: ReadinessPolicy::default(),
        }
    }

    pub fn with_verifier(mut self, verifier: VerifierKind) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_artifact(mut self, artifact: ArtifactKind) -> Self {
        self.artifact = artifact;
        self
    }

    pub fn with_readiness(mut self, readiness: ReadinessPolicy) -> Self {
        self.readiness = readiness;
        self
    }

    pub async fn is_registered(&self, contract: &ContractName) -> Result<bool, RegistryError> {
        self.chain
            .contract_exists(contract)
            .await
            .map_err(|source| RegistryError::Lookup {
                contract: contract.clone(),
                source,
            })
    }

    pub async fn ensure_registered(
        &self,
        contract: &ContractName,
        session: &Session,
    ) -> Result<RegistrationOutcome, RegistryError> {
        if self.is_registered(contract).await? {
            debug!("Contract {} already registered", contract);
            return Ok(RegistrationOutcome::AlreadyRegistered);
        }

        self.wait_until_ready(session).await?;

        let artifact = self
            .prover
            .fetch_artifact(session, self.artifact)
            .await
            .map_err(RegistryError::Artifact)?;

        let registration =
            ContractRegistration::new(self.verifier, contract.clone(), artifact.bytes);
        self.chain
            .register_contract(registration)
            .await
            .map_err(|source| RegistryError::Registration {
                contract: contract.clone(),
                source,
            })?;

        info!("✓ Registered contract {} ({} verifier)", contract, self.verifier);
        Ok(RegistrationOutcome::Registered)
    }

    /// Probe until the prover answers, returning the attempt that succeeded.
    pub async fn wait_until_ready(&self, session: &Session) -> Result<u32, RegistryError> {
        let attempts = self.readiness.attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.prover.probe(session).await {
                Ok(()) => {
                    debug!("Prover {} ready after {} attempt(s)", session.endpoint, attempt);
                    return Ok(attempt);
                }
                Err(err) if attempt >= attempts => {
                    warn!(
                        "Prover {} still unreachable after {} attempts: {}",
                        session.endpoint, attempts, err
                    );
                    return Err(RegistryError::ProverUnavailable {
                        attempts,
                        source: err,
                    });
                }
                Err(err) => {
                    debug!("Prover not ready (attempt {}/{}): {}", attempt, attempts, err);
                    tokio::time::sleep(self.readiness.interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_core::{MockChain, mock::MockCall};
    use prover_client::{MockProver, MockSessionManager, SessionManager};

    fn contract() -> ContractName {
        ContractName::new("sp1_residency")
    }

    async fn session() -> Session {
        MockSessionManager::new().acquire().await.unwrap()
    }

    #[tokio::test]
    async fn test_registered_contract_has_no_side_effects() {
        let chain = MockChain::new().with_contract("sp1_residency");
        let prover = MockProver::new();
        let registry = ContractRegistry::new(Arc::new(chain.clone()), Arc::new(prover.clone()));

        let outcome = registry
            .ensure_registered(&contract(), &session().await)
            .await
            .unwrap();

        assert_eq!(outcome, RegistrationOutcome::AlreadyRegistered);
        assert_eq!(prover.probes(), 0);
        assert!(chain.registrations().is_empty());
    }

    #[tokio::test]
    async fn test_second_call_performs_no_registration() {
        let chain = MockChain::new();
        let prover = MockProver::new().with_artifact(vec![1, 2, 3]);
        let registry = ContractRegistry::new(Arc::new(chain.clone()), Arc::new(prover.clone()));
        let session = session().await;

        let first = registry.ensure_registered(&contract(), &session).await.unwrap();
        let second = registry.ensure_registered(&contract(), &session).await.unwrap();

        assert_eq!(first, RegistrationOutcome::Registered);
        assert_eq!(second, RegistrationOutcome::AlreadyRegistered);
        let registrations = chain.registrations();
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].verification_key, vec![1, 2, 3]);
        assert_eq!(registrations[0].digest, vec![0, 0, 0, 0]);
        assert_eq!(
            chain
                .calls()
                .iter()
                .filter(|call| matches!(call, MockCall::RegisterContract(_)))
                .count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_readiness_gives_up_after_all_attempts() {
        let chain = MockChain::new();
        let prover = MockProver::new().never_ready();
        let registry = ContractRegistry::new(Arc::new(chain.clone()), Arc::new(prover.clone()));

        let started = tokio::time::Instant::now();
        let err = registry
            .ensure_registered(&contract(), &session().await)
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::ProverUnavailable { attempts: 5, .. }));
        assert_eq!(err.kind(), ErrorKind::ProverUnavailable);
        assert_eq!(prover.probes(), 5);
        // four waits between five probes
        assert_eq!(started.elapsed(), Duration::from_secs(4));
        assert!(chain.registrations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_prover_within_attempts() {
        let prover = MockProver::new().ready_after(3);
        let registry = ContractRegistry::new(Arc::new(MockChain::new()), Arc::new(prover.clone()))
            .with_artifact(ArtifactKind::Elf);

        let outcome = registry
            .ensure_registered(&contract(), &session().await)
            .await
            .unwrap();

        assert_eq!(outcome, RegistrationOutcome::Registered);
        assert_eq!(prover.probes(), 3);
        assert_eq!(prover.artifact_requests(), vec![ArtifactKind::Elf]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_registration_surfaces_as_failure() {
        let chain = MockChain::new().rejecting_duplicates();
        let prover = MockProver::new().ready_after(2);
        let registry = ContractRegistry::new(Arc::new(chain.clone()), Arc::new(prover));
        let session = session().await;

        let task = tokio::spawn(async move {
            registry.ensure_registered(&contract(), &session).await
        });

        // Another client registers while this one waits for its prover.
        tokio::time::sleep(Duration::from_millis(500)).await;
        chain.register_externally("sp1_residency");

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, RegistryError::Registration { .. }));
        assert_eq!(err.kind(), ErrorKind::RegistrationFailed);
    }

    #[tokio::test]
    async fn test_artifact_failure_is_registration_failure() {
        let prover = MockProver::new();
        prover.fail_artifact("no key");
        let registry = ContractRegistry::new(Arc::new(MockChain::new()), Arc::new(prover));

        let err = registry
            .ensure_registered(&contract(), &session().await)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RegistrationFailed);
    }
}
