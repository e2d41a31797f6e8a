//! Submission orchestrator.
//!
//! Drives one prover session through registration and any number of
//! sequential submissions:
//!
//! ```text
//! start()   Idle → Initializing → Ready
//! submit()  Ready → Broadcasting → Proving → Verifying → Success
//! reset()   Success | Error → Ready
//! cancel()  Broadcasting | Proving | Verifying → Error
//! teardown() * → Idle, session released
//! ```
//!
//! [`SubmissionOrchestrator`] is a cloneable handle over shared state. The
//! state mutex is only held for synchronous bookkeeping, never across an
//! `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use chain_core::{ChainTransport, TransactionId};
use prover_client::{ProverService, Session, SessionManager, UploadRequest};

use crate::api::{Result, RuntimeError};
use crate::broadcaster::TransactionBroadcaster;
use crate::config::RuntimeConfig;
use crate::events::{
    Event, EventBus, RegistrationEvent, SessionEvent, SubmissionEvent, Topic,
};
use crate::lease::SessionLease;
use crate::registry::{ContractRegistry, RegistrationOutcome};
use crate::state::{Failure, Status, SubmissionState};

const INIT_FAILED: &str = "prover initialization failed";
const SUBMISSION_FAILED: &str = "submission failed";
const READY: &str = "Ready to submit";

struct Shared {
    state: SubmissionState,
    lease: Option<SessionLease>,
    cancel: Option<CancellationToken>,
    /// Id of the latest submission; only that one may touch `cancel` or the status
    submission: u64,
    /// Bumped by teardown; a start that straddles it gives its session back
    generation: u64,
}

struct Inner {
    config: RuntimeConfig,
    sessions: Arc<dyn SessionManager>,
    prover: Arc<dyn ProverService>,
    registry: ContractRegistry,
    broadcaster: TransactionBroadcaster,
    events: EventBus,
    shared: Mutex<Shared>,
}

/// Client-facing handle driving proof-of-residency submissions.
///
/// Dropping the last handle releases a still-held session.
#[derive(Clone)]
pub struct SubmissionOrchestrator {
    inner: Arc<Inner>,
}

impl SubmissionOrchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state snapshot.
    pub fn state(&self) -> SubmissionState {
        self.lock().state.clone()
    }

    pub fn status(&self) -> Status {
        self.lock().state.status
    }

    /// Session currently held, if any.
    pub fn session(&self) -> Option<Session> {
        self.lock()
            .lease
            .as_ref()
            .and_then(|lease| lease.session())
            .cloned()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Subscribe to events from a specific topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.inner.events.subscribe(topic)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.events
    }

    /// Acquire a prover session and make sure the verifier contract exists.
    ///
    /// Allowed from `Idle`, and from `Error` when no session is held (a
    /// failed start may be retried).
    pub async fn start(&self) -> Result<()> {
        let generation = {
            let mut shared = self.lock();
            let status = shared.state.status;
            let retry = status == Status::Error && shared.lease.is_none();
            if status != Status::Idle && !retry {
                return Err(RuntimeError::SubmissionInProgress { status });
            }

            shared.state.clear_submission();
            self.transition(&mut shared, Status::Initializing, "Starting prover session");
            shared.generation
        };

        let outcome = self.initialize().await;

        let stale = {
            let mut shared = self.lock();
            let torn_down = shared.generation != generation;
            match outcome {
                Ok(lease) if torn_down => lease,
                Ok(lease) => {
                    shared.lease = Some(lease);
                    self.transition(&mut shared, Status::Ready, READY);
                    return Ok(());
                }
                Err(err) => {
                    warn!("{}: {}", INIT_FAILED, err.detail());
                    if !torn_down {
                        self.fail(&mut shared, &err, INIT_FAILED);
                    }
                    return Err(err);
                }
            }
        };

        info!("Teardown during start, giving the new session back");
        self.release_lease(stale).await;
        Err(RuntimeError::Cancelled)
    }

    async fn initialize(&self) -> Result<SessionLease> {
        let inner = &self.inner;

        let lease = SessionLease::acquire(Arc::clone(&inner.sessions))
            .await
            .map_err(RuntimeError::Session)?;
        let Some(session) = lease.session().cloned() else {
            return Err(RuntimeError::NoSession);
        };
        inner.events.publish(SessionEvent::Acquired {
            session_id: session.id.clone(),
        });

        let contract = &inner.config.contract_name;
        match inner.registry.ensure_registered(contract, &session).await {
            Ok(RegistrationOutcome::AlreadyRegistered) => {
                inner.events.publish(RegistrationEvent::AlreadyRegistered {
                    contract: contract.clone(),
                });
                Ok(lease)
            }
            Ok(RegistrationOutcome::Registered) => {
                inner.events.publish(RegistrationEvent::Registered {
                    contract: contract.clone(),
                });
                Ok(lease)
            }
            Err(err) => {
                self.release_lease(lease).await;
                Err(err.into())
            }
        }
    }

    /// Submit one document. Resolves with the data transaction the proof
    /// settled.
    ///
    /// Fails with `SubmissionInProgress` unless the orchestrator is `Ready`,
    /// leaving the state untouched. An upload rejected by the upload policy
    /// keeps the state `Ready` and records the failure in `last_error`.
    pub async fn submit(&self, upload: UploadRequest) -> Result<TransactionId> {
        let (session, token, submission) = {
            let mut shared = self.lock();
            let status = shared.state.status;
            if status != Status::Ready {
                return Err(RuntimeError::SubmissionInProgress { status });
            }

            let Some(session) = shared
                .lease
                .as_ref()
                .and_then(|lease| lease.session())
                .cloned()
            else {
                return Err(RuntimeError::NoSession);
            };

            if let Err(err) = self.inner.config.upload.check(&upload) {
                warn!("Rejected upload: {}", err);
                shared.state.last_error = Some(Failure {
                    kind: err.kind(),
                    message: err.detail(),
                });
                return Err(err);
            }

            shared.state.clear_submission();
            shared.submission += 1;
            let token = CancellationToken::new();
            shared.cancel = Some(token.clone());
            self.transition(&mut shared, Status::Broadcasting, "Broadcasting data transaction");
            (session, token, shared.submission)
        };

        info!("Submitting {:?}", upload);

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(RuntimeError::Cancelled),
            result = self.run_submission(&session, &upload, &token, submission) => result,
        };

        let mut shared = self.lock();
        let current = shared.submission == submission;
        if current {
            shared.cancel = None;
        }
        match outcome {
            Ok(tx_hash) => Ok(tx_hash),
            Err(RuntimeError::Cancelled) => {
                info!("Submission cancelled");
                Err(RuntimeError::Cancelled)
            }
            Err(err) => {
                warn!("{}: {}", SUBMISSION_FAILED, err.detail());
                if current && !token.is_cancelled() {
                    self.fail(&mut shared, &err, SUBMISSION_FAILED);
                }
                Err(err)
            }
        }
    }

    async fn run_submission(
        &self,
        session: &Session,
        upload: &UploadRequest,
        token: &CancellationToken,
        submission: u64,
    ) -> Result<TransactionId> {
        let inner = &self.inner;

        if let Err(err) = inner.sessions.heartbeat(session).await {
            warn!("Heartbeat for session {} failed: {}", session.id, err);
        }
        Self::ensure_active(token)?;

        let data = inner
            .broadcaster
            .broadcast_data(
                &inner.config.contract_name,
                &inner.config.identity,
                upload.claim.clone().into_bytes(),
            )
            .await?;
        let tx_hash = data.id().clone();

        inner.events.publish(SubmissionEvent::DataBroadcast {
            tx_hash: tx_hash.clone(),
        });
        self.advance(token, submission, Status::Proving, "Generating proof", |state| {
            state.data_tx = Some(tx_hash.clone());
        })?;

        let proof = inner
            .prover
            .generate_proof(session, upload, &tx_hash)
            .await
            .map_err(RuntimeError::ProofGeneration)?;

        if let Some(echoed) = &proof.tx_hash
            && echoed != &tx_hash
        {
            error!(
                "Prover bound its proof to {} but this submission broadcast {}",
                echoed, tx_hash
            );
            return Err(RuntimeError::ProofMismatch {
                expected: tx_hash,
                echoed: echoed.clone(),
            });
        }

        inner.events.publish(SubmissionEvent::ProofGenerated {
            tx_hash: tx_hash.clone(),
            proof_size: proof.bytes.len(),
        });
        self.advance(token, submission, Status::Verifying, "Verifying proof on chain", |_| {})?;

        let settled = inner.broadcaster.broadcast_proof(&data, proof.bytes).await?;

        self.advance(token, submission, Status::Success, "Residency proof verified", |state| {
            state.final_tx = Some(tx_hash.clone());
            state.proof_tx = Some(settled.id.clone());
        })?;
        inner.events.publish(SubmissionEvent::Settled {
            tx_hash: tx_hash.clone(),
            proof_tx: settled.id,
        });

        info!("✓ Residency proof for {} verified", tx_hash);
        Ok(tx_hash)
    }

    /// Abort the in-flight submission.
    ///
    /// Returns `false` when nothing is in flight. Once this returns `true`
    /// no later step of that submission runs.
    pub fn cancel(&self) -> bool {
        let mut shared = self.lock();
        let status = shared.state.status;
        if !status.is_in_flight() {
            return false;
        }

        if let Some(token) = shared.cancel.take() {
            token.cancel();
        }
        self.fail(&mut shared, &RuntimeError::Cancelled, "submission cancelled");
        info!("Cancelled submission during {}", status);
        true
    }

    /// Return to `Ready` after a finished submission, keeping the session.
    pub fn reset(&self) -> Result<()> {
        let mut shared = self.lock();
        let status = shared.state.status;
        let holds_session = shared.lease.is_some();

        match status {
            Status::Ready => Ok(()),
            status if status.is_terminal() && holds_session => {
                shared.state.clear_submission();
                self.transition(&mut shared, Status::Ready, READY);
                Ok(())
            }
            Status::Idle | Status::Error => Err(RuntimeError::NoSession),
            _ => Err(RuntimeError::SubmissionInProgress { status }),
        }
    }

    /// Cancel anything in flight, release the session and return to `Idle`.
    ///
    /// Returns whether a session was released.
    pub async fn teardown(&self) -> bool {
        let lease = {
            let mut shared = self.lock();
            if let Some(token) = shared.cancel.take() {
                token.cancel();
            }
            shared.generation += 1;
            if shared.state.status != Status::Idle {
                self.transition(&mut shared, Status::Idle, "Session closed");
                shared.state.clear_submission();
            }
            shared.lease.take()
        };

        match lease {
            Some(lease) => self.release_lease(lease).await,
            None => false,
        }
    }

    async fn release_lease(&self, lease: SessionLease) -> bool {
        let session_id = lease.session().map(|session| session.id.clone());
        let released = lease.release().await;
        if let (true, Some(session_id)) = (released, session_id) {
            self.inner
                .events
                .publish(SessionEvent::Released { session_id });
        }
        released
    }

    fn ensure_active(token: &CancellationToken) -> Result<()> {
        if token.is_cancelled() {
            Err(RuntimeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Step forward unless the submission was cancelled, torn down or
    /// superseded meanwhile.
    fn advance(
        &self,
        token: &CancellationToken,
        submission: u64,
        next: Status,
        message: &str,
        record: impl FnOnce(&mut SubmissionState),
    ) -> Result<()> {
        let mut shared = self.lock();
        if token.is_cancelled()
            || shared.submission != submission
            || !shared.state.status.can_transition_to(next)
        {
            return Err(RuntimeError::Cancelled);
        }

        record(&mut shared.state);
        self.transition(&mut shared, next, message);
        Ok(())
    }

    fn transition(&self, shared: &mut Shared, next: Status, message: &str) -> bool {
        let Some(from) = shared.state.transition(next, message) else {
            return false;
        };

        info!("{} → {} ({}%)", from, next, shared.state.progress);
        self.inner.events.publish(SubmissionEvent::StatusChanged {
            from,
            to: next,
            progress: shared.state.progress,
            message: message.to_string(),
        });
        true
    }

    fn fail(&self, shared: &mut Shared, err: &RuntimeError, message: &str) {
        let kind = err.kind();
        let detail = err.detail();
        let Some(from) = shared.state.fail(kind, message, detail.clone()) else {
            return;
        };

        self.inner.events.publish(SubmissionEvent::StatusChanged {
            from,
            to: Status::Error,
            progress: shared.state.progress,
            message: message.to_string(),
        });
        self.inner.events.publish(SubmissionEvent::Failed {
            kind,
            message: detail,
        });
    }
}

/// Builder for [`SubmissionOrchestrator`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    config: RuntimeConfig,
    chain: Option<Arc<dyn ChainTransport>>,
    sessions: Option<Arc<dyn SessionManager>>,
    prover: Option<Arc<dyn ProverService>>,
}

impl OrchestratorBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn chain(mut self, chain: impl ChainTransport + 'static) -> Self {
        self.chain = Some(Arc::new(chain));
        self
    }

    pub fn sessions(mut self, sessions: impl SessionManager + 'static) -> Self {
        self.sessions = Some(Arc::new(sessions));
        self
    }

    pub fn prover(mut self, prover: impl ProverService + 'static) -> Self {
        self.prover = Some(Arc::new(prover));
        self
    }

    pub fn build(self) -> Result<SubmissionOrchestrator> {
        self.config.validate()?;

        let chain = self
            .chain
            .ok_or(RuntimeError::MissingComponent("chain transport"))?;
        let sessions = self
            .sessions
            .ok_or(RuntimeError::MissingComponent("session manager"))?;
        let prover = self
            .prover
            .ok_or(RuntimeError::MissingComponent("prover service"))?;

        let registry = ContractRegistry::new(Arc::clone(&chain), Arc::clone(&prover))
            .with_verifier(self.config.verifier)
            .with_artifact(self.config.artifact)
            .with_readiness(self.config.readiness);
        let broadcaster = TransactionBroadcaster::new(chain);
        let events = EventBus::with_capacity(self.config.event_buffer_size);

        Ok(SubmissionOrchestrator {
            inner: Arc::new(Inner {
                config: self.config,
                sessions,
                prover,
                registry,
                broadcaster,
                events,
                shared: Mutex::new(Shared {
                    state: SubmissionState::default(),
                    lease: None,
                    cancel: None,
                    submission: 0,
                    generation: 0,
                }),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use crate::config::ConfigError;
    use chain_core::MockChain;
    use prover_client::{MockProver, MockSessionManager};

    #[test]
    fn test_builder_requires_components() {
        let err = SubmissionOrchestrator::builder()
            .chain(MockChain::new())
            .prover(MockProver::new())
            .build()
            .err()
            .map(|err| err.kind());
        assert_eq!(err, Some(ErrorKind::Configuration));

        let invalid = SubmissionOrchestrator::builder()
            .config(RuntimeConfig::default().with_max_file_size(0))
            .chain(MockChain::new())
            .sessions(MockSessionManager::new())
            .prover(MockProver::new())
            .build();
        assert!(matches!(
            invalid,
            Err(RuntimeError::Config(ConfigError::Zero("Max file size")))
        ));
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let orchestrator = SubmissionOrchestrator::builder()
            .chain(MockChain::new())
            .sessions(MockSessionManager::new())
            .prover(MockProver::new())
            .build()
            .unwrap();

        orchestrator.start().await.unwrap();
        let err = orchestrator.start().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SubmissionInProgress);
        assert_eq!(orchestrator.status(), Status::Ready);
    }

    #[tokio::test]
    async fn test_reset_without_session() {
        let orchestrator = SubmissionOrchestrator::builder()
            .chain(MockChain::new())
            .sessions(MockSessionManager::new())
            .prover(MockProver::new())
            .build()
            .unwrap();

        assert!(matches!(orchestrator.reset(), Err(RuntimeError::NoSession)));
        assert!(!orchestrator.cancel());
    }
}
