//! Orchestration of proof-of-residency submissions.
//!
//! This crate wires a prover session, the verifier contract registry and the
//! chain broadcaster into one state machine. Consumers build a
//! [`SubmissionOrchestrator`], drive it with `start`/`submit`/`teardown`, and
//! follow progress through [`SubmissionState`] snapshots or the topic-based
//! [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`orchestrator`] hosts the state machine driver and its builder
//! - [`api`] exposes the error types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`registry`], [`broadcaster`] and [`lease`] wrap the external services
pub mod api;
pub mod broadcaster;
pub mod config;
pub mod events;
pub mod lease;
pub mod orchestrator;
pub mod registry;
pub mod state;
pub mod upload;

pub use api::{ErrorKind, Result, RuntimeError};
pub use broadcaster::{BroadcastError, DataTransaction, TransactionBroadcaster};
pub use config::{ConfigError, RuntimeConfig};
pub use events::{
    Event, EventBus, RegistrationEvent, SessionEvent, SubmissionEvent, Topic,
};
pub use lease::SessionLease;
pub use orchestrator::{OrchestratorBuilder, SubmissionOrchestrator};
pub use registry::{ContractRegistry, ReadinessPolicy, RegistrationOutcome, RegistryError};
pub use state::{Failure, Status, SubmissionState};
pub use upload::UploadPolicy;
