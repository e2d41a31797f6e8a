//! Clients for the residency prover.
//!
//! The prover is reached in two hops:
//!
//! ```text
//! session manager (fixed URL)
//!   POST /session            → dedicated prover instance on its own port
//!   DELETE /session/{id}     → tear it down
//!
//! prover instance (per session)
//!   GET /verification-key    → hex verification key
//!   GET /elf                 → program image
//!   POST /upload             → proof bytes (raw or JSON envelope)
//! ```
//!
//! [`SessionManager`] and [`ProverService`] are the seams the runtime depends
//! on; [`http`] holds the reqwest implementations and [`envelope`] folds the
//! two proof response shapes into one [`GeneratedProof`].

pub mod config;
pub mod envelope;
pub mod http;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use config::{ConfigError, ProverConfig};
pub use http::{HttpProverService, HttpSessionManager};
pub use traits::{ProverError, ProverService, SessionError, SessionManager};
pub use types::{
    ArtifactKind, GeneratedProof, ProverEndpoint, Session, SessionId, UploadRequest,
    VerificationArtifact,
};

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockProver, MockSessionManager};
