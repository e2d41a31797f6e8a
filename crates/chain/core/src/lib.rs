//! Chain abstraction layer for residency proof submission.
//!
//! This crate defines what the submission flow needs from a chain, without
//! committing to any particular node API.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: Submission domain (runtime crate)
//!          ├── ContractRegistry   (check-then-register verifier contracts)
//!          └── TransactionBroadcaster (data tx, then proof tx)
//!
//! Layer 0: ChainTransport (this crate)
//!          ├── contract_exists / register_contract
//!          └── broadcast_payload / broadcast_proof
//! ```
//!
//! Concrete transports (e.g. `chain-hyle`) implement [`ChainTransport`]; the
//! runtime only ever talks to the trait object.
//!
//! # Usage
//!
//! ```ignore
//! use chain_core::{ChainTransport, ContractName};
//!
//! async fn check(chain: &dyn ChainTransport) -> Result<bool, chain_core::ChainError> {
//!     chain.contract_exists(&ContractName::new("sp1_residency")).await
//! }
//! ```

pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use traits::{ChainConfig, ChainError, ChainTransport};

pub use types::{
    Blob, BlobTransaction, ContractName, ContractRegistration, Identity, PLACEHOLDER_DIGEST,
    ProofTransaction, TransactionId, TransactionKind, TransactionRecord, VerifierKind,
};

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{Gate, MockChain};
