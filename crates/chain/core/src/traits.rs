//! Chain transport trait and its error type.

use async_trait::async_trait;

use crate::types::{
    BlobTransaction, ContractName, ContractRegistration, ProofTransaction, TransactionId,
};

/// Transport layer errors.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChainError {
    /// Whether the node answered and refused the request, as opposed to the
    /// request never reaching it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ChainError::Rejected(_))
    }
}

/// Pure chain infrastructure layer.
///
/// Knows nothing about residency claims or sessions; it only moves contracts
/// and transactions to a node.
#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// Check whether a contract is registered. Single read, no side effects.
    async fn contract_exists(&self, contract_name: &ContractName) -> Result<bool, ChainError>;

    /// Register a verifier contract.
    ///
    /// Two callers racing on the same name may both get here; whether the
    /// second registration is accepted or rejected is up to the chain.
    async fn register_contract(
        &self,
        registration: ContractRegistration,
    ) -> Result<(), ChainError>;

    /// Broadcast a data (blob) transaction and return its hash.
    async fn broadcast_payload(&self, tx: BlobTransaction) -> Result<TransactionId, ChainError>;

    /// Broadcast a proof transaction for a previously sent data transaction.
    async fn broadcast_proof(&self, tx: ProofTransaction) -> Result<TransactionId, ChainError>;
}

/// Network-specific configuration.
pub trait ChainConfig: Send + Sync {
    /// Human-readable network name (e.g., "hyle-devnet")
    fn network_name(&self) -> &str;

    /// REST API base URL
    fn api_url(&self) -> &str;

    /// Validate configuration (URL shapes, non-empty values)
    fn validate(&self) -> Result<(), String>;
}
