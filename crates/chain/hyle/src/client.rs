//! Hyle node REST client.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use tracing::{debug, info};

use chain_core::{
    BlobTransaction, ChainConfig, ChainError, ChainTransport, ContractName, ContractRegistration,
    ProofTransaction, TransactionId,
};

use crate::config::HyleConfig;
use crate::wire::{
    BlobTransactionBody, ProofTransactionBody, RegisterContractBody, parse_tx_hash,
};

/// Hyle chain client using the node REST API.
pub struct HyleClient {
    config: HyleConfig,

    /// HTTP client
    http_client: reqwest::Client,
}

impl HyleClient {
    /// Create a client for the configured network.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::Config` if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: HyleConfig) -> Result<Self, ChainError> {
        config.validate().map_err(ChainError::Config)?;

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ChainError::Config(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &HyleConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.get_api_url(), path)
    }

    /// Turn a non-success response into an error, keeping the node's message.
    async fn check_status(response: Response, what: &str) -> Result<Response, ChainError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = format!("{} failed with status {}: {}", what, status, error_text);

        if status.is_client_error() {
            Err(ChainError::Rejected(message))
        } else {
            Err(ChainError::Network(message))
        }
    }

    async fn read_tx_hash(response: Response, what: &str) -> Result<TransactionId, ChainError> {
        let body = response
            .text()
            .await
            .map_err(|e| ChainError::Network(format!("Failed to read {} response: {}", what, e)))?;

        parse_tx_hash(&body).ok_or_else(|| {
            ChainError::Serialization(format!(
                "{} response carried no transaction hash. Raw response: {}",
                what, body
            ))
        })
    }
}

fn send_error(what: &str, error: reqwest::Error) -> ChainError {
    ChainError::Network(format!("Failed to send {} request: {}", what, error))
}

#[async_trait]
impl ChainTransport for HyleClient {
    async fn contract_exists(&self, contract_name: &ContractName) -> Result<bool, ChainError> {
        let url = self.url(&format!("/v1/contract/{}", contract_name));

        debug!("Checking contract {} at {}", contract_name, url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| send_error("contract lookup", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        Self::check_status(response, "Contract lookup").await?;
        Ok(true)
    }

    async fn register_contract(
        &self,
        registration: ContractRegistration,
    ) -> Result<(), ChainError> {
        let body = RegisterContractBody::from(&registration);

        debug!(
            "Registering contract {} (verifier: {}, key: {} bytes)",
            registration.contract_name,
            registration.verifier,
            registration.verification_key.len()
        );

        let response = self
            .http_client
            .post(self.url("/v1/contract/register"))
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error("contract registration", e))?;

        Self::check_status(response, "Contract registration").await?;

        info!(
            "✓ Contract registered on {}: {}",
            self.config.network_name(),
            registration.contract_name
        );
        Ok(())
    }

    async fn broadcast_payload(&self, tx: BlobTransaction) -> Result<TransactionId, ChainError> {
        let body = BlobTransactionBody::from(&tx);

        debug!(
            "Broadcasting blob transaction: identity={}, {} blob(s)",
            tx.identity,
            tx.blobs.len()
        );

        let response = self
            .http_client
            .post(self.url("/v1/tx/send/blob"))
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error("blob transaction", e))?;

        let response = Self::check_status(response, "Blob transaction").await?;
        let tx_hash = Self::read_tx_hash(response, "Blob transaction").await?;

        info!("✓ Blob transaction accepted: {}", tx_hash);
        Ok(tx_hash)
    }

    async fn broadcast_proof(&self, tx: ProofTransaction) -> Result<TransactionId, ChainError> {
        let body = ProofTransactionBody::from(&tx);

        debug!(
            "Broadcasting proof for {} (contract: {}, {} bytes)",
            tx.tx_hash,
            tx.contract_name,
            tx.proof.len()
        );

        let response = self
            .http_client
            .post(self.url("/v1/tx/send/proof"))
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error("proof transaction", e))?;

        let response = Self::check_status(response, "Proof transaction").await?;
        let proof_hash = Self::read_tx_hash(response, "Proof transaction").await?;

        info!("✓ Proof transaction accepted: {} (proves {})", proof_hash, tx.tx_hash);
        Ok(proof_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HyleNetwork;

    #[test]
    fn test_client_creation() {
        let client = HyleClient::new(HyleConfig::new(HyleNetwork::Devnet)).unwrap();
        assert_eq!(
            client.url("/v1/tx/send/blob"),
            "https://api.devnet.hyle.eu/v1/tx/send/blob"
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = HyleConfig::default().with_api_url("localhost:1317");
        assert!(matches!(
            HyleClient::new(config),
            Err(ChainError::Config(_))
        ));
    }
}
