//! Data and proof transaction broadcasts.

use std::sync::Arc;

use tracing::info;

use chain_core::{
    Blob, BlobTransaction, ChainError, ChainTransport, ContractName, Identity, ProofTransaction,
    TransactionId, TransactionKind, TransactionRecord,
};

#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("data transaction rejected")]
    Data(#[source] ChainError),

    #[error("proof transaction for {tx_hash} rejected")]
    Proof {
        tx_hash: TransactionId,
        #[source]
        source: ChainError,
    },
}

/// A data transaction the chain accepted.
///
/// Only [`TransactionBroadcaster::broadcast_data`] creates one, so a proof
/// broadcast always refers to a data transaction that exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTransaction {
    record: TransactionRecord,
}

impl DataTransaction {
    pub fn id(&self) -> &TransactionId {
        &self.record.id
    }

    pub fn contract_name(&self) -> &ContractName {
        &self.record.contract_name
    }

    pub fn record(&self) -> &TransactionRecord {
        &self.record
    }
}

#[derive(Clone)]
pub struct TransactionBroadcaster {
    chain: Arc<dyn ChainTransport>,
}

impl TransactionBroadcaster {
    pub fn new(chain: Arc<dyn ChainTransport>) -> Self {
        Self { chain }
    }

    pub async fn broadcast_data(
        &self,
        contract_name: &ContractName,
        identity: &Identity,
        payload: Vec<u8>,
    ) -> Result<DataTransaction, BroadcastError> {
        let tx = BlobTransaction {
            identity: identity.clone(),
            blobs: vec![Blob {
                contract_name: contract_name.clone(),
                data: payload.clone(),
            }],
        };

        let id = self
            .chain
            .broadcast_payload(tx)
            .await
            .map_err(BroadcastError::Data)?;

        info!("✓ Data transaction {} for {}", id, contract_name);
        Ok(DataTransaction {
            record: TransactionRecord {
                id,
                kind: TransactionKind::Data,
                contract_name: contract_name.clone(),
                payload,
            },
        })
    }

    /// Settle `data` with `proof`. The proof targets the first blob.
    pub async fn broadcast_proof(
        &self,
        data: &DataTransaction,
        proof: Vec<u8>,
    ) -> Result<TransactionRecord, BroadcastError> {
        let tx = ProofTransaction {
            tx_hash: data.id().clone(),
            blob_index: 0,
            contract_name: data.contract_name().clone(),
            proof: proof.clone(),
        };

        let id = self
            .chain
            .broadcast_proof(tx)
            .await
            .map_err(|source| BroadcastError::Proof {
                tx_hash: data.id().clone(),
                source,
            })?;

        info!("✓ Proof transaction {} settles {}", id, data.id());
        Ok(TransactionRecord {
            id,
            kind: TransactionKind::Proof,
            contract_name: data.contract_name().clone(),
            payload: proof,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_core::MockChain;

    #[tokio::test]
    async fn test_proof_references_data_transaction() {
        let chain = MockChain::new().with_tx_hashes(["tx_abc", "tx_proof"]);
        let broadcaster = TransactionBroadcaster::new(Arc::new(chain.clone()));
        let contract = ContractName::new("sp1_residency");

        let data = broadcaster
            .broadcast_data(&contract, &Identity::default(), b"Portugal".to_vec())
            .await
            .unwrap();
        assert_eq!(data.id().as_str(), "tx_abc");
        assert_eq!(data.record().kind, TransactionKind::Data);

        let proof = broadcaster
            .broadcast_proof(&data, vec![7; 128])
            .await
            .unwrap();
        assert_eq!(proof.kind, TransactionKind::Proof);
        assert_eq!(proof.id.as_str(), "tx_proof");

        let sent = chain.proofs();
        assert_eq!(sent[0].tx_hash.as_str(), "tx_abc");
        assert_eq!(sent[0].blob_index, 0);
        assert_eq!(sent[0].contract_name, contract);
        assert_eq!(chain.payloads()[0].blobs[0].data, b"Portugal".to_vec());
    }

    #[tokio::test]
    async fn test_rejected_data_broadcast() {
        let chain = MockChain::new();
        chain.fail_payload("insufficient funds");
        let broadcaster = TransactionBroadcaster::new(Arc::new(chain.clone()));

        let err = broadcaster
            .broadcast_data(
                &ContractName::new("sp1_residency"),
                &Identity::default(),
                b"Portugal".to_vec(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BroadcastError::Data(ChainError::Rejected(_))));
        assert!(chain.proofs().is_empty());
    }
}
