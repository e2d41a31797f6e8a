//! JSON bodies exchanged with the node REST API.
//!
//! Byte fields travel hex-encoded.

use serde::{Deserialize, Serialize};

use chain_core::{
    BlobTransaction, ContractRegistration, ProofTransaction, TransactionId, VerifierKind,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterContractBody {
    pub verifier: VerifierKind,
    pub contract_name: String,
    pub verification_key: String,
    pub digest: String,
}

impl From<&ContractRegistration> for RegisterContractBody {
    fn from(registration: &ContractRegistration) -> Self {
        Self {
            verifier: registration.verifier,
            contract_name: registration.contract_name.as_str().to_string(),
            verification_key: hex::encode(&registration.verification_key),
            digest: hex::encode(&registration.digest),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlobBody {
    pub contract_name: String,
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlobTransactionBody {
    pub identity: String,
    pub blobs: Vec<BlobBody>,
}

impl From<&BlobTransaction> for BlobTransactionBody {
    fn from(tx: &BlobTransaction) -> Self {
        Self {
            identity: tx.identity.as_str().to_string(),
            blobs: tx
                .blobs
                .iter()
                .map(|blob| BlobBody {
                    contract_name: blob.contract_name.as_str().to_string(),
                    data: hex::encode(&blob.data),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProofTransactionBody {
    pub tx_hash: String,
    pub blob_index: u32,
    pub contract_name: String,
    pub proof: String,
}

impl From<&ProofTransaction> for ProofTransactionBody {
    fn from(tx: &ProofTransaction) -> Self {
        Self {
            tx_hash: tx.tx_hash.as_str().to_string(),
            blob_index: tx.blob_index,
            contract_name: tx.contract_name.as_str().to_string(),
            proof: hex::encode(&tx.proof),
        }
    }
}

/// Parse a transaction hash response.
///
/// The node answers with a JSON string; older nodes answered with the bare
/// hash as text.
pub fn parse_tx_hash(body: &str) -> Option<TransactionId> {
    let hash = match serde_json::from_str::<String>(body) {
        Ok(hash) => hash,
        Err(_) => body.trim().to_string(),
    };

    if hash.is_empty() {
        None
    } else {
        Some(TransactionId::new(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_core::{Blob, ContractName, Identity};

    #[test]
    fn test_tx_hash_accepts_json_string_and_bare_text() {
        assert_eq!(parse_tx_hash("\"abc123\"").unwrap().as_str(), "abc123");
        assert_eq!(parse_tx_hash("abc123\n").unwrap().as_str(), "abc123");
        assert!(parse_tx_hash("  ").is_none());
        assert!(parse_tx_hash("\"\"").is_none());
    }

    #[test]
    fn test_blob_body_hex_encodes_data() {
        let tx = BlobTransaction {
            identity: Identity::default(),
            blobs: vec![Blob {
                contract_name: ContractName::new("sp1_residency"),
                data: b"PT".to_vec(),
            }],
        };
        let body = BlobTransactionBody::from(&tx);
        assert_eq!(body.identity, "default");
        assert_eq!(body.blobs[0].data, "5054");
    }
}
