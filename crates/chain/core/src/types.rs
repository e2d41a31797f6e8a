//! Common types for chain interactions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Digest submitted alongside every contract registration.
///
/// The verifier contracts this client registers carry no initial state, so the
/// digest is a fixed placeholder.
pub const PLACEHOLDER_DIGEST: [u8; 4] = [0, 0, 0, 0];

/// Chain transaction identifier (transaction hash as reported by the node).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Name under which a verifier contract is registered on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractName(String);

impl ContractName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity on whose behalf blob transactions are sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new("default")
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Proof system a registered contract verifies.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum VerifierKind {
    /// SP1 zkVM (compressed proofs checked against a verification key)
    #[default]
    Sp1,
    /// RISC0 zkVM (receipts checked against an image id)
    Risc0,
    /// Noir circuits
    Noir,
}

/// Registration request for a verifier contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRegistration {
    pub verifier: VerifierKind,
    pub contract_name: ContractName,
    /// Verification key or program image, depending on the verifier
    pub verification_key: Vec<u8>,
    pub digest: Vec<u8>,
}

impl ContractRegistration {
    /// Registration with the placeholder digest.
    pub fn new(
        verifier: VerifierKind,
        contract_name: ContractName,
        verification_key: Vec<u8>,
    ) -> Self {
        Self {
            verifier,
            contract_name,
            verification_key,
            digest: PLACEHOLDER_DIGEST.to_vec(),
        }
    }
}

/// Opaque application data addressed to one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub contract_name: ContractName,
    pub data: Vec<u8>,
}

/// Data transaction: one or more blobs sent by an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobTransaction {
    pub identity: Identity,
    pub blobs: Vec<Blob>,
}

/// Proof transaction settling one blob of a previously sent data transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofTransaction {
    /// Hash of the data transaction being proven
    pub tx_hash: TransactionId,
    /// Index of the proven blob within that transaction
    pub blob_index: u32,
    pub contract_name: ContractName,
    pub proof: Vec<u8>,
}

/// Which of the two submission transactions a record describes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum TransactionKind {
    Data,
    Proof,
}

/// Record of a transaction accepted by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub contract_name: ContractName,
    pub payload: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifier_kind_parses_case_insensitively() {
        assert_eq!("SP1".parse::<VerifierKind>().unwrap(), VerifierKind::Sp1);
        assert_eq!("risc0".parse::<VerifierKind>().unwrap(), VerifierKind::Risc0);
        assert!("groth16".parse::<VerifierKind>().is_err());
        assert_eq!(VerifierKind::Noir.to_string(), "noir");
    }

    #[test]
    fn registration_uses_placeholder_digest() {
        let registration = ContractRegistration::new(
            VerifierKind::Sp1,
            ContractName::new("sp1_residency"),
            vec![0xab; 32],
        );
        assert_eq!(registration.digest, vec![0, 0, 0, 0]);
    }
}
