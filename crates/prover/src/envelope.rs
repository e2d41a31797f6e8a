//! Normalization of proof responses.
//!
//! Prover builds have answered `POST /upload` in two shapes:
//! - the raw proof as an `application/octet-stream` body
//! - a JSON envelope `{ success, result, proof, tx_hash, vk }`
//!
//! Both become a [`GeneratedProof`] here so nothing past this module branches on
//! the wire shape.
//!
//! # Resilience
//!
//! The envelope fields are optional where older builds omitted them, and the
//! proof itself may be a JSON byte array (serde's `Vec<u8>`) or a hex string.

use serde::Deserialize;

use chain_core::TransactionId;

use crate::traits::ProverError;
use crate::types::GeneratedProof;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProofField {
    Bytes(Vec<u8>),
    Hex(String),
}

#[derive(Debug, Deserialize)]
struct ProofEnvelope {
    #[serde(default = "default_true")]
    success: bool,

    /// Whether the document satisfied the claim
    #[serde(default = "default_true")]
    result: bool,

    proof: ProofField,

    #[serde(default)]
    tx_hash: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Build a [`GeneratedProof`] from an upload response body.
///
/// `content_type` is the response `Content-Type`, if any. Without one, a body
/// that parses as an envelope is treated as one.
pub fn normalize(content_type: Option<&str>, body: &[u8]) -> Result<GeneratedProof, ProverError> {
    let declared_json = content_type
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false);

    if declared_json {
        return from_envelope(body);
    }

    if content_type.is_none() && body.first() == Some(&b'{') {
        if let Ok(envelope) = serde_json::from_slice::<ProofEnvelope>(body) {
            return envelope.into_proof();
        }
    }

    from_raw(body)
}

fn from_raw(body: &[u8]) -> Result<GeneratedProof, ProverError> {
    if body.is_empty() {
        return Err(ProverError::InvalidResponse(
            "prover returned an empty proof".to_string(),
        ));
    }

    Ok(GeneratedProof {
        bytes: body.to_vec(),
        tx_hash: None,
    })
}

fn from_envelope(body: &[u8]) -> Result<GeneratedProof, ProverError> {
    let envelope: ProofEnvelope = serde_json::from_slice(body).map_err(|e| {
        ProverError::InvalidResponse(format!("malformed proof envelope: {}", e))
    })?;
    envelope.into_proof()
}

impl ProofEnvelope {
    fn into_proof(self) -> Result<GeneratedProof, ProverError> {
        if !self.success {
            return Err(ProverError::ProofGeneration(
                "prover reported an unsuccessful run".to_string(),
            ));
        }

        if !self.result {
            return Err(ProverError::ProofGeneration(
                "document does not establish the claimed residency".to_string(),
            ));
        }

        let bytes = match self.proof {
            ProofField::Bytes(bytes) => bytes,
            ProofField::Hex(encoded) => hex::decode(encoded.trim_start_matches("0x"))
                .map_err(|e| ProverError::InvalidResponse(format!("proof is not hex: {}", e)))?,
        };

        if bytes.is_empty() {
            return Err(ProverError::InvalidResponse(
                "prover returned an empty proof".to_string(),
            ));
        }

        Ok(GeneratedProof {
            bytes,
            tx_hash: self
                .tx_hash
                .filter(|hash| !hash.is_empty())
                .map(TransactionId::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_and_envelope_normalize_to_same_proof() {
        let raw = normalize(Some("application/octet-stream"), &[1, 2, 3]).unwrap();
        let envelope = normalize(
            Some("application/json"),
            br#"{"success":true,"result":true,"proof":[1,2,3],"tx_hash":"","vk":"0x00"}"#,
        )
        .unwrap();

        assert_eq!(raw.bytes, envelope.bytes);
        assert_eq!(envelope.tx_hash, None);
    }

    #[test]
    fn test_envelope_echoes_tx_hash_and_accepts_hex_proof() {
        let proof = normalize(
            Some("application/json; charset=utf-8"),
            br#"{"success":true,"result":true,"proof":"0xdeadbeef","tx_hash":"tx_abc"}"#,
        )
        .unwrap();

        assert_eq!(proof.bytes, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(proof.tx_hash, Some(TransactionId::new("tx_abc")));
    }

    #[test]
    fn test_failed_claim_is_a_generation_failure() {
        let err = normalize(
            Some("application/json"),
            br#"{"success":true,"result":false,"proof":[9]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProverError::ProofGeneration(_)));

        let err = normalize(None, br#"{"success":false,"result":false,"proof":[]}"#).unwrap_err();
        assert!(matches!(err, ProverError::ProofGeneration(_)));
    }

    #[test]
    fn test_empty_body_is_invalid() {
        assert!(matches!(
            normalize(None, &[]),
            Err(ProverError::InvalidResponse(_))
        ));
    }
}
