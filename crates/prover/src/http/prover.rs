//! Client for a session's dedicated prover instance.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use chain_core::TransactionId;

use super::error_text;
use crate::config::ProverConfig;
use crate::envelope;
use crate::traits::{ProverError, ProverService};
use crate::types::{ArtifactKind, GeneratedProof, Session, UploadRequest, VerificationArtifact};

#[derive(Debug, Deserialize)]
struct VerificationKeyResponse {
    verification_key: String,
}

/// Prover instance reached over HTTP.
///
/// Holds two clients: one bounded by the configured timeout for probes and
/// artifact fetches, one without a timeout for proof generation.
pub struct HttpProverService {
    http_client: reqwest::Client,
    upload_client: reqwest::Client,
}

impl HttpProverService {
    pub fn new(config: &ProverConfig) -> Result<Self, ProverError> {
        Self::with_timeout(config.request_timeout)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ProverError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProverError::Unreachable(e.to_string()))?;
        let upload_client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProverError::Unreachable(e.to_string()))?;

        Ok(Self {
            http_client,
            upload_client,
        })
    }

    async fn fetch_verification_key(&self, session: &Session) -> Result<Vec<u8>, ProverError> {
        let response = self
            .http_client
            .get(session.endpoint.join("/verification-key"))
            .send()
            .await
            .map_err(|e| ProverError::Artifact(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProverError::Artifact(format!(
                "verification key request failed with status {}: {}",
                status,
                error_text(response).await
            )));
        }

        let body: VerificationKeyResponse = response
            .json()
            .await
            .map_err(|e| ProverError::Artifact(format!("malformed verification key: {}", e)))?;

        hex::decode(body.verification_key.trim_start_matches("0x"))
            .map_err(|e| ProverError::Artifact(format!("verification key is not hex: {}", e)))
    }

    async fn fetch_elf(&self, session: &Session) -> Result<Vec<u8>, ProverError> {
        let response = self
            .http_client
            .get(session.endpoint.join("/elf"))
            .send()
            .await
            .map_err(|e| ProverError::Artifact(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProverError::Artifact(format!(
                "elf request failed with status {}: {}",
                status,
                error_text(response).await
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProverError::Artifact(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ProverService for HttpProverService {
    async fn probe(&self, session: &Session) -> Result<(), ProverError> {
        // Any HTTP answer means the instance is up, whatever the status.
        self.http_client
            .get(session.endpoint.join("/verification-key"))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| ProverError::Unreachable(e.to_string()))
    }

    async fn fetch_artifact(
        &self,
        session: &Session,
        kind: ArtifactKind,
    ) -> Result<VerificationArtifact, ProverError> {
        debug!("Fetching {} from {}", kind, session.endpoint);

        let bytes = match kind {
            ArtifactKind::VerificationKey => self.fetch_verification_key(session).await?,
            ArtifactKind::Elf => self.fetch_elf(session).await?,
        };

        if bytes.is_empty() {
            return Err(ProverError::Artifact(format!("prover returned an empty {}", kind)));
        }

        info!("✓ Fetched {} ({} bytes)", kind, bytes.len());
        Ok(VerificationArtifact { kind, bytes })
    }

    async fn generate_proof(
        &self,
        session: &Session,
        upload: &UploadRequest,
        tx_hash: &TransactionId,
    ) -> Result<GeneratedProof, ProverError> {
        let file = Part::bytes(upload.file.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| ProverError::Rejected(format!("invalid content type: {}", e)))?;

        let form = Form::new()
            .part("file", file)
            .text("claim", upload.claim.clone())
            .text("tx_hash", tx_hash.to_string());

        debug!(
            "Uploading {} ({} bytes) for {}",
            upload.file_name,
            upload.file.len(),
            tx_hash
        );

        let response = self
            .upload_client
            .post(session.endpoint.join("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProverError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(ProverError::Rejected(format!(
                "upload failed with status {}: {}",
                status,
                error_text(response).await
            )));
        }
        if !status.is_success() {
            return Err(ProverError::ProofGeneration(format!(
                "upload failed with status {}: {}",
                status,
                error_text(response).await
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| ProverError::InvalidResponse(e.to_string()))?;

        let proof = envelope::normalize(content_type.as_deref(), &body)?;
        info!("✓ Proof generated for {} ({} bytes)", tx_hash, proof.bytes.len());
        Ok(proof)
    }
}
