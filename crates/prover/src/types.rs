//! Session, artifact, and proof types shared by the prover clients.

use std::fmt;

use serde::{Deserialize, Serialize};

use chain_core::TransactionId;

/// Opaque token identifying a prover session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Base URL of a dedicated prover instance, without trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProverEndpoint(String);

impl ProverEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        let url: String = url.into();
        Self(url.trim_end_matches('/').to_string())
    }

    /// Endpoint for a prover listening on `port` of `host`.
    pub fn from_host_port(host: &str, port: u16) -> Self {
        if host.starts_with("http://") || host.starts_with("https://") {
            Self::new(format!("{}:{}", host.trim_end_matches('/'), port))
        } else {
            Self::new(format!("http://{}:{}", host, port))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }
}

impl fmt::Display for ProverEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a dedicated prover instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub endpoint: ProverEndpoint,
}

/// Which artifact the prover hands out for contract registration.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ArtifactKind {
    /// `GET /verification-key`, hex key in a JSON object
    #[default]
    VerificationKey,
    /// `GET /elf`, raw program image
    Elf,
}

/// Artifact needed to register a contract able to check this prover's proofs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationArtifact {
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
}

/// Document upload for proof generation.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: Vec<u8>,
    pub file_name: String,
    /// Declared MIME type of `file`
    pub content_type: String,
    /// Claimed value the document should establish (e.g. country of residence)
    pub claim: String,
}

impl UploadRequest {
    pub fn new(file: Vec<u8>, file_name: impl Into<String>, claim: impl Into<String>) -> Self {
        Self {
            file,
            file_name: file_name.into(),
            content_type: "application/pdf".to_string(),
            claim: claim.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Document contents stay out of logs.
        f.debug_struct("UploadRequest")
            .field("file", &format_args!("<{} bytes>", self.file.len()))
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("claim", &self.claim)
            .finish()
    }
}

/// Proof returned by the prover, whatever shape the response had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProof {
    pub bytes: Vec<u8>,
    /// Transaction the prover says it proved, when it echoes one
    pub tx_hash: Option<TransactionId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_host_port() {
        assert_eq!(
            ProverEndpoint::from_host_port("localhost", 9001).as_str(),
            "http://localhost:9001"
        );
        assert_eq!(
            ProverEndpoint::from_host_port("https://prover.example/", 443).as_str(),
            "https://prover.example:443"
        );
        assert_eq!(
            ProverEndpoint::new("http://127.0.0.1:9001/").join("/elf"),
            "http://127.0.0.1:9001/elf"
        );
    }

    #[test]
    fn test_upload_debug_hides_contents() {
        let upload = UploadRequest::new(b"%PDF-secret".to_vec(), "bill.pdf", "Portugal");
        let rendered = format!("{:?}", upload);
        assert!(rendered.contains("<11 bytes>"));
        assert!(!rendered.contains("secret"));
    }
}
