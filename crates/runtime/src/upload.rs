//! Upload admission checks.

use prover_client::UploadRequest;

use crate::api::{Result, RuntimeError};

const PDF_MIME: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Which documents the orchestrator forwards to the prover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Upper bound on the document size, in bytes
    pub max_file_size: usize,

    /// MIME types accepted, compared without parameters
    pub accepted_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: 5_000_000,
            accepted_types: vec![PDF_MIME.to_string()],
        }
    }
}

impl UploadPolicy {
    pub fn check(&self, upload: &UploadRequest) -> Result<()> {
        if upload.file.is_empty() {
            return Err(RuntimeError::InvalidInput(format!(
                "{} is empty",
                upload.file_name
            )));
        }

        if upload.file.len() > self.max_file_size {
            return Err(RuntimeError::InvalidInput(format!(
                "{} is {} bytes, the limit is {}",
                upload.file_name,
                upload.file.len(),
                self.max_file_size
            )));
        }

        let mime = essence(&upload.content_type);
        if !self
            .accepted_types
            .iter()
            .any(|accepted| essence(accepted) == mime)
        {
            return Err(RuntimeError::InvalidInput(format!(
                "content type {} is not accepted",
                upload.content_type
            )));
        }

        if mime == PDF_MIME && !upload.file.starts_with(PDF_MAGIC) {
            return Err(RuntimeError::InvalidInput(format!(
                "{} is declared as PDF but is not one",
                upload.file_name
            )));
        }

        if upload.claim.trim().is_empty() {
            return Err(RuntimeError::InvalidInput("claim is empty".to_string()));
        }

        Ok(())
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(size: usize) -> Vec<u8> {
        let mut file = PDF_MAGIC.to_vec();
        file.resize(size.max(PDF_MAGIC.len()), b' ');
        file
    }

    #[test]
    fn test_accepts_pdf_with_parameters() {
        let upload = UploadRequest::new(pdf(1024), "bill.pdf", "Portugal")
            .with_content_type("Application/PDF; charset=binary");
        assert!(UploadPolicy::default().check(&upload).is_ok());
    }

    #[test]
    fn test_rejections() {
        let policy = UploadPolicy::default();
        let cases = [
            UploadRequest::new(Vec::new(), "bill.pdf", "Portugal"),
            UploadRequest::new(pdf(5_000_001), "bill.pdf", "Portugal"),
            UploadRequest::new(pdf(64), "bill.png", "Portugal").with_content_type("image/png"),
            UploadRequest::new(b"GIF89a".to_vec(), "bill.pdf", "Portugal"),
            UploadRequest::new(pdf(64), "bill.pdf", " "),
        ];

        for upload in cases {
            assert!(
                matches!(policy.check(&upload), Err(RuntimeError::InvalidInput(_))),
                "{:?}",
                upload
            );
        }
    }

    #[test]
    fn test_exact_limit_is_allowed() {
        let upload = UploadRequest::new(pdf(5_000_000), "bill.pdf", "Portugal");
        assert!(UploadPolicy::default().check(&upload).is_ok());
    }
}
