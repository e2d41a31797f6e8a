//! Loading the document to prove from.

use std::path::Path;

use anyhow::{Context, Result};

use prover_client::UploadRequest;

/// Read `path` into an upload for `claim`.
///
/// Without an explicit `content_type` the type is inferred from the file
/// extension; the orchestrator decides whether it is acceptable.
pub fn load(path: &Path, claim: &str, content_type: Option<&str>) -> Result<UploadRequest> {
    let file = std::fs::read(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let content_type = content_type
        .map(str::to_string)
        .unwrap_or_else(|| infer_content_type(path).to_string());

    Ok(UploadRequest::new(file, file_name, claim).with_content_type(content_type))
}

fn infer_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bill.PDF");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.7")
            .unwrap();

        let upload = load(&path, "Portugal", None).unwrap();

        assert_eq!(upload.file, b"%PDF-1.7".to_vec());
        assert_eq!(upload.file_name, "Bill.PDF");
        assert_eq!(upload.content_type, "application/pdf");
        assert_eq!(upload.claim, "Portugal");
    }

    #[test]
    fn test_explicit_content_type_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4").unwrap();

        let upload = load(file.path(), "Spain", Some("application/pdf")).unwrap();
        assert_eq!(upload.content_type, "application/pdf");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.pdf"), "Portugal", None).unwrap_err();
        assert!(err.to_string().contains("absent.pdf"));
    }
}
