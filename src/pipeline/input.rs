//! Input resolution: turn a user-supplied path or URL into an in-memory upload.
//!
//! The extractor parses from a byte buffer, so both local files and
//! downloads end up as an [`Upload`]. The `%PDF` magic is checked here so
//! callers get a meaningful error instead of a parser failure on, say, an
//! HTML error page served under a `.pdf` URL.

use crate::error::StudyError;
use std::path::Path;
use tracing::{debug, info};

/// One uploaded file: its display name and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// File name shown to the user. Not part of the document identity.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Reject uploads that do not start with the `%PDF` magic.
    pub fn ensure_pdf(&self) -> Result<(), StudyError> {
        if self.bytes.starts_with(b"%PDF") {
            Ok(())
        } else {
            Err(StudyError::NotAPdf {
                name: self.name.clone(),
                magic: self.bytes.iter().take(4).copied().collect(),
            })
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an upload.
///
/// URLs are downloaded with the given timeout; anything else is read as a
/// local path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Upload, StudyError> {
    let upload = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else if input.trim().is_empty() {
        return Err(StudyError::InvalidInput {
            input: input.to_string(),
        });
    } else {
        read_local(Path::new(input)).await?
    };
    upload.ensure_pdf()?;
    Ok(upload)
}

/// Read a local file into memory.
async fn read_local(path: &Path) -> Result<Upload, StudyError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => StudyError::PermissionDenied {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::NotFound => StudyError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => StudyError::Internal(format!("Failed to read {}: {}", path.display(), e)),
    })?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(Upload::new(file_name(path), bytes))
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Upload, StudyError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| StudyError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            StudyError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            StudyError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(StudyError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            StudyError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            StudyError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(Upload::new(filename_from_url(url), bytes.to_vec()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract a reasonable filename from the URL path.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(filename_from_url("https://x.org/papers/notes.pdf"), "notes.pdf");
        assert_eq!(filename_from_url("https://arxiv.org/pdf/1706"), "downloaded.pdf");
        assert_eq!(filename_from_url("not a url"), "downloaded.pdf");
    }

    #[test]
    fn ensure_pdf_reports_magic() {
        let upload = Upload::new("page.html", b"<html>".to_vec());
        match upload.ensure_pdf() {
            Err(StudyError::NotAPdf { name, magic }) => {
                assert_eq!(name, "page.html");
                assert_eq!(magic, b"<htm".to_vec());
            }
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, StudyError::FileNotFound { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn blank_input_is_invalid() {
        let err = resolve_input("  ", 5).await.unwrap_err();
        assert!(matches!(err, StudyError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn local_non_pdf_rejected() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"just some text").unwrap();
        let path = tmp.path().to_string_lossy().to_string();
        let err = resolve_input(&path, 5).await.unwrap_err();
        assert!(matches!(err, StudyError::NotAPdf { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn local_pdf_read_with_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apuntes.pdf");
        std::fs::write(&path, b"%PDF-1.5\n%stub").unwrap();
        let upload = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(upload.name, "apuntes.pdf");
        assert!(upload.bytes.starts_with(b"%PDF"));
    }
}
