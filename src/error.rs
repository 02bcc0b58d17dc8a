//! Error types for the edgequake-pdfstudy library.
//!
//! Two error types reflect two distinct layers:
//!
//! * [`StudyError`]: the current operation cannot proceed (bad input file,
//!   unreadable PDF, invalid configuration). Returned as `Err(StudyError)` from input
//!   resolution, extraction and session uploads.
//!
//! * [`LlmClientError`]: the model call itself failed. Produced by
//!   [`crate::pipeline::llm::LlmClient`] implementations and converted into a
//!   user-facing [`crate::dispatch::Notice`] at the dispatcher boundary, so a
//!   failed call never ends the session.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the current operation.
#[derive(Debug, Error)]
pub enum StudyError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The upload was read, but does not start with the `%PDF` magic.
    #[error("'{name}' is not a PDF document\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The PDF container (header, xref, trailer) could not be parsed.
    #[error("Could not read document '{name}': {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    DocumentParse { name: String, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The model call failed.
    #[error(transparent)]
    Invocation(#[from] LlmClientError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed model invocation.
///
/// The dispatcher folds `Auth`, `Network` and `Provider` into one generic
/// notice; `Timeout` is reported on its own.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmClientError {
    /// The provider rejected the API key (401/403, or 400 with an invalid-key reason).
    #[error("Authentication failed: {detail}")]
    Auth { detail: String },

    /// The request never produced an HTTP response.
    #[error("Network error: {detail}")]
    Network { detail: String },

    /// The provider answered with an error status or a response without text.
    #[error("Provider error{}: {detail}", status_suffix(.status))]
    Provider { status: Option<u16>, detail: String },

    /// The call exceeded the configured deadline.
    #[error("Model call timed out after {secs}s")]
    Timeout { secs: u64 },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl LlmClientError {
    /// Short machine-friendly kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmClientError::Auth { .. } => "auth",
            LlmClientError::Network { .. } => "network",
            LlmClientError::Provider { .. } => "provider",
            LlmClientError::Timeout { .. } => "timeout",
        }
    }
}
