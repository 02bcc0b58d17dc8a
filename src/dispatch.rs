//! One interaction cycle: pick the active request, build the prompt, call
//! the model, and turn every failure into a user-facing [`Notice`].
//!
//! ## Cycle
//!
//! ```text
//! (quick action?, typed text?)
//!        │  resolve_request: typed text wins
//!        ▼
//!   request? ── none ──▶ Outcome::Idle
//!        │
//!        ├─ no document ─────────▶ Notice::NoDocument
//!        ├─ no API key ──────────▶ Notice::MissingCredential
//!        ├─ document too large ──▶ Notice::DocumentTooLarge
//!        ▼
//!   prompt = template(document, request)
//!        │  one call, no history, bounded by api_timeout_secs
//!        ▼
//!   Outcome::Answered | Notice::InvocationFailed | Notice::Timeout
//! ```
//!
//! The dispatcher never retries and never returns an error: whatever
//! happens, control goes back to the caller, ready for the next cycle.

use crate::config::AssistantConfig;
use crate::error::{LlmClientError, StudyError};
use crate::pipeline::llm::{GeminiClient, LlmClient};
use crate::prompts::{PromptTemplate, QuickAction};
use crate::session::Session;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Resolve the single active request for this cycle.
///
/// Typed text takes precedence over a quick action selected in the same
/// cycle. Blank typed text counts as no text.
pub fn resolve_request(canned: Option<QuickAction>, freeform: Option<&str>) -> Option<String> {
    match freeform {
        Some(text) if !text.trim().is_empty() => Some(text.to_string()),
        _ => canned.map(|action| action.instruction().to_string()),
    }
}

/// Something to show the user instead of (or alongside) an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A request arrived before any document was uploaded.
    NoDocument,
    /// No API key is configured; the model was not called.
    MissingCredential,
    /// The document text exceeds `max_document_chars`; the model was not called.
    DocumentTooLarge { chars: usize, limit: usize },
    /// The model call failed (authentication, network, quota, malformed reply).
    InvocationFailed,
    /// The model call exceeded the configured deadline.
    Timeout { secs: u64 },
    /// The document has no extractable text; the answer may be useless.
    EmptyDocument,
    /// No file at the given path, or the input was blank.
    DocumentNotFound,
    /// The file exists but cannot be read.
    PermissionDenied,
    /// The document URL could not be downloaded.
    DownloadFailed,
    /// The document download exceeded its deadline.
    DownloadTimeout { secs: u64 },
    /// The uploaded file is not a PDF, or its container is corrupt.
    UnreadableDocument,
    /// Loading the document failed for another reason.
    UploadFailed,
}

impl Notice {
    /// Map an upload error to the notice shown in its place.
    pub fn from_upload_error(err: &StudyError) -> Self {
        match err {
            StudyError::FileNotFound { .. } | StudyError::InvalidInput { .. } => {
                Notice::DocumentNotFound
            }
            StudyError::PermissionDenied { .. } => Notice::PermissionDenied,
            StudyError::DownloadFailed { .. } => Notice::DownloadFailed,
            StudyError::DownloadTimeout { secs, .. } => Notice::DownloadTimeout { secs: *secs },
            StudyError::NotAPdf { .. } | StudyError::DocumentParse { .. } => {
                Notice::UnreadableDocument
            }
            StudyError::Invocation(_) | StudyError::InvalidConfig(_) | StudyError::Internal(_) => {
                Notice::UploadFailed
            }
        }
    }

    /// Warnings accompany an answer; everything else replaces it.
    pub fn is_warning(&self) -> bool {
        matches!(self, Notice::EmptyDocument)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoDocument => f.write_str("Upload a PDF document first."),
            Notice::MissingCredential => f.write_str(
                "Enter your Google API key to start asking questions about the document.",
            ),
            Notice::DocumentTooLarge { chars, limit } => write!(
                f,
                "The document is too long for the model ({chars} characters, limit {limit}). \
                 Split it and upload the part you want to study."
            ),
            Notice::InvocationFailed => {
                f.write_str("Could not connect to the model. Check your API key and try again.")
            }
            Notice::Timeout { secs } => write!(
                f,
                "The model did not answer within {secs}s. Try again, or ask about a shorter document."
            ),
            Notice::EmptyDocument => f.write_str(
                "No text could be extracted from this document (is it a scanned image?).",
            ),
            Notice::DocumentNotFound => {
                f.write_str("Document not found. Check the path and try again.")
            }
            Notice::PermissionDenied => {
                f.write_str("The document exists but cannot be read. Check its permissions.")
            }
            Notice::DownloadFailed => f.write_str(
                "Could not download the document. Check the URL and your connection.",
            ),
            Notice::DownloadTimeout { secs } => write!(
                f,
                "The document download did not finish within {secs}s. Try again later."
            ),
            Notice::UnreadableDocument => {
                f.write_str("Could not read the document. Is it a valid PDF?")
            }
            Notice::UploadFailed => f.write_str("Could not load the document."),
        }
    }
}

/// A successful cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    /// The request that was sent, exactly as resolved.
    pub request: String,
    /// The model's reply, unmodified.
    pub response: String,
    /// Non-fatal notices, e.g. [`Notice::EmptyDocument`].
    pub warnings: Vec<Notice>,
    pub duration_ms: u64,
}

/// Result of one interaction cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// No request was active; nothing happened.
    Idle,
    Answered(Answer),
    Notice(Notice),
}

impl Outcome {
    pub fn answer(&self) -> Option<&Answer> {
        match self {
            Outcome::Answered(a) => Some(a),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Outcome::Notice(n) => Some(n),
            _ => None,
        }
    }
}

/// Runs interaction cycles against one [`LlmClient`].
pub struct Dispatcher {
    client: Arc<dyn LlmClient>,
    template: PromptTemplate,
    timeout: Duration,
    max_document_chars: Option<usize>,
}

impl Dispatcher {
    /// Dispatcher talking to Gemini as configured.
    pub fn new(config: &AssistantConfig) -> Result<Self, StudyError> {
        let client = GeminiClient::new(config)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Dispatcher with an explicit client (another provider, or a stub).
    pub fn with_client(config: &AssistantConfig, client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            template: config.prompt_template.clone(),
            timeout: Duration::from_secs(config.api_timeout_secs),
            max_document_chars: config.max_document_chars,
        }
    }

    /// Run one cycle.
    pub async fn dispatch(
        &self,
        session: &Session,
        canned: Option<QuickAction>,
        freeform: Option<&str>,
    ) -> Outcome {
        let Some(request) = resolve_request(canned, freeform) else {
            return Outcome::Idle;
        };
        let Some(document) = session.document() else {
            return Outcome::Notice(Notice::NoDocument);
        };
        let Some(credential) = session.credential() else {
            info!("No API key configured; skipping model call");
            return Outcome::Notice(Notice::MissingCredential);
        };

        if let Some(limit) = self.max_document_chars {
            let chars = document.char_count();
            if chars > limit {
                warn!("Document {} has {} chars, limit is {}", document.id, chars, limit);
                return Outcome::Notice(Notice::DocumentTooLarge { chars, limit });
            }
        }

        let mut warnings = Vec::new();
        if document.is_empty() {
            warnings.push(Notice::EmptyDocument);
        }

        let prompt = self.template.render(document.text(), &request);
        debug!(
            "Prompt for document {}: {} bytes (request {} bytes)",
            document.id,
            prompt.len(),
            request.len()
        );

        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.client.generate(credential, &prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LlmClientError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                info!(
                    "{} answered in {}ms ({} bytes)",
                    self.client.name(),
                    duration_ms,
                    response.len()
                );
                Outcome::Answered(Answer {
                    request,
                    response,
                    warnings,
                    duration_ms,
                })
            }
            Err(LlmClientError::Timeout { secs }) => {
                warn!("{} timed out after {}s", self.client.name(), secs);
                Outcome::Notice(Notice::Timeout { secs })
            }
            Err(e) => {
                warn!("{} call failed ({}): {}", self.client.name(), e.kind(), e);
                Outcome::Notice(Notice::InvocationFailed)
            }
        }
    }

    /// Blocking wrapper around [`dispatch`](Self::dispatch).
    ///
    /// Creates a temporary tokio runtime internally; do not call it from
    /// inside an async context.
    pub fn dispatch_sync(
        &self,
        session: &Session,
        canned: Option<QuickAction>,
        freeform: Option<&str>,
    ) -> Result<Outcome, StudyError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StudyError::Internal(format!("Failed to create tokio runtime: {}", e)))?;
        Ok(runtime.block_on(self.dispatch(session, canned, freeform)))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("client", &self.client.name())
            .field("template", &self.template)
            .field("timeout", &self.timeout)
            .field("max_document_chars", &self.max_document_chars)
            .finish()
    }
}
