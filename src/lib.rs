//! # edgequake-pdfstudy
//!
//! Ask questions about a PDF and get answers grounded only in its text.
//!
//! ## Why this crate?
//!
//! Students want summaries, key ideas and flashcards from their course
//! material, not from whatever a model remembers about the topic. This crate
//! extracts the text of one uploaded PDF, wraps it with the student's request
//! in a tutor prompt that restricts the model to the document, and sends the
//! whole thing to Google Gemini in a single stateless call.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF (path / URL / bytes)
//!  │
//!  ├─ 1. Input     resolve local file or download from URL, check %PDF
//!  ├─ 2. Extract   lopdf text per page, normalised, page order
//!  ├─ 3. Cache     one extraction per distinct file content, per session
//!  ├─ 4. Request   quick action or typed question (typed text wins)
//!  ├─ 5. Prompt    tutor template: document + request
//!  └─ 6. Model     one Gemini call; failures become notices, never crashes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfstudy::{resolve_input, AssistantConfig, Dispatcher, QuickAction, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AssistantConfig::default();
//!     let mut session = Session::new(&config);
//!     session.set_credential(std::env::var("GOOGLE_API_KEY")?);
//!
//!     let upload = resolve_input("apuntes.pdf", config.download_timeout_secs).await?;
//!     session.upload(upload)?;
//!
//!     let dispatcher = Dispatcher::new(&config)?;
//!     let outcome = dispatcher
//!         .dispatch(&session, Some(QuickAction::Flashcards), None)
//!         .await;
//!     if let Some(answer) = outcome.answer() {
//!         println!("{}", answer.response);
//!     } else if let Some(notice) = outcome.notice() {
//!         eprintln!("{notice}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfstudy` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdfstudy = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AssistantConfig, AssistantConfigBuilder, Credential};
pub use dispatch::{resolve_request, Answer, Dispatcher, Notice, Outcome};
pub use error::{LlmClientError, StudyError};
pub use pipeline::cache::{DocumentCache, DocumentId};
pub use pipeline::extract::{extract_text, Extraction};
pub use pipeline::input::{resolve_input, Upload};
pub use pipeline::llm::{GeminiClient, LlmClient};
pub use prompts::{build_prompt, PromptTemplate, QuickAction};
pub use session::{Document, Session};
