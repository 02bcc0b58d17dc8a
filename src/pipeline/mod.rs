//! Pipeline stages from an uploaded file to a model answer.
//!
//! Each submodule implements one step and is tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ cache ──▶ (prompt) ──▶ llm
//! (path/URL)  (lopdf)   (blake3)               (Gemini)
//! ```
//!
//! 1. [`input`]     load the path or URL into memory as an [`input::Upload`]
//! 2. [`extract`]   pull text page by page; unreadable pages are skipped
//! 3. [`normalize`] clean each page's text before joining
//! 4. [`cache`]     remember extractions by content hash for the session
//! 5. [`llm`]       the only stage with network I/O after input

pub mod cache;
pub mod extract;
pub mod input;
pub mod llm;
pub mod normalize;
