//! PDF text extraction via lopdf.
//!
//! The whole document is parsed from memory; text is then pulled page by
//! page. The two failure levels are kept apart:
//!
//! * the container itself is unreadable (bad header, broken xref, wrong
//!   password): nothing can be extracted and [`StudyError::DocumentParse`]
//!   is returned;
//! * a single page has no usable text (scanned image, font without a
//!   decodable encoding, corrupt content stream): that page contributes
//!   nothing and the rest of the document is still returned.
//!
//! Every page that yields text is normalised (see [`super::normalize`]) and
//! followed by one `\n`, in page order.

use crate::error::StudyError;
use crate::pipeline::input::Upload;
use crate::pipeline::normalize::normalize_page;
use lopdf::Document;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of extracting a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Page texts joined in page order, each followed by a newline.
    pub text: String,
    /// Number of pages in the document.
    pub page_count: usize,
    /// 1-indexed pages that contributed no text.
    pub empty_pages: Vec<u32>,
}

impl Extraction {
    /// True when no page yielded any text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Extract the text of an in-memory PDF.
pub fn extract_text(bytes: &[u8]) -> Result<String, StudyError> {
    extract_document("<memory>", bytes).map(|e| e.text)
}

/// Extract the text of an upload, keeping per-page bookkeeping.
pub fn extract(upload: &Upload) -> Result<Extraction, StudyError> {
    extract_document(&upload.name, &upload.bytes)
}

fn extract_document(name: &str, bytes: &[u8]) -> Result<Extraction, StudyError> {
    let start = Instant::now();

    let document = Document::load_mem(bytes).map_err(|e| StudyError::DocumentParse {
        name: name.to_string(),
        detail: e.to_string(),
    })?;

    let pages = document.get_pages();
    let mut extraction = Extraction {
        page_count: pages.len(),
        ..Default::default()
    };

    for &page_num in pages.keys() {
        let page_text = match document.extract_text(&[page_num]) {
            Ok(raw) => normalize_page(&raw),
            Err(e) => {
                warn!("{}: page {} has no extractable text: {}", name, page_num, e);
                String::new()
            }
        };

        if page_text.is_empty() {
            debug!("{}: page {} is empty", name, page_num);
            extraction.empty_pages.push(page_num);
            continue;
        }

        extraction.text.push_str(&page_text);
        extraction.text.push('\n');
    }

    info!(
        "Extracted {} chars from {} pages of '{}' in {:?} ({} without text)",
        extraction.text.chars().count(),
        extraction.page_count,
        name,
        start.elapsed(),
        extraction.empty_pages.len()
    );

    Ok(extraction)
}
