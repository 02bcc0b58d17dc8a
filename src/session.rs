//! Explicit session context: the current document, the API key and the
//! extraction cache.
//!
//! A [`Session`] is everything one user accumulates while studying one
//! document. Handlers receive it explicitly instead of reading ambient
//! state, and separate sessions never share a cache, so document text
//! cannot leak between users of a multi-user front end.

use crate::config::{AssistantConfig, Credential};
use crate::error::StudyError;
use crate::pipeline::cache::{DocumentCache, DocumentId};
use crate::pipeline::extract::{self, Extraction};
use crate::pipeline::input::Upload;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// An uploaded document and its extracted text.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    #[serde(skip)]
    extraction: Arc<Extraction>,
}

impl Document {
    /// The extracted text: every page with text, each followed by `\n`.
    pub fn text(&self) -> &str {
        &self.extraction.text
    }

    pub fn page_count(&self) -> usize {
        self.extraction.page_count
    }

    /// 1-indexed pages that yielded no text.
    pub fn empty_pages(&self) -> &[u32] {
        &self.extraction.empty_pages
    }

    /// Extraction succeeded but no page had text.
    pub fn is_empty(&self) -> bool {
        self.extraction.is_empty()
    }

    /// Length of the text in characters.
    pub fn char_count(&self) -> usize {
        self.extraction.text.chars().count()
    }
}

/// One user's study session.
#[derive(Debug)]
pub struct Session {
    cache: DocumentCache<Arc<Extraction>>,
    /// Keep earlier documents cached when a new one is uploaded.
    retain_previous: bool,
    document: Option<Document>,
    credential: Option<Credential>,
}

impl Session {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            cache: DocumentCache::with_optional_capacity(config.cache_capacity),
            retain_previous: config.cache_capacity.is_some(),
            document: None,
            credential: None,
        }
    }

    /// Make `upload` the current document.
    ///
    /// Text is extracted once per distinct content; uploading the same bytes
    /// again reuses it. Without a cache capacity, uploading different content
    /// drops the previous document's text. With one, earlier documents stay
    /// cached until the LRU bound evicts them. On error the current document
    /// is unchanged.
    pub fn upload(&mut self, upload: Upload) -> Result<&Document, StudyError> {
        self.upload_with(upload, extract::extract)
    }

    /// [`upload`](Self::upload) with a custom extractor.
    pub fn upload_with<F>(&mut self, upload: Upload, extractor: F) -> Result<&Document, StudyError>
    where
        F: FnOnce(&Upload) -> Result<Extraction, StudyError>,
    {
        let id = DocumentId::of(&upload.bytes);
        let extraction = self
            .cache
            .get_or_compute(id, || extractor(&upload).map(Arc::new))?;

        if extraction.is_empty() {
            warn!(
                "'{}' has no extractable text; answers will only see an empty document",
                upload.name
            );
        }

        if let Some(previous) = self.document.take() {
            if previous.id != id {
                if !self.retain_previous {
                    self.cache.invalidate(&previous.id);
                }
                info!("Replaced document {} with {}", previous.id, id);
            }
        }

        Ok(self.document.insert(Document {
            id,
            name: upload.name,
            extraction,
        }))
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Forget the current document and its cached text.
    pub fn close_document(&mut self) {
        if let Some(doc) = self.document.take() {
            self.cache.invalidate(&doc.id);
        }
    }

    /// Set the API key. A blank key clears it.
    pub fn set_credential(&mut self, key: impl Into<String>) {
        self.credential = Credential::new(key);
    }

    pub fn clear_credential(&mut self) {
        self.credential = None;
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Number of extractions currently cached.
    pub fn cached_documents(&self) -> usize {
        self.cache.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&AssistantConfig::default())
    }
}
