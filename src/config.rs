//! Configuration types for the study assistant.
//!
//! Every knob lives in [`AssistantConfig`], built via its
//! [`AssistantConfigBuilder`]. Setters clamp out-of-range values; `build()`
//! rejects combinations that can never work (an empty model name, a custom
//! prompt template missing a placeholder).
//!
//! The API key is deliberately *not* part of this struct. It belongs to the
//! session (see [`crate::session::Session`]) and is wrapped in a
//! [`Credential`] so it never shows up in `Debug` output or logs.

use crate::error::StudyError;
use crate::prompts::{PromptTemplate, DOCUMENT_PLACEHOLDER, REQUEST_PLACEHOLDER};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::num::NonZeroUsize;

/// Default Gemini model, matching the one the assistant was tuned against.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Base URL of the Google AI Studio REST API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for a study session.
///
/// # Example
/// ```rust
/// use edgequake_pdfstudy::AssistantConfig;
///
/// let config = AssistantConfig::builder()
///     .model("gemini-2.5-pro")
///     .temperature(0.2)
///     .api_timeout_secs(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.5-pro");
/// ```
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Gemini model identifier. Default: `gemini-2.5-flash`.
    pub model: String,

    /// Base URL of the generative-language API. Default: Google AI Studio v1beta.
    ///
    /// Override it to route through a proxy or a local mock server.
    pub endpoint: String,

    /// Sampling temperature. Default: 0.3.
    ///
    /// Low enough that summaries and flashcards stay close to the document,
    /// high enough that the tutor does not just quote it back.
    pub temperature: f32,

    /// Upper bound on generated tokens. Default: `None` (provider default).
    pub max_output_tokens: Option<u32>,

    /// Deadline for a single model call, in seconds. Default: 60.
    ///
    /// A call that exceeds it surfaces as a timeout notice instead of
    /// hanging the session.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Maximum number of extracted documents kept in the session cache.
    /// Default: `None`.
    ///
    /// `None` keeps only the current document: uploading a different file
    /// drops the previous text. When set, earlier documents stay cached so
    /// switching back to one does not extract it again, and the least
    /// recently used text is evicted once the limit is reached.
    pub cache_capacity: Option<NonZeroUsize>,

    /// Largest document, in characters, that will be sent to the model.
    /// Default: 3 500 000 (roughly a one-million-token context).
    ///
    /// Longer documents are rejected with a notice before any prompt is
    /// built. `None` disables the check.
    pub max_document_chars: Option<usize>,

    /// Prompt template used for every request.
    pub prompt_template: PromptTemplate,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.3,
            max_output_tokens: None,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            cache_capacity: None,
            max_document_chars: Some(3_500_000),
            prompt_template: PromptTemplate::default(),
        }
    }
}

impl AssistantConfig {
    /// Create a new builder for `AssistantConfig`.
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder {
            config: Self::default(),
            custom_template: None,
        }
    }
}

/// Builder for [`AssistantConfig`].
#[derive(Debug)]
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
    custom_template: Option<String>,
}

impl AssistantConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = Some(n.max(1));
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    /// Keep up to `n` documents cached; `0` keeps only the current one.
    pub fn cache_capacity(mut self, n: usize) -> Self {
        self.config.cache_capacity = NonZeroUsize::new(n);
        self
    }

    pub fn max_document_chars(mut self, limit: Option<usize>) -> Self {
        self.config.max_document_chars = limit;
        self
    }

    /// Replace the built-in tutor prompt.
    ///
    /// The template must contain both `{documento}` and `{peticion}`.
    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.custom_template = Some(template.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<AssistantConfig, StudyError> {
        if self.config.model.trim().is_empty() {
            return Err(StudyError::InvalidConfig("model must not be empty".into()));
        }
        if !(self.config.endpoint.starts_with("http://")
            || self.config.endpoint.starts_with("https://"))
        {
            return Err(StudyError::InvalidConfig(format!(
                "endpoint must be an HTTP/HTTPS URL, got '{}'",
                self.config.endpoint
            )));
        }
        if let Some(template) = self.custom_template.take() {
            for placeholder in [DOCUMENT_PLACEHOLDER, REQUEST_PLACEHOLDER] {
                if !template.contains(placeholder) {
                    return Err(StudyError::InvalidConfig(format!(
                        "prompt template is missing the {placeholder} placeholder"
                    )));
                }
            }
            self.config.prompt_template = PromptTemplate::custom(template);
        }
        Ok(self.config)
    }
}

// ── Credential ───────────────────────────────────────────────────────────

/// API key for the model provider.
///
/// Wraps a [`SecretString`]: `Debug` is redacted and the key is only
/// reachable through [`Credential::expose`].
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a key. Blank input yields `None`, the same as no key at all.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(SecretString::from(trimmed.to_string())))
        }
    }

    /// The raw key, for building the request.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AssistantConfig::default();
        assert_eq!(c.model, "gemini-2.5-flash");
        assert_eq!(c.temperature, 0.3);
        assert_eq!(c.api_timeout_secs, 60);
        assert!(c.cache_capacity.is_none());
        assert_eq!(c.max_document_chars, Some(3_500_000));
    }

    #[test]
    fn setters_clamp() {
        let c = AssistantConfig::builder()
            .temperature(7.0)
            .api_timeout_secs(0)
            .cache_capacity(0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.api_timeout_secs, 1);
        assert!(c.cache_capacity.is_none());
    }

    #[test]
    fn empty_model_rejected() {
        let err = AssistantConfig::builder().model("  ").build().unwrap_err();
        assert!(matches!(err, StudyError::InvalidConfig(_)));
    }

    #[test]
    fn endpoint_must_be_http() {
        let err = AssistantConfig::builder()
            .endpoint("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("ftp://example.com"));
    }

    #[test]
    fn template_missing_placeholder_rejected() {
        let err = AssistantConfig::builder()
            .prompt_template("Document: {documento}")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("{peticion}"), "got: {err}");
    }

    #[test]
    fn custom_template_accepted() {
        let c = AssistantConfig::builder()
            .prompt_template("{documento} / {peticion}")
            .build()
            .unwrap();
        assert_eq!(c.prompt_template.render("d", "r"), "d / r");
    }

    #[test]
    fn credential_blank_is_none() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
        let key = Credential::new(" abc ").unwrap();
        assert_eq!(key.expose(), "abc");
    }

    #[test]
    fn credential_debug_is_redacted() {
        let key = Credential::new("super-secret").unwrap();
        assert!(!format!("{key:?}").contains("super-secret"));
    }
}
