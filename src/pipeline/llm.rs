//! Model interaction: the [`LlmClient`] seam and the Gemini implementation.
//!
//! The dispatcher only ever sees `generate(credential, prompt) -> text`.
//! [`GeminiClient`] implements it against the Google AI Studio
//! `generateContent` endpoint; tests substitute a stub.
//!
//! All prompt engineering lives in [`crate::prompts`]; this module only
//! moves text over HTTP and classifies failures:
//!
//! | Outcome | Error |
//! |---------|-------|
//! | 401 / 403, or 400 with an invalid-key reason | [`LlmClientError::Auth`] |
//! | any other non-2xx, or a reply without text | [`LlmClientError::Provider`] |
//! | connection / DNS / TLS failure | [`LlmClientError::Network`] |
//! | deadline exceeded | [`LlmClientError::Timeout`] |

use crate::config::{AssistantConfig, Credential};
use crate::error::LlmClientError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Something that turns a prompt into generated text.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for a single, self-contained prompt.
    async fn generate(&self, credential: &Credential, prompt: &str)
        -> Result<String, LlmClientError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "llm"
    }
}

/// [`LlmClient`] for Google AI Studio Gemini models.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    request_url: String,
    model: String,
    temperature: f32,
    max_output_tokens: Option<u32>,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Build a client from the session configuration.
    pub fn new(config: &AssistantConfig) -> Result<Self, LlmClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| LlmClientError::Network {
                detail: format!("could not build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            request_url: format!(
                "{}/models/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            timeout_secs: config.api_timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&self, prompt: &'a str) -> GeminiRequest<'a> {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiRequestPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(
        &self,
        credential: &Credential,
        prompt: &str,
    ) -> Result<String, LlmClientError> {
        let start = Instant::now();
        let response = self
            .http
            .post(&self.request_url)
            .query(&[("key", credential.expose())])
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        debug!(
            "{}: HTTP {} with {} bytes in {:?}",
            self.model,
            status.as_u16(),
            body.len(),
            start.elapsed()
        );

        if !status.is_success() {
            let err = classify_error(status, &body);
            warn!("{}: request failed ({})", self.model, err.kind());
            return Err(err);
        }

        parse_response(&body)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

impl GeminiClient {
    fn transport_error(&self, e: reqwest::Error) -> LlmClientError {
        if e.is_timeout() {
            LlmClientError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            // the request URL carries the key; never let it reach a message
            LlmClientError::Network {
                detail: e.without_url().to_string(),
            }
        }
    }
}

/// Map a non-success HTTP status and body to a client error.
fn classify_error(status: StatusCode, body: &str) -> LlmClientError {
    let detail = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    let invalid_key = status == StatusCode::BAD_REQUEST
        && (body.contains("API_KEY_INVALID") || body.contains("API key not valid"));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmClientError::Auth { detail },
        _ if invalid_key => LlmClientError::Auth { detail },
        _ => LlmClientError::Provider {
            status: Some(status.as_u16()),
            detail,
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_response(body: &str) -> Result<String, LlmClientError> {
    let response: GeminiResponse =
        serde_json::from_str(body).map_err(|e| LlmClientError::Provider {
            status: None,
            detail: format!("malformed response: {e}"),
        })?;

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmClientError::Provider {
            status: None,
            detail: match response.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => format!("prompt blocked: {reason}"),
                None => "response has no candidates".to_string(),
            },
        })?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(LlmClientError::Provider {
            status: None,
            detail: format!(
                "response has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        });
    }
    Ok(text)
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiRequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiRequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}
