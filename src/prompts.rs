//! Prompt text: the tutor template and the quick-action instructions.
//!
//! Every string the model ever sees is defined here, so prompt changes touch
//! exactly one file and unit tests can inspect them without a model.
//!
//! The quick-action instructions and the template are in Spanish and must be
//! kept byte-for-byte: users compare answers across versions of the tool.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder replaced by the extracted document text.
pub const DOCUMENT_PLACEHOLDER: &str = "{documento}";

/// Placeholder replaced by the resolved request.
pub const REQUEST_PLACEHOLDER: &str = "{peticion}";

/// Default tutor prompt.
///
/// Grounds the answer in the document only, embeds the document and then the
/// student's request, and asks for a clear, structured answer.
pub const TUTOR_TEMPLATE: &str = "Eres un tutor universitario experto. Usa ÚNICAMENTE el siguiente documento para responder a la petición del estudiante.

DOCUMENTO:
{documento}

PETICIÓN DEL ESTUDIANTE:
{peticion}

Respuesta estructurada y clara:";

/// Instruction sent for [`QuickAction::Summary`].
pub const SUMMARY_INSTRUCTION: &str = "Haz un resumen estructurado del texto completo, destacando los 5 puntos más importantes en viñetas.";

/// Instruction sent for [`QuickAction::KeyIdeas`].
pub const KEY_IDEAS_INSTRUCTION: &str = "Extrae las 10 ideas o conceptos más importantes y explícalos en una sola línea cada uno.";

/// Instruction sent for [`QuickAction::Flashcards`].
pub const FLASHCARDS_INSTRUCTION: &str = "Crea 5 flashcards de estudio. Formato: 'Concepto: [Nombre] | Definición: [Explicación simple]'";

/// One of the three canned requests a user can trigger without typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuickAction {
    /// Structured summary with the five most important points.
    Summary,
    /// Ten key ideas, one line each.
    KeyIdeas,
    /// Five `Concepto | Definición` flashcards.
    Flashcards,
}

impl QuickAction {
    /// All actions, in the order they are offered to the user.
    pub const ALL: [QuickAction; 3] = [
        QuickAction::Summary,
        QuickAction::KeyIdeas,
        QuickAction::Flashcards,
    ];

    /// The literal instruction sent to the model.
    pub fn instruction(self) -> &'static str {
        match self {
            QuickAction::Summary => SUMMARY_INSTRUCTION,
            QuickAction::KeyIdeas => KEY_IDEAS_INSTRUCTION,
            QuickAction::Flashcards => FLASHCARDS_INSTRUCTION,
        }
    }

    /// Stable identifier used on the command line.
    pub fn id(self) -> &'static str {
        match self {
            QuickAction::Summary => "summary",
            QuickAction::KeyIdeas => "key-ideas",
            QuickAction::Flashcards => "flashcards",
        }
    }

    /// Human label for menus.
    pub fn label(self) -> &'static str {
        match self {
            QuickAction::Summary => "Generate general summary",
            QuickAction::KeyIdeas => "Extract key ideas",
            QuickAction::Flashcards => "Create flashcards",
        }
    }

    /// Look an action up by its [`id`](Self::id).
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A prompt template with `{documento}` and `{peticion}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PromptTemplate {
    /// [`TUTOR_TEMPLATE`]. (default)
    #[default]
    Tutor,
    /// A user-supplied template, validated by the config builder.
    Custom(String),
}

impl PromptTemplate {
    pub fn custom(template: impl Into<String>) -> Self {
        PromptTemplate::Custom(template.into())
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        match self {
            PromptTemplate::Tutor => TUTOR_TEMPLATE,
            PromptTemplate::Custom(s) => s,
        }
    }

    /// Render the template in a single left-to-right pass.
    ///
    /// Substituted text is never scanned again, so a document that itself
    /// contains `{peticion}` is embedded verbatim.
    pub fn render(&self, document: &str, request: &str) -> String {
        let template = self.as_str();
        let mut out = String::with_capacity(template.len() + document.len() + request.len());
        let mut rest = template;

        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(DOCUMENT_PLACEHOLDER) {
                out.push_str(document);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(REQUEST_PLACEHOLDER) {
                out.push_str(request);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

/// Build the prompt for one request with the default tutor template.
pub fn build_prompt(document: &str, request: &str) -> String {
    PromptTemplate::Tutor.render(document, request)
}
