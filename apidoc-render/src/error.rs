use serde::{Deserialize, Serialize};

use crate::model::ApiItemKind;

/// Fatal rendering errors.
///
/// Every variant is a programming or build-input error: the render is aborted
/// and the error is surfaced to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Attempted to write a newline while constrained to a single line: {text:?}")]
    NewlineInSingleLine { text: String },

    #[error("Attempted to start a paragraph while constrained to a single line")]
    ParagraphBreakInSingleLine,

    #[error("Table has no columns")]
    EmptyTable,

    #[error("Heading level {0} is outside 1..=6")]
    InvalidHeadingLevel(u8),

    #[error("Invalid anchor fragment '{0}'")]
    InvalidAnchor(String),

    #[error("Duplicate {kind} declarations for export '{name}'")]
    DuplicateDeclaration { name: String, kind: ApiItemKind },

    #[error("Missing metadata: {0}")]
    MissingMetadata(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Recoverable reference resolution failures.
///
/// The caller logs these and falls back to the token's literal text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Unable to resolve reference '{0}'")]
    Unresolved(String),

    #[error("Local reference '{0}' has no known declaration")]
    UnsupportedLocalReference(String),

    #[error("Export '{0}' is not routed to any page")]
    Unrouted(String),

    #[error("Local reference expansion exceeded depth {0}")]
    ExpansionLimit(usize),
}

impl ResolveError {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::Unresolved(_) => "R001",
            ResolveError::UnsupportedLocalReference(_) => "R002",
            ResolveError::Unrouted(_) => "R003",
            ResolveError::ExpansionLimit(_) => "R004",
        }
    }
}

/// Signature formatting failures. The unformatted text is used instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Unbalanced '{0}' at byte {1}")]
    Unbalanced(char, usize),

    #[error("Unterminated string literal starting at byte {0}")]
    UnterminatedString(usize),
}

/// Errors that can occur while reading a serialized node tree.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid JSON node tree: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML node tree: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A diagnostic message produced while building or validating pages.
///
/// Diagnostics are non-fatal: the pipeline continues and produces a best-effort
/// result even when diagnostics are emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            code: Some(code.to_string()),
        }
    }

    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            code: Some(code.to_string()),
        }
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}
