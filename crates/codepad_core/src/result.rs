//! Execution results
//!
//! Every run settles into exactly one [`ExecutionResult`] variant. Failures
//! are data, not errors raised across the engine boundary.

use crate::markup::RenderableDocument;
use serde::Serialize;
use std::fmt;

/// Console text shown for a successful run that printed nothing.
pub const NO_OUTPUT_PLACEHOLDER: &str = "Code executed successfully (no output)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Source failed structural/type analysis; nothing was evaluated.
    Transpile,
    /// Evaluation raised (or timed out).
    Runtime,
    /// Another run was in flight.
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ExecutionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ExecutionResult {
    TextOutput { lines: Vec<String> },
    Document(RenderableDocument),
    Failure(ExecutionFailure),
    Unsupported { language: String },
}

impl ExecutionResult {
    pub fn text(lines: Vec<String>) -> Self {
        ExecutionResult::TextOutput { lines }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        ExecutionResult::Failure(ExecutionFailure::new(kind, message))
    }

    pub fn already_running() -> Self {
        Self::failure(
            FailureKind::AlreadyRunning,
            "an execution is already running",
        )
    }

    pub fn unsupported(language: impl Into<String>) -> Self {
        ExecutionResult::Unsupported {
            language: language.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failure(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ExecutionResult::Failure(failure) => Some(failure.kind),
            _ => None,
        }
    }

    /// Text for the output console.
    ///
    /// Documents render as their markup; the console hands them to the
    /// isolated preview surface instead of printing them.
    pub fn console_text(&self) -> String {
        match self {
            ExecutionResult::TextOutput { lines } if lines.is_empty() => {
                NO_OUTPUT_PLACEHOLDER.to_string()
            }
            ExecutionResult::TextOutput { lines } => lines.join("\n"),
            ExecutionResult::Document(document) => document.markup.clone(),
            ExecutionResult::Failure(failure) => failure.to_string(),
            ExecutionResult::Unsupported { language } => unsupported_note(language),
        }
    }
}

fn unsupported_note(language: &str) -> String {
    let name = language.to_uppercase();
    format!(
        "Note: {name} execution requires an external execution service.\n\
         This engine runs JavaScript, TypeScript, and HTML/CSS locally.\n\n\
         To enable {name}, a code execution service has to be integrated."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_output_uses_placeholder() {
        let result = ExecutionResult::text(Vec::new());
        assert_eq!(result.console_text(), NO_OUTPUT_PLACEHOLDER);
        assert!(!result.is_failure());
    }

    #[test]
    fn test_lines_join_with_newline() {
        let result = ExecutionResult::text(vec!["a 1".into(), "b".into()]);
        assert_eq!(result.console_text(), "a 1\nb");
    }

    #[test]
    fn test_failure_text() {
        let result = ExecutionResult::failure(FailureKind::Runtime, "boom");
        assert_eq!(result.console_text(), "Error: boom");
        assert_eq!(result.failure_kind(), Some(FailureKind::Runtime));
    }

    #[test]
    fn test_unsupported_note_names_language() {
        let text = ExecutionResult::unsupported("python").console_text();
        assert!(text.starts_with("Note: PYTHON execution requires an external execution service."));
        assert!(text.contains("To enable PYTHON"));
    }

    #[test]
    fn test_serializes_with_result_tag() {
        let json = serde_json::to_value(ExecutionResult::failure(
            FailureKind::AlreadyRunning,
            "busy",
        ))
        .unwrap();
        assert_eq!(json["result"], "failure");
        assert_eq!(json["kind"], "already_running");
        assert_eq!(json["message"], "busy");
    }
}
