//! Compiler diagnostics.

use crate::span::Range;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// The program cannot be compiled or executed.
    Error,
    /// Suspect code that still compiles.
    Warning,
    /// Informational note.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic produced by parsing or semantic analysis.
///
/// Diagnostics are derived values: the range is resolved to zero-based
/// line/column at construction, so a diagnostic never refers back to the
/// text it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name of the file the diagnostic belongs to.
    pub file: String,
    /// Zero-based line/column range.
    pub range: Range,
    /// Severity of the diagnostic.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(
        file: impl Into<String>,
        range: Range,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            range,
            severity,
            message: message.into(),
        }
    }

    /// Create an error diagnostic.
    pub fn error(file: impl Into<String>, range: Range, message: impl Into<String>) -> Self {
        Self::new(file, range, Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(file: impl Into<String>, range: Range, message: impl Into<String>) -> Self {
        Self::new(file, range, Severity::Warning, message)
    }

    /// Whether this diagnostic is an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    /// Formats as `name(line,col): severity: message` with 1-based
    /// line/column, the shape the execution endpoint concatenates.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{}): {}: {}",
            self.file,
            self.range.start.line + 1,
            self.range.start.col + 1,
            self.severity,
            self.message
        )
    }
}
