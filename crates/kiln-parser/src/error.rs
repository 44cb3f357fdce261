//! Parse error types.

use kiln_core::Span;
use std::fmt;
use thiserror::Error;

/// A parse error with location information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// The span where the error occurred.
    pub span: Span,
}

impl ParseError {
    /// Create a new parse error.
    #[must_use]
    pub const fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Get the error message.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Get a short label for the error.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match &self.kind {
            ParseErrorKind::InvalidToken => "invalid token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::Expected { .. } => "expected different token",
            ParseErrorKind::InvalidInt(_) => "invalid integer",
            ParseErrorKind::InvalidEscape(_) => "invalid escape",
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for ParseError {}

/// Kinds of parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// The lexer could not recognize the input.
    #[error("syntax error: invalid token")]
    InvalidToken,
    /// Input ended in the middle of a construct.
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Found one token while expecting another construct.
    #[error("expected {expected}, found `{found}`")]
    Expected {
        /// What the parser was looking for.
        expected: String,
        /// The token actually found.
        found: String,
    },
    /// An integer literal out of range for i64.
    #[error("integer literal `{0}` is out of range")]
    InvalidInt(String),
    /// An unknown escape sequence in a string literal.
    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(char),
}
