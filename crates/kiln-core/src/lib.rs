//! Core types shared across the kiln workspace.
//!
//! This crate holds the value types every other crate speaks in:
//! source files and submissions, byte spans, line/column positions,
//! and diagnostics. Everything here is immutable once constructed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod diagnostic;
mod line_index;
mod source;
mod span;

pub use diagnostic::{Diagnostic, Severity};
pub use line_index::LineIndex;
pub use source::{SourceFile, Submission};
pub use span::{Pos, Range, Span};
