//! Lexer and parser for the kiln language.
//!
//! This crate turns raw source text into an AST [`Module`] plus a list
//! of structured [`ParseError`]s. Parsing is error-tolerant: broken
//! input still yields a module containing everything that could be
//! recovered, which is what the incremental analysis path needs while a
//! document is mid-edit.
//!
//! # Example
//!
//! ```
//! use kiln_parser::parse;
//!
//! let result = parse("fn main() { println(\"hello\"); }");
//! assert!(result.errors.is_empty());
//! assert_eq!(result.module.functions.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
mod error;
mod lexer;
mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use lexer::Token;
pub use parser::{parse, ParseResult};
