//! LSP request handlers.
//!
//! Handlers are pure functions over a [`Snapshot`](crate::session::Snapshot):
//! the main loop owns the session and hands each handler an immutable
//! view of the open document and its analysis.

pub mod completion;
pub mod diagnostics;
pub mod hover;
pub mod utils;
