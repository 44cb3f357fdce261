//! Language Server Protocol implementation for kiln playground documents.
//!
//! The server backs the playground editor with IDE features:
//! - diagnostics, published on open/change and served on pull
//! - completion (visible locals, document functions, builtins)
//! - hover (signatures, builtin docs, keyword docs)
//!
//! # Architecture
//!
//! - **Main loop**: handles LSP messages; notifications mutate the
//!   session synchronously, requests answer from immutable snapshots.
//! - **Session**: at most one open document with a lazily computed,
//!   cached analysis snapshot.
//! - **Handlers**: pure functions over a snapshot.

pub mod handlers;
pub mod main_loop;

mod server;
mod session;

pub use main_loop::run_main_loop;
pub use server::start_stdio;
pub use session::{Session, Snapshot};

/// LSP server version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
