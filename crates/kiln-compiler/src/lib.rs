//! Compilation and execution for kiln submissions.
//!
//! Two entry points cover the two uses of the pipeline:
//!
//! - [`analyze`] never fails and produces the semantic snapshot the
//!   editor features are derived from;
//! - [`compile`] gates on error diagnostics and lowers to a runnable
//!   [`Artifact`], executed with [`run`] against per-run I/O.
//!
//! ```
//! use kiln_compiler::{compile, run, RunIo, RunLimits};
//! use kiln_core::Submission;
//!
//! let submission = Submission::single("main.kiln", "fn main() { println(\"hi\"); }");
//! let artifact = compile(&submission).unwrap();
//! let mut io = RunIo::new("");
//! run(&artifact, &mut io, &RunLimits::default()).unwrap();
//! assert_eq!(io.output(), "hi\n");
//! ```

mod builtins;
mod bytecode;
mod codegen;
mod sema;
mod vm;

pub use builtins::{builtins, Builtin};
pub use bytecode::{Artifact, Function, Op};
pub use sema::{analyze, Analysis, FunctionSym, LocalSym};
pub use vm::{run, Fault, RunIo, RunLimits, Value};

use kiln_core::{Diagnostic, Submission};

/// Compile a submission to a runnable artifact.
///
/// Runs the same analysis as [`analyze`]; any error-severity
/// diagnostic aborts the compilation and the full diagnostic list is
/// returned instead. Warnings alone do not prevent an artifact from
/// being produced.
pub fn compile(submission: &Submission) -> Result<Artifact, Vec<Diagnostic>> {
    let analysis = analyze(submission);
    if analysis.has_errors() {
        return Err(analysis.diagnostics);
    }
    codegen::emit(&analysis)
}
