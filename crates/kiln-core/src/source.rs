//! Source files and submissions.

use serde::{Deserialize, Serialize};

/// A named source file. Immutable once constructed; edits replace the
/// whole file rather than patching sub-ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// The file name, used to map diagnostics back to their origin.
    pub name: String,
    /// The full source text.
    pub text: String,
}

impl SourceFile {
    /// Create a new source file.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Whether the file contains only whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// An ordered set of source files submitted together for one
/// compile/analyze cycle, plus the stdin text fed to an execution.
///
/// File order affects diagnostic ordering but not semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    /// The source files, in submission order.
    pub files: Vec<SourceFile>,
    /// Text made available on standard input during execution.
    pub stdin: Option<String>,
}

impl Submission {
    /// Create a submission from a list of files.
    #[must_use]
    pub fn new(files: Vec<SourceFile>) -> Self {
        Self { files, stdin: None }
    }

    /// Create a single-file submission.
    pub fn single(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(vec![SourceFile::new(name, text)])
    }

    /// Attach stdin text to this submission.
    #[must_use]
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    /// Whether the submission has no non-blank file.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.files.iter().all(SourceFile::is_blank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_detection() {
        assert!(Submission::new(vec![]).is_blank());
        assert!(Submission::single("a.kiln", "  \n\t").is_blank());
        assert!(!Submission::single("a.kiln", "fn main() {}").is_blank());
    }

    #[test]
    fn test_with_stdin() {
        let sub = Submission::single("a.kiln", "fn main() {}").with_stdin("5\n");
        assert_eq!(sub.stdin.as_deref(), Some("5\n"));
    }
}
