//! Diagnostics handler.
//!
//! Converts analysis diagnostics into LSP diagnostics. Used both for
//! publishing on open/change and for pull diagnostics.

use kiln_compiler::Analysis;
use kiln_core::Severity;
use lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};

/// Convert the diagnostics of an analysis snapshot for one file.
pub fn to_lsp_diagnostics(analysis: &Analysis, file: &str) -> Vec<Diagnostic> {
    analysis
        .diagnostics
        .iter()
        .filter(|d| d.file == file)
        .map(|d| Diagnostic {
            range: Range {
                start: Position::new(d.range.start.line, d.range.start.col),
                end: Position::new(d.range.end.line, d.range.end.col),
            },
            severity: Some(match d.severity {
                Severity::Error => DiagnosticSeverity::ERROR,
                Severity::Warning => DiagnosticSeverity::WARNING,
                Severity::Info => DiagnosticSeverity::INFORMATION,
            }),
            source: Some("kiln".to_string()),
            message: d.message.clone(),
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_compiler::analyze;
    use kiln_core::Submission;

    #[test]
    fn test_converts_severity_and_range() {
        let analysis = analyze(&Submission::single(
            "main.kiln",
            "fn main() {\n    println(x);\n}",
        ));
        let diagnostics = to_lsp_diagnostics(&analysis, "main.kiln");
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(d.range.start.line, 1);
        assert!(d.message.contains("unknown variable `x`"));
    }

    #[test]
    fn test_clean_document_has_no_diagnostics() {
        let analysis = analyze(&Submission::single("main.kiln", "fn main() { }"));
        assert!(to_lsp_diagnostics(&analysis, "main.kiln").is_empty());
    }

    #[test]
    fn test_repeated_conversion_is_identical() {
        let analysis = analyze(&Submission::single("main.kiln", "fn main() { let a = 1; }"));
        assert_eq!(
            to_lsp_diagnostics(&analysis, "main.kiln"),
            to_lsp_diagnostics(&analysis, "main.kiln")
        );
    }
}
