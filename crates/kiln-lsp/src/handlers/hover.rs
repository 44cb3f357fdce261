//! Hover handler.
//!
//! Resolves the word under the cursor against, in order: document
//! functions, builtins, visible local bindings, and language keywords.

use crate::session::Snapshot;
use kiln_compiler::builtins;
use lsp_types::{Hover, HoverContents, HoverParams, MarkupContent, MarkupKind};

use super::utils::{offset_at, word_at};

/// Handle a textDocument/hover request. `None` when nothing resolves.
pub fn handle_hover(params: &HoverParams, snapshot: &Snapshot) -> Option<Hover> {
    let position = params.text_document_position_params.position;
    let offset = offset_at(&snapshot.text, position)?;
    let word = word_at(&snapshot.text, offset)?;

    tracing::debug!(word, "hover lookup");

    let value = if let Some(function) = snapshot.analysis.function(word) {
        format!("```kiln\n{}\n```", function.signature())
    } else if let Some(builtin) = builtins().iter().find(|b| b.name == word) {
        format!("```kiln\n{}\n```\n\n{}", builtin.signature, builtin.doc)
    } else if snapshot
        .analysis
        .locals_in_scope(&snapshot.file_name, offset)
        .any(|l| l.name == word)
    {
        format!("```kiln\nlet {word}\n```\n\nLocal binding.")
    } else {
        keyword_doc(word)?.to_string()
    };

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: None,
    })
}

fn keyword_doc(word: &str) -> Option<&'static str> {
    Some(match word {
        "fn" => "Declares a function: `fn name(params) { ... }`",
        "let" => "Introduces a local binding: `let name = value;`",
        "if" => "Conditional: `if cond { ... } else { ... }`",
        "else" => "The alternative branch of an `if`.",
        "while" => "Loop: `while cond { ... }`",
        "return" => "Returns from the current function, optionally with a value.",
        "true" | "false" => "Boolean literal.",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_compiler::analyze;
    use kiln_core::Submission;
    use lsp_types::{
        Position, TextDocumentIdentifier, TextDocumentPositionParams, WorkDoneProgressParams,
    };
    use std::sync::Arc;

    fn snapshot(text: &str) -> Snapshot {
        Snapshot {
            uri: "file:///main.kiln".parse().unwrap(),
            file_name: "main.kiln".to_string(),
            text: text.to_string(),
            analysis: Arc::new(analyze(&Submission::single("main.kiln", text))),
        }
    }

    fn params(line: u32, character: u32) -> HoverParams {
        HoverParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier {
                    uri: "file:///main.kiln".parse().unwrap(),
                },
                position: Position::new(line, character),
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
        }
    }

    fn markdown(hover: Hover) -> String {
        match hover.contents {
            HoverContents::Markup(m) => m.value,
            other => panic!("unexpected contents: {other:?}"),
        }
    }

    #[test]
    fn test_hover_on_function_shows_signature() {
        let snap = snapshot("fn add(a, b) { return a + b; }\nfn main() { add(1, 2); }");
        // Cursor on `add` in the call.
        let hover = handle_hover(&params(1, 13), &snap).expect("hover");
        assert!(markdown(hover).contains("fn add(a, b)"));
    }

    #[test]
    fn test_hover_on_builtin_shows_doc() {
        let snap = snapshot("fn main() { read_line(); }");
        let hover = handle_hover(&params(0, 14), &snap).expect("hover");
        let text = markdown(hover);
        assert!(text.contains("fn read_line() -> str"));
        assert!(text.contains("Reads one line"));
    }

    #[test]
    fn test_hover_on_keyword() {
        let snap = snapshot("fn main() { }");
        let hover = handle_hover(&params(0, 1), &snap).expect("hover");
        assert!(markdown(hover).contains("Declares a function"));
    }

    #[test]
    fn test_hover_on_local_binding() {
        let snap = snapshot("fn main() { let total = 1; total; }");
        let hover = handle_hover(&params(0, 28), &snap).expect("hover");
        assert!(markdown(hover).contains("let total"));
    }

    #[test]
    fn test_hover_on_nothing_is_none() {
        let snap = snapshot("fn main() { }");
        assert!(handle_hover(&params(0, 10), &snap).is_none());
    }
}
