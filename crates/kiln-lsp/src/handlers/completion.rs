//! Completion handler.
//!
//! Offers the local bindings visible at the cursor, the document's
//! functions, and the builtin set, in a deterministic order.

use crate::session::Snapshot;
use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionParams, CompletionResponse, Documentation,
    MarkupContent, MarkupKind,
};

use super::utils::offset_at;

/// Handle a textDocument/completion request.
pub fn handle_completion(params: &CompletionParams, snapshot: &Snapshot) -> CompletionResponse {
    let position = params.text_document_position.position;
    let offset = offset_at(&snapshot.text, position).unwrap_or(snapshot.text.len());

    let mut items = Vec::new();

    for local in snapshot.analysis.locals_in_scope(&snapshot.file_name, offset) {
        items.push(CompletionItem {
            label: local.name.clone(),
            kind: Some(CompletionItemKind::VARIABLE),
            ..Default::default()
        });
    }

    for function in &snapshot.analysis.functions {
        items.push(CompletionItem {
            label: function.name.clone(),
            kind: Some(CompletionItemKind::FUNCTION),
            detail: Some(function.signature()),
            ..Default::default()
        });
    }

    for builtin in kiln_compiler::builtins() {
        items.push(CompletionItem {
            label: builtin.name.to_string(),
            kind: Some(CompletionItemKind::FUNCTION),
            detail: Some(builtin.signature.to_string()),
            documentation: Some(Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: builtin.doc.to_string(),
            })),
            ..Default::default()
        });
    }

    // Deterministic order: sorted by label, first entry wins on ties so
    // a shadowing local beats a function of the same name.
    items.sort_by(|a, b| a.label.cmp(&b.label));
    items.dedup_by(|a, b| a.label == b.label);

    CompletionResponse::Array(items)
}
