//! Shared utilities for LSP handlers.

use kiln_core::{LineIndex, Pos};
use lsp_types::Position;

/// Convert an LSP position to a byte offset.
///
/// Editors routinely send a column past the last character of the
/// line; those clamp to the line end. An out-of-range line is `None`.
pub fn offset_at(text: &str, position: Position) -> Option<usize> {
    let index = LineIndex::new(text);
    let line_start = index.offset(Pos::new(position.line, 0))?;
    let line_end = text[line_start..]
        .find('\n')
        .map_or(text.len(), |i| line_start + i);
    Some((line_start + position.character as usize).min(line_end))
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// The identifier-shaped word covering a byte offset, if any.
///
/// Word characters are ASCII alphanumerics and `_`, matching the
/// lexer's identifier and keyword alphabet.
pub fn word_at(text: &str, offset: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if offset > bytes.len() {
        return None;
    }
    let mut start = offset;
    while start > 0 && is_word_byte(bytes[start - 1]) {
        start -= 1;
    }
    let mut end = offset;
    while end < bytes.len() && is_word_byte(bytes[end]) {
        end += 1;
    }
    if start == end {
        None
    } else {
        Some(&text[start..end])
    }
}
