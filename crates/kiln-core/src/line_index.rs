//! Byte offset to line/column conversion.

use crate::span::{Pos, Range, Span};

/// A line index for efficient offset-to-position conversion.
///
/// Building the index is O(n) in the source length; lookups are
/// O(log(lines)) via binary search. Construct it once per file when
/// converting many spans.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line (line 0 at offset 0).
    line_starts: Vec<usize>,
    /// Total length of the source in bytes.
    len: usize,
}

impl LineIndex {
    /// Build a line index from source text.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Convert a byte offset to a zero-based position.
    ///
    /// Offsets past the end of the source clamp to the last position.
    #[must_use]
    pub fn pos(&self, offset: usize) -> Pos {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let col = offset - self.line_starts[line];
        Pos::new(line as u32, col as u32)
    }

    /// Convert a byte span to a line/column range.
    #[must_use]
    pub fn range(&self, span: Span) -> Range {
        Range::new(self.pos(span.start), self.pos(span.end))
    }

    /// Convert a zero-based position back to a byte offset.
    ///
    /// Returns `None` when the position is out of bounds.
    #[must_use]
    pub fn offset(&self, pos: Pos) -> Option<usize> {
        let line_start = *self.line_starts.get(pos.line as usize)?;
        let offset = line_start + pos.col as usize;
        (offset <= self.len).then_some(offset)
    }

    /// Number of lines in the source.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_round_trip() {
        let index = LineIndex::new("line1\nline2\nline3");
        assert_eq!(index.pos(0), Pos::new(0, 0));
        assert_eq!(index.pos(5), Pos::new(0, 5));
        assert_eq!(index.pos(6), Pos::new(1, 0));
        assert_eq!(index.pos(12), Pos::new(2, 0));
        assert_eq!(index.offset(Pos::new(1, 0)), Some(6));
        assert_eq!(index.offset(Pos::new(9, 0)), None);
    }

    #[test]
    fn test_clamps_past_end() {
        let index = LineIndex::new("ab");
        assert_eq!(index.pos(100), Pos::new(0, 2));
    }

    #[test]
    fn test_line_count() {
        assert_eq!(LineIndex::new("").line_count(), 1);
        assert_eq!(LineIndex::new("a\nb\n").line_count(), 3);
    }
}
