use xi_rope::Rope;

/// A 1-based line and character column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Maps byte offsets in a document to line/column positions.
///
/// Lines are split on `\n`; a `\r` before it counts as a column on its line.
pub struct LineIndex {
    rope: Rope,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from(text),
        }
    }

    /// Position of the character starting at byte `offset`. Offsets past the
    /// end clamp to the end of the document.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.rope.len());
        let line = self.rope.line_of_offset(offset);
        let line_start = self.rope.offset_of_line(line);
        let column = self.rope.slice_to_cow(line_start..offset).chars().count() + 1;
        Position {
            line: line + 1,
            column,
        }
    }
}
