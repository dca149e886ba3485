//! Source span representation

use serde::{Deserialize, Serialize};

/// Region of source text covered by a syntax node or token
///
/// Lines and columns are 1-indexed; columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Byte offset of the start of the span (inclusive)
    pub start: usize,
    /// Byte offset of the end of the span (exclusive)
    pub end: usize,
    /// Line number of the start (1-indexed)
    pub start_line: u32,
    /// Line number of the end (1-indexed)
    pub end_line: u32,
    /// Column number of the start (1-indexed, in bytes)
    pub start_col: u32,
}

impl SourceSpan {
    /// Create a new source span
    pub fn new(start: usize, end: usize, start_line: u32, end_line: u32, start_col: u32) -> Self {
        SourceSpan {
            start,
            end,
            start_line,
            end_line,
            start_col,
        }
    }

    /// Get the length of the span in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span is empty
    ///
    /// Tokens synthesized by error recovery have empty spans.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this span contains another span
    pub fn contains(&self, other: &SourceSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Line range `(start_line, end_line)` with `start_line <= end_line`
    pub fn lines(&self) -> (u32, u32) {
        let start = self.start_line.max(1);
        (start, self.end_line.max(start))
    }
}

/// Convert from a tree-sitter node to SourceSpan
impl From<tree_sitter::Node<'_>> for SourceSpan {
    fn from(node: tree_sitter::Node<'_>) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        SourceSpan {
            start: node.start_byte(),
            end: node.end_byte(),
            // tree-sitter rows and columns are 0-indexed
            start_line: start.row as u32 + 1,
            end_line: end.row as u32 + 1,
            start_col: start.column as u32 + 1,
        }
    }
}
