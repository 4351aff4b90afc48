//! Cursor positions, offset spans, and the conversions between them.
//!
//! The interpreter thinks in two coordinate systems:
//!
//! - **[`Position`]**: `(row, col)`, both 0-indexed. This is what the cursor
//!   and marks store, and what the host renders.
//! - **Linear offsets**: a char index into the whole buffer. Motions compute
//!   offsets, and the range editor cuts `[from, to)` spans out of the text.
//!
//! Columns and offsets count Unicode scalar values (chars), never bytes. Rows
//! are `\n`-delimited; the last row has no trailing newline of its own.
//!
//! The free functions here are pure and total over valid rows. Row lookups
//! that fall outside the buffer return `None` and callers decide how to clamp.

use std::fmt;

use crate::buffer::Buffer;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A cursor position: (row, column), both 0-indexed.
///
/// # Ordering
///
/// Positions are ordered row first, then column, so
/// `Position { row: 0, col: 9 }` < `Position { row: 1, col: 0 }`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    /// The origin: row 0, column 0.
    pub const ZERO: Self = Self { row: 0, col: 0 };

    /// Create a new position.
    #[inline]
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl Ord for Position {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.row.cmp(&other.row).then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for Position {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.row, self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed for human display, matching Vim's `line:col` status.
        write!(f, "{}:{}", self.row + 1, self.col + 1)
    }
}

// ---------------------------------------------------------------------------
// Span
// ---------------------------------------------------------------------------

/// A half-open span of char offsets: `[start, end)`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Build a span from two arbitrary offsets, swapping so `start <= end`.
    #[inline]
    #[must_use]
    pub const fn ordered(a: usize, b: usize) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// True when the span covers no characters.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// Number of chars covered.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Offset conversion
// ---------------------------------------------------------------------------

/// Convert `(row, col)` to a linear char offset.
///
/// The row is clamped to the last row and the column to the row's content
/// length, so the result always addresses a real character or the row's
/// trailing newline / end of buffer.
#[must_use]
pub fn to_offset(buf: &Buffer, row: usize, col: usize) -> usize {
    let row = row.min(buf.last_row());
    let start = line_start(buf, row).unwrap_or(0);
    start + col.min(buf.row_len(row))
}

/// Convert a linear char offset to `(row, col)`. Offsets past the end of the
/// buffer clamp to the end.
#[must_use]
pub fn to_row_col(buf: &Buffer, offset: usize) -> Position {
    let rope = buf.rope();
    let offset = offset.min(rope.len_chars());
    let row = rope.char_to_line(offset);
    Position::new(row, offset - rope.line_to_char(row))
}

/// Offset of the first character of `row`, or `None` past the last row.
#[must_use]
pub fn line_start(buf: &Buffer, row: usize) -> Option<usize> {
    (row < buf.line_count()).then(|| buf.rope().line_to_char(row))
}

/// Offset of `row`'s trailing newline: or the end of the buffer for the last
/// row. `None` past the last row.
#[must_use]
pub fn line_end(buf: &Buffer, row: usize) -> Option<usize> {
    line_start(buf, row).map(|start| start + buf.row_len(row))
}

/// Offset of the first non-blank character on `row` (or the row end when the
/// row is blank). `None` past the last row.
#[must_use]
pub fn first_non_blank(buf: &Buffer, row: usize) -> Option<usize> {
    let start = line_start(buf, row)?;
    let end = start + buf.row_len(row);
    let mut idx = start;
    while idx < end && matches!(buf.char_at(idx), Some(' ' | '\t')) {
        idx += 1;
    }
    Some(idx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
