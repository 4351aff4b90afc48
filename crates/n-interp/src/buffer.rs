//! Text buffer: the text being edited, as an immutable value.
//!
//! A `Buffer` wraps a [`ropey::Rope`]. Every edit returns a **new** buffer and
//! leaves the receiver untouched, so the interpreter can hold the caller's
//! buffer, the working buffer, and every history checkpoint at once. Rope
//! clones share structure, which keeps those copies cheap.
//!
//! # Coordinates
//!
//! Everything here is addressed by **char offset** into the whole text. Rows
//! are `\n`-delimited (ropey is built without `unicode_lines`, so `\r`, VT,
//! and friends are ordinary characters). Conversion to `(row, col)` lives in
//! [`crate::position`].

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use ropey::Rope;

use crate::position::Span;

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// An immutable text value backed by a rope.
///
/// An empty buffer has one (empty) row. A buffer ending in `\n` has a
/// trailing empty row, which is how the interpreter's row arithmetic sees it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    rope: Rope,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Create a buffer from a string.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Load a buffer from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid UTF-8.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    // -- Text access --------------------------------------------------------

    /// The underlying rope.
    #[inline]
    #[must_use]
    pub const fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Number of rows. Never zero.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Index of the last row.
    #[inline]
    #[must_use]
    pub fn last_row(&self) -> usize {
        self.line_count().saturating_sub(1)
    }

    /// Total character count.
    #[inline]
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// True if the buffer holds no text.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Length of `row` in chars, excluding its newline. Zero for rows past the
    /// end.
    #[must_use]
    pub fn row_len(&self, row: usize) -> usize {
        if row >= self.line_count() {
            return 0;
        }
        let line = self.rope.line(row);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Content of `row` without its newline. Empty for rows past the end.
    #[must_use]
    pub fn row_text(&self, row: usize) -> String {
        if row >= self.line_count() {
            return String::new();
        }
        let mut text = self.rope.line(row).to_string();
        if text.ends_with('\n') {
            text.pop();
        }
        text
    }

    /// The character at `offset`, or `None` at or past the end.
    #[inline]
    #[must_use]
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.rope.get_char(offset)
    }

    /// The text covered by `span`, clamped to the buffer.
    #[must_use]
    pub fn slice(&self, span: Span) -> String {
        let len = self.len_chars();
        let start = span.start.min(len);
        let end = span.end.min(len).max(start);
        self.rope.slice(start..end).to_string()
    }

    /// The entire buffer as a `String`.
    #[must_use]
    pub fn contents(&self) -> String {
        self.rope.to_string()
    }

    // -- Editing ------------------------------------------------------------

    /// A copy of this buffer with `text` inserted at `offset` (clamped to the
    /// end).
    #[must_use]
    pub fn inserted(&self, offset: usize, text: &str) -> Self {
        let mut rope = self.rope.clone();
        rope.insert(offset.min(rope.len_chars()), text);
        Self { rope }
    }

    /// A copy of this buffer with `span` removed. Out-of-range spans clamp;
    /// an empty span returns an identical buffer.
    #[must_use]
    pub fn removed(&self, span: Span) -> Self {
        let len = self.len_chars();
        let start = span.start.min(len);
        let end = span.end.min(len);
        if start >= end {
            return self.clone();
        }
        let mut rope = self.rope.clone();
        rope.remove(start..end);
        Self { rope }
    }

    /// A copy of this buffer with `span` replaced by `text`.
    #[must_use]
    pub fn replaced(&self, span: Span, text: &str) -> Self {
        self.removed(span).inserted(span.start, text)
    }
}

impl From<&str> for Buffer {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("lines", &self.line_count())
            .field("chars", &self.len_chars())
            .finish()
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
