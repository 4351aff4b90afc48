//! Search: query entry, pattern compilation, and wrap-around matching.
//!
//! # Search flow
//!
//! 1. `/` (forward) or `?` (backward) enters search mode with an empty
//!    [`LineInput`].
//! 2. Character tokens edit the query; `backspace` deletes before the cursor.
//! 3. `enter` commits. An empty query reuses the previous pattern; otherwise
//!    the query is compiled into a [`SearchPattern`] and becomes the `/`
//!    register.
//! 4. `n` / `N` repeat the search in the committed / opposite direction.
//!
//! Patterns are regular expressions ([`regex`] syntax). Matching runs over the
//! whole buffer text; offsets in and out of this module are char offsets.
//!
//! When the forward scan from the cursor finds nothing, the scan restarts at
//! the top of the buffer and the hit is reported as `wrapped`. Backward scans
//! wrap to the last match in the buffer.

use std::fmt;

use regex::{Match, Regex, RegexBuilder};
use thiserror::Error;

use crate::buffer::Buffer;
use crate::position::Span;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Search direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum SearchDirection {
    Forward,
    Backward,
}

impl SearchDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }

    /// The key that starts a search in this direction.
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Forward => '/',
            Self::Backward => '?',
        }
    }
}

// ---------------------------------------------------------------------------
// LineInput
// ---------------------------------------------------------------------------

/// A single-line editable query with a cursor, shared by search and
/// command-line entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineInput {
    text: String,
    /// Char offset into `text`.
    cursor: usize,
}

impl LineInput {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The cursor position within the input (char offset).
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Insert a character at the cursor.
    pub fn insert_char(&mut self, ch: char) {
        let byte_idx = self.char_to_byte(self.cursor);
        self.text.insert(byte_idx, ch);
        self.cursor += 1;
    }

    /// Delete the character before the cursor. Returns `false` at offset 0.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let byte_idx = self.char_to_byte(self.cursor);
        self.text.remove(byte_idx);
        true
    }

    /// Take the text out, leaving the input empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    fn char_to_byte(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map_or(self.text.len(), |(byte_idx, _)| byte_idx)
    }
}

// ---------------------------------------------------------------------------
// Pattern
// ---------------------------------------------------------------------------

/// A query that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid search pattern `{source_text}`: {message}")]
pub struct PatternError {
    pub source_text: String,
    pub message: String,
}

/// A compiled search pattern. Equality compares the source text and case
/// setting, which is all that determines the compiled form.
#[derive(Clone)]
pub struct SearchPattern {
    source: String,
    ignore_case: bool,
    regex: Regex,
}

impl SearchPattern {
    /// Compile `source` as a regular expression.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when `source` is not a valid pattern.
    pub fn compile(source: &str, ignore_case: bool) -> Result<Self, PatternError> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|err| PatternError {
                source_text: source.to_string(),
                message: err.to_string(),
            })?;
        Ok(Self {
            source: source.to_string(),
            ignore_case,
            regex,
        })
    }

    /// The text the pattern was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl PartialEq for SearchPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.ignore_case == other.ignore_case
    }
}

impl Eq for SearchPattern {}

impl fmt::Debug for SearchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SearchPattern({:?})", self.source)
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// A located match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchHit {
    /// Char span of the match.
    pub span: Span,
    /// True when the scan had to restart from the other end of the buffer.
    pub wrapped: bool,
}

/// Find the first match starting at or after char offset `from`, wrapping to
/// the top of the buffer when none remains.
#[must_use]
pub fn find_next(buf: &Buffer, from: usize, pattern: &SearchPattern) -> Option<SearchHit> {
    let rope = buf.rope();
    let text = buf.contents();
    let from_byte = rope.char_to_byte(from.min(rope.len_chars()));

    if let Some(m) = pattern.regex.find_at(&text, from_byte) {
        return Some(hit(buf, m, false));
    }
    pattern.regex.find(&text).map(|m| hit(buf, m, true))
}

/// Find the match with the greatest start that lies entirely before char
/// offset `before`, wrapping to the last match in the buffer when none does.
#[must_use]
pub fn find_previous(buf: &Buffer, before: usize, pattern: &SearchPattern) -> Option<SearchHit> {
    let rope = buf.rope();
    let text = buf.contents();
    let before_byte = rope.char_to_byte(before.min(rope.len_chars()));

    if let Some(m) = last_match(&pattern.regex, &text[..before_byte]) {
        return Some(hit(buf, m, false));
    }
    last_match(&pattern.regex, &text).map(|m| hit(buf, m, true))
}

/// The match with the greatest start in `hay`. Restarts one char past each
/// match start so overlapping candidates are considered.
fn last_match<'h>(regex: &Regex, hay: &'h str) -> Option<Match<'h>> {
    let mut last = None;
    let mut pos = 0;
    while let Some(m) = regex.find_at(hay, pos) {
        last = Some(m);
        match hay[m.start()..].chars().next() {
            Some(ch) => pos = m.start() + ch.len_utf8(),
            None => break,
        }
    }
    last
}

fn hit(buf: &Buffer, m: Match<'_>, wrapped: bool) -> SearchHit {
    let rope = buf.rope();
    SearchHit {
        span: Span {
            start: rope.byte_to_char(m.start()),
            end: rope.byte_to_char(m.end()),
        },
        wrapped,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
