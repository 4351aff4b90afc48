//! Interpreter modes.
//!
//! The interpreter is always in exactly one [`Mode`]. The mode decides which
//! handler sees a token first and how far right the cursor may sit:
//!
//! | Mode        | Entered by        | Tokens mean            | Cursor limit       |
//! |-------------|-------------------|------------------------|--------------------|
//! | Normal      | start, `esc`      | commands               | `0..row_len-1`     |
//! | Insert      | `i a A I o O c`   | text                   | `0..row_len`       |
//! | CommandLine | `:`               | query line editing     | unchanged          |
//! | Search      | `/` `?`           | query line editing     | unchanged          |
//! | Visual      | `v V ctrl-v`      | motions and operators  | `0..row_len-1`     |

use std::fmt;

// ---------------------------------------------------------------------------
// VisualKind
// ---------------------------------------------------------------------------

/// The sub-mode of visual selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    /// `v`: character-wise, inclusive of both ends.
    Char,
    /// `V`: whole rows.
    Line,
    /// `ctrl-v`: the column rectangle between anchor and cursor.
    Block,
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// The active interaction mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    /// `:` line entry. The committed query is handed to the host.
    CommandLine,
    /// `/` or `?` query entry.
    Search,
    Visual(VisualKind),
}

impl Mode {
    /// Human-readable name, as a status line would show it.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Insert => "INSERT",
            Self::CommandLine => "COMMAND",
            Self::Search => "SEARCH",
            Self::Visual(VisualKind::Char) => "VISUAL",
            Self::Visual(VisualKind::Line) => "VISUAL LINE",
            Self::Visual(VisualKind::Block) => "VISUAL BLOCK",
        }
    }

    /// True if the cursor may sit one past the last character of its row.
    #[inline]
    #[must_use]
    pub const fn cursor_past_end(self) -> bool {
        matches!(self, Self::Insert)
    }

    /// True for the two query-editing modes.
    #[inline]
    #[must_use]
    pub const fn is_line_input(self) -> bool {
        matches!(self, Self::CommandLine | Self::Search)
    }

    #[inline]
    #[must_use]
    pub const fn is_visual(self) -> bool {
        matches!(self, Self::Visual(_))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
