//! The interpreter state record.
//!
//! [`State`] is the single authoritative record threaded through every token.
//! It is an owned value: [`crate::interpret`] clones the caller's state before
//! touching it, and since every collection inside is owned (the buffers held
//! by checkpoints are persistent ropes), no two `State` values ever observe
//! each other's changes.
//!
//! # Versioned vs transient fields
//!
//! A [`Snapshot`] is the part of the state that undo and redo restore: the
//! cursor, the visual anchor, the `;`/`,` jump memory, and the search
//! bookkeeping. Everything else is left alone by undo:
//!
//! - **global side channels**: registers, marks, the history itself;
//! - **the mode** and the insert-append flag;
//! - **half-typed commands**: pending operator and modifier, counts, the
//!   continuation, the selected register, query line buffers.

use crate::buffer::Buffer;
use crate::history::History;
use crate::mark::MarkSet;
use crate::mode::Mode;
use crate::position::{Position, Span};
use crate::register::RegisterFile;
use crate::search::{LineInput, SearchDirection, SearchPattern};

// ---------------------------------------------------------------------------
// Pending command parts
// ---------------------------------------------------------------------------

/// An operator waiting for the motion that defines its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Delete,
    Change,
    Yank,
}

impl Operator {
    /// The key that sets (and, doubled, line-applies) this operator.
    #[must_use]
    pub const fn key(self) -> char {
        match self {
            Self::Delete => 'd',
            Self::Change => 'c',
            Self::Yank => 'y',
        }
    }

    /// Operator for a key, if any.
    #[must_use]
    pub const fn from_key(ch: char) -> Option<Self> {
        match ch {
            'd' => Some(Self::Delete),
            'c' => Some(Self::Change),
            'y' => Some(Self::Yank),
            _ => None,
        }
    }
}

/// Range expansion requested by `i` / `a` after an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Inside,
    Around,
}

/// Land-on (`f`/`F`) or land-before (`t`/`T`) character jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpKind {
    Find,
    Till,
}

/// The last `f`/`F`/`t`/`T` jump, repeated by `;` and `,`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LastJump {
    pub ch: char,
    pub kind: JumpKind,
    pub direction: SearchDirection,
}

/// Which two-token command is waiting for its second token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Continuation {
    /// `"`: register name.
    SetRegister,
    /// `m`: mark name.
    SetMark,
    /// `dm`: mark name.
    DeleteMark,
    /// `f` / `F`: target character.
    FindChar(SearchDirection),
    /// `t` / `T`: target character.
    ToChar(SearchDirection),
    /// `r`: replacement character.
    ReplaceChar,
    /// `'`: mark name.
    JumpToMark,
    /// `q`: register to record into.
    StartRecording,
    /// `@`: register to play back.
    StartPlayback,
    /// `g`: second `g` of `gg`.
    GotoPrefix,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The versioned part of the state, stored in every checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub cursor: Position,
    pub visual_anchor: Option<Position>,
    pub last_jump: Option<LastJump>,
    pub search_direction: Option<SearchDirection>,
    pub search_pattern: Option<SearchPattern>,
    pub last_match_found: bool,
    pub last_match_wrapped: bool,
    pub last_match_range: Option<Span>,
    pub search_error: Option<String>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Everything the interpreter knows between tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub(crate) mode: Mode,
    pub(crate) cursor: Position,

    // ── Half-typed commands ─────────────────────────────────────
    pub(crate) pending_operator: Option<Operator>,
    /// Count typed before the operator (`2` in `2d3w`).
    pub(crate) operator_count: Option<usize>,
    pub(crate) pending_modifier: Option<Modifier>,
    pub(crate) continuation: Option<Continuation>,
    pub(crate) repeat_count: Option<usize>,
    /// Register chosen with `"x` for the next operator or put.
    pub(crate) selected_register: Option<char>,

    // ── Side channels ───────────────────────────────────────────
    pub(crate) registers: RegisterFile,
    pub(crate) marks: MarkSet,
    pub(crate) recording_register: Option<char>,
    pub(crate) last_played_register: Option<char>,

    // ── Jumps and search ────────────────────────────────────────
    pub(crate) last_jump: Option<LastJump>,
    pub(crate) search_direction: Option<SearchDirection>,
    pub(crate) search_query: LineInput,
    pub(crate) search_pattern: Option<SearchPattern>,
    pub(crate) last_match_found: bool,
    pub(crate) last_match_wrapped: bool,
    pub(crate) last_match_range: Option<Span>,
    pub(crate) search_error: Option<String>,

    // ── Command line ────────────────────────────────────────────
    pub(crate) command_query: LineInput,
    pub(crate) last_command: Option<String>,

    // ── Visual and insert ───────────────────────────────────────
    pub(crate) visual_anchor: Option<Position>,
    /// Set on insert entry; `esc` steps the cursor back one column.
    pub(crate) insert_append: bool,

    pub(crate) history: History<Snapshot>,
}

impl State {
    /// A fresh state with no history: normal mode, cursor at the origin,
    /// nothing stored.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh state whose history starts with a checkpoint of `buffer`.
    #[must_use]
    pub fn initial(buffer: &Buffer) -> Self {
        let mut state = Self::new();
        state.checkpoint(buffer);
        state
    }

    // -- Snapshots ----------------------------------------------------------

    /// Copy out the versioned fields.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cursor: self.cursor,
            visual_anchor: self.visual_anchor,
            last_jump: self.last_jump,
            search_direction: self.search_direction,
            search_pattern: self.search_pattern.clone(),
            last_match_found: self.last_match_found,
            last_match_wrapped: self.last_match_wrapped,
            last_match_range: self.last_match_range,
            search_error: self.search_error.clone(),
        }
    }

    /// Overwrite the versioned fields from `snapshot`.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.cursor = snapshot.cursor;
        self.visual_anchor = snapshot.visual_anchor;
        self.last_jump = snapshot.last_jump;
        self.search_direction = snapshot.search_direction;
        self.search_pattern = snapshot.search_pattern;
        self.last_match_found = snapshot.last_match_found;
        self.last_match_wrapped = snapshot.last_match_wrapped;
        self.last_match_range = snapshot.last_match_range;
        self.search_error = snapshot.search_error;
    }

    /// Push an undo boundary for `buffer` and the current snapshot. Returns
    /// `false` when it would duplicate the newest checkpoint.
    pub fn checkpoint(&mut self, buffer: &Buffer) -> bool {
        let snapshot = self.snapshot();
        let pushed = self.history.checkpoint(buffer, snapshot);
        if pushed {
            tracing::debug!(
                index = ?self.history.index(),
                len = self.history.len(),
                "checkpoint"
            );
        }
        pushed
    }

    /// Take the repeat count, combined with any count typed before the
    /// operator. Defaults to 1.
    pub(crate) fn take_count(&mut self) -> usize {
        let motion = self.repeat_count.take();
        let operator = self.operator_count.take();
        match (operator, motion) {
            (None, None) => 1,
            (Some(n), None) | (None, Some(n)) => n,
            (Some(a), Some(b)) => a.saturating_mul(b),
        }
    }

    /// Drop every half-typed command part.
    pub(crate) fn clear_pending(&mut self) {
        self.pending_operator = None;
        self.operator_count = None;
        self.pending_modifier = None;
        self.repeat_count = None;
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> Position {
        self.cursor
    }

    #[inline]
    #[must_use]
    pub const fn pending_operator(&self) -> Option<Operator> {
        self.pending_operator
    }

    #[inline]
    #[must_use]
    pub const fn pending_modifier(&self) -> Option<Modifier> {
        self.pending_modifier
    }

    #[inline]
    #[must_use]
    pub const fn continuation(&self) -> Option<Continuation> {
        self.continuation
    }

    /// The count typed so far for the next motion, if any. Always ≥ 1.
    #[inline]
    #[must_use]
    pub const fn repeat_count(&self) -> Option<usize> {
        self.repeat_count
    }

    /// Content of register `name`; `""` when unset.
    #[must_use]
    pub fn register(&self, name: char) -> &str {
        self.registers.read(name)
    }

    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    #[must_use]
    pub fn mark(&self, name: char) -> Option<Position> {
        self.marks.get(name)
    }

    #[must_use]
    pub const fn marks(&self) -> &MarkSet {
        &self.marks
    }

    #[inline]
    #[must_use]
    pub const fn selected_register(&self) -> Option<char> {
        self.selected_register
    }

    #[inline]
    #[must_use]
    pub const fn recording_register(&self) -> Option<char> {
        self.recording_register
    }

    #[inline]
    #[must_use]
    pub const fn search_direction(&self) -> Option<SearchDirection> {
        self.search_direction
    }

    #[inline]
    #[must_use]
    pub const fn last_jump(&self) -> Option<LastJump> {
        self.last_jump
    }

    /// The search query being typed.
    #[must_use]
    pub const fn search_query(&self) -> &LineInput {
        &self.search_query
    }

    /// The command-line query being typed.
    #[must_use]
    pub const fn command_query(&self) -> &LineInput {
        &self.command_query
    }

    /// The most recently committed `:` line. Never executed by the
    /// interpreter; the host decides what it means.
    #[must_use]
    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    #[must_use]
    pub const fn search_pattern(&self) -> Option<&SearchPattern> {
        self.search_pattern.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn last_match_found(&self) -> bool {
        self.last_match_found
    }

    #[inline]
    #[must_use]
    pub const fn last_match_wrapped(&self) -> bool {
        self.last_match_wrapped
    }

    #[inline]
    #[must_use]
    pub const fn last_match_range(&self) -> Option<Span> {
        self.last_match_range
    }

    /// Why the last committed query failed to compile, if it did.
    #[must_use]
    pub fn search_error(&self) -> Option<&str> {
        self.search_error.as_deref()
    }

    #[inline]
    #[must_use]
    pub const fn visual_anchor(&self) -> Option<Position> {
        self.visual_anchor
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub const fn history_index(&self) -> Option<usize> {
        self.history.index()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
