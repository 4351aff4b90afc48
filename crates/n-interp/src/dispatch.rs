//! The dispatcher: the state machine that consumes tokens.
//!
//! [`interpret`] is the entry point. It copies the caller's state, then feeds
//! tokens one at a time through an ordered rule table. The first rule whose
//! predicate matches handles the token; a handler may decline, in which case
//! evaluation continues with the next rule. The order is load-bearing:
//!
//! | # | Rule          | Matches                                   |
//! |---|---------------|-------------------------------------------|
//! | 1 | escape        | `esc` / `ctrl-c`, in every mode           |
//! | 2 | continuation  | a two-token command awaits its 2nd token  |
//! | 3 | insert        | insert mode                               |
//! | 4 | command line  | `:` entry                                 |
//! | 5 | search        | `/` or `?` entry                          |
//! | 6 | count         | a count digit                             |
//! | 7 | visual        | visual modes                              |
//! | 8 | normal        | everything else                           |
//!
//! Before the table runs, a live token is appended to the register being
//! recorded. After it runs, the cursor is clamped back into the buffer.
//!
//! # Grammar
//!
//! ```text
//! [count] ["x] operator [count] [i|a] motion
//! [count] ["x] operator operator          line-wise (dd, cc, yy)
//! [count] motion
//! [count] command                          x X p P r{c} u ctrl-r @{r}
//! ```
//!
//! Motions produce a [`Target`]; [`Run::apply_target`] hands it to the range
//! editor together with whatever operator is pending.

use tracing::{debug, info, trace, warn};

use crate::buffer::Buffer;
use crate::key::Token;
use crate::mode::{Mode, VisualKind};
use crate::options::Options;
use crate::position::{self, Position, Span};
use crate::range::{self, leading_blanks};
use crate::recorder::{self, PlaybackGuard};
use crate::register::{self, LAST_INSERT, SEARCH, UNNAMED};
use crate::search::{self, LineInput, SearchDirection, SearchHit, SearchPattern};
use crate::state::{Continuation, JumpKind, LastJump, Modifier, Operator, State};
use crate::word::{self, WordKind};

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run `tokens` against `buffer` and `state` with default options.
///
/// `state = None` starts fresh: normal mode, cursor at the origin, and one
/// history checkpoint of `buffer`. The caller's values are never modified.
#[must_use]
pub fn interpret(buffer: &Buffer, state: Option<&State>, tokens: &[Token]) -> (Buffer, State) {
    Interpreter::new().interpret(buffer, state, tokens)
}

/// An interpreter with explicit [`Options`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interpreter {
    options: Options,
}

impl Interpreter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_options(options: Options) -> Self {
        Self { options }
    }

    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Run `tokens`. See [`interpret`].
    #[must_use]
    pub fn interpret(
        &self,
        buffer: &Buffer,
        state: Option<&State>,
        tokens: &[Token],
    ) -> (Buffer, State) {
        let state = state.map_or_else(|| State::initial(buffer), State::clone);
        let mut run = Run {
            buffer: buffer.clone(),
            state,
            options: self.options,
            guard: PlaybackGuard::new(&self.options),
        };
        run.feed(tokens, 0);
        (run.buffer, run.state)
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// One dispatch rule. `handle` returns `false` to pass the token on.
struct Rule {
    name: &'static str,
    applies: fn(&State, Token) -> bool,
    handle: fn(&mut Run, Token, usize) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        name: "escape",
        applies: is_escape,
        handle: Run::escape,
    },
    Rule {
        name: "continuation",
        applies: has_continuation,
        handle: Run::continuation,
    },
    Rule {
        name: "insert",
        applies: in_insert,
        handle: Run::insert,
    },
    Rule {
        name: "command-line",
        applies: in_command_line,
        handle: Run::command_line,
    },
    Rule {
        name: "search",
        applies: in_search,
        handle: Run::search_input,
    },
    Rule {
        name: "count",
        applies: is_count_digit,
        handle: Run::count_digit,
    },
    Rule {
        name: "visual",
        applies: in_visual,
        handle: Run::visual,
    },
    Rule {
        name: "normal",
        applies: always,
        handle: Run::normal,
    },
];

const fn is_escape(_: &State, token: Token) -> bool {
    token.is_escape()
}

const fn has_continuation(state: &State, _: Token) -> bool {
    state.continuation.is_some()
}

fn in_insert(state: &State, _: Token) -> bool {
    state.mode == Mode::Insert
}

fn in_command_line(state: &State, _: Token) -> bool {
    state.mode == Mode::CommandLine
}

fn in_search(state: &State, _: Token) -> bool {
    state.mode == Mode::Search
}

/// `1`-`9` always count; `0` only continues a count already started.
const fn is_count_digit(state: &State, token: Token) -> bool {
    match token {
        Token::Char('1'..='9') => true,
        Token::Char('0') => state.repeat_count.is_some(),
        _ => false,
    }
}

const fn in_visual(state: &State, _: Token) -> bool {
    state.mode.is_visual()
}

const fn always(_: &State, _: Token) -> bool {
    true
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Where a motion lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// A char offset. Inclusive forward motions cover the landing char when
    /// an operator is pending.
    Char { offset: usize, inclusive: bool },
    /// A row. Operators cover every row between the cursor and `row`; a pure
    /// motion moves to `offset`.
    Line { row: usize, offset: usize },
}

impl Target {
    const fn exclusive(offset: usize) -> Self {
        Self::Char {
            offset,
            inclusive: false,
        }
    }

    const fn inclusive(offset: usize) -> Self {
        Self::Char {
            offset,
            inclusive: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// The working (buffer, state) pair for one `interpret` call.
struct Run {
    buffer: Buffer,
    state: State,
    options: Options,
    guard: PlaybackGuard,
}

impl Run {
    /// Process `tokens` at macro nesting `depth` (0 for live input).
    fn feed(&mut self, tokens: &[Token], depth: usize) {
        for &token in tokens {
            if depth > 0 && !self.guard.spend() {
                if self.guard.mark_truncated() {
                    warn!(depth, "macro token budget exhausted; playback truncated");
                }
                return;
            }
            self.step(token, depth);
        }
    }

    fn step(&mut self, token: Token, depth: usize) {
        trace!(%token, mode = %self.state.mode, depth, "token");

        if depth == 0
            && let Some(name) = self.state.recording_register
        {
            recorder::capture(&mut self.state.registers, name, token);
        }

        for rule in RULES {
            if (rule.applies)(&self.state, token) && (rule.handle)(self, token, depth) {
                trace!(rule = rule.name, "handled");
                break;
            }
        }

        self.normalize_cursor();
    }

    // -- Shared helpers -----------------------------------------------------

    fn cursor_offset(&self) -> usize {
        let Position { row, col } = self.state.cursor;
        position::to_offset(&self.buffer, row, col)
    }

    fn row_start(&self, row: usize) -> usize {
        position::line_start(&self.buffer, row).unwrap_or(0)
    }

    fn row_end(&self, row: usize) -> usize {
        position::line_end(&self.buffer, row).unwrap_or_else(|| self.buffer.len_chars())
    }

    fn first_non_blank(&self, row: usize) -> usize {
        position::first_non_blank(&self.buffer, row).unwrap_or_else(|| self.row_start(row))
    }

    fn checkpoint(&mut self) {
        self.state.checkpoint(&self.buffer);
    }

    /// Clamp the cursor into the buffer for the current mode.
    fn normalize_cursor(&mut self) {
        let row = self.state.cursor.row.min(self.buffer.last_row());
        let len = self.buffer.row_len(row);
        let max_col = if self.state.mode.cursor_past_end() {
            len
        } else {
            len.saturating_sub(1)
        };
        self.state.cursor = Position::new(row, self.state.cursor.col.min(max_col));
    }

    // -- Rule 1: escape -----------------------------------------------------

    fn escape(&mut self, _: Token, _: usize) -> bool {
        if self.state.mode == Mode::Insert
            && self.state.insert_append
            && self.state.cursor.col > 0
        {
            self.state.cursor.col -= 1;
        }
        self.state.mode = Mode::Normal;
        self.state.clear_pending();
        self.state.continuation = None;
        self.state.selected_register = None;
        self.state.insert_append = false;
        self.state.visual_anchor = None;
        self.state.search_query = LineInput::new();
        self.state.command_query = LineInput::new();
        true
    }

    // -- Rule 2: continuations ----------------------------------------------

    fn continuation(&mut self, token: Token, depth: usize) -> bool {
        let Some(pending) = self.state.continuation.take() else {
            return false;
        };

        // `g` followed by anything but `g` is just the next command.
        if pending == Continuation::GotoPrefix && !token.is('g') {
            return false;
        }

        let Some(ch) = token.as_char() else {
            return true;
        };

        match pending {
            Continuation::SetRegister => self.state.selected_register = Some(ch),
            Continuation::SetMark => self.state.marks.set(ch, self.state.cursor),
            Continuation::DeleteMark => {
                self.state.marks.delete(ch);
            }
            Continuation::FindChar(direction) => self.start_jump(ch, JumpKind::Find, direction),
            Continuation::ToChar(direction) => self.start_jump(ch, JumpKind::Till, direction),
            Continuation::ReplaceChar => self.replace_chars(ch),
            Continuation::JumpToMark => {
                if let Some(mark) = self.state.marks.get(ch) {
                    let offset = position::to_offset(&self.buffer, mark.row, mark.col);
                    self.apply_target(Target::exclusive(offset));
                }
            }
            Continuation::StartRecording => {
                self.state.recording_register = Some(ch);
                if !ch.is_ascii_uppercase() {
                    self.state.registers.write(ch, "");
                }
                debug!(register = %ch, "recording started");
            }
            Continuation::StartPlayback => {
                let name = if ch == '@' {
                    self.state.last_played_register
                } else {
                    Some(ch)
                };
                if let Some(name) = name {
                    self.play(name, depth);
                }
            }
            Continuation::GotoPrefix => {
                let row = self
                    .state
                    .repeat_count
                    .map_or(0, |n| n.saturating_sub(1))
                    .min(self.buffer.last_row());
                self.state.take_count();
                self.apply_target(Target::Line {
                    row,
                    offset: self.first_non_blank(row),
                });
            }
        }
        true
    }

    // -- Rule 3: insert mode ------------------------------------------------

    fn insert(&mut self, token: Token, _: usize) -> bool {
        let offset = self.cursor_offset();
        match token {
            Token::Char(ch) => {
                self.buffer = self.buffer.inserted(offset, &ch.to_string());
                self.state.cursor.col += 1;
                self.state.registers.append(LAST_INSERT, &ch.to_string());
            }
            Token::Enter => {
                let indent = leading_blanks(&self.buffer.row_text(self.state.cursor.row));
                self.buffer = self.buffer.inserted(offset, &format!("\n{indent}"));
                self.state.cursor =
                    Position::new(self.state.cursor.row + 1, indent.chars().count());
                self.state.registers.append(LAST_INSERT, "\n");
            }
            Token::Backspace => {
                if offset > 0 {
                    self.buffer = self.buffer.removed(Span {
                        start: offset - 1,
                        end: offset,
                    });
                    self.state.cursor = position::to_row_col(&self.buffer, offset - 1);
                    let mut typed = self.state.registers.read(LAST_INSERT).to_string();
                    if typed.pop().is_some() {
                        self.state.registers.write(LAST_INSERT, typed);
                    }
                }
            }
            _ => {}
        }
        true
    }

    // -- Rule 4: command line -----------------------------------------------

    fn command_line(&mut self, token: Token, _: usize) -> bool {
        match token {
            Token::Char(ch) => self.state.command_query.insert_char(ch),
            Token::Backspace => {
                self.state.command_query.backspace();
            }
            Token::Enter => {
                let command = self.state.command_query.take();
                info!(command = %command, "command line committed");
                self.state.last_command = Some(command);
                self.state.mode = Mode::Normal;
            }
            _ => {}
        }
        true
    }

    // -- Rule 5: search entry -----------------------------------------------

    fn search_input(&mut self, token: Token, _: usize) -> bool {
        match token {
            Token::Char(ch) => self.state.search_query.insert_char(ch),
            Token::Backspace => {
                self.state.search_query.backspace();
            }
            Token::Enter => self.commit_search(),
            _ => {}
        }
        true
    }

    fn commit_search(&mut self) {
        self.state.mode = Mode::Normal;
        let query = self.state.search_query.take();

        if query.is_empty() {
            if self.state.search_pattern.is_none() {
                self.recompile_search_register();
            }
            self.repeat_search(false);
            return;
        }

        self.state.registers.write(SEARCH, query.as_str());
        match SearchPattern::compile(&query, self.options.ignore_case) {
            Ok(pattern) => {
                self.state.search_pattern = Some(pattern);
                self.state.search_error = None;
                let direction = self.state.search_direction.unwrap_or(SearchDirection::Forward);
                self.run_search(direction, true);
            }
            Err(err) => {
                warn!(%err, "search pattern rejected");
                self.state.search_error = Some(err.to_string());
                self.state.search_pattern = None;
                self.record_miss();
            }
        }
    }

    /// An empty commit with no compiled pattern falls back to the `/`
    /// register, which may have been set from an earlier state.
    fn recompile_search_register(&mut self) {
        let source = self.state.registers.read(SEARCH).to_string();
        if !source.is_empty()
            && let Ok(pattern) = SearchPattern::compile(&source, self.options.ignore_case)
        {
            self.state.search_pattern = Some(pattern);
        }
    }

    // -- Rule 6: counts -----------------------------------------------------

    fn count_digit(&mut self, token: Token, _: usize) -> bool {
        let Some(digit) = token.as_char().and_then(|ch| ch.to_digit(10)) else {
            return false;
        };
        let current = self.state.repeat_count.unwrap_or(0);
        self.state.repeat_count = Some(current.saturating_mul(10).saturating_add(digit as usize));
        true
    }

    // -- Rule 7: visual mode ------------------------------------------------

    fn visual(&mut self, token: Token, _: usize) -> bool {
        let Mode::Visual(kind) = self.state.mode else {
            return false;
        };
        match token {
            Token::CtrlV => self.toggle_visual(VisualKind::Block),
            Token::Char('v') => self.toggle_visual(VisualKind::Char),
            Token::Char('V') => self.toggle_visual(VisualKind::Line),
            Token::Char(ch @ ('d' | 'x' | 'y' | 'c')) => {
                let op = if ch == 'x' {
                    Operator::Delete
                } else {
                    Operator::from_key(ch).unwrap_or(Operator::Delete)
                };
                self.operate_on_selection(kind, op);
            }
            Token::Char('"') => self.state.continuation = Some(Continuation::SetRegister),
            Token::Char(ch) => {
                self.motion_key(ch);
            }
            _ => {}
        }
        true
    }

    fn toggle_visual(&mut self, kind: VisualKind) {
        if self.state.mode == Mode::Visual(kind) {
            self.state.mode = Mode::Normal;
            self.state.visual_anchor = None;
        } else {
            if !self.state.mode.is_visual() {
                self.state.visual_anchor = Some(self.state.cursor);
            }
            self.state.mode = Mode::Visual(kind);
        }
        self.state.clear_pending();
    }

    fn operate_on_selection(&mut self, kind: VisualKind, op: Operator) {
        let anchor = self.state.visual_anchor.unwrap_or(self.state.cursor);
        let cursor = self.state.cursor;
        self.state.mode = Mode::Normal;
        self.state.visual_anchor = None;
        self.state.repeat_count = None;
        self.state.pending_operator = Some(op);

        self.buffer = match kind {
            VisualKind::Char => {
                let a = position::to_offset(&self.buffer, anchor.row, anchor.col);
                let b = position::to_offset(&self.buffer, cursor.row, cursor.col);
                let span = Span::ordered(a, b);
                let end = (span.end + 1).min(self.buffer.len_chars());
                self.state.cursor = position::to_row_col(&self.buffer, span.start);
                range::apply(&self.buffer, &mut self.state, span.start, end)
            }
            VisualKind::Line => {
                let (first, last) = (anchor.row.min(cursor.row), anchor.row.max(cursor.row));
                range::apply_linewise(&self.buffer, &mut self.state, first, last)
            }
            VisualKind::Block => range::apply_block(
                &self.buffer,
                &mut self.state,
                (anchor.row.min(cursor.row), anchor.row.max(cursor.row)),
                (anchor.col.min(cursor.col), anchor.col.max(cursor.col)),
            ),
        };
    }

    // -- Rule 8: normal mode ------------------------------------------------

    fn normal(&mut self, token: Token, _: usize) -> bool {
        let ch = match token {
            Token::Char(ch) => ch,
            Token::CtrlR => {
                self.redo();
                return true;
            }
            Token::CtrlV => {
                self.toggle_visual(VisualKind::Block);
                return true;
            }
            _ => return true,
        };

        if self.motion_key(ch) {
            return true;
        }

        match ch {
            'd' | 'c' | 'y' => self.operator_key(ch),
            'i' | 'a' if self.state.pending_operator.is_some() => {
                self.state.pending_modifier = Some(if ch == 'i' {
                    Modifier::Inside
                } else {
                    Modifier::Around
                });
            }
            'm' => {
                let deleting = self.state.pending_operator == Some(Operator::Delete);
                self.state.continuation = Some(if deleting {
                    Continuation::DeleteMark
                } else {
                    Continuation::SetMark
                });
                self.state.clear_pending();
            }
            _ if self.state.pending_operator.is_some() => {
                // Not a motion: the operator is abandoned.
                self.state.clear_pending();
            }
            'i' => self.insert_entry(),
            'a' => {
                self.insert_entry();
                if self.buffer.row_len(self.state.cursor.row) > 0 {
                    self.state.cursor.col += 1;
                }
            }
            'A' => {
                self.insert_entry();
                self.motion_key('$');
            }
            'I' => {
                self.insert_entry();
                self.motion_key('^');
            }
            'C' => {
                self.state.pending_operator = Some(Operator::Change);
                self.motion_key('$');
            }
            'D' => {
                self.state.pending_operator = Some(Operator::Delete);
                self.motion_key('$');
            }
            'o' => self.open_line(true),
            'O' => self.open_line(false),
            'x' => self.delete_chars(true),
            'X' => self.delete_chars(false),
            'p' => self.put(true),
            'P' => self.put(false),
            'r' => self.state.continuation = Some(Continuation::ReplaceChar),
            '"' => self.state.continuation = Some(Continuation::SetRegister),
            'q' => self.toggle_recording(),
            '@' => self.state.continuation = Some(Continuation::StartPlayback),
            'u' => self.undo(),
            'v' => self.toggle_visual(VisualKind::Char),
            'V' => self.toggle_visual(VisualKind::Line),
            ':' => {
                self.state.mode = Mode::CommandLine;
                self.state.command_query = LineInput::new();
                self.state.repeat_count = None;
            }
            _ => self.state.repeat_count = None,
        }
        true
    }

    fn operator_key(&mut self, ch: char) {
        let Some(op) = Operator::from_key(ch) else {
            return;
        };
        if self.state.pending_operator == Some(op) {
            // Doubled: whole lines.
            let count = self.state.take_count();
            let row = self.state.cursor.row;
            let last = row.saturating_add(count.saturating_sub(1));
            self.buffer = range::apply_linewise(&self.buffer, &mut self.state, row, last);
        } else {
            self.state.pending_operator = Some(op);
            self.state.pending_modifier = None;
            self.state.operator_count = self.state.repeat_count.take();
        }
    }

    // -- Motions ------------------------------------------------------------

    /// Handle `ch` if it is a motion or a motion prefix. Returns `false` for
    /// every other key.
    fn motion_key(&mut self, ch: char) -> bool {
        let target = match ch {
            'h' | 'l' | '0' | '^' | '$' => Some(self.line_motion(ch)),
            'j' | 'k' => self.vertical_motion(ch == 'j'),
            'w' | 'W' => Some(self.word_motion(word_kind(ch))),
            'b' | 'B' => Some(self.back_word_motion(word_kind(ch))),
            'e' | 'E' => Some(self.word_end_motion(word_kind(ch))),
            'G' => {
                let count = self.state.repeat_count.take();
                let row = count
                    .map_or(self.buffer.last_row(), |n| n.saturating_sub(1))
                    .min(self.buffer.last_row());
                Some(Target::Line {
                    row,
                    offset: self.first_non_blank(row),
                })
            }
            'f' | 'F' | 't' | 'T' => {
                let direction = if ch.is_ascii_lowercase() {
                    SearchDirection::Forward
                } else {
                    SearchDirection::Backward
                };
                self.state.pending_modifier = None;
                self.state.continuation = Some(if ch.eq_ignore_ascii_case(&'f') {
                    Continuation::FindChar(direction)
                } else {
                    Continuation::ToChar(direction)
                });
                return true;
            }
            ';' | ',' => {
                self.repeat_jump(ch == ',');
                return true;
            }
            'g' => {
                self.state.continuation = Some(Continuation::GotoPrefix);
                return true;
            }
            '\'' => {
                self.state.continuation = Some(Continuation::JumpToMark);
                return true;
            }
            '/' | '?' => {
                self.state.search_direction = Some(if ch == '/' {
                    SearchDirection::Forward
                } else {
                    SearchDirection::Backward
                });
                self.state.pending_modifier = None;
                self.state.mode = Mode::Search;
                self.state.search_query = LineInput::new();
                return true;
            }
            'n' | 'N' => {
                self.repeat_search(ch == 'N');
                return true;
            }
            _ => return false,
        };

        match target {
            Some(target) => self.apply_target(target),
            None => self.state.clear_pending(),
        }
        true
    }

    /// Motions within the cursor's row: `h l 0 ^ $`.
    fn line_motion(&mut self, ch: char) -> Target {
        let count = self.state.take_count();
        let Position { row, col } = self.state.cursor;
        let start = self.row_start(row);
        let len = self.buffer.row_len(row);
        match ch {
            'h' => Target::exclusive(start + col.saturating_sub(count)),
            'l' => Target::exclusive(start + col.saturating_add(count).min(len)),
            '0' => Target::exclusive(start),
            '^' => Target::exclusive(self.first_non_blank(row)),
            _ => {
                let row = row
                    .saturating_add(count.saturating_sub(1))
                    .min(self.buffer.last_row());
                let start = self.row_start(row);
                let end = self.row_end(row);
                if self.state.mode == Mode::Insert || end == start {
                    Target::exclusive(end)
                } else {
                    Target::inclusive(end - 1)
                }
            }
        }
    }

    fn vertical_motion(&mut self, down: bool) -> Option<Target> {
        let count = self.state.take_count();
        let Position { row, col } = self.state.cursor;
        let target_row = if down {
            row.saturating_add(count).min(self.buffer.last_row())
        } else {
            row.saturating_sub(count)
        };
        if target_row == row {
            return None;
        }
        Some(Target::Line {
            row: target_row,
            offset: position::to_offset(&self.buffer, target_row, col),
        })
    }

    /// `w` / `W`. Under an operator the range never crosses into the next
    /// row, and `cw` stops at the end of the current word.
    fn word_motion(&mut self, kind: WordKind) -> Target {
        let count = self.state.take_count();
        let from = self.cursor_offset();

        if self.state.pending_modifier.is_some() {
            return Target::exclusive((from + 1).min(self.buffer.len_chars()));
        }

        let len = self.buffer.len_chars();
        let mut pos = from;
        for _ in 1..count {
            if pos >= len {
                break;
            }
            pos = next_word_start(&self.buffer, pos, kind);
        }

        let Some(op) = self.state.pending_operator else {
            return Target::exclusive(next_word_start(&self.buffer, pos, kind));
        };

        let end = if op == Operator::Change {
            current_word_end(&self.buffer, pos, kind)
                .unwrap_or_else(|| next_word_start(&self.buffer, pos, kind))
        } else {
            next_word_start(&self.buffer, pos, kind)
        };
        let row_end = self.row_end(position::to_row_col(&self.buffer, pos).row);
        Target::exclusive(end.min(row_end))
    }

    /// `b` / `B`.
    fn back_word_motion(&mut self, kind: WordKind) -> Target {
        let count = self.state.take_count();
        let mut pos = self.cursor_offset();
        for _ in 0..count {
            if pos == 0 {
                break;
            }
            let before = self.buffer.slice(Span { start: 0, end: pos });
            pos = word::tokenize(&before, kind).last().map_or(0, |t| t.start);
        }
        Target::exclusive(pos)
    }

    /// `e` / `E`.
    fn word_end_motion(&mut self, kind: WordKind) -> Target {
        let count = self.state.take_count();
        let len = self.buffer.len_chars();
        let mut pos = self.cursor_offset();
        for _ in 0..count {
            let after = self.buffer.slice(Span {
                start: pos + 1,
                end: len,
            });
            match word::tokenize(&after, kind).first() {
                Some(token) => pos = pos + 1 + token.last(),
                None => break,
            }
        }
        Target::inclusive(pos.min(len.saturating_sub(1)))
    }

    /// Hand a motion's target to the range editor.
    fn apply_target(&mut self, target: Target) {
        let from = self.cursor_offset();
        let operator = self.state.pending_operator;
        self.state.repeat_count = None;
        self.state.operator_count = None;

        match target {
            Target::Char { offset, inclusive } => {
                let to = if operator.is_some() && inclusive && offset >= from {
                    (offset + 1).min(self.buffer.len_chars())
                } else {
                    offset
                };
                self.buffer = range::apply(&self.buffer, &mut self.state, from, to);
            }
            Target::Line { row, offset } => {
                if operator.is_some() {
                    let here = self.state.cursor.row;
                    self.buffer = range::apply_linewise(
                        &self.buffer,
                        &mut self.state,
                        here.min(row),
                        here.max(row),
                    );
                } else {
                    self.state.cursor = position::to_row_col(&self.buffer, offset);
                }
            }
        }
    }

    // -- Character jumps ----------------------------------------------------

    fn start_jump(&mut self, ch: char, kind: JumpKind, direction: SearchDirection) {
        let jump = LastJump { ch, kind, direction };
        self.state.last_jump = Some(jump);
        self.jump(jump, false);
    }

    /// `;` repeats the last jump, `,` repeats it the other way.
    fn repeat_jump(&mut self, reverse: bool) {
        let Some(mut jump) = self.state.last_jump else {
            self.state.clear_pending();
            return;
        };
        if reverse {
            jump.direction = jump.direction.opposite();
        }
        self.jump(jump, true);
    }

    fn jump(&mut self, jump: LastJump, repeat: bool) {
        let count = self.state.take_count();
        let row = self.state.cursor.row;
        match find_in_row(&self.buffer.row_text(row), self.state.cursor.col, jump, count, repeat) {
            Some(col) => {
                let offset = self.row_start(row) + col;
                let target = match jump.direction {
                    SearchDirection::Forward => Target::inclusive(offset),
                    SearchDirection::Backward => Target::exclusive(offset),
                };
                self.apply_target(target);
            }
            None => self.state.clear_pending(),
        }
    }

    // -- Search -------------------------------------------------------------

    /// `n` (or `N` when `reverse`), and an empty search commit.
    fn repeat_search(&mut self, reverse: bool) {
        let direction = self.state.search_direction.unwrap_or(SearchDirection::Forward);
        let direction = if reverse { direction.opposite() } else { direction };
        self.run_search(direction, false);
    }

    /// Search from the cursor and move (or operate) to the match start. The
    /// first search after a commit may match at the cursor itself.
    fn run_search(&mut self, direction: SearchDirection, initial: bool) {
        let Some(pattern) = self.state.search_pattern.clone() else {
            self.state.clear_pending();
            return;
        };

        // Matches cycle; more than one hit per char cannot reach anything new.
        let count = self.state.take_count().min(self.buffer.len_chars() + 1);
        let mut pos = self.cursor_offset();
        let mut last: Option<SearchHit> = None;
        for iteration in 0..count {
            let hit = match direction {
                SearchDirection::Forward => {
                    let start = if initial && iteration == 0 { pos } else { pos + 1 };
                    search::find_next(&self.buffer, start, &pattern)
                }
                SearchDirection::Backward => search::find_previous(&self.buffer, pos, &pattern),
            };
            let Some(hit) = hit else {
                break;
            };
            pos = hit.span.start;
            last = Some(hit);
        }

        let Some(hit) = last else {
            self.record_miss();
            return;
        };
        self.state.last_match_found = true;
        self.state.last_match_wrapped = hit.wrapped;
        self.state.last_match_range = Some(hit.span);
        debug!(start = hit.span.start, wrapped = hit.wrapped, "search hit");
        self.apply_target(Target::exclusive(hit.span.start));
    }

    fn record_miss(&mut self) {
        self.state.last_match_found = false;
        self.state.last_match_wrapped = false;
        self.state.last_match_range = None;
        self.state.clear_pending();
    }

    // -- Editing commands ---------------------------------------------------

    fn insert_entry(&mut self) {
        self.checkpoint();
        self.state.repeat_count = None;
        range::enter_insert(&mut self.state);
    }

    /// `o` (below) / `O` (above): open a row with the current indentation.
    fn open_line(&mut self, below: bool) {
        self.checkpoint();
        self.state.repeat_count = None;
        let row = self.state.cursor.row;
        let indent = leading_blanks(&self.buffer.row_text(row));
        let width = indent.chars().count();
        if below {
            let at = self.row_end(row);
            self.buffer = self.buffer.inserted(at, &format!("\n{indent}"));
            self.state.cursor = Position::new(row + 1, width);
        } else {
            let at = self.row_start(row);
            self.buffer = self.buffer.inserted(at, &format!("{indent}\n"));
            self.state.cursor = Position::new(row, width);
        }
        range::enter_insert(&mut self.state);
    }

    /// `x` (under and after the cursor) / `X` (before it), within the row.
    fn delete_chars(&mut self, forward: bool) {
        let count = self.state.take_count();
        let Position { row, col } = self.state.cursor;
        let start = self.row_start(row);
        let len = self.buffer.row_len(row);
        let span = if forward {
            Span {
                start: start + col,
                end: start + col.saturating_add(count).min(len),
            }
        } else {
            Span {
                start: start + col.saturating_sub(count),
                end: start + col,
            }
        };
        if span.is_empty() {
            return;
        }
        self.checkpoint();
        self.buffer = self.buffer.removed(span);
        if !forward {
            self.state.cursor.col -= span.len();
        }
    }

    /// `p` (after) / `P` (before). Line-wise content goes on its own rows.
    fn put(&mut self, after: bool) {
        let count = self.state.take_count();
        let name = self.state.selected_register.take().unwrap_or(UNNAMED);
        let stored = self.state.registers.read(name);
        if stored.is_empty() || stored.len().checked_mul(count).is_none() {
            return;
        }
        let content = stored.repeat(count);
        self.checkpoint();
        let row = self.state.cursor.row;

        if register::is_linewise(&content) {
            let new_row = if !after {
                let at = self.row_start(row);
                self.buffer = self.buffer.inserted(at, &content);
                row
            } else if row < self.buffer.last_row() {
                let at = self.row_start(row + 1);
                self.buffer = self.buffer.inserted(at, &content);
                row + 1
            } else {
                let at = self.row_end(row);
                let body = content.strip_suffix('\n').unwrap_or(&content);
                self.buffer = self.buffer.inserted(at, &format!("\n{body}"));
                row + 1
            };
            let col = self.first_non_blank(new_row) - self.row_start(new_row);
            self.state.cursor = Position::new(new_row, col);
        } else {
            let here = self.cursor_offset();
            let at = if after && self.buffer.row_len(row) > 0 {
                (here + 1).min(self.row_end(row))
            } else {
                here
            };
            self.buffer = self.buffer.inserted(at, &content);
            let last = at + content.chars().count() - 1;
            self.state.cursor = position::to_row_col(&self.buffer, last);
        }
    }

    /// `r{ch}`: overwrite `count` characters, or nothing if the row is too
    /// short.
    fn replace_chars(&mut self, ch: char) {
        let count = self.state.take_count();
        let Position { row, col } = self.state.cursor;
        if col.saturating_add(count) > self.buffer.row_len(row) {
            return;
        }
        self.checkpoint();
        let start = self.row_start(row) + col;
        let replacement: String = std::iter::repeat_n(ch, count).collect();
        self.buffer = self.buffer.replaced(
            Span {
                start,
                end: start + count,
            },
            &replacement,
        );
        self.state.cursor.col += count.saturating_sub(1);
    }

    // -- Macros -------------------------------------------------------------

    fn toggle_recording(&mut self) {
        self.state.repeat_count = None;
        if let Some(name) = self.state.recording_register.take() {
            recorder::finish(&mut self.state.registers, name);
            debug!(register = %name, "recording stopped");
        } else {
            self.state.continuation = Some(Continuation::StartRecording);
        }
    }

    /// Replay register `name` `count` times, one nesting level deeper.
    fn play(&mut self, name: char, depth: usize) {
        let count = self.state.take_count();
        self.state.last_played_register = Some(name);
        let tokens = recorder::decode(self.state.registers.read(name));
        if tokens.is_empty() {
            return;
        }

        if !self.guard.may_enter(depth + 1) {
            if self.guard.mark_truncated() {
                warn!(register = %name, depth, "macro nesting limit reached; playback truncated");
            }
            return;
        }

        debug!(register = %name, count, depth = depth + 1, "macro playback");
        for _ in 0..count {
            if self.guard.remaining() == 0 {
                break;
            }
            self.feed(&tokens, depth + 1);
        }
    }

    // -- Undo / redo --------------------------------------------------------

    fn undo(&mut self) {
        let count = self.state.take_count();
        let snapshot = self.state.snapshot();
        let restored = self.state.history.undo(&self.buffer, snapshot, count).cloned();
        if let Some(checkpoint) = restored {
            debug!(index = ?self.state.history.index(), "undo");
            self.buffer = checkpoint.buffer;
            self.state.restore(checkpoint.snapshot);
        }
    }

    fn redo(&mut self) {
        let count = self.state.take_count();
        let restored = self.state.history.redo(count).cloned();
        if let Some(checkpoint) = restored {
            debug!(index = ?self.state.history.index(), "redo");
            self.buffer = checkpoint.buffer;
            self.state.restore(checkpoint.snapshot);
        }
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

const fn word_kind(ch: char) -> WordKind {
    if ch.is_ascii_uppercase() {
        WordKind::BigWord
    } else {
        WordKind::Word
    }
}

/// Start of the word after the one at `from` (or the first word after
/// `from` when it sits on a blank). The buffer end when none remains.
fn next_word_start(buffer: &Buffer, from: usize, kind: WordKind) -> usize {
    let len = buffer.len_chars();
    let rest = buffer.slice(Span { start: from, end: len });
    let tokens = word::tokenize(&rest, kind);
    let next = match tokens.first() {
        Some(first) if first.start == 0 => tokens.get(1),
        first => first,
    };
    next.map_or(len, |token| from + token.start)
}

/// End (exclusive) of the word under `from`, if `from` is on one.
fn current_word_end(buffer: &Buffer, from: usize, kind: WordKind) -> Option<usize> {
    let rest = buffer.slice(Span {
        start: from,
        end: buffer.len_chars(),
    });
    word::tokenize(&rest, kind)
        .first()
        .filter(|token| token.start == 0)
        .map(|token| from + token.end)
}

/// Column that an `f`/`F`/`t`/`T` jump lands on within `line`, or `None`
/// when the character does not occur `count` times in that direction.
///
/// A repeated till jump skips a target right next to the cursor so that `;`
/// makes progress.
fn find_in_row(
    line: &str,
    col: usize,
    jump: LastJump,
    count: usize,
    repeat: bool,
) -> Option<usize> {
    let chars: Vec<char> = line.chars().collect();
    let skip = usize::from(repeat && jump.kind == JumpKind::Till);
    let nth = count.saturating_sub(1);

    let found = match jump.direction {
        SearchDirection::Forward => (col + 1 + skip..chars.len())
            .filter(|&idx| chars[idx] == jump.ch)
            .nth(nth)?,
        SearchDirection::Backward => (0..col.saturating_sub(skip))
            .rev()
            .filter(|&idx| chars[idx] == jump.ch)
            .nth(nth)?,
    };

    Some(match (jump.kind, jump.direction) {
        (JumpKind::Find, _) => found,
        (JumpKind::Till, SearchDirection::Forward) => found - 1,
        (JumpKind::Till, SearchDirection::Backward) => found + 1,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::parse_keys;
    use pretty_assertions::assert_eq;

    /// Run `keys` (in key notation) on `text` from a fresh state.
    fn run(text: &str, keys: &str) -> (String, State) {
        let (buf, state) = interpret(&Buffer::from_text(text), None, &parse_keys(keys));
        (buf.contents(), state)
    }

    /// Run `keys` on `text` with the cursor starting at `(row, col)`.
    fn run_at(text: &str, row: usize, col: usize, keys: &str) -> (String, State) {
        let buf = Buffer::from_text(text);
        let mut state = State::initial(&buf);
        state.cursor = Position::new(row, col);
        let (buf, state) = interpret(&buf, Some(&state), &parse_keys(keys));
        (buf.contents(), state)
    }

    fn p(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    // ── Entry points ──────────────────────────────────────────────────────

    #[test]
    fn fresh_state_has_initial_checkpoint() {
        let (text, state) = run("abc", "");
        assert_eq!(text, "abc");
        assert_eq!(state.mode(), Mode::Normal);
        assert_eq!(state.cursor(), p(0, 0));
        assert_eq!(state.history_len(), 1);
        assert_eq!(state.history_index(), Some(0));
    }

    #[test]
    fn caller_state_is_not_modified() {
        let buf = Buffer::from_text("abc def");
        let (_, first) = interpret(&buf, None, &parse_keys("yw"));
        let before = first.clone();
        let (_, second) = interpret(&buf, Some(&first), &parse_keys("\"bdw"));
        assert_eq!(first, before);
        assert_eq!(first.register('b'), "");
        assert_eq!(second.register('b'), "abc ");
    }

    #[test]
    fn named_tokens_from_host() {
        let tokens: Vec<Token> = ["i", "x", "enter", "y", "escape"]
            .into_iter()
            .filter_map(Token::from_name)
            .collect();
        let (buf, state) = interpret(&Buffer::new(), None, &tokens);
        assert_eq!(buf.contents(), "x\ny");
        assert_eq!(state.mode(), Mode::Normal);
    }

    // ── Motions ───────────────────────────────────────────────────────────

    #[test]
    fn hjkl() {
        let (_, s) = run("abc\ndef\nghi", "lljh");
        assert_eq!(s.cursor(), p(1, 1));
        let (_, s) = run("abc\ndef", "jjjk");
        assert_eq!(s.cursor(), p(0, 0));
    }

    #[test]
    fn l_stops_on_last_char() {
        let (_, s) = run("abc", "10l");
        assert_eq!(s.cursor(), p(0, 2));
    }

    #[test]
    fn j_clamps_column_to_shorter_row() {
        let (_, s) = run_at("abcdef\nab", 0, 5, "j");
        assert_eq!(s.cursor(), p(1, 1));
    }

    #[test]
    fn word_motions() {
        let (_, s) = run("foo.bar baz", "w");
        assert_eq!(s.cursor(), p(0, 3));
        let (_, s) = run("foo.bar baz", "W");
        assert_eq!(s.cursor(), p(0, 8));
        let (_, s) = run("foo bar\nbaz", "ww");
        assert_eq!(s.cursor(), p(1, 0));
        let (_, s) = run("foo bar baz", "2w");
        assert_eq!(s.cursor(), p(0, 8));
    }

    #[test]
    fn word_back_and_end() {
        let (_, s) = run_at("foo bar baz", 0, 9, "b");
        assert_eq!(s.cursor(), p(0, 8));
        let (_, s) = run_at("foo bar baz", 0, 9, "2b");
        assert_eq!(s.cursor(), p(0, 4));
        let (_, s) = run("foo bar", "e");
        assert_eq!(s.cursor(), p(0, 2));
        let (_, s) = run("foo bar", "ee");
        assert_eq!(s.cursor(), p(0, 6));
        let (_, s) = run("a.b c", "E");
        assert_eq!(s.cursor(), p(0, 2));
    }

    #[test]
    fn b_crosses_rows() {
        let (_, s) = run_at("abc\ndef", 1, 0, "b");
        assert_eq!(s.cursor(), p(0, 0));
    }

    #[test]
    fn line_motions() {
        let (_, s) = run_at("  abc", 0, 4, "0");
        assert_eq!(s.cursor(), p(0, 0));
        let (_, s) = run_at("  abc", 0, 4, "^");
        assert_eq!(s.cursor(), p(0, 2));
        let (_, s) = run("  abc", "$");
        assert_eq!(s.cursor(), p(0, 4));
    }

    #[test]
    fn goto_lines() {
        let (_, s) = run("a\n  b\nc", "G");
        assert_eq!(s.cursor(), p(2, 0));
        let (_, s) = run("a\n  b\nc", "2G");
        assert_eq!(s.cursor(), p(1, 2));
        let (_, s) = run_at("  a\nb\nc", 2, 0, "gg");
        assert_eq!(s.cursor(), p(0, 2));
        let (_, s) = run("a\nb\nc", "3gg");
        assert_eq!(s.cursor(), p(2, 0));
    }

    #[test]
    fn g_prefix_falls_through() {
        // `g` then `l`: not `gg`, so `l` runs as a normal motion.
        let (_, s) = run("abc", "gl");
        assert_eq!(s.cursor(), p(0, 1));
        assert_eq!(s.continuation(), None);
    }

    // ── Character jumps ───────────────────────────────────────────────────

    #[test]
    fn find_and_till() {
        let (_, s) = run("a,b,c,d", "f,");
        assert_eq!(s.cursor(), p(0, 1));
        let (_, s) = run("a,b,c,d", "2f,");
        assert_eq!(s.cursor(), p(0, 3));
        let (_, s) = run("abcdef", "te");
        assert_eq!(s.cursor(), p(0, 3));
        let (_, s) = run_at("abcdef", 0, 5, "Fb");
        assert_eq!(s.cursor(), p(0, 1));
        let (_, s) = run_at("abcdef", 0, 5, "Tb");
        assert_eq!(s.cursor(), p(0, 2));
    }

    #[test]
    fn find_missing_char_does_nothing() {
        let (_, s) = run("abc", "fz");
        assert_eq!(s.cursor(), p(0, 0));
        let (text, _) = run("abc", "dfz");
        assert_eq!(text, "abc");
    }

    #[test]
    fn semicolon_and_comma_repeat() {
        let (_, s) = run("a,b,c,d", "f,;");
        assert_eq!(s.cursor(), p(0, 3));
        let (_, s) = run("a,b,c,d", "f,;;,");
        assert_eq!(s.cursor(), p(0, 3));
        assert_eq!(
            s.last_jump(),
            Some(LastJump {
                ch: ',',
                kind: JumpKind::Find,
                direction: SearchDirection::Forward
            })
        );
    }

    #[test]
    fn till_repeat_skips_adjacent_target() {
        let (_, s) = run("a,b,c", "t,;");
        assert_eq!(s.cursor(), p(0, 2));
    }

    #[test]
    fn delete_to_char() {
        let (text, _) = run("abc,def", "df,");
        assert_eq!(text, "def");
        let (text, _) = run("abc,def", "dt,");
        assert_eq!(text, ",def");
        let (text, _) = run_at("abc,def", 0, 5, "dF,");
        assert_eq!(text, "abcef");
    }

    // ── Operators ─────────────────────────────────────────────────────────

    #[test]
    fn dw_keeps_newline() {
        let (text, s) = run("abc def\nghi", "dw");
        assert_eq!(text, "def\nghi");
        assert_eq!(s.register('"'), "abc ");
        let (text, _) = run_at("abc def\nghi", 0, 4, "dw");
        assert_eq!(text, "abc \nghi");
    }

    #[test]
    fn counted_operator_and_motion_multiply() {
        let (text, _) = run("a b c d e f g h", "2d3w");
        assert_eq!(text, "g h");
    }

    #[test]
    fn cw_changes_to_word_end() {
        let (text, s) = run("abc def", "cwxy<esc>");
        assert_eq!(text, "xy def");
        assert_eq!(s.mode(), Mode::Normal);
        assert_eq!(s.cursor(), p(0, 1));
        assert_eq!(s.register('.'), "xy");
    }

    #[test]
    fn diw_and_caw() {
        let (text, _) = run_at("foo bar baz", 0, 5, "diw");
        assert_eq!(text, "foo  baz");
        let (text, s) = run_at("foo bar baz", 0, 5, "cawX<esc>");
        assert_eq!(text, "foo X baz");
        assert_eq!(s.register('0'), "bar");
    }

    #[test]
    fn de_is_inclusive() {
        let (text, _) = run("abc def", "de");
        assert_eq!(text, " def");
    }

    #[test]
    fn d_dollar_and_capital_d() {
        let (text, _) = run_at("abc def\nx", 0, 4, "d$");
        assert_eq!(text, "abc \nx");
        let (text, s) = run_at("abc def\nx", 0, 4, "D");
        assert_eq!(text, "abc \nx");
        assert_eq!(s.cursor(), p(0, 3));
    }

    #[test]
    fn capital_c_changes_to_end() {
        let (text, s) = run_at("abc def", 0, 4, "Cxyz<esc>");
        assert_eq!(text, "abc xyz");
        assert_eq!(s.cursor(), p(0, 6));
    }

    #[test]
    fn db_deletes_backward() {
        let (text, s) = run_at("foo bar", 0, 4, "db");
        assert_eq!(text, "bar");
        assert_eq!(s.cursor(), p(0, 0));
    }

    #[test]
    fn dd_and_counts() {
        let (text, s) = run("one\ntwo\nthree", "dd");
        assert_eq!(text, "two\nthree");
        assert_eq!(s.register('"'), "one\n");
        let (text, _) = run("one\ntwo\nthree", "2dd");
        assert_eq!(text, "three");
        let (text, _) = run_at("one\ntwo\nthree", 2, 0, "dd");
        assert_eq!(text, "one\ntwo");
    }

    #[test]
    fn dj_and_dk_are_linewise() {
        let (text, s) = run("a\nb\nc", "dj");
        assert_eq!(text, "c");
        assert_eq!(s.register('"'), "a\nb\n");
        let (text, _) = run_at("a\nb\nc", 2, 0, "dk");
        assert_eq!(text, "a");
    }

    #[test]
    fn dg_deletes_to_end() {
        let (text, _) = run_at("a\nb\nc", 1, 0, "dG");
        assert_eq!(text, "a");
        let (text, _) = run_at("a\nb\nc", 1, 0, "dgg");
        assert_eq!(text, "c");
    }

    #[test]
    fn cc_keeps_indent() {
        let (text, s) = run("  foo\nbar", "ccx<esc>");
        assert_eq!(text, "  x\nbar");
        assert_eq!(s.cursor(), p(0, 2));
    }

    #[test]
    fn yank_and_put() {
        let (text, s) = run("abc\ndef", "yyp");
        assert_eq!(text, "abc\nabc\ndef");
        assert_eq!(s.register('"'), "abc\n");
        assert_eq!(s.cursor(), p(1, 0));
    }

    #[test]
    fn put_linewise_on_last_row_and_above() {
        let (text, _) = run_at("abc\ndef", 1, 0, "yyp");
        assert_eq!(text, "abc\ndef\ndef");
        let (text, s) = run_at("abc\ndef", 1, 0, "yyP");
        assert_eq!(text, "abc\ndef\ndef");
        assert_eq!(s.cursor(), p(1, 0));
    }

    #[test]
    fn put_charwise() {
        let (text, s) = run("abc", "ylp");
        assert_eq!(text, "aabc");
        assert_eq!(s.cursor(), p(0, 1));
        let (text, _) = run("abc", "yl$P");
        assert_eq!(text, "abac");
        let (text, _) = run("abc", "yl3p");
        assert_eq!(text, "aaaabc");
    }

    #[test]
    fn named_registers() {
        let (text, s) = run("abc def", "\"ayw\"bdwe\"ap");
        assert_eq!(s.register('a'), "abc ");
        assert_eq!(s.register('b'), "abc ");
        assert_eq!(text, "defabc ");
    }

    #[test]
    fn uppercase_register_appends() {
        let (_, s) = run("ab", "\"ayl\"Ayl");
        assert_eq!(s.register('a'), "aa");
    }

    #[test]
    fn numbered_ring_eviction() {
        let text: String = (1..=11).map(|n| format!("line{n}\n")).collect();
        let (_, s) = run(&text, &"dd".repeat(11));
        assert_eq!(s.register('"'), "line11\n");
        assert_eq!(s.register('1'), "line10\n");
        assert!(('0'..='9').all(|r| s.register(r) != "line1\n"));
    }

    #[test]
    fn unknown_key_abandons_operator() {
        let (text, s) = run("abc", "dzx");
        assert_eq!(text, "bc");
        assert_eq!(s.pending_operator(), None);
    }

    // ── Line edits ────────────────────────────────────────────────────────

    #[test]
    fn x_and_capital_x() {
        let (text, s) = run("abc", "x");
        assert_eq!(text, "bc");
        assert_eq!(s.cursor(), p(0, 0));
        let (text, _) = run("abc", "5x");
        assert_eq!(text, "");
        let (text, s) = run_at("abcd", 0, 3, "2X");
        assert_eq!(text, "ad");
        assert_eq!(s.cursor(), p(0, 1));
        let (text, _) = run("ab\ncd", "3x");
        assert_eq!(text, "\ncd");
    }

    #[test]
    fn x_on_last_char_moves_cursor_left() {
        let (text, s) = run_at("abc", 0, 2, "x");
        assert_eq!(text, "ab");
        assert_eq!(s.cursor(), p(0, 1));
    }

    #[test]
    fn replace() {
        let (text, s) = run("abc", "rx");
        assert_eq!(text, "xbc");
        assert_eq!(s.cursor(), p(0, 0));
        let (text, s) = run("abc", "2rz");
        assert_eq!(text, "zzc");
        assert_eq!(s.cursor(), p(0, 1));
        let (text, _) = run("abc", "5rz");
        assert_eq!(text, "abc");
    }

    // ── Insert mode ───────────────────────────────────────────────────────

    #[test]
    fn insert_and_escape_steps_back() {
        let (text, s) = run("world", "ihello <esc>");
        assert_eq!(text, "hello world");
        assert_eq!(s.cursor(), p(0, 5));
        assert_eq!(s.register('.'), "hello ");
    }

    #[test]
    fn append_variants() {
        let (text, _) = run("abc", "aX<esc>");
        assert_eq!(text, "aXbc");
        let (text, s) = run("abc", "AX<esc>");
        assert_eq!(text, "abcX");
        assert_eq!(s.cursor(), p(0, 3));
        let (text, _) = run("  abc", "IX<esc>");
        assert_eq!(text, "  Xabc");
    }

    #[test]
    fn insert_enter_copies_indent() {
        let (text, s) = run("  ab", "A<cr>c<esc>");
        assert_eq!(text, "  ab\n  c");
        assert_eq!(s.cursor(), p(1, 2));
    }

    #[test]
    fn insert_backspace_joins_rows() {
        let (text, _) = run_at("ab\ncd", 1, 0, "i<bs><esc>");
        assert_eq!(text, "abcd");
    }

    #[test]
    fn open_lines() {
        let (text, s) = run("  a\nb", "ox<esc>");
        assert_eq!(text, "  a\n  x\nb");
        assert_eq!(s.cursor(), p(1, 2));
        let (text, _) = run("  a\nb", "Ox<esc>");
        assert_eq!(text, "  x\n  a\nb");
    }

    #[test]
    fn insert_undo_restores() {
        let (text, s) = run("abc", "ixyz<esc>u");
        assert_eq!(text, "abc");
        assert_eq!(s.cursor(), p(0, 0));
    }

    // ── Undo / redo ───────────────────────────────────────────────────────

    #[test]
    fn undo_delete_line() {
        let (text, s) = run_at("one\ntwo\nthree", 1, 2, "ddu");
        assert_eq!(text, "one\ntwo\nthree");
        assert_eq!(s.cursor(), p(1, 2));
    }

    #[test]
    fn undo_redo_cycle() {
        let (text, _) = run("abc", "xxuu");
        assert_eq!(text, "abc");
        let (text, _) = run("abc", "xxuu<c-r>");
        assert_eq!(text, "bc");
        let (text, _) = run("abc", "xxuu<c-r><c-r>");
        assert_eq!(text, "c");
        let (text, _) = run("abc", "xxu2<c-r>");
        assert_eq!(text, "c");
    }

    #[test]
    fn undo_leaves_registers_and_marks() {
        let (_, s) = run("abc\ndef", "maddu");
        assert_eq!(s.register('"'), "abc\n");
        assert_eq!(s.mark('a'), Some(p(0, 0)));
    }

    #[test]
    fn undo_at_start_is_noop() {
        let (text, s) = run("abc", "uuu");
        assert_eq!(text, "abc");
        assert_eq!(s.history_index(), Some(0));
    }

    #[test]
    fn edit_after_undo_discards_redo() {
        let (text, _) = run("abcd", "xu$x<c-r>");
        assert_eq!(text, "abc");
    }

    #[test]
    fn edit_at_undo_point_survives_redo() {
        let (text, s) = run("abcd", "xurZ<c-r>");
        assert_eq!(text, "Zbcd");
        assert_eq!(s.history_index(), Some(s.history_len() - 1));
        let (text, _) = run("abcd", "xurZu");
        assert_eq!(text, "abcd");
    }

    // ── Marks ─────────────────────────────────────────────────────────────

    #[test]
    fn set_and_jump_to_mark() {
        let (_, s) = run("abc\ndef", "jlmakk'a");
        assert_eq!(s.cursor(), p(1, 1));
        assert_eq!(s.mark('a'), Some(p(1, 1)));
    }

    #[test]
    fn delete_to_mark() {
        let (text, _) = run("abcdef", "llmb$d'b");
        assert_eq!(text, "abf");
    }

    #[test]
    fn delete_mark() {
        let (_, s) = run("abc", "madma");
        assert_eq!(s.mark('a'), None);
        assert_eq!(s.pending_operator(), None);
    }

    #[test]
    fn unset_mark_clears_continuation() {
        let (text, s) = run("abc", "d'zx");
        assert_eq!(s.continuation(), None);
        // The operator survives the failed jump, and `x` abandons it.
        assert_eq!(text, "abc");
    }

    // ── Search ────────────────────────────────────────────────────────────

    #[test]
    fn search_forward_and_wrap() {
        let (_, s) = run_at("foo bar foo", 0, 8, "/foo<cr>");
        assert_eq!(s.cursor(), p(0, 8));
        assert!(s.last_match_found());
        assert!(!s.last_match_wrapped());
        let (_, s) = run_at("foo bar foo", 0, 8, "/foo<cr>n");
        assert_eq!(s.cursor(), p(0, 0));
        assert!(s.last_match_wrapped());
        assert_eq!(s.register('/'), "foo");
        assert_eq!(s.last_match_range(), Some(Span { start: 0, end: 3 }));
    }

    #[test]
    fn search_backward_and_n_n() {
        let (_, s) = run_at("ab ab ab", 0, 7, "?ab<cr>");
        assert_eq!(s.cursor(), p(0, 3));
        let (_, s) = run_at("ab ab ab", 0, 7, "?ab<cr>n");
        assert_eq!(s.cursor(), p(0, 0));
        let (_, s) = run_at("ab ab ab", 0, 7, "?ab<cr>nN");
        assert_eq!(s.cursor(), p(0, 3));
    }

    #[test]
    fn search_not_found() {
        let (_, s) = run_at("abc", 0, 1, "/zzz<cr>");
        assert!(!s.last_match_found());
        assert_eq!(s.cursor(), p(0, 1));
        assert_eq!(s.last_match_range(), None);
    }

    #[test]
    fn empty_search_repeats_previous() {
        let (_, s) = run("x a a", "/a<cr>/<cr>");
        assert_eq!(s.cursor(), p(0, 4));
    }

    #[test]
    fn search_query_editing() {
        let (_, s) = run("abc xyz", "/xyq<bs>z<cr>");
        assert_eq!(s.cursor(), p(0, 4));
        let (_, s) = run("abc", "/<bs><bs>");
        assert_eq!(s.mode(), Mode::Search);
    }

    #[test]
    fn delete_to_search_match() {
        let (text, _) = run("abc def ghi", "d/gh<cr>");
        assert_eq!(text, "ghi");
    }

    #[test]
    fn invalid_search_pattern() {
        let (_, s) = run("a(b", "/(<cr>");
        assert!(!s.last_match_found());
        assert!(s.search_error().is_some());
        assert_eq!(s.search_pattern(), None);
        assert_eq!(s.register('/'), "(");
        assert_eq!(s.mode(), Mode::Normal);
    }

    #[test]
    fn ignore_case_option() {
        let opts = Options {
            ignore_case: true,
            ..Options::default()
        };
        let buf = Buffer::from_text("x HELLO");
        let (_, s) =
            Interpreter::with_options(opts).interpret(&buf, None, &parse_keys("/hello<cr>"));
        assert_eq!(s.cursor(), p(0, 2));
    }

    // ── Command line ──────────────────────────────────────────────────────

    #[test]
    fn command_line_commit() {
        let (text, s) = run("abc", ":wq!<bs><cr>");
        assert_eq!(text, "abc");
        assert_eq!(s.last_command(), Some("wq"));
        assert_eq!(s.mode(), Mode::Normal);
        assert!(s.command_query().is_empty());
    }

    #[test]
    fn command_line_backspace_on_empty() {
        let (_, s) = run("abc", ":<bs>");
        assert_eq!(s.mode(), Mode::CommandLine);
        assert!(s.command_query().is_empty());
    }

    #[test]
    fn command_line_escape_discards() {
        let (_, s) = run("abc", ":q<esc>");
        assert_eq!(s.last_command(), None);
        assert_eq!(s.mode(), Mode::Normal);
    }

    // ── Macros ────────────────────────────────────────────────────────────

    #[test]
    fn record_and_play() {
        let (text, s) = run("abcdefg", "qaxq3@a");
        assert_eq!(s.register('a'), "x");
        assert_eq!(text, "efg");
        assert_eq!(s.recording_register(), None);
    }

    #[test]
    fn recording_stores_named_keys() {
        let (text, s) = run("a", "qbAz<esc>q@b");
        assert_eq!(s.register('b'), "Az<esc>");
        assert_eq!(text, "azz");
    }

    #[test]
    fn uppercase_recording_appends() {
        let (text, s) = run("abcdef", "qAxq@A");
        assert_eq!(s.register('a'), "x");
        assert_eq!(text, "cdef");

        let (text, s) = run("abcdef", "qaxqqAxq@a");
        assert_eq!(s.register('a'), "xx");
        assert_eq!(text, "ef");
    }

    #[test]
    fn recorded_text_spelling_a_key_name_replays_as_text() {
        let (text, s) = run("", "qaA<lt>esc><esc>q@a");
        assert_eq!(s.register('a'), "A<lt>esc><esc>");
        assert_eq!(text, "<esc><esc>");
    }

    #[test]
    fn at_at_replays_last() {
        let (text, _) = run("abcdef", "qaxq@a@@");
        assert_eq!(text, "def");
    }

    #[test]
    fn self_recursive_macro_is_bounded() {
        let opts = Options {
            max_macro_depth: 5,
            ..Options::default()
        };
        let buf = Buffer::from_text(&"x".repeat(50));
        let mut state = State::initial(&buf);
        state.registers.write('a', "x@a");
        let (out, _) =
            Interpreter::with_options(opts).interpret(&buf, Some(&state), &parse_keys("@a"));
        assert_eq!(out.contents().len(), 45);
    }

    #[test]
    fn macro_budget_truncates() {
        let opts = Options {
            macro_token_budget: 4,
            ..Options::default()
        };
        let buf = Buffer::from_text("abcdefgh");
        let mut state = State::initial(&buf);
        state.registers.write('a', "x");
        let (out, _) =
            Interpreter::with_options(opts).interpret(&buf, Some(&state), &parse_keys("9@a"));
        assert_eq!(out.contents(), "efgh");
    }

    // ── Escape and continuations ──────────────────────────────────────────

    #[test]
    fn escape_clears_everything_pending() {
        let (_, s) = run("abc", "\"a2di<esc>");
        assert_eq!(s.pending_operator(), None);
        assert_eq!(s.pending_modifier(), None);
        assert_eq!(s.repeat_count(), None);
        assert_eq!(s.selected_register(), None);
        let (_, s) = run("abc", "f<esc>");
        assert_eq!(s.continuation(), None);
    }

    #[test]
    fn continuation_beats_commands() {
        // `"` then `d`: `d` names a register, it is not an operator.
        let (_, s) = run("abc", "\"d");
        assert_eq!(s.selected_register(), Some('d'));
        assert_eq!(s.pending_operator(), None);
    }

    #[test]
    fn non_char_token_cancels_continuation() {
        let (text, s) = run("abc", "r<cr>");
        assert_eq!(text, "abc");
        assert_eq!(s.continuation(), None);
    }

    #[test]
    fn counts_accumulate() {
        let (_, s) = run("abc", "12");
        assert_eq!(s.repeat_count(), Some(12));
        let (_, s) = run("abc", "10");
        assert_eq!(s.repeat_count(), Some(10));
        let (_, s) = run_at("abc", 0, 2, "0");
        assert_eq!(s.cursor(), p(0, 0));
        assert_eq!(s.repeat_count(), None);
    }

    // ── Visual modes ──────────────────────────────────────────────────────

    #[test]
    fn visual_char_delete_inclusive() {
        let (text, s) = run("abcdef", "lvlld");
        assert_eq!(text, "aef");
        assert_eq!(s.register('"'), "bcd");
        assert_eq!(s.mode(), Mode::Normal);
        assert_eq!(s.cursor(), p(0, 1));
    }

    #[test]
    fn visual_backward_selection() {
        let (text, _) = run_at("abcdef", 0, 4, "vhhy");
        assert_eq!(text, "abcdef");
        let (_, s) = run_at("abcdef", 0, 4, "vhhy");
        assert_eq!(s.register('"'), "cde");
        assert_eq!(s.cursor(), p(0, 2));
    }

    #[test]
    fn visual_line_delete() {
        let (text, s) = run("a\nb\nc", "Vjd");
        assert_eq!(text, "c");
        assert_eq!(s.register('"'), "a\nb\n");
    }

    #[test]
    fn visual_block_delete() {
        let (text, _) = run("abcd\nefgh", "l<c-v>jlx");
        assert_eq!(text, "ad\neh");
    }

    #[test]
    fn visual_change() {
        let (text, s) = run("abc def", "vecX<esc>");
        assert_eq!(text, "X def");
        assert_eq!(s.mode(), Mode::Normal);
    }

    #[test]
    fn visual_toggle_and_switch() {
        let (_, s) = run("abc", "v");
        assert_eq!(s.mode(), Mode::Visual(VisualKind::Char));
        assert_eq!(s.visual_anchor(), Some(p(0, 0)));
        let (_, s) = run("abc", "vv");
        assert_eq!(s.mode(), Mode::Normal);
        assert_eq!(s.visual_anchor(), None);
        let (_, s) = run("abc", "lvV");
        assert_eq!(s.mode(), Mode::Visual(VisualKind::Line));
        assert_eq!(s.visual_anchor(), Some(p(0, 1)));
        let (_, s) = run("abc", "v<esc>");
        assert_eq!(s.mode(), Mode::Normal);
    }

    // ── Cursor normalization ──────────────────────────────────────────────

    #[test]
    fn cursor_is_clamped_after_edits() {
        let (text, s) = run_at("abc\nd", 0, 2, "dd");
        assert_eq!(text, "d");
        assert_eq!(s.cursor(), p(0, 0));
        let (_, s) = run_at("abc", 5, 9, "<esc>");
        assert_eq!(s.cursor(), p(0, 2));
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    #[test]
    fn find_in_row_directions() {
        let jump = |ch, kind, direction| LastJump { ch, kind, direction };
        let fwd = SearchDirection::Forward;
        let back = SearchDirection::Backward;
        assert_eq!(find_in_row("a.b.c", 0, jump('.', JumpKind::Find, fwd), 1, false), Some(1));
        assert_eq!(find_in_row("a.b.c", 0, jump('.', JumpKind::Find, fwd), 2, false), Some(3));
        assert_eq!(find_in_row("a.b.c", 0, jump('.', JumpKind::Find, fwd), 3, false), None);
        assert_eq!(find_in_row("a.b.c", 4, jump('.', JumpKind::Till, back), 1, false), Some(4));
        assert_eq!(find_in_row("a.b.c", 4, jump('.', JumpKind::Till, back), 1, true), Some(2));
    }

    #[test]
    fn next_word_start_cases() {
        let b = Buffer::from_text("ab  cd");
        assert_eq!(next_word_start(&b, 0, WordKind::Word), 4);
        assert_eq!(next_word_start(&b, 2, WordKind::Word), 4);
        assert_eq!(next_word_start(&b, 4, WordKind::Word), 6);
    }
}
