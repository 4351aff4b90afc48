//! Range editor: applies the pending operator to a motion's range.
//!
//! Motions produce a raw `(from, to)` pair of char offsets: `from` is the
//! cursor, `to` is where the motion landed. [`apply`] turns that pair into an
//! edit:
//!
//! 1. **Order**: if `from > to` the pair is swapped, so backward motions
//!    (`b`, `F`, `N`) cut the text behind the cursor.
//! 2. **Expand**: with a modifier pending (`i`/`a`), grow both ends while the
//!    neighbouring character is a word character. Inside and around expand
//!    identically.
//! 3. **Operate** on the half-open range `[from, to)`:
//!
//! | Operator | Registers                  | Buffer          | Afterwards                  |
//! |----------|----------------------------|-----------------|-----------------------------|
//! | delete   | ring + selected            | range removed   | cursor at range start       |
//! | change   | ring + selected            | range removed   | insert mode at range start  |
//! | yank     | ring + selected            | unchanged       | checkpoint pushed           |
//! | none     | -                          | unchanged       | cursor moves to `to`        |
//!
//! Delete and change checkpoint before editing. Every path clears the pending
//! operator, modifier, and selected register.
//!
//! Line-wise ranges (`dd`, `dj`, `V`) go through [`apply_linewise`], which
//! cuts whole rows and stores register text ending in `\n`. Visual block
//! selections go through [`apply_block`].

use crate::buffer::Buffer;
use crate::mode::Mode;
use crate::position::{self, Position, Span};
use crate::register::LAST_INSERT;
use crate::state::{Operator, State};
use crate::word::is_word_char;

// ---------------------------------------------------------------------------
// Character-wise ranges
// ---------------------------------------------------------------------------

/// Apply the pending operator to the range between `from` and `to`.
#[must_use]
pub fn apply(buffer: &Buffer, state: &mut State, from: usize, to: usize) -> Buffer {
    let swapped = from > to;
    let span = Span::ordered(from, to);
    let span = if state.pending_modifier.is_some() {
        expand_word(buffer, span)
    } else {
        span
    };

    let operator = state.pending_operator;
    state.pending_operator = None;
    state.pending_modifier = None;

    let result = match operator {
        Some(Operator::Delete) => delete(buffer, state, span),
        Some(Operator::Change) => {
            let edited = delete(buffer, state, span);
            enter_insert(state);
            edited
        }
        Some(Operator::Yank) => {
            store(state, &buffer.slice(span));
            if swapped {
                state.cursor = position::to_row_col(buffer, span.start);
            }
            state.checkpoint(buffer);
            buffer.clone()
        }
        None => {
            state.cursor = position::to_row_col(buffer, to);
            buffer.clone()
        }
    };

    // Backward pure motions land on the low end of the unexpanded pair.
    if swapped && operator.is_none() {
        state.cursor = position::to_row_col(buffer, from.min(to));
    }

    state.selected_register = None;
    result
}

/// Grow `span` outward over adjacent word characters.
fn expand_word(buffer: &Buffer, span: Span) -> Span {
    let Span { mut start, mut end } = span;
    while start > 0 && buffer.char_at(start - 1).is_some_and(is_word_char) {
        start -= 1;
    }
    while buffer.char_at(end).is_some_and(is_word_char) {
        end += 1;
    }
    Span { start, end }
}

fn delete(buffer: &Buffer, state: &mut State, span: Span) -> Buffer {
    state.checkpoint(buffer);
    store(state, &buffer.slice(span));
    let edited = buffer.removed(span);
    state.cursor = position::to_row_col(&edited, span.start);
    edited
}

// ---------------------------------------------------------------------------
// Line-wise ranges
// ---------------------------------------------------------------------------

/// Apply the pending operator to rows `first..=last` as whole lines.
///
/// The removed span includes the trailing newline of `last`, or the newline
/// before `first` when `last` is the final row. Register text is the rows
/// joined and terminated with `\n`.
#[must_use]
pub fn apply_linewise(buffer: &Buffer, state: &mut State, first: usize, last: usize) -> Buffer {
    let first = first.min(buffer.last_row());
    let last = last.clamp(first, buffer.last_row());
    let operator = state.pending_operator;
    state.pending_operator = None;
    state.pending_modifier = None;

    let Some(operator) = operator else {
        state.selected_register = None;
        return buffer.clone();
    };

    let text = line_text(buffer, first, last);
    let start = position::line_start(buffer, first).unwrap_or(0);
    let end = position::line_end(buffer, last).unwrap_or(start);

    let result = match operator {
        Operator::Delete => {
            state.checkpoint(buffer);
            store(state, &text);
            let span = if last < buffer.last_row() {
                Span { start, end: end + 1 }
            } else {
                Span {
                    start: start.saturating_sub(usize::from(first > 0)),
                    end,
                }
            };
            let edited = buffer.removed(span);
            let row = first.min(edited.last_row());
            let col = position::first_non_blank(&edited, row)
                .zip(position::line_start(&edited, row))
                .map_or(0, |(idx, line)| idx - line);
            state.cursor = Position::new(row, col);
            edited
        }
        Operator::Change => {
            state.checkpoint(buffer);
            store(state, &text);
            let indent = leading_blanks(&buffer.row_text(first));
            let edited = buffer.replaced(Span { start, end }, &indent);
            state.cursor = Position::new(first, indent.chars().count());
            enter_insert(state);
            edited
        }
        Operator::Yank => {
            store(state, &text);
            if state.cursor.row > first {
                state.cursor.row = first;
            }
            state.checkpoint(buffer);
            buffer.clone()
        }
    };

    state.selected_register = None;
    result
}

/// Rows `first..=last` joined, with a trailing newline.
fn line_text(buffer: &Buffer, first: usize, last: usize) -> String {
    let mut text = String::new();
    for row in first..=last {
        text.push_str(&buffer.row_text(row));
        text.push('\n');
    }
    text
}

/// The run of spaces and tabs that starts `line`.
pub(crate) fn leading_blanks(line: &str) -> String {
    line.chars().take_while(|ch| matches!(ch, ' ' | '\t')).collect()
}

// ---------------------------------------------------------------------------
// Block ranges
// ---------------------------------------------------------------------------

/// Apply the pending operator to the rectangle spanning rows `top..=bottom`
/// and columns `left..=right`. Rows shorter than `left` contribute nothing.
#[must_use]
pub fn apply_block(
    buffer: &Buffer,
    state: &mut State,
    (top, bottom): (usize, usize),
    (left, right): (usize, usize),
) -> Buffer {
    let operator = state.pending_operator;
    state.pending_operator = None;
    state.pending_modifier = None;

    let spans: Vec<Span> = (top..=bottom.min(buffer.last_row()))
        .map(|row| {
            let start = position::to_offset(buffer, row, left);
            let end = position::to_offset(buffer, row, right.saturating_add(1));
            Span { start, end }
        })
        .collect();
    let text = spans
        .iter()
        .map(|&span| buffer.slice(span))
        .collect::<Vec<_>>()
        .join("\n");

    let result = match operator {
        Some(Operator::Delete | Operator::Change) => {
            state.checkpoint(buffer);
            store(state, &text);
            let edited = spans
                .iter()
                .rev()
                .fold(buffer.clone(), |acc, &span| acc.removed(span));
            state.cursor = Position::new(top, left.min(edited.row_len(top)));
            if operator == Some(Operator::Change) {
                enter_insert(state);
            }
            edited
        }
        Some(Operator::Yank) => {
            store(state, &text);
            state.cursor = Position::new(top, left);
            state.checkpoint(buffer);
            buffer.clone()
        }
        None => buffer.clone(),
    };

    state.selected_register = None;
    result
}

// ---------------------------------------------------------------------------
// Shared effects
// ---------------------------------------------------------------------------

/// Write operator text to the ring and to the selected register, if any.
fn store(state: &mut State, text: &str) {
    state.registers.record(text);
    if let Some(name) = state.selected_register {
        state.registers.store_selected(name, text);
    }
}

/// Switch to insert mode the way every insert-entry command does.
pub(crate) fn enter_insert(state: &mut State) {
    state.mode = Mode::Insert;
    state.insert_append = true;
    state.registers.clear(LAST_INSERT);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Modifier;
    use pretty_assertions::assert_eq;

    fn setup(text: &str, op: Option<Operator>) -> (Buffer, State) {
        let buf = Buffer::from_text(text);
        let mut state = State::initial(&buf);
        state.pending_operator = op;
        (buf, state)
    }

    // -- Pure motion --------------------------------------------------------

    #[test]
    fn motion_moves_cursor_only() {
        let (buf, mut state) = setup("abc\ndef", None);
        let out = apply(&buf, &mut state, 0, 5);
        assert_eq!(out, buf);
        assert_eq!(state.cursor, Position::new(1, 1));
    }

    #[test]
    fn backward_motion_lands_on_target() {
        let (buf, mut state) = setup("abc def", None);
        state.cursor = Position::new(0, 6);
        let _ = apply(&buf, &mut state, 6, 4);
        assert_eq!(state.cursor, Position::new(0, 4));
    }

    // -- Delete -------------------------------------------------------------

    #[test]
    fn delete_half_open() {
        let (buf, mut state) = setup("abc def", Some(Operator::Delete));
        let out = apply(&buf, &mut state, 0, 4);
        assert_eq!(out.contents(), "def");
        assert_eq!(state.register('"'), "abc ");
        assert_eq!(state.register('0'), "abc ");
        assert_eq!(state.cursor, Position::ZERO);
        assert_eq!(state.pending_operator, None);
    }

    #[test]
    fn delete_swapped_range() {
        let (buf, mut state) = setup("abc def", Some(Operator::Delete));
        state.cursor = Position::new(0, 4);
        let out = apply(&buf, &mut state, 4, 0);
        assert_eq!(out.contents(), "def");
        assert_eq!(state.cursor, Position::ZERO);
    }

    #[test]
    fn delete_writes_selected_register() {
        let (buf, mut state) = setup("abc", Some(Operator::Delete));
        state.selected_register = Some('k');
        let _ = apply(&buf, &mut state, 0, 2);
        assert_eq!(state.register('k'), "ab");
        assert_eq!(state.selected_register, None);
    }

    #[test]
    fn delete_checkpoints_before_editing() {
        let (buf, mut state) = setup("abc", Some(Operator::Delete));
        state.cursor = Position::new(0, 1);
        let _ = apply(&buf, &mut state, 1, 2);
        assert_eq!(state.history.len(), 2);
        assert_eq!(
            state.history.current().map(|cp| cp.buffer.contents()),
            Some("abc".to_string())
        );
    }

    // -- Modifier -----------------------------------------------------------

    #[test]
    fn modifier_expands_to_word() {
        let (buf, mut state) = setup("foo bar_baz qux", Some(Operator::Delete));
        state.pending_modifier = Some(Modifier::Inside);
        let out = apply(&buf, &mut state, 6, 7);
        assert_eq!(out.contents(), "foo  qux");
        assert_eq!(state.register('"'), "bar_baz");
    }

    #[test]
    fn around_expands_like_inside() {
        let (buf, mut state) = setup("foo bar qux", Some(Operator::Yank));
        state.pending_modifier = Some(Modifier::Around);
        let _ = apply(&buf, &mut state, 5, 6);
        assert_eq!(state.register('"'), "bar");
    }

    // -- Change -------------------------------------------------------------

    #[test]
    fn change_enters_insert() {
        let (buf, mut state) = setup("abc def", Some(Operator::Change));
        state.registers.write('.', "old");
        let out = apply(&buf, &mut state, 0, 3);
        assert_eq!(out.contents(), " def");
        assert_eq!(state.mode, Mode::Insert);
        assert!(state.insert_append);
        assert_eq!(state.register('.'), "");
    }

    // -- Yank ---------------------------------------------------------------

    #[test]
    fn yank_keeps_buffer_and_cursor() {
        let (buf, mut state) = setup("abc def", Some(Operator::Yank));
        state.selected_register = Some('a');
        let out = apply(&buf, &mut state, 0, 3);
        assert_eq!(out, buf);
        assert_eq!(state.register('a'), "abc");
        assert_eq!(state.register('"'), "abc");
        assert_eq!(state.cursor, Position::ZERO);
    }

    // -- Line-wise ----------------------------------------------------------

    #[test]
    fn linewise_delete_middle() {
        let (buf, mut state) = setup("one\n  two\nthree", Some(Operator::Delete));
        let out = apply_linewise(&buf, &mut state, 0, 0);
        assert_eq!(out.contents(), "  two\nthree");
        assert_eq!(state.register('"'), "one\n");
        assert_eq!(state.cursor, Position::new(0, 2));
    }

    #[test]
    fn linewise_delete_last_takes_preceding_newline() {
        let (buf, mut state) = setup("one\ntwo", Some(Operator::Delete));
        let out = apply_linewise(&buf, &mut state, 1, 1);
        assert_eq!(out.contents(), "one");
        assert_eq!(state.register('"'), "two\n");
        assert_eq!(state.cursor, Position::new(0, 0));
    }

    #[test]
    fn linewise_delete_only_line() {
        let (buf, mut state) = setup("solo", Some(Operator::Delete));
        let out = apply_linewise(&buf, &mut state, 0, 0);
        assert_eq!(out.contents(), "");
        assert_eq!(state.register('"'), "solo\n");
    }

    #[test]
    fn linewise_change_keeps_indent() {
        let (buf, mut state) = setup("a\n    body\nz", Some(Operator::Change));
        let out = apply_linewise(&buf, &mut state, 1, 1);
        assert_eq!(out.contents(), "a\n    \nz");
        assert_eq!(state.cursor, Position::new(1, 4));
        assert_eq!(state.mode, Mode::Insert);
        assert_eq!(state.register('"'), "    body\n");
    }

    #[test]
    fn linewise_yank_multiple_rows() {
        let (buf, mut state) = setup("a\nb\nc", Some(Operator::Yank));
        state.cursor = Position::new(1, 0);
        let out = apply_linewise(&buf, &mut state, 0, 1);
        assert_eq!(out, buf);
        assert_eq!(state.register('"'), "a\nb\n");
        assert_eq!(state.cursor, Position::new(0, 0));
    }

    // -- Block --------------------------------------------------------------

    #[test]
    fn block_delete_rectangle() {
        let (buf, mut state) = setup("abcd\nefgh\nij", Some(Operator::Delete));
        let out = apply_block(&buf, &mut state, (0, 2), (1, 2));
        assert_eq!(out.contents(), "ad\neh\ni");
        assert_eq!(state.register('"'), "bc\nfg\nj");
        assert_eq!(state.cursor, Position::new(0, 1));
    }

    #[test]
    fn leading_blanks_mixed() {
        assert_eq!(leading_blanks(" \t x "), " \t ");
        assert_eq!(leading_blanks("x"), "");
    }
}
