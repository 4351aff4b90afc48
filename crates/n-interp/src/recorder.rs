//! Macro recording and playback support.
//!
//! While `q{name}` is active, each live token is appended to register `name`
//! in key notation (`<esc>`, `<cr>`, `<lt>` for a literal `<`), so a macro
//! register is ordinary text that can also be written with `"ayy`-style
//! yanks. The closing `q` is recorded like any other token and then stripped.
//! `qA` appends to register `a` instead of starting it afresh.
//!
//! Playback (`@{name}`) decodes the register and feeds the tokens back through
//! the interpreter one level deeper. [`PlaybackGuard`] bounds that recursion:
//! a macro that plays itself stops at the configured depth, and the total
//! number of replayed tokens per call is capped. Both limits truncate
//! silently apart from a `warn!` event.

use crate::key::{self, Token};
use crate::options::Options;
use crate::register::RegisterFile;

/// Append `token` to the register being recorded.
pub fn capture(registers: &mut RegisterFile, name: char, token: Token) {
    registers.append(name, &key::encode(&[token]));
}

/// Finish recording into `name`: drop the trailing `q` that stopped it.
pub fn finish(registers: &mut RegisterFile, name: char) {
    let content = registers.read(name);
    if let Some(stripped) = content.strip_suffix('q') {
        let stripped = stripped.to_string();
        registers.write(name, stripped);
    }
}

/// Decode a register's content into tokens for playback.
#[must_use]
pub fn decode(content: &str) -> Vec<Token> {
    key::parse_keys(content)
}

// ---------------------------------------------------------------------------
// PlaybackGuard
// ---------------------------------------------------------------------------

/// Recursion and volume limits for one `interpret` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackGuard {
    max_depth: usize,
    remaining: usize,
    truncated: bool,
}

impl PlaybackGuard {
    #[must_use]
    pub const fn new(options: &Options) -> Self {
        Self {
            max_depth: options.max_macro_depth,
            remaining: options.macro_token_budget,
            truncated: false,
        }
    }

    /// True if playback may start at nesting `depth` (1 for a macro invoked
    /// by a live token).
    #[must_use]
    pub const fn may_enter(&self, depth: usize) -> bool {
        depth <= self.max_depth
    }

    /// Spend budget for one replayed token. Returns `false` once the budget
    /// is gone.
    pub const fn spend(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    /// Record that playback was cut short. Returns `true` the first time, so
    /// the caller logs once per call.
    pub const fn mark_truncated(&mut self) -> bool {
        let first = !self.truncated;
        self.truncated = true;
        first
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
