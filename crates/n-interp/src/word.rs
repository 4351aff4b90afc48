//! Word tokenizer: splits text into the units word motions jump between.
//!
//! | Kind              | Keys        | A token is                                   |
//! |-------------------|-------------|----------------------------------------------|
//! | [`WordKind::Word`]    | `w b e`     | a run of word chars, or one punctuation char |
//! | [`WordKind::BigWord`] | `W B E`     | a run of non-blank chars                     |
//!
//! Word chars are letters, digits, and underscore (Unicode-aware). Blanks
//! (including newlines) separate tokens and never appear in one. Under the
//! `word` policy each punctuation character is its own token, so `foo.bar`
//! yields `foo`, `.`, `bar` and motions can land exactly on the dot.
//!
//! The tokenizer holds no state: motions re-tokenize the fragment they care
//! about every time.

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Boundary policy for tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordKind {
    /// `w`/`b`/`e`: punctuation splits words.
    Word,
    /// `W`/`B`/`E`: only whitespace splits WORDs.
    BigWord,
}

/// True for characters that make up a `word`: alphanumerics and `_`.
#[inline]
#[must_use]
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// One token of a tokenized fragment. `start..end` are char offsets into the
/// fragment, half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordToken {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl WordToken {
    /// Offset of the token's last character.
    #[inline]
    #[must_use]
    pub const fn last(&self) -> usize {
        self.end.saturating_sub(1)
    }
}

/// Split `text` into word/separator tokens under `kind`.
#[must_use]
pub fn tokenize(text: &str, kind: WordKind) -> Vec<WordToken> {
    let mut tokens = Vec::new();
    let mut run = String::new();
    let mut run_start = 0;

    let flush = |run: &mut String, start: usize, end: usize, tokens: &mut Vec<WordToken>| {
        if !run.is_empty() {
            tokens.push(WordToken {
                text: std::mem::take(run),
                start,
                end,
            });
        }
    };

    let mut offset = 0;
    for ch in text.chars() {
        if ch.is_whitespace() {
            flush(&mut run, run_start, offset, &mut tokens);
        } else if kind == WordKind::Word && !is_word_char(ch) {
            flush(&mut run, run_start, offset, &mut tokens);
            tokens.push(WordToken {
                text: ch.to_string(),
                start: offset,
                end: offset + 1,
            });
        } else {
            if run.is_empty() {
                run_start = offset;
            }
            run.push(ch);
        }
        offset += 1;
    }
    flush(&mut run, run_start, offset, &mut tokens);

    tokens
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
