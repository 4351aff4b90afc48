//! Input tokens and key notation.
//!
//! A [`Token`] is one keystroke as the interpreter sees it: either a printable
//! character or one of a small fixed set of named keys. Physical key events
//! are mapped to tokens by the host.
//!
//! Tokens have a textual notation used for macro registers and for the replay
//! binary's command line:
//!
//! | Token       | Notation | Names accepted by [`Token::from_name`] |
//! |-------------|----------|----------------------------------------|
//! | `Escape`    | `<esc>`  | `esc`, `escape`                        |
//! | `CtrlC`     | `<c-c>`  | `ctrl-c`                               |
//! | `Backspace` | `<bs>`   | `backspace`                            |
//! | `Enter`     | `<cr>`   | `enter`, `"\r"`                        |
//! | `CtrlR`     | `<c-r>`  | `ctrl-r`                               |
//! | `CtrlV`     | `<c-v>`  | `ctrl-v`                               |
//!
//! A literal `<` is written `<lt>`, so any token sequence survives a trip
//! through its notation. A `<` that does not open a known name is still read
//! as an ordinary character.

use std::fmt;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// One input keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// A printable character.
    Char(char),
    // ── Named keys ──────────────────────────────────────────────
    Escape,
    CtrlC,
    Backspace,
    Enter,
    CtrlR,
    CtrlV,
}

/// Bracketed names, longest spellings included, and the token each means.
const NOTATION: &[(&str, Token)] = &[
    ("esc", Token::Escape),
    ("escape", Token::Escape),
    ("c-c", Token::CtrlC),
    ("ctrl-c", Token::CtrlC),
    ("bs", Token::Backspace),
    ("backspace", Token::Backspace),
    ("cr", Token::Enter),
    ("enter", Token::Enter),
    ("c-r", Token::CtrlR),
    ("ctrl-r", Token::CtrlR),
    ("c-v", Token::CtrlV),
    ("ctrl-v", Token::CtrlV),
    ("lt", Token::Char('<')),
];

impl Token {
    /// Parse a host-supplied key name: a single character or one of the
    /// named-key spellings. Returns `None` for anything else.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "esc" | "escape" => Some(Self::Escape),
            "ctrl-c" => Some(Self::CtrlC),
            "backspace" => Some(Self::Backspace),
            "enter" | "\r" => Some(Self::Enter),
            "ctrl-r" => Some(Self::CtrlR),
            "ctrl-v" => Some(Self::CtrlV),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Some(Self::Char(ch)),
                    _ => None,
                }
            }
        }
    }

    /// True for the two keys that unconditionally return to normal mode.
    #[inline]
    #[must_use]
    pub const fn is_escape(self) -> bool {
        matches!(self, Self::Escape | Self::CtrlC)
    }

    /// The character, if this is a printable token.
    #[inline]
    #[must_use]
    pub const fn as_char(self) -> Option<char> {
        match self {
            Self::Char(ch) => Some(ch),
            _ => None,
        }
    }

    /// True if this token is exactly `ch`.
    #[inline]
    #[must_use]
    pub fn is(self, ch: char) -> bool {
        self == Self::Char(ch)
    }
}

impl From<char> for Token {
    fn from(ch: char) -> Self {
        Self::Char(ch)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char('<') => f.write_str("<lt>"),
            Self::Char(ch) => write!(f, "{ch}"),
            Self::Escape => f.write_str("<esc>"),
            Self::CtrlC => f.write_str("<c-c>"),
            Self::Backspace => f.write_str("<bs>"),
            Self::Enter => f.write_str("<cr>"),
            Self::CtrlR => f.write_str("<c-r>"),
            Self::CtrlV => f.write_str("<c-v>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Notation
// ---------------------------------------------------------------------------

/// Parse key notation such as `"dw<esc>"` into tokens.
///
/// Names inside `<...>` are matched case-insensitively. Unknown or unclosed
/// brackets are taken literally, so `"a<b"` is three characters.
#[must_use]
pub fn parse_keys(notation: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(notation.len());
    let mut rest = notation;

    while let Some(ch) = rest.chars().next() {
        if ch == '<'
            && let Some((token, consumed)) = bracketed(rest)
        {
            tokens.push(token);
            rest = &rest[consumed..];
            continue;
        }
        tokens.push(Token::Char(ch));
        rest = &rest[ch.len_utf8()..];
    }

    tokens
}

/// Encode tokens back into notation. Inverse of [`parse_keys`].
#[must_use]
pub fn encode(tokens: &[Token]) -> String {
    tokens.iter().map(ToString::to_string).collect()
}

/// Try to read `<name>` at the start of `text`. Returns the token and the
/// number of bytes consumed.
fn bracketed(text: &str) -> Option<(Token, usize)> {
    let close = text.find('>')?;
    let name = text[1..close].to_ascii_lowercase();
    NOTATION
        .iter()
        .find(|(spelling, _)| *spelling == name)
        .map(|&(_, token)| (token, close + 1))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // -- from_name ----------------------------------------------------------

    #[test]
    fn from_name_named_keys() {
        assert_eq!(Token::from_name("esc"), Some(Token::Escape));
        assert_eq!(Token::from_name("escape"), Some(Token::Escape));
        assert_eq!(Token::from_name("ctrl-c"), Some(Token::CtrlC));
        assert_eq!(Token::from_name("backspace"), Some(Token::Backspace));
        assert_eq!(Token::from_name("enter"), Some(Token::Enter));
        assert_eq!(Token::from_name("\r"), Some(Token::Enter));
        assert_eq!(Token::from_name("ctrl-r"), Some(Token::CtrlR));
        assert_eq!(Token::from_name("ctrl-v"), Some(Token::CtrlV));
    }

    #[test]
    fn from_name_single_char() {
        assert_eq!(Token::from_name("x"), Some(Token::Char('x')));
        assert_eq!(Token::from_name("é"), Some(Token::Char('é')));
    }

    #[test]
    fn from_name_rejects_unknown() {
        assert_eq!(Token::from_name(""), None);
        assert_eq!(Token::from_name("tab"), None);
        assert_eq!(Token::from_name("xy"), None);
    }

    #[test]
    fn escape_classification() {
        assert!(Token::Escape.is_escape());
        assert!(Token::CtrlC.is_escape());
        assert!(!Token::Enter.is_escape());
        assert!(!Token::Char('q').is_escape());
    }

    // -- parse_keys ---------------------------------------------------------

    #[test]
    fn parse_plain_characters() {
        assert_eq!(
            parse_keys("dw"),
            vec![Token::Char('d'), Token::Char('w')]
        );
    }

    #[test]
    fn parse_named_keys() {
        assert_eq!(
            parse_keys("ihi<esc>u<C-R>"),
            vec![
                Token::Char('i'),
                Token::Char('h'),
                Token::Char('i'),
                Token::Escape,
                Token::Char('u'),
                Token::CtrlR,
            ]
        );
    }

    #[test]
    fn parse_literal_angle_brackets() {
        assert_eq!(
            parse_keys("a<b"),
            vec![Token::Char('a'), Token::Char('<'), Token::Char('b')]
        );
        assert_eq!(parse_keys("<x>").len(), 3);
        assert_eq!(parse_keys("<LT>"), vec![Token::Char('<')]);
    }

    // -- encode -------------------------------------------------------------

    #[test]
    fn encode_uses_short_names() {
        let tokens = [Token::Char('x'), Token::Enter, Token::Backspace, Token::CtrlC];
        assert_eq!(encode(&tokens), "x<cr><bs><c-c>");
        assert_eq!(parse_keys(&encode(&tokens)), tokens.to_vec());
    }

    #[test]
    fn encode_escapes_literal_names() {
        let tokens = parse_keys("<lt>esc><lt>lt>");
        assert_eq!(
            tokens,
            vec![
                Token::Char('<'),
                Token::Char('e'),
                Token::Char('s'),
                Token::Char('c'),
                Token::Char('>'),
                Token::Char('<'),
                Token::Char('l'),
                Token::Char('t'),
                Token::Char('>'),
            ]
        );
        assert_eq!(encode(&tokens), "<lt>esc><lt>lt>");
        assert_eq!(parse_keys(&encode(&tokens)), tokens);
    }
}
