//! Interpreter options and the `set`-style directives that change them.
//!
//! # Option names
//!
//! Both full names and abbreviations are accepted:
//!
//! | Full name     | Abbrev | Type    | Default   | Effect                                 |
//! |---------------|--------|---------|-----------|----------------------------------------|
//! | `ignorecase`  | `ic`   | bool    | false     | search patterns ignore case            |
//! | `macrodepth`  | `md`   | integer | 64        | deepest nested `@` playback            |
//! | `macrobudget` | `mb`   | integer | 100000    | replayed tokens allowed per call       |
//!
//! # Directive syntax
//!
//! | Syntax          | Effect                  |
//! |-----------------|-------------------------|
//! | `option`        | enable a boolean        |
//! | `nooption`      | disable a boolean       |
//! | `option!`       | toggle a boolean        |
//! | `option=N`      | assign an integer       |

use thiserror::Error;

/// Default nesting limit for macro playback.
pub const DEFAULT_MAX_MACRO_DEPTH: usize = 64;
/// Default number of replayed tokens one `interpret` call may process.
pub const DEFAULT_MACRO_TOKEN_BUDGET: usize = 100_000;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Interpreter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Playback nested deeper than this is truncated.
    pub max_macro_depth: usize,
    /// Total replayed tokens per call before playback is truncated.
    pub macro_token_budget: usize,
    /// Compile search patterns case-insensitively.
    pub ignore_case: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_macro_depth: DEFAULT_MAX_MACRO_DEPTH,
            macro_token_budget: DEFAULT_MACRO_TOKEN_BUDGET,
            ignore_case: false,
        }
    }
}

impl Options {
    /// Apply every directive in a space-separated argument string.
    ///
    /// # Errors
    ///
    /// Stops at the first directive that names an unknown option or carries
    /// a bad value. Directives before it stay applied.
    pub fn set(&mut self, args: &str) -> Result<(), OptionError> {
        for directive in parse_set(args) {
            self.apply(&directive)?;
        }
        Ok(())
    }

    /// Apply one parsed directive.
    ///
    /// # Errors
    ///
    /// Returns an [`OptionError`] when the name is unknown, the directive does
    /// not fit the option's type, or an assigned value is not an integer.
    pub fn apply(&mut self, directive: &SetDirective) -> Result<(), OptionError> {
        match directive {
            SetDirective::On(name) => *self.flag(name)? = true,
            SetDirective::Off(name) => *self.flag(name)? = false,
            SetDirective::Toggle(name) => {
                let flag = self.flag(name)?;
                *flag = !*flag;
            }
            SetDirective::Assign(name, value) => {
                let parsed = value.parse().map_err(|_| OptionError::InvalidValue {
                    name: name.clone(),
                    value: value.clone(),
                })?;
                *self.number(name)? = parsed;
            }
        }
        Ok(())
    }

    fn flag(&mut self, name: &str) -> Result<&mut bool, OptionError> {
        match name {
            "ignorecase" | "ic" => Ok(&mut self.ignore_case),
            _ if is_numeric_option(name) => Err(OptionError::NotBoolean(name.to_string())),
            _ => Err(OptionError::Unknown(name.to_string())),
        }
    }

    fn number(&mut self, name: &str) -> Result<&mut usize, OptionError> {
        match name {
            "macrodepth" | "md" => Ok(&mut self.max_macro_depth),
            "macrobudget" | "mb" => Ok(&mut self.macro_token_budget),
            _ if is_bool_option(name) => Err(OptionError::NotNumeric(name.to_string())),
            _ => Err(OptionError::Unknown(name.to_string())),
        }
    }
}

/// A directive that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("unknown option: {0}")]
    Unknown(String),
    #[error("option {0} takes a number")]
    NotBoolean(String),
    #[error("option {0} is a flag")]
    NotNumeric(String),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

// ---------------------------------------------------------------------------
// Directive parsing
// ---------------------------------------------------------------------------

/// A parsed option directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDirective {
    /// `option`: enable a boolean option.
    On(String),
    /// `nooption`: disable a boolean option.
    Off(String),
    /// `option!`: toggle a boolean option.
    Toggle(String),
    /// `option=value`: assign a value.
    Assign(String, String),
}

/// Returns `true` if `name` is a known boolean option.
#[must_use]
pub fn is_bool_option(name: &str) -> bool {
    matches!(name, "ignorecase" | "ic")
}

/// Returns `true` if `name` is a known numeric option.
#[must_use]
pub fn is_numeric_option(name: &str) -> bool {
    matches!(name, "macrodepth" | "md" | "macrobudget" | "mb")
}

/// Parse a space-separated argument string into directives.
#[must_use]
pub fn parse_set(args: &str) -> Vec<SetDirective> {
    args.split_whitespace().map(parse_set_arg).collect()
}

/// Parse a single argument into a directive.
#[must_use]
pub fn parse_set_arg(arg: &str) -> SetDirective {
    if let Some((name, value)) = arg.split_once('=') {
        return SetDirective::Assign(name.to_string(), value.to_string());
    }

    if let Some(name) = arg.strip_suffix('!') {
        return SetDirective::Toggle(name.to_string());
    }

    // Only strip "no" when the rest is a real flag.
    if let Some(name) = arg.strip_prefix("no")
        && is_bool_option(name)
    {
        return SetDirective::Off(name.to_string());
    }

    SetDirective::On(arg.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
