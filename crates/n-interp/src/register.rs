//! Register store: named slots of text.
//!
//! Every register is a name mapped to a string. Reading a register that was
//! never written yields `""`, never an error.
//!
//! ## Register names
//!
//! | Name          | Written by                                        |
//! |---------------|---------------------------------------------------|
//! | `"` unnamed   | every delete, change, and yank                    |
//! | `0`–`9`       | the numbered ring (see [`RegisterFile::record`])   |
//! | `.`           | text typed during the most recent insert          |
//! | `/`           | the most recently committed search query          |
//! | `a`–`z`       | `"x` before an operator; `qx` macro recording     |
//! | `A`–`Z`       | `"X` or `qX` appends to `x`                       |
//!
//! Register content that ends in `\n` is line-wise: a put opens new rows for
//! it instead of splicing it into the current one.

use std::collections::BTreeMap;

/// The unnamed register.
pub const UNNAMED: char = '"';
/// Text typed during the last insert session.
pub const LAST_INSERT: char = '.';
/// The last committed search query.
pub const SEARCH: char = '/';

/// Number of slots in the numbered ring.
pub const RING_LEN: usize = 10;

const RING: [char; RING_LEN] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// True if register content should be put line-wise.
#[inline]
#[must_use]
pub fn is_linewise(content: &str) -> bool {
    content.ends_with('\n')
}

// ── Register file ────────────────────────────────────────────────────────

/// All registers, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    slots: BTreeMap<char, String>,
}

impl RegisterFile {
    /// Create a register file with every register empty.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// Content of register `name`, or `""` if unset. Uppercase letters read
    /// their lowercase register.
    #[must_use]
    pub fn read(&self, name: char) -> &str {
        self.slots
            .get(&name.to_ascii_lowercase())
            .map_or("", String::as_str)
    }

    /// Overwrite register `name`. Uppercase letters name their lowercase
    /// register, as in [`read`](Self::read).
    pub fn write(&mut self, name: char, content: impl Into<String>) {
        self.slots.insert(name.to_ascii_lowercase(), content.into());
    }

    /// Append to register `name`, creating it if needed.
    pub fn append(&mut self, name: char, text: &str) {
        self.slots
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push_str(text);
    }

    /// Reset register `name` to empty.
    pub fn clear(&mut self, name: char) {
        self.slots.remove(&name.to_ascii_lowercase());
    }

    /// Record a delete/change/yank.
    ///
    /// Shifts the ring (`9 ← 8 ← … ← 1 ← 0`), then stores `content` in the
    /// unnamed register and copies it into `0`. Slot `0` therefore always
    /// mirrors `"`, `1` holds the previous write, and the eleventh write
    /// pushes the first one off the end of the ring.
    pub fn record(&mut self, content: &str) {
        for idx in (1..RING_LEN).rev() {
            if let Some(prev) = self.slots.get(&RING[idx - 1]).cloned() {
                self.slots.insert(RING[idx], prev);
            }
        }
        self.write(UNNAMED, content);
        self.write(RING[0], content);
    }

    /// Store operator text into an explicitly selected register. Lowercase
    /// letters (and any other name) overwrite; uppercase ASCII letters append
    /// to their lowercase register.
    pub fn store_selected(&mut self, name: char, content: &str) {
        if name.is_ascii_uppercase() {
            self.append(name, content);
        } else {
            self.write(name, content);
        }
    }

    /// Iterate over every set register in name order.
    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> {
        self.slots.iter().map(|(&name, content)| (name, content.as_str()))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
