//! Marks: named cursor bookmarks.
//!
//! `m{name}` stores the cursor, `'{name}` jumps back (or supplies the range
//! end for a pending operator), `dm{name}` forgets it. Any character can name
//! a mark. Marks are not versioned: undo and redo leave them alone.

use std::collections::BTreeMap;

use crate::position::Position;

/// The set of marks, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkSet {
    marks: BTreeMap<char, Position>,
}

impl MarkSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            marks: BTreeMap::new(),
        }
    }

    /// Store `pos` under `name`, replacing any previous mark.
    pub fn set(&mut self, name: char, pos: Position) {
        self.marks.insert(name, pos);
    }

    /// The position stored under `name`, if any.
    #[must_use]
    pub fn get(&self, name: char) -> Option<Position> {
        self.marks.get(&name).copied()
    }

    /// Forget `name`. Returns the removed position.
    pub fn delete(&mut self, name: char) -> Option<Position> {
        self.marks.remove(&name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Iterate over marks in name order.
    pub fn iter(&self) -> impl Iterator<Item = (char, Position)> + '_ {
        self.marks.iter().map(|(&name, &pos)| (name, pos))
    }
}
