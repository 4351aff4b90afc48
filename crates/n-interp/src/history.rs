//! Undo/redo history: a list of whole-state checkpoints.
//!
//! Each [`Checkpoint`] pairs a buffer value with a snapshot of the versioned
//! part of the interpreter state. Buffers are ropes, so a checkpoint shares
//! structure with its neighbours instead of copying the text.
//!
//! ```text
//!   entries:  [ c0 ] [ c1 ] [ c2 ] [ c3 ]
//!                           ^ index
//!   undo  → index 1, restore c1
//!   redo  → index 3, restore c3
//!   checkpoint(new) → drop c3, push new, index 3
//! ```
//!
//! Checkpoints are taken explicitly by commands, before they edit. History is
//! linear: checkpointing after an undo discards the redo branch.
//!
//! The history is generic over its snapshot type so it stays independent of
//! the interpreter's state record.

use crate::buffer::Buffer;

// ---------------------------------------------------------------------------
// Checkpoint
// ---------------------------------------------------------------------------

/// One undo boundary: the buffer and the versioned state at that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint<S> {
    pub buffer: Buffer,
    pub snapshot: S,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Linear undo/redo history with a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History<S> {
    entries: Vec<Checkpoint<S>>,
    /// `None` only while `entries` is empty.
    index: Option<usize>,
}

impl<S> Default for History<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> History<S> {
    /// Create an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: None,
        }
    }

    /// Number of checkpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the current checkpoint, `None` when empty.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    /// The checkpoint at the current index.
    #[must_use]
    pub fn current(&self) -> Option<&Checkpoint<S>> {
        self.index.and_then(|idx| self.entries.get(idx))
    }
}

impl<S: Clone + PartialEq> History<S> {
    /// Record an undo boundary.
    ///
    /// Returns `false` without touching anything when the buffer and snapshot
    /// equal the newest checkpoint. Otherwise every checkpoint after the
    /// current one is dropped, the new one is appended, and the index moves
    /// to it. After an undo the current checkpoint is not the newest, so an
    /// edit made there always cuts off the redo branch.
    pub fn checkpoint(&mut self, buffer: &Buffer, snapshot: S) -> bool {
        if let Some(last) = self.entries.last()
            && last.buffer == *buffer
            && last.snapshot == snapshot
        {
            return false;
        }

        if let Some(idx) = self.index {
            self.entries.truncate(idx + 1);
        }
        self.entries.push(Checkpoint {
            buffer: buffer.clone(),
            snapshot,
        });
        self.index = Some(self.entries.len() - 1);
        true
    }

    /// Step back `count` checkpoints (floored at the first) and return the
    /// checkpoint to restore, or `None` when already at the first.
    ///
    /// If the live buffer has changed since the current checkpoint, it is
    /// checkpointed first so a later redo can return to it. A live state that
    /// differs only in its snapshot (a moved cursor, say) is not saved, which
    /// keeps plain navigation from discarding the redo branch.
    pub fn undo(&mut self, live: &Buffer, snapshot: S, count: usize) -> Option<&Checkpoint<S>> {
        if self.current().is_some_and(|cp| cp.buffer != *live) {
            self.checkpoint(live, snapshot);
        }
        let idx = self.index?;
        let target = idx.saturating_sub(count);
        if target == idx {
            return None;
        }
        self.index = Some(target);
        self.current()
    }

    /// Step forward `count` checkpoints (capped at the last) and return the
    /// checkpoint to restore, or `None` when already at the last.
    pub fn redo(&mut self, count: usize) -> Option<&Checkpoint<S>> {
        let idx = self.index?;
        let last = self.entries.len().saturating_sub(1);
        let target = idx.saturating_add(count).min(last);
        if target == idx {
            return None;
        }
        self.index = Some(target);
        self.current()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
