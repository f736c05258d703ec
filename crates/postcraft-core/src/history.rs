// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-session undo/redo history
//!
//! Linear history of document snapshots:
//! - every content mutation records the state it replaced
//! - undo restores the previous snapshot and moves the current one to the
//!   redo stack
//! - a new mutation after an undo clears the redo stack (no branching)

use crate::ast::Document;
use crate::selection::Selection;

/// Default number of undo levels kept per session
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    document: Document,
    selection: Selection,
}

#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_levels: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_HISTORY_LIMIT)
    }

    /// History keeping at most `max_levels` undo steps (0 = unlimited)
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Record the state a mutation is about to replace
    pub fn record(&mut self, document: Document, selection: Selection) {
        self.redo_stack.clear();
        self.undo_stack.push(Snapshot {
            document,
            selection,
        });
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            let excess = self.undo_stack.len() - self.max_levels;
            self.undo_stack.drain(..excess);
        }
    }

    /// Step back; `current` is pushed onto the redo stack
    pub fn undo(&mut self, current: (Document, Selection)) -> Option<(Document, Selection)> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(Snapshot {
            document: current.0,
            selection: current.1,
        });
        Some((previous.document, previous.selection))
    }

    /// Step forward; `current` is pushed back onto the undo stack
    pub fn redo(&mut self, current: (Document, Selection)) -> Option<(Document, Selection)> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(Snapshot {
            document: current.0,
            selection: current.1,
        });
        Some((next.document, next.selection))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Span};

    fn doc(text: &str) -> Document {
        Document::from_blocks(vec![Block::paragraph(vec![Span::plain(text)])])
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::new();
        history.record(doc("a"), Selection::default());

        let (restored, _) = history.undo((doc("ab"), Selection::default())).unwrap();
        assert_eq!(restored, doc("a"));
        assert!(history.can_redo());

        let (again, _) = history.redo((restored, Selection::default())).unwrap();
        assert_eq!(again, doc("ab"));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new();
        history.record(doc("a"), Selection::default());
        history.undo((doc("ab"), Selection::default()));
        history.record(doc("a"), Selection::default());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_max_levels() {
        let mut history = History::with_max_levels(2);
        for text in ["a", "b", "c"] {
            history.record(doc(text), Selection::default());
        }
        assert_eq!(history.undo_depth(), 2);
        let (restored, _) = history.undo((doc("d"), Selection::default())).unwrap();
        assert_eq!(restored, doc("c"));
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::new();
        assert!(history.undo((doc("a"), Selection::default())).is_none());
        assert!(history.redo((doc("a"), Selection::default())).is_none());
    }
}
