// SPDX-License-Identifier: AGPL-3.0-or-later
//! Cursor positions and selections
//!
//! A [`Position`] addresses a block by index and a char offset inside that
//! block's text. Positions order by block first, then offset.

use crate::ast::Document;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub block: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }

    /// Clamp into the bounds of `doc`
    pub fn clamp(self, doc: &Document) -> Self {
        let block = self.block.min(doc.len().saturating_sub(1));
        let max_offset = doc.block(block).map(|b| b.char_len()).unwrap_or(0);
        Self {
            block,
            offset: self.offset.min(max_offset),
        }
    }
}

/// Anchor/head selection; collapsed when both ends coincide
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
}

impl Selection {
    pub fn new(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    pub fn caret(position: Position) -> Self {
        Self::new(position, position)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn start(&self) -> Position {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> Position {
        self.anchor.max(self.head)
    }

    /// Selection spanning the whole document
    pub fn all(doc: &Document) -> Self {
        let last = doc.len().saturating_sub(1);
        let end = doc.block(last).map(|b| b.char_len()).unwrap_or(0);
        Self::new(Position::new(0, 0), Position::new(last, end))
    }

    pub fn clamp(self, doc: &Document) -> Self {
        Self::new(self.anchor.clamp(doc), self.head.clamp(doc))
    }

    /// Per-block `(index, start, end)` char ranges covered by the selection
    pub fn block_ranges(&self, doc: &Document) -> Vec<(usize, usize, usize)> {
        let start = self.start();
        let end = self.end();
        (start.block..=end.block)
            .filter_map(|index| {
                let block = doc.block(index)?;
                let from = if index == start.block { start.offset } else { 0 };
                let to = if index == end.block {
                    end.offset
                } else {
                    block.char_len()
                };
                Some((index, from.min(to), to))
            })
            .collect()
    }
}
