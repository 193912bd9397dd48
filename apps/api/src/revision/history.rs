//! Bounded undo/redo history of layout snapshots.
//!
//! `entries[cursor]` is the current layout. Pushing after an undo discards the
//! redo tail; once the cap is exceeded the oldest snapshots are dropped.

use std::collections::VecDeque;

use crate::catalog::Catalog;
use crate::models::layout::Layout;
use crate::revision::transforms::{apply_all, Transform};

pub const DEFAULT_HISTORY_CAP: usize = 50;

#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: VecDeque<Layout>,
    cursor: usize,
    cap: usize,
}

impl HistoryManager {
    /// Starts a history at `initial`. A cap of 0 is treated as 1.
    pub fn new(initial: Layout, cap: usize) -> Self {
        HistoryManager {
            entries: VecDeque::from([Layout::new(initial.sections)]),
            cursor: 0,
            cap: cap.max(1),
        }
    }

    pub fn current(&self) -> &Layout {
        &self.entries[self.cursor]
    }

    /// Records `layout` as the new current snapshot.
    pub fn push(&mut self, layout: Layout) -> &Layout {
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(layout);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        self.current()
    }

    /// Applies `transforms` in order to the current layout and records the
    /// result as one snapshot.
    pub fn apply(&mut self, transforms: &[Transform], catalog: &Catalog) -> &Layout {
        let next = apply_all(self.current(), transforms, catalog);
        self.push(next)
    }

    /// Steps back one snapshot. `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&Layout> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    /// Steps forward one snapshot. `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&Layout> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
