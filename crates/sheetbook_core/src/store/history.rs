//! Bounded undo/redo stacks of whole snapshots.
//!
//! # Invariants
//! - `past` never exceeds its limit; the oldest entry is evicted first.
//! - Recording a new entry clears `future`.

use crate::model::snapshot::Snapshot;
use crate::store::Selection;
use std::collections::VecDeque;

/// Default number of undo entries kept.
pub const HISTORY_LIMIT: usize = 100;

/// Snapshot plus the selection that was active with it.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub snapshot: Snapshot,
    pub selection: Selection,
}

#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<HistoryEntry>,
    future: Vec<HistoryEntry>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            limit,
        }
    }

    /// Records a pre-mutation entry and drops the redo stack.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.push_past(entry);
        self.future.clear();
    }

    /// Swaps `current` with the newest past entry.
    pub fn undo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Swaps `current` with the newest future entry.
    pub fn redo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let next = self.future.pop()?;
        self.push_past(current);
        Some(next)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Past entries, oldest first.
    pub fn past(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.past.iter()
    }

    fn push_past(&mut self, entry: HistoryEntry) {
        self.past.push_back(entry);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }
}
