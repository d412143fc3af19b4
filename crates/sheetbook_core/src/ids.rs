//! Prefixed unique identifier generation.
//!
//! # Responsibility
//! - Produce collision-resistant ids such as `book-3f2a…` for new entities.
//! - Allow deterministic generators to be injected in tests.

use std::collections::BTreeMap;
use uuid::Uuid;

pub const BOOK_ID_PREFIX: &str = "book";
pub const SHEET_ID_PREFIX: &str = "sheet";
pub const FOLDER_ID_PREFIX: &str = "folder";

/// Source of fresh entity ids.
pub trait IdGenerator: Send {
    /// Returns a new id of the form `{prefix}-{unique}`.
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Random v4 UUID generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4().simple())
    }
}

/// Deterministic generator: `book-001`, `book-002`, `sheet-001`, …
///
/// Counters are kept per prefix.
#[derive(Debug, Default, Clone)]
pub struct SequentialIdGenerator {
    counters: BTreeMap<String, u64>,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the counter for `prefix` after `last`.
    pub fn starting_after(mut self, prefix: &str, last: u64) -> Self {
        self.counters.insert(prefix.to_string(), last);
        self
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{prefix}-{:03}", *counter)
    }
}

#[cfg(test)]
mod tests {
    use super::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};

    #[test]
    fn uuid_ids_are_prefixed_and_distinct() {
        let mut ids = UuidIdGenerator;
        let first = ids.next_id("book");
        let second = ids.next_id("book");
        assert!(first.starts_with("book-"));
        assert_eq!(first.len(), "book-".len() + 32);
        assert_ne!(first, second);
    }

    #[test]
    fn sequential_ids_count_per_prefix() {
        let mut ids = SequentialIdGenerator::new().starting_after("sheet", 1);
        assert_eq!(ids.next_id("book"), "book-001");
        assert_eq!(ids.next_id("sheet"), "sheet-002");
        assert_eq!(ids.next_id("book"), "book-002");
    }
}
