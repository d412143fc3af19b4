//! Document model for the workspace index and book files.
//!
//! # Responsibility
//! - Define the serialized shape of `workspace.json` and `books/{id}.json`.
//! - Define the in-memory `Snapshot` aggregate handed between engine and store.
//!
//! # Invariants
//! - Model types carry data only; cross-document rules live in `reconcile`.
//! - Field names serialize in camelCase to match the on-disk JSON.

pub mod book;
pub mod snapshot;
pub mod workspace;
