//! Reconciliation between the workspace index and the book files.
//!
//! # Responsibility
//! - `detect`: find drift between the two representations.
//! - `repair`: apply caller-chosen decisions and return a corrected copy.
//!
//! # Invariants
//! - Both entry points are pure: the input snapshot is never mutated.
//! - Issue ids are deterministic for an unrepaired snapshot.
//! - A decision outside an issue's supported set is rejected up front.

pub mod detect;
pub mod issue;
pub mod repair;

pub use detect::detect;
pub use issue::{ConsistencyIssue, Decision, IssueKind, OrderIssueReason, Severity};
pub use repair::{repair, RepairError, RepairOutcome};
