//! Core domain logic for Sheetbook, a local-first spreadsheet workspace.
//! This crate is the single source of truth for cross-document invariants
//! between `workspace.json` and the book files, and for edit history.

pub mod clock;
pub mod factory;
pub mod grid;
pub mod ids;
pub mod logging;
pub mod model;
pub mod persist;
pub mod recent;
pub mod reconcile;
pub mod store;
pub mod validate;

pub use clock::{Clock, FixedClock, SystemClock};
pub use factory::{build_new_book_snapshot, build_new_sheet_snapshot, FactoryError};
pub use grid::{column_index, column_label, sheet_bounds, GridBounds};
pub use ids::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::book::{BookDocument, CellData, CellType, CellValue, GridSize, SheetData};
pub use model::snapshot::{BookFile, Snapshot, WorkspaceFile};
pub use model::workspace::{BookReference, FolderMeta, WorkspaceIndex, WorkspaceSettings};
pub use persist::{load_workspace_snapshot, save_workspace_snapshot, PersistError};
pub use reconcile::{
    detect, repair, ConsistencyIssue, Decision, IssueKind, OrderIssueReason, RepairError,
    RepairOutcome, Severity,
};
pub use store::history::HistoryEntry;
pub use store::{CellUpdate, Selection, StoreError, StoreOptions, StoreResult, WorkspaceStore};
pub use validate::{validate_book, validate_workspace, ValidationError, ValidationReport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
