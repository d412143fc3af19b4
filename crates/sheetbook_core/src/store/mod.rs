//! Editing session store: one live snapshot plus undo/redo history.
//!
//! # Responsibility
//! - Route every user edit through one operation that yields a new snapshot.
//! - Keep bounded undo/redo stacks and the current book/sheet selection.
//! - Maintain the recent book/sheet id lists in workspace settings.
//!
//! # Invariants
//! - A failed operation leaves snapshot, selection and history untouched.
//! - An operation with no effective change pushes no history and bumps no
//!   timestamp.
//! - Every recorded change clears the redo stack.
//! - Operations take `&mut self`; share a store across threads behind a
//!   `Mutex` so calls stay serialized.

pub mod cell_input;
pub mod history;

use crate::clock::{Clock, SystemClock};
use crate::factory::{build_new_book_snapshot, build_new_sheet_snapshot, FactoryError};
use crate::grid::{column_index, column_label, row_number};
use crate::ids::{IdGenerator, UuidIdGenerator};
use crate::model::snapshot::Snapshot;
use crate::recent::{remove_recent, touch_recent, RECENT_LIMIT};
use cell_input::write_cell;
use history::{History, HistoryEntry, HISTORY_LIMIT};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use cell_input::CellUpdate;

/// Result type used by store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Book reference or its book file does not exist.
    BookNotFound(String),
    /// Sheet does not exist in the book.
    SheetNotFound { book_id: String, sheet_id: String },
    /// Cell edits need a selected book and sheet.
    NoActiveSheet,
    /// Name is blank after trim.
    InvalidName,
    /// Row key or column label cannot address a cell.
    InvalidCellAddress { row_key: String, column_key: String },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::SheetNotFound { book_id, sheet_id } => {
                write!(f, "sheet not found: {sheet_id} in book {book_id}")
            }
            Self::NoActiveSheet => write!(f, "no sheet is selected"),
            Self::InvalidName => write!(f, "name must not be blank"),
            Self::InvalidCellAddress {
                row_key,
                column_key,
            } => write!(f, "invalid cell address: row `{row_key}` column `{column_key}`"),
        }
    }
}

impl Error for StoreError {}

impl From<FactoryError> for StoreError {
    fn from(value: FactoryError) -> Self {
        match value {
            FactoryError::EmptyName => Self::InvalidName,
            FactoryError::BookNotFound(id) => Self::BookNotFound(id),
        }
    }
}

/// Currently focused book and sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub book_id: Option<String>,
    pub sheet_id: Option<String>,
}

impl Selection {
    pub fn new(book_id: impl Into<String>, sheet_id: Option<String>) -> Self {
        Self {
            book_id: Some(book_id.into()),
            sheet_id,
        }
    }
}

/// Tunables for a store instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub history_limit: usize,
    pub recent_limit: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            history_limit: HISTORY_LIMIT,
            recent_limit: RECENT_LIMIT,
        }
    }
}

/// Mutation and history store for one editing session.
pub struct WorkspaceStore {
    snapshot: Snapshot,
    selection: Selection,
    history: History,
    options: StoreOptions,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
}

impl WorkspaceStore {
    /// Creates a store with random ids and the system clock.
    pub fn new(snapshot: Snapshot) -> Self {
        Self::with_dependencies(
            snapshot,
            StoreOptions::default(),
            Box::new(UuidIdGenerator),
            Box::new(SystemClock),
        )
    }

    /// Creates a store with injected id generator and clock.
    pub fn with_dependencies(
        snapshot: Snapshot,
        options: StoreOptions,
        ids: Box<dyn IdGenerator>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let selection = default_selection(&snapshot);
        Self {
            snapshot,
            selection,
            history: History::new(options.history_limit),
            options,
            ids,
            clock,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.past_len()
    }

    pub fn future_len(&self) -> usize {
        self.history.future_len()
    }

    /// Undo entries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.past()
    }

    /// Installs a freshly loaded or repaired snapshot and forgets history.
    pub fn replace_snapshot(&mut self, snapshot: Snapshot) {
        self.selection = default_selection(&snapshot);
        self.snapshot = snapshot;
        self.history.clear();
        info!(
            "event=store_replace module=store status=ok books={}",
            self.snapshot.books.len()
        );
    }

    /// Focuses a book and optionally one of its sheets. Not recorded in history.
    pub fn select(&mut self, book_id: &str, sheet_id: Option<&str>) -> StoreResult<()> {
        let document = self
            .snapshot
            .book_document(book_id)
            .ok_or_else(|| StoreError::BookNotFound(book_id.to_string()))?;
        if let Some(sheet_id) = sheet_id {
            if document.sheet(sheet_id).is_none() {
                return Err(StoreError::SheetNotFound {
                    book_id: book_id.to_string(),
                    sheet_id: sheet_id.to_string(),
                });
            }
        }
        self.selection = Selection::new(book_id, sheet_id.map(str::to_string));
        Ok(())
    }

    /// Creates a book with one sheet at the end of the root group and selects it.
    ///
    /// # Errors
    /// - `InvalidName` when `name` is provided but blank.
    pub fn create_book(&mut self, name: Option<&str>) -> StoreResult<Snapshot> {
        let now = self.clock.now();
        let built = build_new_book_snapshot(&self.snapshot, name, self.ids.as_mut(), &now)?;
        let mut next = built.snapshot;
        self.touch_recents(&mut next, &built.book_id, Some(built.sheet_id.as_str()));
        let selection = Selection::new(built.book_id, Some(built.sheet_id));
        Ok(self.commit("create_book", next, selection))
    }

    /// Appends a sheet to `book_id`, makes it active and selects it.
    ///
    /// # Errors
    /// - `BookNotFound` when the reference or its book file is missing.
    /// - `InvalidName` when `name` is provided but blank.
    pub fn create_sheet(&mut self, book_id: &str, name: Option<&str>) -> StoreResult<Snapshot> {
        let now = self.clock.now();
        let built =
            build_new_sheet_snapshot(&self.snapshot, book_id, name, self.ids.as_mut(), &now)?;
        let mut next = built.snapshot;
        self.touch_recents(&mut next, &built.book_id, Some(built.sheet_id.as_str()));
        let selection = Selection::new(built.book_id, Some(built.sheet_id));
        Ok(self.commit("create_sheet", next, selection))
    }

    /// Writes a batch of cells into the selected sheet.
    ///
    /// Returns `Ok(None)` when no update changes stored content.
    ///
    /// # Errors
    /// - `NoActiveSheet` when no book/sheet is selected.
    /// - `BookNotFound` / `SheetNotFound` when the selection is stale.
    /// - `InvalidCellAddress` when any update has a bad row key or column label;
    ///   nothing from the batch is applied.
    pub fn apply_cell_updates(&mut self, updates: &[CellUpdate]) -> StoreResult<Option<Snapshot>> {
        let (Some(book_id), Some(sheet_id)) = (
            self.selection.book_id.clone(),
            self.selection.sheet_id.clone(),
        ) else {
            return Err(StoreError::NoActiveSheet);
        };
        let position = self
            .snapshot
            .index()
            .book_position(&book_id)
            .ok_or_else(|| StoreError::BookNotFound(book_id.clone()))?;
        let file = self
            .snapshot
            .book_file_for(&book_id)
            .ok_or_else(|| StoreError::BookNotFound(book_id.clone()))?;
        if self.snapshot.books[file].data.sheet(&sheet_id).is_none() {
            return Err(StoreError::SheetNotFound { book_id, sheet_id });
        }
        let addresses = updates
            .iter()
            .map(canonical_address)
            .collect::<StoreResult<Vec<_>>>()?;

        let now = self.clock.now();
        let mut next = self.snapshot.clone();
        let mut changed = false;
        if let Some(sheet) = next
            .book_mut(file)
            .and_then(|document| document.sheet_mut(&sheet_id))
        {
            for (update, (row_key, column_key)) in updates.iter().zip(&addresses) {
                changed |= write_cell(sheet, row_key, column_key, &update.raw_value);
            }
            // Writes that cancel out within the batch leave nothing to record.
            changed = changed
                && self.snapshot.books[file]
                    .data
                    .sheet(&sheet_id)
                    .is_some_and(|before| before.rows != sheet.rows);
        }
        if !changed {
            debug!(
                "event=store_mutation module=store status=noop op=apply_cell_updates updates={}",
                updates.len()
            );
            return Ok(None);
        }

        if let Some(document) = next.book_mut(file) {
            document.book.updated_at = now.clone();
        }
        next.index_mut().books[position].updated_at = now;
        self.touch_recents(&mut next, &book_id, Some(&sheet_id));
        let selection = self.selection.clone();
        Ok(Some(self.commit("apply_cell_updates", next, selection)))
    }

    /// Renames a book in both the index and its book file.
    ///
    /// Returns `Ok(None)` when the trimmed name is blank or unchanged.
    pub fn rename_book(&mut self, book_id: &str, name: &str) -> StoreResult<Option<Snapshot>> {
        let position = self
            .snapshot
            .index()
            .book_position(book_id)
            .ok_or_else(|| StoreError::BookNotFound(book_id.to_string()))?;
        let trimmed = name.trim();
        if trimmed.is_empty() || self.snapshot.index().books[position].name == trimmed {
            return Ok(None);
        }

        let now = self.clock.now();
        let file = self.snapshot.book_file_for(book_id);
        let mut next = self.snapshot.clone();
        let reference = &mut next.index_mut().books[position];
        reference.name = trimmed.to_string();
        reference.updated_at = now.clone();
        if let Some(document) = file.and_then(|file| next.book_mut(file)) {
            document.book.name = trimmed.to_string();
            document.book.updated_at = now;
        }
        self.touch_recents(&mut next, book_id, None);
        let selection = self.selection.clone();
        Ok(Some(self.commit("rename_book", next, selection)))
    }

    /// Renames one sheet.
    ///
    /// Returns `Ok(None)` when the trimmed name is blank or unchanged.
    pub fn rename_sheet(
        &mut self,
        book_id: &str,
        sheet_id: &str,
        name: &str,
    ) -> StoreResult<Option<Snapshot>> {
        let (position, file) = self.locate_book(book_id)?;
        let current = self.snapshot.books[file]
            .data
            .sheet(sheet_id)
            .ok_or_else(|| StoreError::SheetNotFound {
                book_id: book_id.to_string(),
                sheet_id: sheet_id.to_string(),
            })?;
        let trimmed = name.trim();
        if trimmed.is_empty() || current.name == trimmed {
            return Ok(None);
        }

        let now = self.clock.now();
        let mut next = self.snapshot.clone();
        if let Some(document) = next.book_mut(file) {
            if let Some(sheet) = document.sheet_mut(sheet_id) {
                sheet.name = trimmed.to_string();
            }
            document.book.updated_at = now.clone();
        }
        next.index_mut().books[position].updated_at = now;
        self.touch_recents(&mut next, book_id, Some(sheet_id));
        let selection = self.selection.clone();
        Ok(Some(self.commit("rename_sheet", next, selection)))
    }

    /// Removes a book, its file entry, and every recent-list mention of it.
    pub fn delete_book(&mut self, book_id: &str) -> StoreResult<Snapshot> {
        if self.snapshot.index().book_position(book_id).is_none() {
            return Err(StoreError::BookNotFound(book_id.to_string()));
        }
        let file = self.snapshot.book_file_for(book_id);
        let sheet_ids = file
            .map(|file| self.snapshot.books[file].data.sheet_ids())
            .unwrap_or_default();

        let now = self.clock.now();
        let mut next = self.snapshot.clone();
        if let Some(file) = file {
            next.books.remove(file);
        }
        let index = next.index_mut();
        index.books.retain(|reference| reference.id != book_id);
        index.workspace.updated_at = now;
        let settings = &mut index.workspace.settings;
        remove_recent(&mut settings.recent_book_ids, &[book_id.to_string()]);
        remove_recent(&mut settings.recent_sheet_ids, &sheet_ids);

        let selection = if self.selection.book_id.as_deref() == Some(book_id) {
            default_selection(&next)
        } else {
            self.selection.clone()
        };
        Ok(self.commit("delete_book", next, selection))
    }

    /// Removes one sheet and repoints the book's active sheet if needed.
    ///
    /// Deleting the last sheet is allowed here; callers gate it.
    pub fn delete_sheet(&mut self, book_id: &str, sheet_id: &str) -> StoreResult<Snapshot> {
        let (position, file) = self.locate_book(book_id)?;
        if self.snapshot.books[file].data.sheet(sheet_id).is_none() {
            return Err(StoreError::SheetNotFound {
                book_id: book_id.to_string(),
                sheet_id: sheet_id.to_string(),
            });
        }

        let now = self.clock.now();
        let mut next = self.snapshot.clone();
        let mut first_remaining = None;
        if let Some(document) = next.book_mut(file) {
            document.sheets.retain(|sheet| sheet.id != sheet_id);
            document.book.updated_at = now.clone();
            first_remaining = document.sheets.first().map(|sheet| sheet.id.clone());
        }
        let index = next.index_mut();
        let reference = &mut index.books[position];
        if reference.active_sheet_id.as_deref() == Some(sheet_id) {
            reference.active_sheet_id = first_remaining;
        }
        reference.updated_at = now;
        let active_sheet_id = reference.active_sheet_id.clone();
        remove_recent(
            &mut index.workspace.settings.recent_sheet_ids,
            &[sheet_id.to_string()],
        );
        self.touch_recents(&mut next, book_id, None);

        let selection = if self.selection.book_id.as_deref() == Some(book_id)
            && self.selection.sheet_id.as_deref() == Some(sheet_id)
        {
            Selection::new(book_id, active_sheet_id)
        } else {
            self.selection.clone()
        };
        Ok(self.commit("delete_sheet", next, selection))
    }

    /// Restores the previous snapshot and selection.
    ///
    /// Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let current = self.current_entry();
        let previous = self.history.undo(current)?;
        self.install(previous);
        info!(
            "event=store_undo module=store status=ok history={} future={}",
            self.history.past_len(),
            self.history.future_len()
        );
        Some(self.snapshot.clone())
    }

    /// Re-applies the most recently undone snapshot and selection.
    ///
    /// Returns `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let current = self.current_entry();
        let next = self.history.redo(current)?;
        self.install(next);
        info!(
            "event=store_redo module=store status=ok history={} future={}",
            self.history.past_len(),
            self.history.future_len()
        );
        Some(self.snapshot.clone())
    }

    fn locate_book(&self, book_id: &str) -> StoreResult<(usize, usize)> {
        let position = self.snapshot.index().book_position(book_id);
        let file = self.snapshot.book_file_for(book_id);
        match (position, file) {
            (Some(position), Some(file)) => Ok((position, file)),
            _ => Err(StoreError::BookNotFound(book_id.to_string())),
        }
    }

    fn touch_recents(&self, next: &mut Snapshot, book_id: &str, sheet_id: Option<&str>) {
        let limit = self.options.recent_limit;
        let settings = &mut next.index_mut().workspace.settings;
        touch_recent(&mut settings.recent_book_ids, book_id, limit);
        if let Some(sheet_id) = sheet_id {
            touch_recent(&mut settings.recent_sheet_ids, sheet_id, limit);
        }
    }

    fn current_entry(&self) -> HistoryEntry {
        HistoryEntry {
            snapshot: self.snapshot.clone(),
            selection: self.selection.clone(),
        }
    }

    fn install(&mut self, entry: HistoryEntry) {
        self.snapshot = entry.snapshot;
        self.selection = entry.selection;
    }

    fn commit(&mut self, op: &str, next: Snapshot, selection: Selection) -> Snapshot {
        let previous = HistoryEntry {
            snapshot: std::mem::replace(&mut self.snapshot, next),
            selection: std::mem::replace(&mut self.selection, selection),
        };
        self.history.record(previous);
        info!(
            "event=store_mutation module=store status=ok op={} history={}",
            op,
            self.history.past_len()
        );
        self.snapshot.clone()
    }
}

/// First book in the index with its active (or first) sheet.
fn default_selection(snapshot: &Snapshot) -> Selection {
    let Some(reference) = snapshot.index().books.first() else {
        return Selection::default();
    };
    let document = snapshot
        .match_book_file(reference)
        .map(|file| snapshot.books[file].data.as_ref());
    let sheet_id = match (document, reference.active_sheet_id.as_deref()) {
        (Some(document), Some(active)) if document.sheet(active).is_some() => {
            Some(active.to_string())
        }
        (Some(document), _) => document.sheets.first().map(|sheet| sheet.id.clone()),
        (None, _) => None,
    };
    Selection::new(reference.id.clone(), sheet_id)
}

/// Validates an update's address and returns canonical `(row, column)` keys.
fn canonical_address(update: &CellUpdate) -> StoreResult<(String, String)> {
    let row = row_number(update.row_key.trim());
    let column = column_index(update.column_key.trim());
    match (row, column) {
        (Some(row), Some(column)) => Ok((row.to_string(), column_label(column))),
        _ => Err(StoreError::InvalidCellAddress {
            row_key: update.row_key.clone(),
            column_key: update.column_key.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{canonical_address, CellUpdate, StoreError, WorkspaceStore};

    fn assert_send<T: Send>() {}

    #[test]
    fn store_can_move_behind_a_mutex() {
        assert_send::<WorkspaceStore>();
    }

    #[test]
    fn canonical_address_uppercases_and_trims() {
        let (row, column) = canonical_address(&CellUpdate::new(" 7", "ab ", "x")).unwrap();
        assert_eq!(row, "7");
        assert_eq!(column, "AB");
    }

    #[test]
    fn canonical_address_rejects_bad_keys() {
        let err = canonical_address(&CellUpdate::new("0", "A", "x")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidCellAddress { .. }));
        assert!(canonical_address(&CellUpdate::new("1", "A1", "x")).is_err());
    }
}
