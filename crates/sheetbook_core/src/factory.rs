//! Default shapes for new books and sheets.
//!
//! # Responsibility
//! - Allocate ids, unique names and default grids for new entities.
//! - Derive a new book's `dataPath` next to the workspace file.
//!
//! # Invariants
//! - Default names never collide with sibling names: `Sheet`, `Sheet (2)`, …
//! - Explicit names are trimmed and must not be blank.
//! - The input snapshot is never mutated.

use crate::ids::{IdGenerator, BOOK_ID_PREFIX, SHEET_ID_PREFIX};
use crate::model::book::{
    BookDocument, BookMeta, BookProperties, GridSize, SheetData, BOOK_SCHEMA_VERSION,
};
use crate::model::snapshot::{BookFile, Snapshot};
use crate::model::workspace::BookReference;
use serde_json::Map;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub const DEFAULT_GRID_ROWS: u32 = 100;
pub const DEFAULT_GRID_COLS: u32 = 26;
pub const DEFAULT_BOOK_NAME: &str = "New Book";
pub const DEFAULT_SHEET_NAME: &str = "Sheet";
pub const BOOKS_DIR: &str = "books";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    /// Name is blank after trim.
    EmptyName,
    /// Target book reference or its file is missing.
    BookNotFound(String),
}

impl Display for FactoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be blank"),
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
        }
    }
}

impl Error for FactoryError {}

/// Snapshot with one new book appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBookSnapshot {
    pub snapshot: Snapshot,
    pub book_id: String,
    pub sheet_id: String,
}

/// Snapshot with one new sheet appended to an existing book.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSheetSnapshot {
    pub snapshot: Snapshot,
    pub book_id: String,
    pub sheet_id: String,
}

/// Returns `base`, or `base (n)` with the smallest `n >= 2` not yet taken.
pub fn unique_name<'a>(base: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let taken: Vec<&str> = existing.into_iter().collect();
    if !taken.contains(&base) {
        return base.to_string();
    }
    let mut counter = 2u32;
    loop {
        let candidate = format!("{base} ({counter})");
        if !taken.contains(&candidate.as_str()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Builds an empty sheet with the default grid.
pub fn new_sheet(id: String, name: String) -> SheetData {
    SheetData {
        id,
        name,
        grid_size: GridSize {
            rows: DEFAULT_GRID_ROWS,
            cols: DEFAULT_GRID_COLS,
        },
        settings: Map::new(),
        rows: BTreeMap::new(),
    }
}

/// Appends a new book (with one sheet) at the end of the root group.
///
/// # Errors
/// - `EmptyName` when `name` is provided but blank.
pub fn build_new_book_snapshot(
    snapshot: &Snapshot,
    name: Option<&str>,
    ids: &mut dyn IdGenerator,
    now: &str,
) -> Result<NewBookSnapshot, FactoryError> {
    let index = snapshot.index();
    let name = match name {
        Some(value) => normalize_name(value)?,
        None => unique_name(
            DEFAULT_BOOK_NAME,
            index.books.iter().map(|book| book.name.as_str()),
        ),
    };

    let book_id = ids.next_id(BOOK_ID_PREFIX);
    let sheet_id = ids.next_id(SHEET_ID_PREFIX);
    let separator = path_separator(&snapshot.workspace.file_path);
    let data_path = format!("{BOOKS_DIR}{separator}{book_id}.json");
    let file_path = match workspace_dir(&snapshot.workspace.file_path) {
        Some(dir) => format!("{dir}{separator}{data_path}"),
        None => data_path.clone(),
    };
    let order = index
        .books
        .iter()
        .filter(|book| book.folder_id.is_none() && book.order.is_finite())
        .map(|book| book.order)
        .fold(None, |max: Option<f64>, order| {
            Some(max.map_or(order, |max| max.max(order)))
        })
        .map_or(0.0, |max| max + 1.0);

    let reference = BookReference {
        id: book_id.clone(),
        name: name.clone(),
        folder_id: None,
        order,
        data_path,
        thumb_path: None,
        active_sheet_id: Some(sheet_id.clone()),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    };
    let document = BookDocument {
        schema_version: BOOK_SCHEMA_VERSION,
        book: BookMeta {
            id: book_id.clone(),
            name,
            created_at: now.to_string(),
            updated_at: now.to_string(),
            properties: BookProperties::default(),
        },
        sheets: vec![new_sheet(sheet_id.clone(), DEFAULT_SHEET_NAME.to_string())],
    };

    let mut next = snapshot.clone();
    let next_index = next.index_mut();
    next_index.books.push(reference);
    next_index.workspace.updated_at = now.to_string();
    next.books.push(BookFile {
        file_path,
        data: Arc::new(document),
    });

    Ok(NewBookSnapshot {
        snapshot: next,
        book_id,
        sheet_id,
    })
}

/// Appends a new sheet to `book_id` and makes it the active sheet.
///
/// # Errors
/// - `EmptyName` when `name` is provided but blank.
/// - `BookNotFound` when the reference or its book file is missing.
pub fn build_new_sheet_snapshot(
    snapshot: &Snapshot,
    book_id: &str,
    name: Option<&str>,
    ids: &mut dyn IdGenerator,
    now: &str,
) -> Result<NewSheetSnapshot, FactoryError> {
    let position = snapshot
        .index()
        .book_position(book_id)
        .ok_or_else(|| FactoryError::BookNotFound(book_id.to_string()))?;
    let file = snapshot
        .book_file_for(book_id)
        .ok_or_else(|| FactoryError::BookNotFound(book_id.to_string()))?;

    let document = &snapshot.books[file].data;
    let name = match name {
        Some(value) => normalize_name(value)?,
        None => unique_name(
            DEFAULT_SHEET_NAME,
            document.sheets.iter().map(|sheet| sheet.name.as_str()),
        ),
    };
    let sheet_id = ids.next_id(SHEET_ID_PREFIX);

    let mut next = snapshot.clone();
    if let Some(document) = next.book_mut(file) {
        document.sheets.push(new_sheet(sheet_id.clone(), name));
        document.book.updated_at = now.to_string();
    }
    let reference = &mut next.index_mut().books[position];
    reference.active_sheet_id = Some(sheet_id.clone());
    reference.updated_at = now.to_string();

    Ok(NewSheetSnapshot {
        snapshot: next,
        book_id: book_id.to_string(),
        sheet_id,
    })
}

/// Trims a user-supplied name, rejecting blank input.
pub fn normalize_name(value: &str) -> Result<String, FactoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FactoryError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn path_separator(workspace_path: &str) -> char {
    if workspace_path.contains('\\') {
        '\\'
    } else {
        '/'
    }
}

fn workspace_dir(workspace_path: &str) -> Option<&str> {
    workspace_path
        .rfind(|ch: char| ch == '/' || ch == '\\')
        .map(|position| &workspace_path[..position])
}
