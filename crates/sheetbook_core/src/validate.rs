//! Structural validation of raw workspace and book JSON.
//!
//! # Responsibility
//! - Decide whether a raw document can become a typed model value.
//! - Report every structural problem found, not just the first.
//!
//! # Invariants
//! - A failed validation is fatal for that document; nothing here attempts
//!   repair. Cross-document drift is the job of `reconcile`.

use crate::grid::{column_index, column_label, row_number};
use crate::model::book::BookDocument;
use crate::model::workspace::WorkspaceIndex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Outcome of validating one raw document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Which document shape failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Workspace,
    Book,
}

impl Display for DocumentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Workspace => write!(f, "workspace"),
            Self::Book => write!(f, "book"),
        }
    }
}

/// Schema-invalid document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub document: DocumentKind,
    pub errors: Vec<String>,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {} document: {}",
            self.document,
            self.errors.join("; ")
        )
    }
}

impl Error for ValidationError {}

/// Validates a raw `workspace.json` value.
pub fn validate_workspace(raw: &Value) -> ValidationReport {
    match check_workspace(raw) {
        Ok(_) => ValidationReport::from_errors(Vec::new()),
        Err(errors) => ValidationReport::from_errors(errors),
    }
}

/// Validates a raw book file value.
pub fn validate_book(raw: &Value) -> ValidationReport {
    match check_book(raw) {
        Ok(_) => ValidationReport::from_errors(Vec::new()),
        Err(errors) => ValidationReport::from_errors(errors),
    }
}

/// Validates and converts a raw `workspace.json` value.
pub fn parse_workspace(raw: &Value) -> Result<WorkspaceIndex, ValidationError> {
    check_workspace(raw).map_err(|errors| ValidationError {
        document: DocumentKind::Workspace,
        errors,
    })
}

/// Validates and converts a raw book file value.
pub fn parse_book(raw: &Value) -> Result<BookDocument, ValidationError> {
    check_book(raw).map_err(|errors| ValidationError {
        document: DocumentKind::Book,
        errors,
    })
}

fn check_workspace(raw: &Value) -> Result<WorkspaceIndex, Vec<String>> {
    let index: WorkspaceIndex =
        serde_json::from_value(raw.clone()).map_err(|err| vec![err.to_string()])?;

    let mut errors = Vec::new();
    if index.schema_version < 1 {
        errors.push("schemaVersion must be >= 1".to_string());
    }
    if index.workspace.id.trim().is_empty() {
        errors.push("workspace.id must not be empty".to_string());
    }

    let mut folder_ids = BTreeSet::new();
    for (position, folder) in index.folders.iter().enumerate() {
        if folder.id.trim().is_empty() {
            errors.push(format!("folders[{position}].id must not be empty"));
        } else if !folder_ids.insert(folder.id.as_str()) {
            errors.push(format!("folders[{position}].id `{}` is duplicated", folder.id));
        }
    }

    for (position, book) in index.books.iter().enumerate() {
        if book.id.trim().is_empty() {
            errors.push(format!("books[{position}].id must not be empty"));
        }
        if book.data_path.trim().is_empty() {
            errors.push(format!("books[{position}].dataPath must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(index)
    } else {
        Err(errors)
    }
}

fn check_book(raw: &Value) -> Result<BookDocument, Vec<String>> {
    let book: BookDocument =
        serde_json::from_value(raw.clone()).map_err(|err| vec![err.to_string()])?;

    let mut errors = Vec::new();
    if book.schema_version < 1 {
        errors.push("schemaVersion must be >= 1".to_string());
    }
    if book.book.id.trim().is_empty() {
        errors.push("book.id must not be empty".to_string());
    }

    let mut sheet_ids = BTreeSet::new();
    for (position, sheet) in book.sheets.iter().enumerate() {
        let at = format!("sheets[{position}]");
        if sheet.id.trim().is_empty() {
            errors.push(format!("{at}.id must not be empty"));
        } else if !sheet_ids.insert(sheet.id.as_str()) {
            errors.push(format!("{at}.id `{}` is duplicated", sheet.id));
        }
        if sheet.grid_size.rows < 1 || sheet.grid_size.cols < 1 {
            errors.push(format!("{at}.gridSize must be at least 1x1"));
        }
        for (row_key, row) in &sheet.rows {
            match row_number(row_key) {
                None => errors.push(format!("{at}.rows key `{row_key}` is not a row number")),
                Some(number) if number.to_string() != *row_key => errors.push(format!(
                    "{at}.rows key `{row_key}` should be `{number}`"
                )),
                Some(_) => {}
            }
            for (column_key, cell) in row {
                match column_index(column_key).map(column_label) {
                    None => errors.push(format!(
                        "{at}.rows[{row_key}] key `{column_key}` is not a column label"
                    )),
                    Some(label) if label != *column_key => errors.push(format!(
                        "{at}.rows[{row_key}] key `{column_key}` should be `{label}`"
                    )),
                    Some(_) => {}
                }
                if !cell.kind.accepts(&cell.value) {
                    errors.push(format!(
                        "{at}.rows[{row_key}][{column_key}] value does not match type tag"
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(book)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_book, validate_book, validate_workspace, DocumentKind};
    use serde_json::json;

    fn book_json(rows: serde_json::Value) -> serde_json::Value {
        json!({
            "schemaVersion": 1,
            "book": {
                "id": "book-001",
                "name": "Budget",
                "createdAt": "2024-01-01T00:00:00.000Z",
                "updatedAt": "2024-01-01T00:00:00.000Z",
                "properties": {}
            },
            "sheets": [{
                "id": "sheet-001",
                "name": "Sheet",
                "gridSize": { "rows": 100, "cols": 26 },
                "settings": {},
                "rows": rows
            }]
        })
    }

    #[test]
    fn well_formed_book_is_valid() {
        let report = validate_book(&book_json(json!({
            "1": { "A": { "value": 3, "type": "number" } }
        })));
        assert!(report.valid, "{:?}", report.errors);
    }

    #[test]
    fn book_reports_every_structural_problem() {
        let report = validate_book(&book_json(json!({
            "0": { "A": { "value": 3, "type": "number" } },
            "2": {
                "A1": { "value": "x", "type": "string" },
                "B": { "value": "x", "type": "number" }
            }
        })));
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn book_rejects_non_canonical_cell_keys() {
        let report = validate_book(&book_json(json!({
            "007": { "a": { "value": 3, "type": "number" } }
        })));
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].contains("`007`"));
        assert!(report.errors[1].contains("should be `A`"));
    }

    #[test]
    fn malformed_json_shape_is_fatal() {
        let err = parse_book(&json!({ "schemaVersion": 1 })).unwrap_err();
        assert_eq!(err.document, DocumentKind::Book);
        assert!(err.to_string().contains("book"));
    }

    #[test]
    fn workspace_rejects_duplicate_folders_and_empty_data_path() {
        let report = validate_workspace(&json!({
            "schemaVersion": 1,
            "workspace": {
                "id": "ws-1",
                "name": "Home",
                "createdAt": "t",
                "updatedAt": "t"
            },
            "folders": [
                { "id": "f1", "name": "A", "parentId": null, "order": 0 },
                { "id": "f1", "name": "B", "parentId": null, "order": 1 }
            ],
            "books": [{
                "id": "book-001",
                "name": "Budget",
                "folderId": null,
                "order": 0,
                "dataPath": " ",
                "createdAt": "t",
                "updatedAt": "t"
            }]
        }));
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 2);
    }
}
