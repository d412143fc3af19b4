//! In-memory aggregate of one workspace index plus its loaded books.
//!
//! # Invariants
//! - A `Snapshot` is a value: once handed to a caller it is never mutated.
//! - Documents sit behind `Arc`; edits go through `Arc::make_mut`, so
//!   untouched documents stay shared between revisions and touched ones are
//!   copied.

use crate::model::book::BookDocument;
use crate::model::workspace::{BookReference, WorkspaceIndex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Workspace index paired with the path it was loaded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceFile {
    pub file_path: String,
    pub data: Arc<WorkspaceIndex>,
}

/// One book document paired with its file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFile {
    pub file_path: String,
    pub data: Arc<BookDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub workspace: WorkspaceFile,
    pub books: Vec<BookFile>,
}

impl Snapshot {
    pub fn new(
        workspace_path: impl Into<String>,
        index: WorkspaceIndex,
        books: Vec<(String, BookDocument)>,
    ) -> Self {
        Self {
            workspace: WorkspaceFile {
                file_path: workspace_path.into(),
                data: Arc::new(index),
            },
            books: books
                .into_iter()
                .map(|(file_path, data)| BookFile {
                    file_path,
                    data: Arc::new(data),
                })
                .collect(),
        }
    }

    pub fn index(&self) -> &WorkspaceIndex {
        &self.workspace.data
    }

    /// Copy-on-write access to the index.
    pub fn index_mut(&mut self) -> &mut WorkspaceIndex {
        Arc::make_mut(&mut self.workspace.data)
    }

    /// Copy-on-write access to the book file at `position`.
    pub fn book_mut(&mut self, position: usize) -> Option<&mut BookDocument> {
        self.books
            .get_mut(position)
            .map(|book| Arc::make_mut(&mut book.data))
    }

    /// Resolves the book file a reference points at.
    ///
    /// Matches by normalized `dataPath` suffix first, then by book id.
    pub fn match_book_file(&self, reference: &BookReference) -> Option<usize> {
        let data_path = normalize_path(&reference.data_path);
        if !data_path.is_empty() {
            let by_path = self
                .books
                .iter()
                .position(|book| path_ends_with(&normalize_path(&book.file_path), &data_path));
            if by_path.is_some() {
                return by_path;
            }
        }
        self.books
            .iter()
            .position(|book| book.data.book.id == reference.id)
    }

    /// Resolves the book file for a reference id.
    pub fn book_file_for(&self, book_id: &str) -> Option<usize> {
        self.index()
            .book(book_id)
            .and_then(|reference| self.match_book_file(reference))
    }

    /// Returns the book document behind a reference id.
    pub fn book_document(&self, book_id: &str) -> Option<&BookDocument> {
        self.book_file_for(book_id)
            .map(|position| self.books[position].data.as_ref())
    }
}

/// Forward slashes only, no leading `./` or `/`, no empty or `.` segments.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn path_ends_with(path: &str, suffix: &str) -> bool {
    if path == suffix {
        return true;
    }
    path.len() > suffix.len()
        && path.ends_with(suffix)
        && path.as_bytes()[path.len() - suffix.len() - 1] == b'/'
}

#[cfg(test)]
mod tests {
    use super::{normalize_path, path_ends_with};

    #[test]
    fn normalize_path_unifies_separators() {
        assert_eq!(normalize_path(".\\books\\b1.json"), "books/b1.json");
        assert_eq!(normalize_path("/tmp//ws/./books/b1.json"), "tmp/ws/books/b1.json");
    }

    #[test]
    fn suffix_match_respects_segment_boundary() {
        assert!(path_ends_with("tmp/ws/books/b1.json", "books/b1.json"));
        assert!(path_ends_with("books/b1.json", "books/b1.json"));
        assert!(!path_ends_with("tmp/ws/mybooks/b1.json", "books/b1.json"));
    }
}
