//! JSON file loading and saving for a whole workspace snapshot.
//!
//! # Responsibility
//! - Read `workspace.json` plus every referenced book file into a `Snapshot`.
//! - Write a snapshot back as pretty JSON, one file per document.
//!
//! # Invariants
//! - Every document is validated before a snapshot is constructed; a schema
//!   failure aborts the load.
//! - `dataPath` is resolved against the workspace file's directory.
//! - Written files end with a trailing newline.

use crate::model::snapshot::Snapshot;
use crate::validate::{parse_book, parse_workspace, ValidationError};
use log::{error, info};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type PersistResult<T> = Result<T, PersistError>;

#[derive(Debug)]
pub enum PersistError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to access {}: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            }
            Self::Invalid { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Invalid { source, .. } => Some(source),
        }
    }
}

/// Loads the workspace index at `path` and every book it references.
pub fn load_workspace_snapshot(path: impl AsRef<Path>) -> PersistResult<Snapshot> {
    let started_at = Instant::now();
    let path = path.as_ref();
    match load_snapshot(path) {
        Ok(snapshot) => {
            info!(
                "event=snapshot_load module=persist status=ok books={} duration_ms={}",
                snapshot.books.len(),
                started_at.elapsed().as_millis()
            );
            Ok(snapshot)
        }
        Err(err) => {
            error!(
                "event=snapshot_load module=persist status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Writes the index and every book file of `snapshot` to their paths.
pub fn save_workspace_snapshot(snapshot: &Snapshot) -> PersistResult<()> {
    let started_at = Instant::now();
    let result = write_json_file(Path::new(&snapshot.workspace.file_path), &snapshot.workspace.data)
        .and_then(|()| {
            snapshot
                .books
                .iter()
                .try_for_each(|book| write_json_file(Path::new(&book.file_path), &book.data))
        });
    match &result {
        Ok(()) => info!(
            "event=snapshot_save module=persist status=ok books={} duration_ms={}",
            snapshot.books.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=snapshot_save module=persist status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn load_snapshot(path: &Path) -> PersistResult<Snapshot> {
    let raw = read_json_file(path)?;
    let index = parse_workspace(&raw).map_err(|source| PersistError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    let workspace_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut books = Vec::with_capacity(index.books.len());
    for reference in &index.books {
        let book_path = workspace_dir.join(&reference.data_path);
        let raw_book = read_json_file(&book_path)?;
        let document = parse_book(&raw_book).map_err(|source| PersistError::Invalid {
            path: book_path.clone(),
            source,
        })?;
        books.push((book_path.to_string_lossy().into_owned(), document));
    }

    Ok(Snapshot::new(
        path.to_string_lossy().into_owned(),
        index,
        books,
    ))
}

fn read_json_file(path: &Path) -> PersistResult<Value> {
    let contents = fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json_file<T: Serialize>(path: &Path, value: &T) -> PersistResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PersistError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut payload = serde_json::to_string_pretty(value).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    payload.push('\n');
    fs::write(path, payload).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}
