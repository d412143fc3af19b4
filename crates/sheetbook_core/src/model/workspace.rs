//! Workspace index model.
//!
//! # Responsibility
//! - Describe the lightweight catalog file: folders and book references.
//!
//! # Invariants
//! - `BookReference::order` may be non-finite in memory; `null` or a missing
//!   value on disk loads as NaN so detection can flag it.
//! - Unknown workspace settings keys survive a load/save round trip.
//! - Equality treats two NaN orders as equal, so a snapshot always equals its
//!   own clone.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Current on-disk schema version for `workspace.json`.
pub const WORKSPACE_SCHEMA_VERSION: u32 = 1;

/// Root document of `workspace.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceIndex {
    pub schema_version: u32,
    pub workspace: WorkspaceMeta,
    #[serde(default)]
    pub folders: Vec<FolderMeta>,
    #[serde(default)]
    pub books: Vec<BookReference>,
}

impl WorkspaceIndex {
    /// Returns the first reference with `id`, if any.
    pub fn book(&self, id: &str) -> Option<&BookReference> {
        self.books.iter().find(|book| book.id == id)
    }

    /// Returns the position of the first reference with `id`, if any.
    pub fn book_position(&self, id: &str) -> Option<usize> {
        self.books.iter().position(|book| book.id == id)
    }

    /// Returns whether a folder with `id` exists.
    pub fn has_folder(&self, id: &str) -> bool {
        self.folders.iter().any(|folder| folder.id == id)
    }
}

/// Workspace-level metadata block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMeta {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub settings: WorkspaceSettings,
}

/// User preferences persisted with the workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar_width: Option<f64>,
    /// Most-recently-used book ids, newest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_book_ids: Option<Vec<String>>,
    /// Most-recently-used sheet ids, newest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_sheet_ids: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Grouping node for books.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default = "non_finite_order", deserialize_with = "deserialize_order")]
    pub order: f64,
}

/// Pointer entry inside the index for one book file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookReference {
    pub id: String,
    pub name: String,
    /// `None` means the book sits at the root.
    #[serde(default)]
    pub folder_id: Option<String>,
    /// Sibling rank within the `folder_id` group.
    #[serde(default = "non_finite_order", deserialize_with = "deserialize_order")]
    pub order: f64,
    /// Path of the book file, relative to the workspace directory.
    pub data_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_sheet_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PartialEq for FolderMeta {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.parent_id == other.parent_id
            && same_order(self.order, other.order)
    }
}

impl PartialEq for BookReference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.folder_id == other.folder_id
            && same_order(self.order, other.order)
            && self.data_path == other.data_path
            && self.thumb_path == other.thumb_path
            && self.active_sheet_id == other.active_sheet_id
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
    }
}

fn same_order(left: f64, right: f64) -> bool {
    left == right || (left.is_nan() && right.is_nan())
}

fn non_finite_order() -> f64 {
    f64::NAN
}

fn deserialize_order<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}
