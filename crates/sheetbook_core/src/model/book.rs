//! Book document model.
//!
//! # Responsibility
//! - Describe one spreadsheet file: metadata plus ordered sheets.
//! - Keep cell storage sparse: rows keyed by 1-based row number, cells keyed
//!   by column label.
//!
//! # Invariants
//! - A cell's `type` tag agrees with its `value` kind (checked by `validate`).
//! - Cells hold literal values only; `formula` is carried but never evaluated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Current on-disk schema version for book files.
pub const BOOK_SCHEMA_VERSION: u32 = 1;

/// Root document of one book file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDocument {
    pub schema_version: u32,
    pub book: BookMeta,
    #[serde(default)]
    pub sheets: Vec<SheetData>,
}

impl BookDocument {
    pub fn sheet(&self, id: &str) -> Option<&SheetData> {
        self.sheets.iter().find(|sheet| sheet.id == id)
    }

    pub fn sheet_mut(&mut self, id: &str) -> Option<&mut SheetData> {
        self.sheets.iter_mut().find(|sheet| sheet.id == id)
    }

    /// Sheet ids in tab order.
    pub fn sheet_ids(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.id.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMeta {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub properties: BookProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

/// Nominal grid dimensions declared by a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: u32,
    pub cols: u32,
}

/// Sparse row: column label -> cell.
pub type RowData = BTreeMap<String, CellData>;

/// One spreadsheet tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetData {
    pub id: String,
    pub name: String,
    pub grid_size: GridSize,
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Row key is the 1-based row number rendered as decimal text.
    #[serde(default)]
    pub rows: BTreeMap<String, RowData>,
}

impl SheetData {
    pub fn cell(&self, row_key: &str, column_key: &str) -> Option<&CellData> {
        self.rows.get(row_key).and_then(|row| row.get(column_key))
    }
}

/// Literal cell value as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Stored type tag of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    String,
    Number,
    Boolean,
    Null,
}

impl CellType {
    /// Returns whether `value` is an acceptable payload for this tag.
    pub fn accepts(self, value: &CellValue) -> bool {
        matches!(
            (self, value),
            (_, CellValue::Null)
                | (CellType::String, CellValue::Text(_))
                | (CellType::Number, CellValue::Number(_))
                | (CellType::Boolean, CellValue::Bool(_))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellData {
    pub value: CellValue,
    #[serde(rename = "type")]
    pub kind: CellType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl CellData {
    pub fn number(value: f64) -> Self {
        Self::literal(CellValue::Number(value), CellType::Number)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::literal(CellValue::Text(value.into()), CellType::String)
    }

    fn literal(value: CellValue, kind: CellType) -> Self {
        Self {
            value,
            kind,
            format: None,
            formula: None,
            comment: None,
        }
    }

    /// Returns whether the `(value, type)` pair equals another cell's.
    pub fn same_content(&self, other: &CellData) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

#[cfg(test)]
mod tests {
    use super::{CellData, CellType, CellValue};
    use serde_json::json;

    #[test]
    fn cell_values_deserialize_by_json_kind() {
        let cell: CellData =
            serde_json::from_value(json!({ "value": null, "type": "string" })).unwrap();
        assert_eq!(cell.value, CellValue::Null);

        let cell: CellData =
            serde_json::from_value(json!({ "value": 12.5, "type": "number" })).unwrap();
        assert_eq!(cell.value, CellValue::Number(12.5));

        let cell: CellData =
            serde_json::from_value(json!({ "value": true, "type": "boolean" })).unwrap();
        assert_eq!(cell.value, CellValue::Bool(true));
    }

    #[test]
    fn cell_serializes_type_tag_and_skips_empty_optionals() {
        let raw = serde_json::to_value(CellData::text("hello")).unwrap();
        assert_eq!(raw, json!({ "value": "hello", "type": "string" }));
    }

    #[test]
    fn type_tag_rejects_mismatched_value() {
        assert!(CellType::Number.accepts(&CellValue::Number(1.0)));
        assert!(CellType::Number.accepts(&CellValue::Null));
        assert!(!CellType::Number.accepts(&CellValue::Text("1".to_string())));
        assert!(!CellType::Boolean.accepts(&CellValue::Number(0.0)));
    }
}
