//! Interpretation of raw text typed into a cell.

use crate::model::book::{CellData, RowData, SheetData};
use once_cell::sync::Lazy;
use regex::Regex;

static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid decimal regex")
});

/// One cell write: canonical row key, column label and raw input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub row_key: String,
    pub column_key: String,
    pub raw_value: String,
}

impl CellUpdate {
    pub fn new(
        row_key: impl Into<String>,
        column_key: impl Into<String>,
        raw_value: impl Into<String>,
    ) -> Self {
        Self {
            row_key: row_key.into(),
            column_key: column_key.into(),
            raw_value: raw_value.into(),
        }
    }
}

/// Parses trimmed input as a finite decimal number.
pub fn parse_number(trimmed: &str) -> Option<f64> {
    if !DECIMAL_RE.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Applies one write to `sheet`; returns whether stored content changed.
///
/// Blank input deletes the cell, and the row once it is empty. Anything
/// else is stored as a number when it parses as one, otherwise as the raw
/// text. Writing the stored `(value, type)` again changes nothing.
pub(crate) fn write_cell(
    sheet: &mut SheetData,
    row_key: &str,
    column_key: &str,
    raw: &str,
) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        let Some(row) = sheet.rows.get_mut(row_key) else {
            return false;
        };
        if row.remove(column_key).is_none() {
            return false;
        }
        if row.is_empty() {
            sheet.rows.remove(row_key);
        }
        return true;
    }

    let incoming = match parse_number(trimmed) {
        Some(number) => CellData::number(number),
        None => CellData::text(raw),
    };
    let row: &mut RowData = sheet.rows.entry(row_key.to_string()).or_default();
    match row.get_mut(column_key) {
        Some(existing) if existing.same_content(&incoming) => false,
        Some(existing) => {
            existing.value = incoming.value;
            existing.kind = incoming.kind;
            existing.formula = None;
            true
        }
        None => {
            row.insert(column_key.to_string(), incoming);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_number, write_cell};
    use crate::factory::new_sheet;
    use crate::model::book::{CellType, CellValue};

    fn is_number(value: &CellValue, expected: f64) -> bool {
        matches!(value, CellValue::Number(number) if *number == expected)
    }

    #[test]
    fn parse_number_accepts_decimal_forms_only() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("-3.5"), Some(-3.5));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("1e999"), None);
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("1,000"), None);
    }

    #[test]
    fn write_stores_number_or_raw_text() {
        let mut sheet = new_sheet("sheet-001".to_string(), "Sheet".to_string());
        assert!(write_cell(&mut sheet, "1", "A", " 7 "));
        assert!(write_cell(&mut sheet, "1", "B", " hello "));

        let number = sheet.cell("1", "A").unwrap();
        assert_eq!(number.kind, CellType::Number);
        assert!(is_number(&number.value, 7.0));

        let text = sheet.cell("1", "B").unwrap();
        assert_eq!(text.kind, CellType::String);
        assert_eq!(text.value, CellValue::Text(" hello ".to_string()));
    }

    #[test]
    fn rewriting_same_content_is_not_a_change() {
        let mut sheet = new_sheet("sheet-001".to_string(), "Sheet".to_string());
        assert!(write_cell(&mut sheet, "2", "C", "10"));
        assert!(!write_cell(&mut sheet, "2", "C", "10.0"));
        assert!(!write_cell(&mut sheet, "5", "C", ""));
        assert!(sheet.rows.get("5").is_none());
    }

    #[test]
    fn blank_write_deletes_cell_and_empty_row() {
        let mut sheet = new_sheet("sheet-001".to_string(), "Sheet".to_string());
        write_cell(&mut sheet, "3", "A", "x");
        write_cell(&mut sheet, "3", "B", "y");

        assert!(write_cell(&mut sheet, "3", "A", "   "));
        assert!(sheet.rows.contains_key("3"));
        assert!(write_cell(&mut sheet, "3", "B", ""));
        assert!(!sheet.rows.contains_key("3"));
    }
}
