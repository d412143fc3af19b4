//! Grid addressing: column labels and rendered sheet bounds.
//!
//! # Invariants
//! - Column labels are bijective base-26 (`A`=0 … `Z`=25, `AA`=26): there is
//!   no zero digit, so `column_label` and `column_index` are exact inverses.
//! - Rendered bounds never truncate data stored past the nominal grid.

use crate::model::book::SheetData;

/// Rendered extent of a sheet, in rows and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub rows: u32,
    pub cols: u32,
}

/// Converts a 0-based column index to its label (0 -> A, 26 -> AA).
pub fn column_label(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index;
    loop {
        letters.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    letters.into_iter().map(char::from).collect()
}

/// Converts a column label to its 0-based index.
///
/// Returns `None` for empty input, non `A-Z` characters, or overflow.
/// Lowercase letters are accepted.
pub fn column_index(label: &str) -> Option<usize> {
    if label.is_empty() {
        return None;
    }
    let mut value = 0usize;
    for ch in label.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        value = value.checked_mul(26)?.checked_add(digit)?;
    }
    Some(value - 1)
}

/// Parses a sparse row key (1-based decimal row number).
pub fn row_number(row_key: &str) -> Option<u32> {
    if row_key.is_empty() || !row_key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    row_key.parse::<u32>().ok().filter(|row| *row >= 1)
}

/// Bounds to render: the larger of the nominal grid and the stored data.
pub fn sheet_bounds(sheet: &SheetData) -> GridBounds {
    let mut rows = sheet.grid_size.rows;
    let mut cols = sheet.grid_size.cols;
    for (row_key, row) in &sheet.rows {
        if let Some(row_number) = row_number(row_key) {
            rows = rows.max(row_number);
        }
        for column_key in row.keys() {
            if let Some(index) = column_index(column_key) {
                let width = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
                cols = cols.max(width);
            }
        }
    }
    GridBounds { rows, cols }
}
