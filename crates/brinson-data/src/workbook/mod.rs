//! Spreadsheet-like sources of named sheets.
//!
//! A workbook is anything that can hand back a grid of string cells for a
//! sheet name. Parsing into typed tables happens in [`crate::loader`].

pub mod csv_dir;
pub mod memory;

pub use csv_dir::CsvWorkbook;
pub use memory::InMemoryWorkbook;

use crate::cache::Fingerprint;
use crate::error::{DataError, Result};
use std::fmt;
use tracing::{debug, warn};

/// A source of named sheets.
pub trait SheetSource: fmt::Debug + Send + Sync {
    /// Read a sheet by name, returning `None` when the sheet does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet exists but cannot be read.
    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>>;

    /// Content fingerprint of the whole source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn fingerprint(&self) -> Result<Fingerprint>;

    /// Human readable description used in log and error messages.
    fn describe(&self) -> String;
}

/// Read the first sheet that exists among `names`, in order.
///
/// # Errors
///
/// Returns [`DataError::SheetNotFound`] listing every name tried when none exist.
pub fn read_first(source: &dyn SheetSource, names: &[String]) -> Result<Sheet> {
    for (attempt, name) in names.iter().enumerate() {
        if let Some(sheet) = source.read_sheet(name)? {
            if attempt > 0 {
                warn!(sheet = %name, primary = %names[0], "primary sheet missing, using fallback");
            }
            debug!(sheet = %name, rows = sheet.len(), "read sheet");
            return Ok(sheet);
        }
    }
    Err(DataError::SheetNotFound {
        tried: names.to_vec(),
    })
}

/// A named grid of trimmed string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Create a sheet, trimming every cell.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| c.trim().to_string()).collect())
            .collect();
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Sheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All rows, header included.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows, header included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the sheet has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first row, or an empty slice for an empty sheet.
    pub fn header(&self) -> &[String] {
        self.rows.first().map_or(&[], Vec::as_slice)
    }

    /// Rows after the header, paired with their 1-based row number in the sheet.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[String])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, row)| (i + 1, row.as_slice()))
    }

    /// Index of a header column by exact (trimmed) name.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        let column = column.trim();
        self.header().iter().position(|h| h == column)
    }

    /// Index of a header column, or [`DataError::MissingColumn`].
    ///
    /// # Errors
    ///
    /// Returns an error when the header does not contain `column`.
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| DataError::MissingColumn {
                sheet: self.name.clone(),
                column: column.to_string(),
            })
    }
}

/// A non-blank cell value, or `None` when the cell is absent or blank.
pub fn cell(row: &[String], index: usize) -> Option<&str> {
    row.get(index).map(String::as_str).filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Sheet {
        Sheet::new(
            "benchmark",
            vec![
                vec![" Asset ID ".to_string(), "Holdings".to_string()],
                vec!["X".to_string(), " 10 ".to_string()],
                vec!["Y".to_string()],
            ],
        )
    }

    #[test]
    fn cells_are_trimmed() {
        let sheet = sheet();
        assert_eq!(sheet.header(), ["Asset ID", "Holdings"]);
        assert_eq!(sheet.rows()[1][1], "10");
    }

    #[test]
    fn data_rows_carry_sheet_row_numbers() {
        let sheet = sheet();
        let numbers: Vec<usize> = sheet.data_rows().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn cell_treats_short_rows_as_blank() {
        let sheet = sheet();
        let (_, row) = sheet.data_rows().nth(1).unwrap();
        assert_eq!(cell(row, 0), Some("Y"));
        assert_eq!(cell(row, 1), None);
    }

    #[test]
    fn require_column_reports_sheet() {
        let err = sheet().require_column("Price").unwrap_err();
        assert!(err.to_string().contains("benchmark"));
    }

    #[test]
    fn read_first_falls_back_in_order() {
        let source = InMemoryWorkbook::new().with_sheet("funds", vec![vec!["a"]]);
        let names = vec!["funds_20231231".to_string(), "funds".to_string()];
        let sheet = read_first(&source, &names).unwrap();
        assert_eq!(sheet.name(), "funds");

        let err = read_first(&source, &["prices".to_string()]).unwrap_err();
        assert!(err.is_missing_sheet());
    }
}
