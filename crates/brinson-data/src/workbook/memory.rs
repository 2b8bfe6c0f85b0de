//! In-memory workbook.

use super::{Sheet, SheetSource};
use crate::cache::{Fingerprint, FingerprintHasher};
use crate::error::Result;
use std::collections::BTreeMap;

/// Sheets held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkbook {
    sheets: BTreeMap<String, Vec<Vec<String>>>,
}

impl InMemoryWorkbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a sheet.
    pub fn with_sheet<R, C>(mut self, name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.insert_sheet(name, rows);
        self
    }

    /// Add or replace a sheet in place.
    pub fn insert_sheet<R, C>(&mut self, name: impl Into<String>, rows: R)
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self.sheets.insert(name.into(), rows);
    }

    /// Remove a sheet, returning whether it existed.
    pub fn remove_sheet(&mut self, name: &str) -> bool {
        self.sheets.remove(name).is_some()
    }
}

impl SheetSource for InMemoryWorkbook {
    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>> {
        Ok(self
            .sheets
            .get(name)
            .map(|rows| Sheet::new(name, rows.clone())))
    }

    fn fingerprint(&self) -> Result<Fingerprint> {
        let mut hasher = FingerprintHasher::new();
        for (name, rows) in &self.sheets {
            hasher.update_part(name.as_bytes());
            for row in rows {
                hasher.update_part(&(row.len() as u64).to_le_bytes());
                for cell in row {
                    hasher.update_part(cell.as_bytes());
                }
            }
        }
        Ok(hasher.finish())
    }

    fn describe(&self) -> String {
        format!("in-memory workbook ({} sheets)", self.sheets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_changes_with_cells() {
        let mut workbook = InMemoryWorkbook::new().with_sheet("benchmark", [["X", "1"]]);
        let before = workbook.fingerprint().unwrap();

        workbook.insert_sheet("benchmark", [["X", "2"]]);
        assert_ne!(before, workbook.fingerprint().unwrap());
    }

    #[test]
    fn cell_boundaries_affect_fingerprint() {
        let a = InMemoryWorkbook::new().with_sheet("s", [["ab", "c"]]);
        let b = InMemoryWorkbook::new().with_sheet("s", [["a", "bc"]]);
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }
}
