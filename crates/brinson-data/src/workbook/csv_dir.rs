//! Workbook backed by a directory of CSV files, one file per sheet.

use super::{Sheet, SheetSource};
use crate::cache::{Fingerprint, FingerprintHasher};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension used for sheet files.
const SHEET_EXTENSION: &str = "csv";

/// A directory where each `<sheet>.csv` file is one sheet.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    dir: PathBuf,
}

impl CsvWorkbook {
    /// Create a workbook rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the sheet files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{SHEET_EXTENSION}"))
    }

    /// Sheet files in the directory, sorted by file name.
    fn sheet_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == SHEET_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl SheetSource for CsvWorkbook {
    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>> {
        let path = self.sheet_path(name);
        if !path.is_file() {
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Some(Sheet::new(name, rows)))
    }

    fn fingerprint(&self) -> Result<Fingerprint> {
        let mut hasher = FingerprintHasher::new();
        for path in self.sheet_files()? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            hasher.update_part(name.as_bytes());
            hasher.update_part(&fs::read(&path)?);
        }
        Ok(hasher.finish())
    }

    fn describe(&self) -> String {
        format!("CSV workbook at {}", self.dir.display())
    }
}
