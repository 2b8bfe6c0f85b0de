//! Error types for data operations.

use chrono::NaiveDate;
use thiserror::Error;

use crate::tables::AssetId;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading a dataset.
#[derive(Debug, Error)]
pub enum DataError {
    /// None of the candidate sheet names exist in the source
    #[error("Sheet not found: tried {}", tried.join(", "))]
    SheetNotFound {
        /// Sheet names that were tried, in order
        tried: Vec<String>,
    },

    /// A required header is absent
    #[error("Missing column '{column}' in sheet '{sheet}'")]
    MissingColumn {
        /// Sheet being parsed
        sheet: String,
        /// Column that was expected
        column: String,
    },

    /// Sheet shape does not match its expected layout
    #[error("Malformed sheet '{sheet}': {reason}")]
    MalformedSheet {
        /// Sheet being parsed
        sheet: String,
        /// What is wrong with it
        reason: String,
    },

    /// Two rows give different prices for the same asset and date
    #[error("Conflicting prices for {asset_id} on {date}: {first} vs {second}")]
    ConflictingPrice {
        /// Asset with duplicate rows
        asset_id: AssetId,
        /// Date of the duplicate rows
        date: NaiveDate,
        /// Price seen first
        first: f64,
        /// Price seen later
        second: f64,
    },

    /// Fund block could not be located in the fund sheet
    #[error("Fund not found in fund sheet: {0}")]
    FundNotFound(String),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Returns whether the error comes from a missing sheet.
    #[must_use]
    pub const fn is_missing_sheet(&self) -> bool {
        matches!(self, Self::SheetNotFound { .. })
    }
}
