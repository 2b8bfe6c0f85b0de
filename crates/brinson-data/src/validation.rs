//! Row-level validation results.
//!
//! Rows that cannot be used (blank ids, non-numeric holdings, unparseable
//! dates) are dropped rather than failing the load. Every drop is recorded
//! here so data-quality issues stay visible.

use crate::tables::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Why a row was dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DropReason {
    /// The asset id cell is blank.
    MissingAssetId,
    /// A required value cell is blank.
    MissingValue {
        /// Column holding the blank value.
        column: String,
    },
    /// A numeric cell does not parse as a finite number.
    NonNumeric {
        /// Column holding the value.
        column: String,
        /// The raw cell contents.
        value: String,
    },
    /// A date cell does not parse.
    InvalidDate {
        /// The raw cell contents.
        value: String,
    },
    /// A later row repeats an asset already seen (first row kept).
    DuplicateAsset,
    /// Identical repeat of an earlier price row.
    DuplicatePrice,
}

impl DropReason {
    /// Short label used for grouping counts.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MissingAssetId => "missing asset id",
            Self::MissingValue { .. } => "missing value",
            Self::NonNumeric { .. } => "non-numeric value",
            Self::InvalidDate { .. } => "invalid date",
            Self::DuplicateAsset => "duplicate asset",
            Self::DuplicatePrice => "duplicate price",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValue { column } => write!(f, "missing value in '{column}'"),
            Self::NonNumeric { column, value } => {
                write!(f, "non-numeric value '{value}' in '{column}'")
            }
            Self::InvalidDate { value } => write!(f, "invalid date '{value}'"),
            other => f.write_str(other.label()),
        }
    }
}

/// A dropped row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRow {
    /// Sheet the row came from.
    pub sheet: String,
    /// 1-based row number within the sheet.
    pub row: usize,
    /// Asset id, when the row had one.
    pub asset_id: Option<AssetId>,
    /// Why it was dropped.
    pub reason: DropReason,
}

impl fmt::Display for DroppedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} row {}", self.sheet, self.row)?;
        if let Some(id) = &self.asset_id {
            write!(f, " ({id})")?;
        }
        write!(f, ": {}", self.reason)
    }
}

/// Collected row drops for one or more sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    dropped: Vec<DroppedRow>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dropped row.
    pub fn drop_row(
        &mut self,
        sheet: &str,
        row: usize,
        asset_id: Option<AssetId>,
        reason: DropReason,
    ) {
        let dropped = DroppedRow {
            sheet: sheet.to_string(),
            row,
            asset_id,
            reason,
        };
        warn!(%dropped, "dropped row");
        self.dropped.push(dropped);
    }

    /// Append all drops from another report.
    pub fn merge(&mut self, other: Self) {
        self.dropped.extend(other.dropped);
    }

    /// All dropped rows in the order they were recorded.
    pub fn dropped(&self) -> &[DroppedRow] {
        &self.dropped
    }

    /// Dropped rows for one sheet.
    pub fn for_sheet<'a>(&'a self, sheet: &'a str) -> impl Iterator<Item = &'a DroppedRow> + 'a {
        self.dropped.iter().filter(move |d| d.sheet == sheet)
    }

    /// Number of dropped rows.
    pub fn len(&self) -> usize {
        self.dropped.len()
    }

    /// Whether nothing was dropped.
    pub fn is_empty(&self) -> bool {
        self.dropped.is_empty()
    }

    /// Drop counts keyed by `(sheet, reason label)`.
    pub fn counts(&self) -> BTreeMap<(String, &'static str), usize> {
        let mut counts = BTreeMap::new();
        for d in &self.dropped {
            *counts
                .entry((d.sheet.clone(), d.reason.label()))
                .or_insert(0) += 1;
        }
        counts
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No rows dropped.");
        }
        writeln!(f, "{} row(s) dropped:", self.len())?;
        for ((sheet, label), count) in self.counts() {
            writeln!(f, "  {sheet}: {count} x {label}")?;
        }
        for d in &self.dropped {
            writeln!(f, "    {d}")?;
        }
        Ok(())
    }
}
