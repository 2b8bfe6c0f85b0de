//! Fund holdings blocks.
//!
//! The fund sheet places several funds side by side. The first row is a
//! banner naming each fund above its block, the second row is the column
//! header (`Asset ID`, `Holdings` per block) and data follows.
//!
//! ```text
//! Fund A   |          |  |  | Fund B   |
//! Asset ID | Holdings |  |  | Asset ID | Holdings
//! X        | 100      |  |  | Y        | 40
//! ```
//!
//! Blocks are located by the fund's banner name. A positional column pair is
//! only used as a fallback when the banner does not name the fund.

use crate::error::{DataError, Result};
use crate::tables::{ASSET_ID_COLUMN, HOLDINGS_COLUMN, HoldingSet};
use crate::validation::ValidationReport;
use crate::workbook::Sheet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

fn default_asset_column() -> String {
    ASSET_ID_COLUMN.to_string()
}

fn default_holdings_column() -> String {
    HOLDINGS_COLUMN.to_string()
}

/// How to find one fund's block in the fund sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundSpec {
    /// Fund name as written in the banner row.
    pub name: String,

    /// Header of the block's asset id column.
    #[serde(default = "default_asset_column")]
    pub asset_column: String,

    /// Header of the block's holdings column.
    #[serde(default = "default_holdings_column")]
    pub holdings_column: String,

    /// Zero-based `(asset, holdings)` column indices used when the banner
    /// does not name the fund.
    #[serde(default)]
    pub fallback_columns: Option<(usize, usize)>,
}

impl FundSpec {
    /// Create a spec located by name only.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            asset_column: default_asset_column(),
            holdings_column: default_holdings_column(),
            fallback_columns: None,
        }
    }

    /// Set the positional fallback columns.
    #[must_use]
    pub fn with_fallback(mut self, asset_col: usize, holdings_col: usize) -> Self {
        self.fallback_columns = Some((asset_col, holdings_col));
        self
    }

    /// The two funds of the standard fund sheet layout.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::named("Fund A").with_fallback(0, 1),
            Self::named("Fund B").with_fallback(4, 5),
        ]
    }
}

/// Column pair of one located fund block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundBlock {
    /// Asset id column index.
    pub asset_col: usize,
    /// Holdings column index.
    pub holdings_col: usize,
    /// Whether the block was found by position rather than by name.
    pub positional: bool,
}

/// The raw fund sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundTable {
    sheet: Sheet,
}

impl FundTable {
    /// Wrap a fund sheet.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MalformedSheet`] when the sheet lacks the banner
    /// and header rows.
    pub fn from_sheet(sheet: Sheet) -> Result<Self> {
        if sheet.len() < 2 {
            return Err(DataError::MalformedSheet {
                sheet: sheet.name().to_string(),
                reason: "expected a banner row and a header row".to_string(),
            });
        }
        Ok(Self { sheet })
    }

    /// Name of the underlying sheet.
    pub fn sheet_name(&self) -> &str {
        self.sheet.name()
    }

    fn banner(&self) -> &[String] {
        &self.sheet.rows()[0]
    }

    fn header(&self) -> &[String] {
        &self.sheet.rows()[1]
    }

    /// Fund names present in the banner row.
    pub fn banner_names(&self) -> Vec<&str> {
        self.banner()
            .iter()
            .map(String::as_str)
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Locate a fund's block.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::FundNotFound`] when the fund is neither named in
    /// the banner nor has a usable positional fallback.
    pub fn locate(&self, spec: &FundSpec) -> Result<FundBlock> {
        if let Some(block) = self.locate_by_name(spec) {
            debug!(fund = %spec.name, ?block, "located fund block by name");
            return Ok(block);
        }

        let width = self.sheet.rows().iter().map(Vec::len).max().unwrap_or(0);
        match spec.fallback_columns {
            Some((asset_col, holdings_col)) if asset_col < width && holdings_col < width => {
                warn!(
                    fund = %spec.name,
                    asset_col,
                    holdings_col,
                    "fund not named in banner, using positional columns"
                );
                Ok(FundBlock {
                    asset_col,
                    holdings_col,
                    positional: true,
                })
            }
            _ => Err(DataError::FundNotFound(spec.name.clone())),
        }
    }

    fn locate_by_name(&self, spec: &FundSpec) -> Option<FundBlock> {
        let banner = self.banner();
        let start = banner
            .iter()
            .position(|c| c.eq_ignore_ascii_case(spec.name.trim()))?;
        // The block ends where the next fund's banner begins.
        let end = banner
            .iter()
            .enumerate()
            .skip(start + 1)
            .find(|(_, c)| !c.is_empty())
            .map_or(usize::MAX, |(i, _)| i);

        let header = self.header();
        let find = |name: &str, from: usize| {
            header
                .iter()
                .enumerate()
                .skip(from)
                .take_while(|(i, _)| *i < end)
                .find(|(_, h)| h.as_str() == name)
                .map(|(i, _)| i)
        };
        let asset_col = find(spec.asset_column.as_str(), start)?;
        let holdings_col = find(spec.holdings_column.as_str(), start)?;
        Some(FundBlock {
            asset_col,
            holdings_col,
            positional: false,
        })
    }

    /// Extract a fund's holdings, dropping invalid rows into `report`.
    ///
    /// # Errors
    ///
    /// Returns an error when the fund block cannot be located.
    pub fn holdings(&self, spec: &FundSpec, report: &mut ValidationReport) -> Result<HoldingSet> {
        let block = self.locate(spec)?;
        let rows = self.sheet.data_rows().skip(1);
        let set = HoldingSet::from_columns(
            spec.name.clone(),
            self.sheet.name(),
            rows,
            block.asset_col,
            block.holdings_col,
            report,
        );
        debug!(fund = %spec.name, assets = set.len(), "extracted fund holdings");
        Ok(set)
    }
}
