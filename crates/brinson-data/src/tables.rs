//! Typed tables parsed from workbook sheets.

use crate::error::{DataError, Result};
use crate::validation::{DropReason, ValidationReport};
use crate::workbook::{Sheet, cell};
use chrono::{NaiveDate, NaiveDateTime};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

/// Header of the asset id column in every sheet.
pub const ASSET_ID_COLUMN: &str = "Asset ID";
/// Header of the holdings quantity column.
pub const HOLDINGS_COLUMN: &str = "Holdings";
/// Header of the price date column.
pub const DATE_COLUMN: &str = "Date";
/// Header of the price column.
pub const PRICE_COLUMN: &str = "Price";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Unique identifier for an asset.
///
/// Ids are trimmed, and integral ids written with a zero fraction (`"101.0"`)
/// are normalised to their integer form so that sheets exported with
/// different number formats still join.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
pub struct AssetId(String);

impl AssetId {
    /// Create a new asset id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let id = id.trim();
        let normalised = match id.split_once('.') {
            Some((int, frac))
                if !int.is_empty()
                    && int.bytes().all(|b| b.is_ascii_digit())
                    && !frac.is_empty()
                    && frac.bytes().all(|b| b == b'0') =>
            {
                int
            }
            _ => id,
        };
        Self(normalised.to_string())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// The group an asset falls into under one classification dimension.
///
/// Assets with a blank classification, or missing from the attribute table,
/// share the [`GroupKey::Unclassified`] bucket, which sorts after every
/// named group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupKey {
    /// A named classification value.
    Classified(String),
    /// No classification value.
    Unclassified,
}

impl GroupKey {
    /// Label used for unclassified assets. The parentheses keep it apart
    /// from a classification value spelled `Unclassified`.
    pub const UNCLASSIFIED_LABEL: &'static str = "(unclassified)";

    /// Build a key from an optional cell value.
    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self::Classified(v.to_string()),
            _ => Self::Unclassified,
        }
    }

    /// Display label.
    pub fn label(&self) -> &str {
        match self {
            Self::Classified(v) => v,
            Self::Unclassified => Self::UNCLASSIFIED_LABEL,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        Self::from_value(Some(s))
    }
}

/// Parse a numeric cell, accepting thousands separators.
///
/// Commas are only accepted between well-formed groups of three digits, so
/// `"1,250.5"` parses while `"1,5"` and `"1,2,3"` are rejected.
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    let cleaned = if value.contains(',') {
        if !valid_thousands(value) {
            return None;
        }
        value.replace(',', "")
    } else {
        value.to_string()
    };
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn valid_thousands(value: &str) -> bool {
    let unsigned = value.strip_prefix(['-', '+']).unwrap_or(value);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if fraction.contains(',') {
        return false;
    }
    let mut groups = integer.split(',');
    let first_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()));
    first_ok && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse a date cell in any of the accepted layouts.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Asset prices by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    by_date: BTreeMap<NaiveDate, HashMap<AssetId, f64>>,
}

impl PriceTable {
    /// Create an empty price table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a price point.
    ///
    /// Returns `Ok(false)` when an identical price already exists for the
    /// asset and date.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ConflictingPrice`] when a different price already
    /// exists for the asset and date.
    pub fn insert(&mut self, date: NaiveDate, asset_id: AssetId, price: f64) -> Result<bool> {
        let prices = self.by_date.entry(date).or_default();
        match prices.get(&asset_id) {
            Some(&existing) if existing == price => Ok(false),
            Some(&existing) => Err(DataError::ConflictingPrice {
                asset_id,
                date,
                first: existing,
                second: price,
            }),
            None => {
                prices.insert(asset_id, price);
                Ok(true)
            }
        }
    }

    /// Parse a `Date`, `Asset ID`, `Price` sheet.
    ///
    /// # Errors
    ///
    /// Returns an error when a required column is missing or two rows give
    /// conflicting prices for the same asset and date.
    pub fn from_sheet(sheet: &Sheet, report: &mut ValidationReport) -> Result<Self> {
        let date_col = sheet.require_column(DATE_COLUMN)?;
        let asset_col = sheet.require_column(ASSET_ID_COLUMN)?;
        let price_col = sheet.require_column(PRICE_COLUMN)?;

        let mut table = Self::new();
        for (row_number, row) in sheet.data_rows() {
            if row.iter().all(String::is_empty) {
                continue;
            }
            let Some(asset_id) = cell(row, asset_col).map(AssetId::new) else {
                report.drop_row(sheet.name(), row_number, None, DropReason::MissingAssetId);
                continue;
            };
            let date = match cell(row, date_col) {
                None => {
                    let reason = DropReason::MissingValue {
                        column: DATE_COLUMN.to_string(),
                    };
                    report.drop_row(sheet.name(), row_number, Some(asset_id), reason);
                    continue;
                }
                Some(raw) => match parse_date(raw) {
                    Some(date) => date,
                    None => {
                        let reason = DropReason::InvalidDate {
                            value: raw.to_string(),
                        };
                        report.drop_row(sheet.name(), row_number, Some(asset_id), reason);
                        continue;
                    }
                },
            };
            let Some(price) = numeric_cell(
                sheet,
                row_number,
                row,
                price_col,
                PRICE_COLUMN,
                &asset_id,
                report,
            ) else {
                continue;
            };
            if !table.insert(date, asset_id.clone(), price)? {
                report.drop_row(
                    sheet.name(),
                    row_number,
                    Some(asset_id),
                    DropReason::DuplicatePrice,
                );
            }
        }

        debug!(dates = table.by_date.len(), points = table.len(), "parsed price table");
        Ok(table)
    }

    /// Distinct dates in ascending order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.by_date.keys().copied().collect()
    }

    /// Whether any price exists on `date`.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.by_date.contains_key(&date)
    }

    /// Earliest date.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.by_date.keys().next().copied()
    }

    /// Latest date.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.by_date.keys().next_back().copied()
    }

    /// All prices on `date`, keyed by asset.
    pub fn prices_on(&self, date: NaiveDate) -> Option<&HashMap<AssetId, f64>> {
        self.by_date.get(&date)
    }

    /// A single price.
    pub fn price(&self, date: NaiveDate, asset_id: &AssetId) -> Option<f64> {
        self.by_date.get(&date)?.get(asset_id).copied()
    }

    /// Number of price points.
    pub fn len(&self) -> usize {
        self.by_date.values().map(HashMap::len).sum()
    }

    /// Whether the table holds no prices.
    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

/// Classification values per asset for every attribute dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTable {
    dimensions: Vec<String>,
    values: BTreeMap<AssetId, Vec<Option<String>>>,
}

impl AttributeTable {
    /// Create an attribute table with the given dimensions and no assets.
    pub fn new(dimensions: Vec<String>) -> Self {
        Self {
            dimensions,
            values: BTreeMap::new(),
        }
    }

    /// Set an asset's values, one per dimension. Returns `false` if the
    /// asset was already present (the existing values are kept).
    pub fn insert(&mut self, asset_id: AssetId, values: Vec<Option<String>>) -> bool {
        if self.values.contains_key(&asset_id) {
            return false;
        }
        let mut values = values;
        values.resize(self.dimensions.len(), None);
        self.values.insert(asset_id, values);
        true
    }

    /// Parse an `Asset ID` + classification columns sheet.
    ///
    /// Every non-blank header other than `Asset ID` is a dimension.
    ///
    /// # Errors
    ///
    /// Returns an error when the asset id column is missing or there are no
    /// classification columns.
    pub fn from_sheet(sheet: &Sheet, report: &mut ValidationReport) -> Result<Self> {
        let asset_col = sheet.require_column(ASSET_ID_COLUMN)?;
        let dimension_cols: Vec<(usize, String)> = sheet
            .header()
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != asset_col && !h.is_empty())
            .map(|(i, h)| (i, h.clone()))
            .collect();

        if dimension_cols.is_empty() {
            return Err(DataError::MalformedSheet {
                sheet: sheet.name().to_string(),
                reason: "no classification columns".to_string(),
            });
        }

        let mut table = Self::new(dimension_cols.iter().map(|(_, h)| h.clone()).collect());
        for (row_number, row) in sheet.data_rows() {
            if row.iter().all(String::is_empty) {
                continue;
            }
            let Some(asset_id) = cell(row, asset_col).map(AssetId::new) else {
                report.drop_row(sheet.name(), row_number, None, DropReason::MissingAssetId);
                continue;
            };
            let values = dimension_cols
                .iter()
                .map(|(i, _)| cell(row, *i).map(str::to_string))
                .collect();
            if !table.insert(asset_id.clone(), values) {
                report.drop_row(
                    sheet.name(),
                    row_number,
                    Some(asset_id),
                    DropReason::DuplicateAsset,
                );
            }
        }

        debug!(
            assets = table.len(),
            dimensions = table.dimensions.len(),
            "parsed attribute table"
        );
        Ok(table)
    }

    /// Classification dimension names, in sheet order.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Number of classified assets.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no assets are listed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A single classification value.
    pub fn value(&self, asset_id: &AssetId, dimension: &str) -> Option<&str> {
        let index = self.dimensions.iter().position(|d| d == dimension)?;
        self.values.get(asset_id)?.get(index)?.as_deref()
    }

    /// The asset-to-group mapping for one dimension, or `None` for an
    /// unknown dimension.
    pub fn classification(&self, dimension: &str) -> Option<Classification> {
        let index = self.dimensions.iter().position(|d| d == dimension)?;
        let groups = self
            .values
            .iter()
            .map(|(id, values)| {
                let value = values.get(index).and_then(Option::as_deref);
                (id.clone(), GroupKey::from_value(value))
            })
            .collect();
        Some(Classification {
            dimension: dimension.to_string(),
            groups,
        })
    }
}

/// Asset-to-group mapping for one classification dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    dimension: String,
    groups: BTreeMap<AssetId, GroupKey>,
}

impl Classification {
    /// Build a classification directly from `(asset, group)` pairs.
    pub fn from_pairs<I, A, G>(dimension: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, G)>,
        A: Into<AssetId>,
        G: Into<GroupKey>,
    {
        Self {
            dimension: dimension.into(),
            groups: pairs
                .into_iter()
                .map(|(a, g)| (a.into(), g.into()))
                .collect(),
        }
    }

    /// Dimension name.
    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    /// Group of an asset; assets not listed are unclassified.
    pub fn group_of(&self, asset_id: &AssetId) -> GroupKey {
        self.groups
            .get(asset_id)
            .cloned()
            .unwrap_or(GroupKey::Unclassified)
    }

    /// Iterate `(asset, group)` pairs in asset order.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &GroupKey)> {
        self.groups.iter()
    }

    /// Number of listed assets.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no assets are listed.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Holdings quantities at period start for one portfolio or benchmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoldingSet {
    name: String,
    holdings: BTreeMap<AssetId, f64>,
}

impl HoldingSet {
    /// Create an empty holding set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            holdings: BTreeMap::new(),
        }
    }

    /// Build a holding set from `(asset, quantity)` pairs.
    pub fn from_pairs<I, A>(name: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, f64)>,
        A: Into<AssetId>,
    {
        let mut set = Self::new(name);
        for (asset_id, quantity) in pairs {
            set.add(asset_id.into(), quantity);
        }
        set
    }

    /// Add a quantity. Repeated assets accumulate.
    pub fn add(&mut self, asset_id: AssetId, quantity: f64) {
        *self.holdings.entry(asset_id).or_insert(0.0) += quantity;
    }

    /// Parse holdings from two columns of a sheet's data rows.
    ///
    /// Rows blank in both columns are padding and skipped silently. A blank
    /// asset id, a blank quantity, or a non-numeric quantity drops the row
    /// and records it in `report`.
    pub fn from_columns<'a>(
        name: impl Into<String>,
        sheet_name: &str,
        rows: impl Iterator<Item = (usize, &'a [String])>,
        asset_col: usize,
        holdings_col: usize,
        report: &mut ValidationReport,
    ) -> Self {
        let mut set = Self::new(name);
        let mut repeated = 0usize;
        for (row_number, row) in rows {
            let asset = cell(row, asset_col);
            let quantity = cell(row, holdings_col);
            let (asset, quantity) = match (asset, quantity) {
                (None, None) => continue,
                (None, Some(_)) => {
                    report.drop_row(sheet_name, row_number, None, DropReason::MissingAssetId);
                    continue;
                }
                (Some(a), None) => {
                    let reason = DropReason::MissingValue {
                        column: HOLDINGS_COLUMN.to_string(),
                    };
                    report.drop_row(sheet_name, row_number, Some(AssetId::new(a)), reason);
                    continue;
                }
                (Some(a), Some(q)) => (AssetId::new(a), q),
            };
            let Some(quantity_value) = parse_number(quantity) else {
                let reason = DropReason::NonNumeric {
                    column: HOLDINGS_COLUMN.to_string(),
                    value: quantity.to_string(),
                };
                report.drop_row(sheet_name, row_number, Some(asset), reason);
                continue;
            };
            if set.holdings.contains_key(&asset) {
                repeated += 1;
            }
            set.add(asset, quantity_value);
        }
        if repeated > 0 {
            debug!(set = %set.name, repeated, "accumulated repeated holdings rows");
        }
        set
    }

    /// Parse an `Asset ID`, `Holdings` sheet.
    ///
    /// # Errors
    ///
    /// Returns an error when either column is missing.
    pub fn from_sheet(
        name: impl Into<String>,
        sheet: &Sheet,
        report: &mut ValidationReport,
    ) -> Result<Self> {
        let asset_col = sheet.require_column(ASSET_ID_COLUMN)?;
        let holdings_col = sheet.require_column(HOLDINGS_COLUMN)?;
        Ok(Self::from_columns(
            name,
            sheet.name(),
            sheet.data_rows(),
            asset_col,
            holdings_col,
            report,
        ))
    }

    /// Holding set name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quantity held of one asset.
    pub fn get(&self, asset_id: &AssetId) -> Option<f64> {
        self.holdings.get(asset_id).copied()
    }

    /// Iterate `(asset, quantity)` pairs in asset order.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, f64)> {
        self.holdings.iter().map(|(id, q)| (id, *q))
    }

    /// Number of distinct assets held.
    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

fn numeric_cell(
    sheet: &Sheet,
    row_number: usize,
    row: &[String],
    col: usize,
    column: &str,
    asset_id: &AssetId,
    report: &mut ValidationReport,
) -> Option<f64> {
    let Some(raw) = cell(row, col) else {
        let reason = DropReason::MissingValue {
            column: column.to_string(),
        };
        report.drop_row(sheet.name(), row_number, Some(asset_id.clone()), reason);
        return None;
    };
    let value = parse_number(raw);
    if value.is_none() {
        let reason = DropReason::NonNumeric {
            column: column.to_string(),
            value: raw.to_string(),
        };
        report.drop_row(sheet.name(), row_number, Some(asset_id.clone()), reason);
    }
    value
}
