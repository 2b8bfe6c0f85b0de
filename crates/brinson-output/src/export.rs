//! CSV and JSON export of attribution results.

use crate::table::{AttributionTable, VALUE_COLUMNS};
use brinson_engine::{AttributionRun, JoinedAsset};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while serializing attribution output.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer failed.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failed.
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the output file failed.
    #[error("Could not write export: {0}")]
    Io(#[from] std::io::Error),

    /// Unrecognized format name or non-UTF-8 output.
    #[error("Unsupported export format: {0}")]
    InvalidFormat(String),
}

/// Serialized output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// One row per group plus a totals row.
    Csv,

    /// Single-line JSON.
    Json,

    /// Indented JSON.
    PrettyJson,
}

impl ExportFormat {
    /// File extension written for this format.
    pub const fn extension(&self) -> &str {
        if matches!(self, Self::Csv) {
            "csv"
        } else {
            "json"
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Attribution output that can be serialized to text or a file.
pub trait Exporter {
    /// Serialize in `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV writer or JSON encoder fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Serialize in `format` and write the result to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serializing or writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let mut file = File::create(path)?;
        file.write_all(self.export_to_string(format)?.as_bytes())?;
        Ok(())
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, ExportError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for AttributionTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(Vec::new());
                let mut header = vec![self.dimension.as_str()];
                header.extend(VALUE_COLUMNS);
                wtr.write_record(&header)?;
                for row in self.rows.iter().chain(std::iter::once(&self.totals)) {
                    wtr.write_record([
                        row.group.clone(),
                        row.w_p.to_string(),
                        row.w_b.to_string(),
                        row.r_p.to_string(),
                        row.r_b.to_string(),
                        row.allocation.to_string(),
                        row.selection.to_string(),
                        row.interaction.to_string(),
                        row.total_alpha.to_string(),
                    ])?;
                }
                finish_csv(wtr)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => {
                to_json(self, format == ExportFormat::PrettyJson)
            }
        }
    }
}

/// One asset's joined weights and return, for drill-down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRow {
    /// Asset id.
    pub asset_id: String,
    /// Group label.
    pub group: String,
    /// Portfolio weight.
    pub w_p: f64,
    /// Benchmark weight.
    pub w_b: f64,
    /// Period return.
    pub asset_return: f64,
    /// `w_p * return`.
    pub portfolio_contribution: f64,
    /// `w_b * return`.
    pub benchmark_contribution: f64,
}

impl From<&JoinedAsset> for AssetRow {
    fn from(asset: &JoinedAsset) -> Self {
        Self {
            asset_id: asset.asset_id.to_string(),
            group: asset.group.label().to_string(),
            w_p: asset.portfolio_weight,
            w_b: asset.benchmark_weight,
            asset_return: asset.asset_return,
            portfolio_contribution: asset.portfolio_contribution(),
            benchmark_contribution: asset.benchmark_contribution(),
        }
    }
}

/// Asset rows of a run.
pub fn asset_rows(run: &AttributionRun) -> Vec<AssetRow> {
    run.assets.iter().map(AssetRow::from).collect()
}

impl Exporter for Vec<AssetRow> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(Vec::new());
                for record in self {
                    wtr.serialize(record)?;
                }
                finish_csv(wtr)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => {
                to_json(self, format == ExportFormat::PrettyJson)
            }
        }
    }
}
