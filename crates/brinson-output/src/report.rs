//! Timestamped attribution reports.

use crate::table::AttributionTable;
use brinson_data::ValidationReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while assembling or encoding a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON encoding failed.
    #[error("Report encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required field was not set on the builder.
    #[error("Missing report field: {0}")]
    MissingField(&'static str),
}

/// An attribution result with the data-quality notes of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// When the report was built.
    pub timestamp: DateTime<Utc>,

    /// Data source description.
    pub source: String,

    /// Attribution table.
    pub table: AttributionTable,

    /// Rows dropped while loading, one line each.
    pub dropped_rows: Vec<String>,
}

impl Report {
    /// Create a new report.
    pub fn new(source: String, table: AttributionTable, dropped_rows: Vec<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            source,
            table,
            dropped_rows,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Markdown rendering of the table followed by the dropped rows.
    pub fn to_markdown(&self) -> String {
        let mut output = self.table.to_markdown();
        output.push_str(&format!(
            "\n_Source: {}, generated {}_\n",
            self.source,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if !self.dropped_rows.is_empty() {
            output.push_str(&format!("\n## Dropped rows ({})\n\n", self.dropped_rows.len()));
            for line in &self.dropped_rows {
                output.push_str(&format!("- {line}\n"));
            }
        }
        output
    }
}

/// Collects the parts of a [`Report`].
#[derive(Debug, Default)]
pub struct ReportBuilder {
    source: Option<String>,
    table: Option<AttributionTable>,
    dropped_rows: Vec<String>,
}

impl ReportBuilder {
    /// Start with no table and no dropped rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data source description.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the attribution table.
    pub fn table(mut self, table: AttributionTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Add the rows of a validation report.
    pub fn validation(mut self, report: &ValidationReport) -> Self {
        self.dropped_rows
            .extend(report.dropped().iter().map(ToString::to_string));
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        let table = self.table.ok_or(ReportError::MissingField("table"))?;
        Ok(Report::new(
            self.source.unwrap_or_default(),
            table,
            self.dropped_rows,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::sample_run;
    use brinson_data::{AssetId, DropReason};

    #[test]
    fn builds_report_with_dropped_rows() {
        let mut validation = ValidationReport::new();
        validation.drop_row(
            "benchmark",
            7,
            Some(AssetId::new("Y")),
            DropReason::MissingValue {
                column: "Holdings".to_string(),
            },
        );

        let report = ReportBuilder::new()
            .source("data/")
            .table(AttributionTable::from_run(&sample_run()))
            .validation(&validation)
            .build()
            .unwrap();

        assert_eq!(report.source, "data/");
        assert_eq!(report.dropped_rows.len(), 1);
        assert!(report.dropped_rows[0].contains("benchmark row 7"));

        let markdown = report.to_markdown();
        assert!(markdown.contains("## Dropped rows (1)"));
        assert!(report.to_json().unwrap().contains("\"timestamp\""));
    }

    #[test]
    fn table_is_required() {
        let err = ReportBuilder::new().source("x").build().unwrap_err();
        assert!(matches!(err, ReportError::MissingField("table")));
    }
}
