//! Attribution table for display.
//!
//! Holds the raw fractions of a [`BrinsonAttribution`] keyed by group label,
//! and renders them as percentages: weights and returns with two decimals,
//! effects with four.

use crate::format::{effect_percent, weight_percent};
use brinson_engine::{AttributionRun, BrinsonAttribution, GroupAttribution};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column headers after the group column.
pub const VALUE_COLUMNS: [&str; 8] = [
    "w_p",
    "w_b",
    "r_p",
    "r_b",
    "Allocation",
    "Selection",
    "Interaction",
    "Total Alpha",
];

/// Label of the totals row.
pub const TOTAL_LABEL: &str = "Total";

/// Portfolio return, benchmark return and alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadlineMetrics {
    /// Portfolio (fund) return.
    pub fund_return: f64,
    /// Benchmark return.
    pub benchmark_return: f64,
    /// Fund return minus benchmark return.
    pub alpha: f64,
}

impl HeadlineMetrics {
    /// Headline figures of an attribution.
    pub const fn from_attribution(attribution: &BrinsonAttribution) -> Self {
        Self {
            fund_return: attribution.portfolio_return,
            benchmark_return: attribution.benchmark_return,
            alpha: attribution.alpha,
        }
    }
}

impl fmt::Display for HeadlineMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fund Return: {}  Benchmark Return: {}  Alpha: {}",
            weight_percent(self.fund_return),
            weight_percent(self.benchmark_return),
            weight_percent(self.alpha)
        )
    }
}

/// One group's row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionRow {
    /// Group label.
    pub group: String,
    /// Portfolio weight.
    pub w_p: f64,
    /// Benchmark weight.
    pub w_b: f64,
    /// Portfolio return within the group.
    pub r_p: f64,
    /// Benchmark return within the group.
    pub r_b: f64,
    /// Allocation effect.
    pub allocation: f64,
    /// Selection effect.
    pub selection: f64,
    /// Interaction effect.
    pub interaction: f64,
    /// Total alpha.
    pub total_alpha: f64,
}

impl AttributionRow {
    fn from_group(group: &GroupAttribution) -> Self {
        Self {
            group: group.group.label().to_string(),
            w_p: group.portfolio_weight,
            w_b: group.benchmark_weight,
            r_p: group.portfolio_return,
            r_b: group.benchmark_return,
            allocation: group.allocation,
            selection: group.selection,
            interaction: group.interaction,
            total_alpha: group.total_alpha,
        }
    }

    /// Cells formatted as percentages, in [`VALUE_COLUMNS`] order.
    pub fn formatted(&self) -> [String; 8] {
        [
            weight_percent(self.w_p),
            weight_percent(self.w_b),
            weight_percent(self.r_p),
            weight_percent(self.r_b),
            effect_percent(self.allocation),
            effect_percent(self.selection),
            effect_percent(self.interaction),
            effect_percent(self.total_alpha),
        ]
    }
}

/// Table of group attribution for one fund, benchmark and classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionTable {
    /// Fund name.
    pub fund: String,
    /// Benchmark name.
    pub benchmark: String,
    /// Classification dimension.
    pub dimension: String,
    /// Period start.
    pub period_start: NaiveDate,
    /// Period end.
    pub period_end: NaiveDate,
    /// Headline figures.
    pub headline: HeadlineMetrics,
    /// Group rows, sorted by group.
    pub rows: Vec<AttributionRow>,
    /// Column totals. Weights and returns are summed weights and
    /// contribution-weighted returns.
    pub totals: AttributionRow,
}

impl AttributionTable {
    /// Build the table from a finished run.
    pub fn from_run(run: &AttributionRun) -> Self {
        let attribution = &run.attribution;
        let rows: Vec<AttributionRow> = attribution
            .groups
            .iter()
            .map(AttributionRow::from_group)
            .collect();
        let effects = attribution.effect_totals();

        let totals = AttributionRow {
            group: TOTAL_LABEL.to_string(),
            w_p: rows.iter().map(|r| r.w_p).sum(),
            w_b: rows.iter().map(|r| r.w_b).sum(),
            r_p: attribution.portfolio_return,
            r_b: attribution.benchmark_return,
            allocation: effects.allocation,
            selection: effects.selection,
            interaction: effects.interaction,
            total_alpha: effects.total_alpha,
        };

        Self {
            fund: run.portfolio_weights.name().to_string(),
            benchmark: run.benchmark_weights.name().to_string(),
            dimension: attribution.dimension.clone(),
            period_start: run.start,
            period_end: run.end,
            headline: HeadlineMetrics::from_attribution(attribution),
            rows,
            totals,
        }
    }

    /// Row of one group label.
    pub fn row(&self, group: &str) -> Option<&AttributionRow> {
        self.rows.iter().find(|r| r.group == group)
    }

    /// Group labels in row order.
    pub fn groups(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.group.as_str()).collect()
    }

    fn group_width(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.group.chars().count())
            .chain([self.dimension.chars().count(), TOTAL_LABEL.len()])
            .max()
            .unwrap_or(0)
            .max(12)
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let gw = self.group_width();
        let width = gw + VALUE_COLUMNS.len() * 13;
        let mut output = String::new();

        output.push_str(&format!(
            "\nBrinson Attribution: {} vs {} by {}\n",
            self.fund, self.benchmark, self.dimension
        ));
        output.push_str(&format!(
            "Period: {} to {}\n",
            self.period_start, self.period_end
        ));
        output.push_str(&format!("{}\n", self.headline));
        output.push_str(&"=".repeat(width));
        output.push('\n');

        output.push_str(&format!("{:<gw$}", self.dimension));
        for column in VALUE_COLUMNS {
            output.push_str(&format!(" {column:>12}"));
        }
        output.push('\n');
        output.push_str(&"-".repeat(width));
        output.push('\n');

        for row in &self.rows {
            push_ascii_row(&mut output, row, gw);
        }

        output.push_str(&"-".repeat(width));
        output.push('\n');
        push_ascii_row(&mut output, &self.totals, gw);
        output.push_str(&"=".repeat(width));
        output.push('\n');

        output
    }

    /// Format as Markdown table for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "# Brinson Attribution: {} vs {}\n\n",
            self.fund, self.benchmark
        ));
        output.push_str(&format!(
            "**Period:** {} to {}  \n**Attribute:** {}\n\n",
            self.period_start, self.period_end, self.dimension
        ));
        output.push_str(&format!(
            "- **Fund Return:** {}\n- **Benchmark Return:** {}\n- **Alpha:** {}\n\n",
            weight_percent(self.headline.fund_return),
            weight_percent(self.headline.benchmark_return),
            weight_percent(self.headline.alpha)
        ));

        output.push_str(&format!("| {} | {} |\n", self.dimension, VALUE_COLUMNS.join(" | ")));
        output.push_str(&format!("|---{}|\n", "|---:".repeat(VALUE_COLUMNS.len())));
        for row in self.rows.iter().chain(std::iter::once(&self.totals)) {
            output.push_str(&format!("| {} | {} |\n", row.group, row.formatted().join(" | ")));
        }

        output
    }
}

fn push_ascii_row(output: &mut String, row: &AttributionRow, gw: usize) {
    output.push_str(&format!("{:<gw$}", row.group));
    for cell in row.formatted() {
        output.push_str(&format!(" {cell:>12}"));
    }
    output.push('\n');
}

impl fmt::Display for AttributionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Attribution for {} vs {} by {} ({} to {}):",
            self.fund, self.benchmark, self.dimension, self.period_start, self.period_end
        )?;
        writeln!(f, "  {}", self.headline)?;
        for row in &self.rows {
            writeln!(
                f,
                "  {}: allocation {}, selection {}, interaction {}, total {}",
                row.group,
                effect_percent(row.allocation),
                effect_percent(row.selection),
                effect_percent(row.interaction),
                effect_percent(row.total_alpha)
            )?;
        }
        Ok(())
    }
}
