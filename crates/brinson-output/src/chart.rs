//! Grouped bar-chart series of the attribution effects.

use crate::format::effect_percent;
use crate::table::{AttributionRow, AttributionTable};
use serde::{Deserialize, Serialize};

/// One named series, one value per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Series name.
    pub name: String,
    /// Values in category order.
    pub values: Vec<f64>,
}

/// Grouped bar chart: Allocation, Selection and Interaction per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    /// Chart title.
    pub title: String,
    /// X-axis categories (group labels).
    pub categories: Vec<String>,
    /// One series per effect.
    pub series: Vec<ChartSeries>,
}

impl BarChart {
    /// Effect series of an attribution table.
    pub fn from_table(table: &AttributionTable) -> Self {
        let series = |name: &str, value: fn(&AttributionRow) -> f64| ChartSeries {
            name: name.to_string(),
            values: table.rows.iter().map(value).collect(),
        };
        Self {
            title: format!("Attribution by {}", table.dimension),
            categories: table.rows.iter().map(|r| r.group.clone()).collect(),
            series: vec![
                series("Allocation", |r: &AttributionRow| r.allocation),
                series("Selection", |r: &AttributionRow| r.selection),
                series("Interaction", |r: &AttributionRow| r.interaction),
            ],
        }
    }

    /// Largest absolute value across all series.
    pub fn max_abs(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Render horizontal bars, `width` characters for the largest value.
    ///
    /// Positive values draw `#` to the right of the axis, negative values `-`
    /// to the left.
    pub fn render_ascii(&self, width: usize) -> String {
        let max = self.max_abs();
        let label_width = self
            .categories
            .iter()
            .map(|c| c.chars().count())
            .max()
            .unwrap_or(0);
        let series_width = self
            .series
            .iter()
            .map(|s| s.name.len())
            .max()
            .unwrap_or(0);

        let mut output = String::new();
        output.push_str(&format!("\n{}\n", self.title));
        output.push_str(&"=".repeat(label_width + series_width + 2 * width + 16));
        output.push('\n');

        for (i, category) in self.categories.iter().enumerate() {
            for (j, series) in self.series.iter().enumerate() {
                let value = series.values.get(i).copied().unwrap_or(0.0);
                let len = if max > 0.0 {
                    ((value.abs() / max) * width as f64).round() as usize
                } else {
                    0
                };
                let (left, right) = if value < 0.0 {
                    ("-".repeat(len), String::new())
                } else {
                    (String::new(), "#".repeat(len))
                };
                let label = if j == 0 { category.as_str() } else { "" };
                output.push_str(&format!(
                    "{label:<label_width$} {:<series_width$} {left:>width$}|{right:<width$} {}\n",
                    series.name,
                    effect_percent(value)
                ));
            }
        }

        output
    }
}
