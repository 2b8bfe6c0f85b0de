#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/brinson/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chart;
pub mod export;
pub mod format;
pub mod frame;
pub mod report;
pub mod table;

pub use chart::{BarChart, ChartSeries};
pub use export::{AssetRow, ExportError, ExportFormat, Exporter, asset_rows};
pub use format::{effect_percent, percent, weight_percent};
pub use frame::assets_dataframe;
pub use report::{Report, ReportBuilder, ReportError};
pub use table::{AttributionRow, AttributionTable, HeadlineMetrics};
