#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/brinson/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aggregate;
pub mod attribution;
pub mod engine;
pub mod returns;

// Re-export main types
pub use aggregate::{GroupAggregator, GroupExposure, JoinedAsset};
pub use attribution::{BrinsonAttribution, EffectTotals, GroupAttribution};
pub use engine::{AttributionEngine, AttributionInput, AttributionRun};
pub use returns::{PricedPosition, ReturnCalculator, ReturnSeries, WeightSeries, WeightedPosition};
