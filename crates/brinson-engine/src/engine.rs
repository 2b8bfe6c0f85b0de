//! One-shot attribution pipeline.

use crate::aggregate::{GroupAggregator, JoinedAsset};
use crate::attribution::BrinsonAttribution;
use crate::returns::{ReturnCalculator, ReturnSeries, WeightSeries};
use brinson_data::{Classification, HoldingSet, PriceTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything one attribution pass reads.
#[derive(Debug, Clone, Copy)]
pub struct AttributionInput<'a> {
    /// Asset prices.
    pub prices: &'a PriceTable,
    /// Classification to group by.
    pub classification: &'a Classification,
    /// Portfolio holdings at period start.
    pub portfolio: &'a HoldingSet,
    /// Benchmark holdings at period start.
    pub benchmark: &'a HoldingSet,
    /// Period start.
    pub start: NaiveDate,
    /// Period end.
    pub end: NaiveDate,
}

/// Output of one attribution pass, with the intermediate series kept for
/// drill-down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionRun {
    /// Period start.
    pub start: NaiveDate,
    /// Period end.
    pub end: NaiveDate,
    /// Per-asset period returns.
    pub returns: ReturnSeries,
    /// Portfolio weights.
    pub portfolio_weights: WeightSeries,
    /// Benchmark weights.
    pub benchmark_weights: WeightSeries,
    /// Joined per-asset rows.
    pub assets: Vec<JoinedAsset>,
    /// Group attribution and totals.
    pub attribution: BrinsonAttribution,
}

/// Runs returns, weights, aggregation and decomposition in sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributionEngine;

impl AttributionEngine {
    /// Create an engine.
    pub const fn new() -> Self {
        Self
    }

    /// Compute the attribution. Every stage is total, so this cannot fail.
    pub fn run(&self, input: &AttributionInput<'_>) -> AttributionRun {
        let calculator = ReturnCalculator::new(input.prices, input.start, input.end);
        let returns = calculator.returns();
        let portfolio_weights = calculator.weights(input.portfolio);
        let benchmark_weights = calculator.weights(input.benchmark);

        let aggregator = GroupAggregator::new(input.classification);
        let assets = aggregator.join(&portfolio_weights, &benchmark_weights, &returns);
        let exposures = aggregator.aggregate(&assets);
        let attribution =
            BrinsonAttribution::from_exposures(input.classification.dimension(), &exposures);

        debug!(
            portfolio = input.portfolio.name(),
            dimension = input.classification.dimension(),
            groups = attribution.groups.len(),
            alpha = attribution.alpha,
            "attribution complete"
        );

        AttributionRun {
            start: input.start,
            end: input.end,
            returns,
            portfolio_weights,
            benchmark_weights,
            assets,
            attribution,
        }
    }
}
