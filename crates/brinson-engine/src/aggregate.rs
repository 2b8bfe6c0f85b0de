//! Grouping of per-asset weights and returns by classification.

use crate::returns::{ReturnSeries, WeightSeries};
use brinson_data::{AssetId, Classification, GroupKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One asset after the outer join of classification, weights and returns.
///
/// Values absent from an input are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedAsset {
    /// Asset.
    pub asset_id: AssetId,
    /// Group under the chosen classification.
    pub group: GroupKey,
    /// Portfolio weight.
    pub portfolio_weight: f64,
    /// Benchmark weight.
    pub benchmark_weight: f64,
    /// Period return.
    pub asset_return: f64,
}

impl JoinedAsset {
    /// `w_p * R`.
    pub fn portfolio_contribution(&self) -> f64 {
        self.portfolio_weight * self.asset_return
    }

    /// `w_b * R`.
    pub fn benchmark_contribution(&self) -> f64 {
        self.benchmark_weight * self.asset_return
    }
}

/// Weights and weighted-average returns of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupExposure {
    /// Group.
    pub group: GroupKey,
    /// `Σ w_p` over the group.
    pub portfolio_weight: f64,
    /// `Σ w_b` over the group.
    pub benchmark_weight: f64,
    /// `Σ(w_p·R) / Σ w_p`, or 0 when the group has no portfolio weight.
    pub portfolio_return: f64,
    /// `Σ(w_b·R) / Σ w_b`, or 0 when the group has no benchmark weight.
    pub benchmark_return: f64,
    /// Number of joined assets in the group.
    pub assets: usize,
}

#[derive(Debug, Default)]
struct GroupSums {
    portfolio_weight: f64,
    benchmark_weight: f64,
    portfolio_weighted_return: f64,
    benchmark_weighted_return: f64,
    assets: usize,
}

fn weighted_average(weighted_sum: f64, weight: f64) -> f64 {
    if weight == 0.0 {
        0.0
    } else {
        weighted_sum / weight
    }
}

/// Joins per-asset data under one classification and reduces it per group.
#[derive(Debug, Clone, Copy)]
pub struct GroupAggregator<'a> {
    classification: &'a Classification,
}

impl<'a> GroupAggregator<'a> {
    /// Create an aggregator for a classification.
    pub const fn new(classification: &'a Classification) -> Self {
        Self { classification }
    }

    /// Outer-join the classification, both weight series and the return
    /// series by asset.
    ///
    /// Every asset appearing in any input is present exactly once, in asset
    /// order. Classified assets with no holding and no return still appear
    /// with all-zero values.
    pub fn join(
        &self,
        portfolio: &WeightSeries,
        benchmark: &WeightSeries,
        returns: &ReturnSeries,
    ) -> Vec<JoinedAsset> {
        let portfolio: BTreeMap<&AssetId, f64> = portfolio.iter().collect();
        let benchmark: BTreeMap<&AssetId, f64> = benchmark.iter().collect();

        let assets: BTreeSet<&AssetId> = self
            .classification
            .iter()
            .map(|(id, _)| id)
            .chain(portfolio.keys().copied())
            .chain(benchmark.keys().copied())
            .chain(returns.iter().map(|(id, _)| id))
            .collect();

        assets
            .into_iter()
            .map(|id| JoinedAsset {
                asset_id: id.clone(),
                group: self.classification.group_of(id),
                portfolio_weight: portfolio.get(id).copied().unwrap_or(0.0),
                benchmark_weight: benchmark.get(id).copied().unwrap_or(0.0),
                asset_return: returns.get(id).unwrap_or(0.0),
            })
            .collect()
    }

    /// Reduce joined assets to one exposure per group, sorted by group key.
    pub fn aggregate(&self, joined: &[JoinedAsset]) -> Vec<GroupExposure> {
        let mut sums: BTreeMap<&GroupKey, GroupSums> = BTreeMap::new();
        for asset in joined {
            let entry = sums.entry(&asset.group).or_default();
            entry.portfolio_weight += asset.portfolio_weight;
            entry.benchmark_weight += asset.benchmark_weight;
            entry.portfolio_weighted_return += asset.portfolio_contribution();
            entry.benchmark_weighted_return += asset.benchmark_contribution();
            entry.assets += 1;
        }

        let exposures: Vec<GroupExposure> = sums
            .into_iter()
            .map(|(group, s)| GroupExposure {
                group: group.clone(),
                portfolio_weight: s.portfolio_weight,
                benchmark_weight: s.benchmark_weight,
                portfolio_return: weighted_average(s.portfolio_weighted_return, s.portfolio_weight),
                benchmark_return: weighted_average(s.benchmark_weighted_return, s.benchmark_weight),
                assets: s.assets,
            })
            .collect();

        debug!(
            dimension = self.classification.dimension(),
            assets = joined.len(),
            groups = exposures.len(),
            "aggregated group exposures"
        );
        exposures
    }

    /// [`GroupAggregator::join`] followed by [`GroupAggregator::aggregate`].
    pub fn exposures(
        &self,
        portfolio: &WeightSeries,
        benchmark: &WeightSeries,
        returns: &ReturnSeries,
    ) -> Vec<GroupExposure> {
        self.aggregate(&self.join(portfolio, benchmark, returns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn classification() -> Classification {
        Classification::from_pairs("Sector", [("X", "A"), ("Y", "B"), ("Z", "A")])
    }

    #[test]
    fn outer_join_zero_fills() {
        let classification = classification();
        let aggregator = GroupAggregator::new(&classification);
        let portfolio = WeightSeries::from_weights("Fund A", [("X", 1.0)]);
        let benchmark = WeightSeries::from_weights("Benchmark", [("Y", 0.5), ("Q", 0.5)]);
        let returns = ReturnSeries::from_pairs([("X", 0.1), ("Y", -0.1)]);

        let joined = aggregator.join(&portfolio, &benchmark, &returns);
        let ids: Vec<&str> = joined.iter().map(|a| a.asset_id.as_str()).collect();
        assert_eq!(ids, vec!["Q", "X", "Y", "Z"]);

        let q = &joined[0];
        assert_eq!(q.group, GroupKey::Unclassified);
        assert_eq!(q.portfolio_weight, 0.0);
        assert_eq!(q.asset_return, 0.0);

        let z = &joined[3];
        assert_eq!(z.group, GroupKey::from("A"));
        assert_eq!(
            (z.portfolio_weight, z.benchmark_weight, z.asset_return),
            (0.0, 0.0, 0.0)
        );
    }

    #[test]
    fn group_returns_are_weight_averaged() {
        let classification = classification();
        let aggregator = GroupAggregator::new(&classification);
        let portfolio = WeightSeries::from_weights("Fund A", [("X", 0.3), ("Z", 0.1), ("Y", 0.6)]);
        let benchmark = WeightSeries::from_weights("Benchmark", [("X", 0.5), ("Y", 0.5)]);
        let returns = ReturnSeries::from_pairs([("X", 0.10), ("Z", 0.30), ("Y", 0.05)]);

        let groups = aggregator.exposures(&portfolio, &benchmark, &returns);
        assert_eq!(groups.len(), 2);

        let a = &groups[0];
        assert_eq!(a.group, GroupKey::from("A"));
        assert_eq!(a.assets, 2);
        assert_relative_eq!(a.portfolio_weight, 0.4, epsilon = 1e-12);
        assert_relative_eq!(a.portfolio_return, (0.03 + 0.03) / 0.4, epsilon = 1e-12);
        assert_relative_eq!(a.benchmark_weight, 0.5, epsilon = 1e-12);
        assert_relative_eq!(a.benchmark_return, 0.10, epsilon = 1e-12);
    }

    #[test]
    fn empty_side_reports_zero_return() {
        let classification = classification();
        let aggregator = GroupAggregator::new(&classification);
        let portfolio = WeightSeries::from_weights("Fund A", [("X", 1.0)]);
        let benchmark = WeightSeries::default();
        let returns = ReturnSeries::from_pairs([("X", 0.2), ("Y", 0.4)]);

        let groups = aggregator.exposures(&portfolio, &benchmark, &returns);
        let b = groups.iter().find(|g| g.group == GroupKey::from("B")).unwrap();
        assert_eq!(b.portfolio_weight, 0.0);
        assert_eq!(b.portfolio_return, 0.0);
        assert_eq!(b.benchmark_return, 0.0);
        assert!(groups.iter().all(|g| g.benchmark_return == 0.0));
    }

    #[test]
    fn unclassified_group_sorts_last() {
        let classification = classification();
        let aggregator = GroupAggregator::new(&classification);
        let portfolio = WeightSeries::from_weights("Fund A", [("Q", 0.5), ("X", 0.5)]);

        let groups =
            aggregator.exposures(&portfolio, &WeightSeries::default(), &ReturnSeries::default());
        let keys: Vec<&str> = groups.iter().map(|g| g.group.label()).collect();
        assert_eq!(keys, vec!["A", "B", "(unclassified)"]);
    }
}
