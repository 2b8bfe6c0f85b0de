//! Per-asset period returns and holding weights.
//!
//! Return of an asset over the period:
//!
//! ```text
//! R = P(end) / P(start) - 1
//! ```
//!
//! Weight of an asset within a holding set, using start-date prices:
//!
//! ```text
//! MV_i = Holdings_i * P_i(start)
//! w_i  = MV_i / Σ MV
//! ```

use brinson_data::{AssetId, HoldingSet, PriceTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Period return per asset.
///
/// Only assets priced on both dates with a usable start price are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    returns: BTreeMap<AssetId, f64>,
}

impl ReturnSeries {
    /// Build a series directly from `(asset, return)` pairs.
    pub fn from_pairs<I, A>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, f64)>,
        A: Into<AssetId>,
    {
        Self {
            returns: pairs.into_iter().map(|(a, r)| (a.into(), r)).collect(),
        }
    }

    /// Return of one asset.
    pub fn get(&self, asset_id: &AssetId) -> Option<f64> {
        self.returns.get(asset_id).copied()
    }

    /// Iterate `(asset, return)` pairs in asset order.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, f64)> {
        self.returns.iter().map(|(id, r)| (id, *r))
    }

    /// Number of assets with a return.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Whether no asset has a return.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// A holding joined to its start-date price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedPosition {
    /// Asset held.
    pub asset_id: AssetId,
    /// Quantity held at period start.
    pub holdings: f64,
    /// Start-date price.
    pub price: f64,
    /// `holdings * price`.
    pub market_value: f64,
}

impl PricedPosition {
    /// Create a priced position.
    pub fn new(asset_id: AssetId, holdings: f64, price: f64) -> Self {
        Self {
            asset_id,
            holdings,
            price,
            market_value: holdings * price,
        }
    }
}

/// A priced position with its share of the holding set's market value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPosition {
    /// The underlying position.
    pub position: PricedPosition,
    /// `market_value / Σ market_value`.
    pub weight: f64,
}

/// Weights of one holding set.
///
/// Empty when nothing in the set is priced or the total market value is zero
/// or not finite; otherwise the weights sum to 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightSeries {
    name: String,
    total_market_value: f64,
    positions: Vec<WeightedPosition>,
}

impl WeightSeries {
    /// Normalise priced positions into weights.
    pub fn from_positions(name: impl Into<String>, positions: Vec<PricedPosition>) -> Self {
        let name = name.into();
        let total: f64 = positions.iter().map(|p| p.market_value).sum();
        if positions.is_empty() || total == 0.0 || !total.is_finite() {
            debug!(set = %name, priced = positions.len(), total, "no usable market value");
            return Self {
                name,
                total_market_value: 0.0,
                positions: Vec::new(),
            };
        }

        let positions = positions
            .into_iter()
            .map(|position| WeightedPosition {
                weight: position.market_value / total,
                position,
            })
            .collect();
        Self {
            name,
            total_market_value: total,
            positions,
        }
    }

    /// Build a series directly from `(asset, weight)` pairs, without
    /// normalising.
    pub fn from_weights<I, A>(name: impl Into<String>, weights: I) -> Self
    where
        I: IntoIterator<Item = (A, f64)>,
        A: Into<AssetId>,
    {
        let positions: Vec<WeightedPosition> = weights
            .into_iter()
            .map(|(asset_id, weight)| WeightedPosition {
                position: PricedPosition::new(asset_id.into(), weight, 1.0),
                weight,
            })
            .collect();
        let total_market_value = positions.iter().map(|p| p.position.market_value).sum();
        Self {
            name: name.into(),
            total_market_value,
            positions,
        }
    }

    /// Holding set name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total start-date market value of the priced holdings.
    pub const fn total_market_value(&self) -> f64 {
        self.total_market_value
    }

    /// Weighted positions.
    pub fn positions(&self) -> &[WeightedPosition] {
        &self.positions
    }

    /// Weight of one asset.
    pub fn get(&self, asset_id: &AssetId) -> Option<f64> {
        self.positions
            .iter()
            .find(|p| &p.position.asset_id == asset_id)
            .map(|p| p.weight)
    }

    /// Iterate `(asset, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, f64)> {
        self.positions.iter().map(|p| (&p.position.asset_id, p.weight))
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> f64 {
        self.positions.iter().map(|p| p.weight).sum()
    }

    /// Number of weighted assets.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Computes returns and weights for one period.
#[derive(Debug, Clone, Copy)]
pub struct ReturnCalculator<'a> {
    prices: &'a PriceTable,
    start: NaiveDate,
    end: NaiveDate,
}

impl<'a> ReturnCalculator<'a> {
    /// Create a calculator over `prices` for the `start`..`end` period.
    pub const fn new(prices: &'a PriceTable, start: NaiveDate, end: NaiveDate) -> Self {
        Self { prices, start, end }
    }

    /// Period start.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Period end.
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns for every asset priced on both dates.
    ///
    /// Assets with a zero or non-finite start price have no defined return
    /// and are left out.
    pub fn returns(&self) -> ReturnSeries {
        let (Some(start), Some(end)) = (
            self.prices.prices_on(self.start),
            self.prices.prices_on(self.end),
        ) else {
            debug!(start = %self.start, end = %self.end, "period date has no prices");
            return ReturnSeries::default();
        };

        let returns: BTreeMap<AssetId, f64> = start
            .iter()
            .filter(|(_, p0)| **p0 != 0.0 && p0.is_finite())
            .filter_map(|(id, p0)| end.get(id).map(|p1| (id.clone(), p1 / p0 - 1.0)))
            .filter(|(_, r)| r.is_finite())
            .collect();

        debug!(
            start = %self.start,
            end = %self.end,
            assets = returns.len(),
            "computed period returns"
        );
        ReturnSeries { returns }
    }

    /// Join holdings to start-date prices. Holdings without a start price are
    /// left out.
    pub fn priced_positions(&self, holdings: &HoldingSet) -> Vec<PricedPosition> {
        let Some(start) = self.prices.prices_on(self.start) else {
            return Vec::new();
        };
        holdings
            .iter()
            .filter_map(|(id, quantity)| {
                start
                    .get(id)
                    .map(|price| PricedPosition::new(id.clone(), quantity, *price))
            })
            .collect()
    }

    /// Start-date weights of a holding set.
    pub fn weights(&self, holdings: &HoldingSet) -> WeightSeries {
        let positions = self.priced_positions(holdings);
        let unpriced = holdings.len() - positions.len();
        if unpriced > 0 {
            debug!(set = holdings.name(), unpriced, "holdings without a start price");
        }
        WeightSeries::from_positions(holdings.name(), positions)
    }
}
