//! Brinson-Fachler decomposition.
//!
//! For each group with portfolio weight `w_p`, benchmark weight `w_b`,
//! portfolio return `r_p` and benchmark return `r_b`:
//!
//! ```text
//! Allocation  = (w_p - w_b) * r_b
//! Selection   = w_b * (r_p - r_b)
//! Interaction = (w_p - w_b) * (r_p - r_b)
//! Total Alpha = Allocation + Selection + Interaction = w_p*r_p - w_b*r_b
//! ```
//!
//! Summed over groups, Total Alpha equals the headline alpha
//! `Σ w_p*r_p - Σ w_b*r_b`.

use crate::aggregate::GroupExposure;
use brinson_data::GroupKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribution effects of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAttribution {
    /// Group.
    pub group: GroupKey,
    /// Portfolio weight `w_p`.
    pub portfolio_weight: f64,
    /// Benchmark weight `w_b`.
    pub benchmark_weight: f64,
    /// Portfolio return within the group `r_p`.
    pub portfolio_return: f64,
    /// Benchmark return within the group `r_b`.
    pub benchmark_return: f64,
    /// Allocation effect.
    pub allocation: f64,
    /// Selection effect.
    pub selection: f64,
    /// Interaction effect.
    pub interaction: f64,
    /// Sum of the three effects.
    pub total_alpha: f64,
}

impl GroupAttribution {
    /// Decompose one group.
    pub fn from_exposure(exposure: &GroupExposure) -> Self {
        let active_weight = exposure.portfolio_weight - exposure.benchmark_weight;
        let active_return = exposure.portfolio_return - exposure.benchmark_return;

        let allocation = active_weight * exposure.benchmark_return;
        let selection = exposure.benchmark_weight * active_return;
        let interaction = active_weight * active_return;

        Self {
            group: exposure.group.clone(),
            portfolio_weight: exposure.portfolio_weight,
            benchmark_weight: exposure.benchmark_weight,
            portfolio_return: exposure.portfolio_return,
            benchmark_return: exposure.benchmark_return,
            allocation,
            selection,
            interaction,
            total_alpha: allocation + selection + interaction,
        }
    }

    /// `w_p - w_b`.
    pub fn active_weight(&self) -> f64 {
        self.portfolio_weight - self.benchmark_weight
    }

    /// `w_p * r_p`.
    pub fn portfolio_contribution(&self) -> f64 {
        self.portfolio_weight * self.portfolio_return
    }

    /// `w_b * r_b`.
    pub fn benchmark_contribution(&self) -> f64 {
        self.benchmark_weight * self.benchmark_return
    }
}

impl fmt::Display for GroupAttribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: alloc {:.4}%, select {:.4}%, interact {:.4}%, total {:.4}%",
            self.group,
            self.allocation * 100.0,
            self.selection * 100.0,
            self.interaction * 100.0,
            self.total_alpha * 100.0
        )
    }
}

/// Column sums of the effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectTotals {
    /// Total allocation effect.
    pub allocation: f64,
    /// Total selection effect.
    pub selection: f64,
    /// Total interaction effect.
    pub interaction: f64,
    /// Total alpha.
    pub total_alpha: f64,
}

/// Attribution of one portfolio against one benchmark under one
/// classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrinsonAttribution {
    /// Classification dimension.
    pub dimension: String,
    /// Per-group effects, sorted by group.
    pub groups: Vec<GroupAttribution>,
    /// `Σ w_p * r_p`.
    pub portfolio_return: f64,
    /// `Σ w_b * r_b`.
    pub benchmark_return: f64,
    /// `portfolio_return - benchmark_return`.
    pub alpha: f64,
}

impl BrinsonAttribution {
    /// Decompose every group and compute the headline totals.
    pub fn from_exposures(dimension: impl Into<String>, exposures: &[GroupExposure]) -> Self {
        let groups: Vec<GroupAttribution> =
            exposures.iter().map(GroupAttribution::from_exposure).collect();
        let portfolio_return = groups.iter().map(GroupAttribution::portfolio_contribution).sum();
        let benchmark_return = groups.iter().map(GroupAttribution::benchmark_contribution).sum();

        Self {
            dimension: dimension.into(),
            groups,
            portfolio_return,
            benchmark_return,
            alpha: portfolio_return - benchmark_return,
        }
    }

    /// Effects of one group.
    pub fn group(&self, group: &GroupKey) -> Option<&GroupAttribution> {
        self.groups.iter().find(|g| &g.group == group)
    }

    /// Sums of the effect columns.
    pub fn effect_totals(&self) -> EffectTotals {
        self.groups.iter().fold(EffectTotals::default(), |acc, g| EffectTotals {
            allocation: acc.allocation + g.allocation,
            selection: acc.selection + g.selection,
            interaction: acc.interaction + g.interaction,
            total_alpha: acc.total_alpha + g.total_alpha,
        })
    }

    /// Difference between the summed group alphas and the headline alpha.
    pub fn residual(&self) -> f64 {
        self.effect_totals().total_alpha - self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn exposure(group: &str, w_p: f64, w_b: f64, r_p: f64, r_b: f64) -> GroupExposure {
        GroupExposure {
            group: GroupKey::from(group),
            portfolio_weight: w_p,
            benchmark_weight: w_b,
            portfolio_return: r_p,
            benchmark_return: r_b,
            assets: 1,
        }
    }

    #[rstest]
    #[case(0.6, 0.4, 0.10, 0.10, 0.02, 0.0, 0.0)]
    #[case(0.3, 0.5, 0.12, 0.08, -0.016, 0.02, -0.008)]
    #[case(0.0, 0.2, 0.0, 0.05, -0.01, -0.01, 0.01)]
    fn group_effects(
        #[case] w_p: f64,
        #[case] w_b: f64,
        #[case] r_p: f64,
        #[case] r_b: f64,
        #[case] allocation: f64,
        #[case] selection: f64,
        #[case] interaction: f64,
    ) {
        let g = GroupAttribution::from_exposure(&exposure("A", w_p, w_b, r_p, r_b));

        assert_relative_eq!(g.allocation, allocation, epsilon = 1e-12);
        assert_relative_eq!(g.selection, selection, epsilon = 1e-12);
        assert_relative_eq!(g.interaction, interaction, epsilon = 1e-12);
        assert_relative_eq!(
            g.total_alpha,
            g.portfolio_contribution() - g.benchmark_contribution(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn totals_and_lookup() {
        let attribution = BrinsonAttribution::from_exposures(
            "Sector",
            &[
                exposure("A", 0.6, 0.4, 0.10, 0.10),
                exposure("B", 0.4, 0.6, -0.10, -0.10),
            ],
        );

        assert_relative_eq!(attribution.portfolio_return, 0.02, epsilon = 1e-12);
        assert_relative_eq!(attribution.benchmark_return, -0.02, epsilon = 1e-12);
        assert_relative_eq!(attribution.alpha, 0.04, epsilon = 1e-12);
        assert_relative_eq!(attribution.effect_totals().allocation, 0.04, epsilon = 1e-12);
        assert!(attribution.residual().abs() < 1e-12);

        let b = attribution.group(&GroupKey::from("B")).unwrap();
        assert_relative_eq!(b.active_weight(), -0.2, epsilon = 1e-12);
        assert!(attribution.group(&GroupKey::Unclassified).is_none());
    }

    #[test]
    fn empty_table_is_all_zero() {
        let attribution = BrinsonAttribution::from_exposures("Sector", &[]);
        assert!(attribution.groups.is_empty());
        assert_eq!(attribution.alpha, 0.0);
        assert_eq!(attribution.effect_totals(), EffectTotals::default());
    }
}
