//! Integration tests for attribution invariants

use approx::assert_relative_eq;
use brinson_data::{AssetId, Classification, GroupKey, HoldingSet, PriceTable};
use brinson_engine::{AttributionEngine, AttributionInput, AttributionRun, ReturnCalculator};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TOLERANCE: f64 = 1e-9;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
}

fn end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn run(
    prices: &PriceTable,
    classification: &Classification,
    portfolio: &HoldingSet,
    benchmark: &HoldingSet,
) -> AttributionRun {
    AttributionEngine::new().run(&AttributionInput {
        prices,
        classification,
        portfolio,
        benchmark,
        start: start(),
        end: end(),
    })
}

/// X: group A, 100 -> 110. Y: group B, 50 -> 45.
fn two_asset_prices() -> PriceTable {
    let mut prices = PriceTable::new();
    prices.insert(start(), AssetId::new("X"), 100.0).unwrap();
    prices.insert(end(), AssetId::new("X"), 110.0).unwrap();
    prices.insert(start(), AssetId::new("Y"), 50.0).unwrap();
    prices.insert(end(), AssetId::new("Y"), 45.0).unwrap();
    prices
}

#[test]
fn test_two_asset_two_group_scenario() {
    let prices = two_asset_prices();
    let classification = Classification::from_pairs("Sector", [("X", "A"), ("Y", "B")]);
    // Market values 600/400 and 400/600
    let portfolio = HoldingSet::from_pairs("Fund A", [("X", 6.0), ("Y", 8.0)]);
    let benchmark = HoldingSet::from_pairs("Benchmark", [("X", 4.0), ("Y", 12.0)]);

    let result = run(&prices, &classification, &portfolio, &benchmark);

    assert_relative_eq!(result.returns.get(&"X".into()).unwrap(), 0.10, epsilon = TOLERANCE);
    assert_relative_eq!(result.returns.get(&"Y".into()).unwrap(), -0.10, epsilon = TOLERANCE);

    let attribution = &result.attribution;
    assert_eq!(attribution.groups.len(), 2);

    let a = attribution.group(&GroupKey::from("A")).unwrap();
    assert_relative_eq!(a.portfolio_weight, 0.6, epsilon = TOLERANCE);
    assert_relative_eq!(a.benchmark_weight, 0.4, epsilon = TOLERANCE);
    assert_relative_eq!(a.portfolio_return, 0.10, epsilon = TOLERANCE);
    assert_relative_eq!(a.benchmark_return, 0.10, epsilon = TOLERANCE);
    assert_relative_eq!(a.allocation, 0.02, epsilon = TOLERANCE);
    assert_relative_eq!(a.selection, 0.0, epsilon = TOLERANCE);
    assert_relative_eq!(a.interaction, 0.0, epsilon = TOLERANCE);
    assert_relative_eq!(a.total_alpha, 0.02, epsilon = TOLERANCE);

    let b = attribution.group(&GroupKey::from("B")).unwrap();
    assert_relative_eq!(b.portfolio_weight, 0.4, epsilon = TOLERANCE);
    assert_relative_eq!(b.benchmark_weight, 0.6, epsilon = TOLERANCE);
    assert_relative_eq!(b.portfolio_return, -0.10, epsilon = TOLERANCE);
    assert_relative_eq!(b.benchmark_return, -0.10, epsilon = TOLERANCE);
    assert_relative_eq!(b.allocation, 0.02, epsilon = TOLERANCE);
    assert_relative_eq!(b.total_alpha, 0.02, epsilon = TOLERANCE);

    assert_relative_eq!(attribution.portfolio_return, 0.02, epsilon = TOLERANCE);
    assert_relative_eq!(attribution.benchmark_return, -0.02, epsilon = TOLERANCE);
    assert_relative_eq!(attribution.alpha, 0.04, epsilon = TOLERANCE);
    assert_relative_eq!(attribution.effect_totals().total_alpha, 0.04, epsilon = TOLERANCE);
}

#[test]
fn test_asset_missing_from_benchmark() {
    let prices = two_asset_prices();
    let classification = Classification::from_pairs("Sector", [("X", "A"), ("Y", "B")]);
    let portfolio = HoldingSet::from_pairs("Fund A", [("X", 6.0), ("Y", 8.0)]);
    let benchmark = HoldingSet::from_pairs("Benchmark", [("X", 4.0)]);

    let result = run(&prices, &classification, &portfolio, &benchmark);

    assert_relative_eq!(result.benchmark_weights.total_weight(), 1.0, epsilon = TOLERANCE);
    let b = result.attribution.group(&GroupKey::from("B")).unwrap();
    assert_eq!(b.benchmark_weight, 0.0);
    assert_eq!(b.benchmark_return, 0.0);
    assert!(result.attribution.residual().abs() < TOLERANCE);
}

#[test]
fn test_unpriced_benchmark_is_all_zero() {
    let prices = two_asset_prices();
    let classification = Classification::from_pairs("Sector", [("X", "A"), ("Y", "B")]);
    let portfolio = HoldingSet::from_pairs("Fund A", [("X", 1.0)]);
    let benchmark = HoldingSet::from_pairs("Benchmark", [("Q", 1.0)]);

    let result = run(&prices, &classification, &portfolio, &benchmark);

    assert!(result.benchmark_weights.is_empty());
    for group in &result.attribution.groups {
        assert_eq!(group.benchmark_weight, 0.0);
        assert_eq!(group.benchmark_return, 0.0);
    }
    assert_relative_eq!(result.attribution.alpha, 0.10, epsilon = TOLERANCE);
}

struct Universe {
    prices: PriceTable,
    sector: Classification,
    region: Classification,
    portfolio: HoldingSet,
    benchmark: HoldingSet,
}

fn random_universe(seed: u64) -> Universe {
    let mut rng = StdRng::seed_from_u64(seed);
    let sectors = ["Energy", "Financials", "Health", "Tech"];
    let regions = ["EU", "JP", "US"];

    let mut prices = PriceTable::new();
    let mut sector = Vec::new();
    let mut region = Vec::new();
    let mut portfolio = Vec::new();
    let mut benchmark = Vec::new();

    for i in 0..40 {
        let id = format!("A{i:03}");
        let p0: f64 = rng.gen_range(5.0..500.0);
        prices.insert(start(), AssetId::new(id.as_str()), p0).unwrap();
        // Some assets have no end price and so no return
        if rng.gen_bool(0.9) {
            let p1 = p0 * rng.gen_range(0.5..1.8);
            prices.insert(end(), AssetId::new(id.as_str()), p1).unwrap();
        }
        // Some assets are unclassified under one dimension
        if rng.gen_bool(0.9) {
            sector.push((id.clone(), sectors[rng.gen_range(0..sectors.len())]));
        }
        region.push((id.clone(), regions[rng.gen_range(0..regions.len())]));
        if rng.gen_bool(0.6) {
            portfolio.push((id.clone(), rng.gen_range(1.0..1_000.0)));
        }
        if rng.gen_bool(0.8) {
            benchmark.push((id, rng.gen_range(1.0..1_000.0)));
        }
    }
    // Held but never priced
    portfolio.push(("UNPRICED".to_string(), 50.0));

    Universe {
        prices,
        sector: Classification::from_pairs("Sector", sector),
        region: Classification::from_pairs("Region", region),
        portfolio: HoldingSet::from_pairs("Fund A", portfolio),
        benchmark: HoldingSet::from_pairs("Benchmark", benchmark),
    }
}

#[test]
fn test_weights_are_normalized() {
    for seed in 0..20 {
        let universe = random_universe(seed);
        let calculator = ReturnCalculator::new(&universe.prices, start(), end());
        for holdings in [&universe.portfolio, &universe.benchmark] {
            let weights = calculator.weights(holdings);
            assert!(!weights.is_empty());
            assert_relative_eq!(weights.total_weight(), 1.0, epsilon = TOLERANCE);
        }
    }
}

#[test]
fn test_alpha_conservation_and_decomposition() {
    for seed in 0..20 {
        let universe = random_universe(seed);
        let result = run(
            &universe.prices,
            &universe.sector,
            &universe.portfolio,
            &universe.benchmark,
        );
        let attribution = &result.attribution;

        assert_relative_eq!(
            attribution.effect_totals().total_alpha,
            attribution.portfolio_return - attribution.benchmark_return,
            epsilon = TOLERANCE
        );
        for group in &attribution.groups {
            assert_relative_eq!(
                group.allocation + group.selection + group.interaction,
                group.portfolio_weight * group.portfolio_return
                    - group.benchmark_weight * group.benchmark_return,
                epsilon = TOLERANCE
            );
            if group.portfolio_weight == 0.0 {
                assert_eq!(group.portfolio_return, 0.0);
            }
            if group.benchmark_weight == 0.0 {
                assert_eq!(group.benchmark_return, 0.0);
            }
        }

        let w_p: f64 = attribution.groups.iter().map(|g| g.portfolio_weight).sum();
        let w_b: f64 = attribution.groups.iter().map(|g| g.benchmark_weight).sum();
        assert_relative_eq!(w_p, 1.0, epsilon = TOLERANCE);
        assert_relative_eq!(w_b, 1.0, epsilon = TOLERANCE);
    }
}

#[test]
fn test_totals_are_invariant_to_classification() {
    for seed in 0..10 {
        let universe = random_universe(seed);
        let by_sector = run(
            &universe.prices,
            &universe.sector,
            &universe.portfolio,
            &universe.benchmark,
        );
        let by_region = run(
            &universe.prices,
            &universe.region,
            &universe.portfolio,
            &universe.benchmark,
        );
        let back = run(
            &universe.prices,
            &universe.sector,
            &universe.portfolio,
            &universe.benchmark,
        );

        assert_eq!(by_sector.attribution, back.attribution);
        assert_relative_eq!(
            by_sector.attribution.alpha,
            by_region.attribution.alpha,
            epsilon = TOLERANCE
        );
        assert_relative_eq!(
            by_sector.attribution.portfolio_return,
            by_region.attribution.portfolio_return,
            epsilon = TOLERANCE
        );
    }
}
