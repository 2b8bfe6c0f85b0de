//! Dataset loading.
//!
//! Reads the four sheets (prices, attributes, benchmark, funds) from a
//! [`SheetSource`] into typed tables. The fund sheet is looked up under a
//! primary name first and then under fallback names; every other sheet must
//! exist under its configured name.

use crate::cache::Fingerprint;
use crate::error::Result;
use crate::funds::{FundSpec, FundTable};
use crate::tables::{AttributeTable, HoldingSet, PriceTable};
use crate::validation::ValidationReport;
use crate::workbook::{SheetSource, read_first};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Name given to the benchmark holding set.
pub const BENCHMARK_NAME: &str = "Benchmark";

fn default_prices() -> String {
    "prices".to_string()
}

fn default_attributes() -> String {
    "attributes".to_string()
}

fn default_benchmark() -> String {
    "benchmark".to_string()
}

fn default_funds() -> Vec<String> {
    vec!["funds_20231231".to_string(), "funds".to_string()]
}

/// Sheet names to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetNames {
    /// Price sheet.
    #[serde(default = "default_prices")]
    pub prices: String,

    /// Attribute sheet.
    #[serde(default = "default_attributes")]
    pub attributes: String,

    /// Benchmark holdings sheet.
    #[serde(default = "default_benchmark")]
    pub benchmark: String,

    /// Fund holdings sheet candidates, tried in order.
    #[serde(default = "default_funds")]
    pub funds: Vec<String>,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            prices: default_prices(),
            attributes: default_attributes(),
            benchmark: default_benchmark(),
            funds: default_funds(),
        }
    }
}

impl SheetNames {
    /// Every name a complete workbook is expected to provide, for error hints.
    pub fn expected(&self) -> Vec<&str> {
        let mut names = vec![
            self.prices.as_str(),
            self.attributes.as_str(),
            self.benchmark.as_str(),
        ];
        names.extend(self.funds.first().map(String::as_str));
        names
    }
}

/// The loaded tables of one source.
#[derive(Debug, Clone)]
pub struct Dataset {
    prices: PriceTable,
    attributes: AttributeTable,
    benchmark: HoldingSet,
    funds: FundTable,
    report: ValidationReport,
    fingerprint: Fingerprint,
}

impl Dataset {
    /// Asset prices.
    pub const fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Asset classifications.
    pub const fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    /// Benchmark holdings.
    pub const fn benchmark(&self) -> &HoldingSet {
        &self.benchmark
    }

    /// Raw fund sheet.
    pub const fn funds(&self) -> &FundTable {
        &self.funds
    }

    /// Rows dropped while loading prices, attributes and benchmark.
    pub const fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Fingerprint of the source content.
    pub const fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Extract one fund's holdings together with the rows dropped from its
    /// block.
    ///
    /// # Errors
    ///
    /// Returns an error when the fund block cannot be located.
    pub fn fund_holdings(&self, spec: &FundSpec) -> Result<(HoldingSet, ValidationReport)> {
        let mut report = ValidationReport::new();
        let holdings = self.funds.holdings(spec, &mut report)?;
        Ok((holdings, report))
    }
}

/// Loads a [`Dataset`] from a sheet source.
#[derive(Debug, Clone, Default)]
pub struct DatasetLoader {
    names: SheetNames,
}

impl DatasetLoader {
    /// Create a loader for the given sheet names.
    pub const fn new(names: SheetNames) -> Self {
        Self { names }
    }

    /// Sheet names this loader reads.
    pub const fn names(&self) -> &SheetNames {
        &self.names
    }

    /// Load every sheet.
    ///
    /// # Errors
    ///
    /// Returns an error when a sheet is missing, a required column is absent
    /// or price rows conflict.
    pub fn load(&self, source: &dyn SheetSource) -> Result<Dataset> {
        let fingerprint = source.fingerprint()?;
        self.load_with_fingerprint(source, fingerprint)
    }

    /// Load every sheet, tagging the dataset with a precomputed fingerprint.
    ///
    /// # Errors
    ///
    /// See [`DatasetLoader::load`].
    pub fn load_with_fingerprint(
        &self,
        source: &dyn SheetSource,
        fingerprint: Fingerprint,
    ) -> Result<Dataset> {
        let mut report = ValidationReport::new();

        let prices_sheet = read_first(source, std::slice::from_ref(&self.names.prices))?;
        let prices = PriceTable::from_sheet(&prices_sheet, &mut report)?;

        let attributes_sheet = read_first(source, std::slice::from_ref(&self.names.attributes))?;
        let attributes = AttributeTable::from_sheet(&attributes_sheet, &mut report)?;

        let benchmark_sheet = read_first(source, std::slice::from_ref(&self.names.benchmark))?;
        let benchmark = HoldingSet::from_sheet(BENCHMARK_NAME, &benchmark_sheet, &mut report)?;

        let funds = FundTable::from_sheet(read_first(source, &self.names.funds)?)?;

        info!(
            dates = prices.dates().len(),
            prices = prices.len(),
            classified = attributes.len(),
            benchmark = benchmark.len(),
            dropped = report.len(),
            "dataset loaded"
        );

        Ok(Dataset {
            prices,
            attributes,
            benchmark,
            funds,
            report,
            fingerprint,
        })
    }
}
