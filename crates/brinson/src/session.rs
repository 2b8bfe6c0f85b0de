//! Attribution sessions.
//!
//! A session owns the configuration and a [`DatasetCache`]. Each run loads
//! the source (or reuses the cached dataset when its content is unchanged),
//! resolves the selection and pushes it through the engine.

use crate::config::BrinsonConfig;
use crate::controls::{ControlSurface, Selection, SelectionRequest};
use crate::error::{BrinsonError, Result};
use brinson_data::{
    CsvWorkbook, Dataset, DatasetCache, DatasetLoader, SheetSource, ValidationReport,
};
use brinson_engine::{AttributionEngine, AttributionInput, AttributionRun};
use brinson_output::{AttributionTable, BarChart, Report, ReportBuilder};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything produced by one attribution run.
#[derive(Debug, Clone)]
pub struct AttributionOutcome {
    /// Resolved selection.
    pub selection: Selection,
    /// Engine output with intermediate series.
    pub run: AttributionRun,
    /// Display table.
    pub table: AttributionTable,
    /// Rows dropped from the shared sheets and from the selected fund's block.
    pub validation: ValidationReport,
}

impl AttributionOutcome {
    /// Effect series for charting.
    pub fn chart(&self) -> BarChart {
        BarChart::from_table(&self.table)
    }

    /// Timestamped report of the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be assembled.
    pub fn report(&self, source: impl Into<String>) -> Result<Report> {
        Ok(ReportBuilder::new()
            .source(source)
            .table(self.table.clone())
            .validation(&self.validation)
            .build()?)
    }
}

/// Loads datasets through a cache and runs attribution over them.
#[derive(Debug)]
pub struct AttributionSession {
    config: BrinsonConfig,
    loader: DatasetLoader,
    cache: DatasetCache,
    engine: AttributionEngine,
}

impl AttributionSession {
    /// Create a session.
    pub fn new(config: BrinsonConfig) -> Self {
        let loader = DatasetLoader::new(config.sheets.clone());
        Self {
            config,
            loader,
            cache: DatasetCache::new(),
            engine: AttributionEngine::new(),
        }
    }

    /// Session configuration.
    pub const fn config(&self) -> &BrinsonConfig {
        &self.config
    }

    /// Dataset cache.
    pub const fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// The configured data directory as a workbook.
    pub fn workbook(&self) -> CsvWorkbook {
        CsvWorkbook::new(&self.config.data_dir)
    }

    /// Dataset for the source's current content.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or a sheet is invalid.
    pub fn load(&self, source: &dyn SheetSource) -> Result<Arc<Dataset>> {
        Ok(self.cache.get_or_load(source, &self.loader)?)
    }

    /// Control surface over a loaded dataset.
    pub const fn controls<'a>(&'a self, dataset: &'a Dataset) -> ControlSurface<'a> {
        ControlSurface::new(dataset, &self.config)
    }

    /// Load the source, resolve the request and compute the attribution.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the request is invalid.
    pub fn run(
        &self,
        source: &dyn SheetSource,
        request: &SelectionRequest,
    ) -> Result<AttributionOutcome> {
        let dataset = self.load(source)?;
        let selection = self.controls(&dataset).select(request)?;
        self.run_selection(&dataset, &selection)
    }

    /// Compute the attribution of a resolved selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection does not fit the dataset or the
    /// fund block cannot be located.
    pub fn run_selection(
        &self,
        dataset: &Dataset,
        selection: &Selection,
    ) -> Result<AttributionOutcome> {
        let controls = self.controls(dataset);
        controls.validate(selection)?;

        let fund = controls.fund_spec(&selection.fund)?;
        let (portfolio, fund_report) = dataset.fund_holdings(fund)?;
        let classification = dataset
            .attributes()
            .classification(&selection.dimension)
            .ok_or_else(|| BrinsonError::UnknownDimension {
                name: selection.dimension.clone(),
                available: controls.dimensions().to_vec(),
            })?;

        let run = self.engine.run(&AttributionInput {
            prices: dataset.prices(),
            classification: &classification,
            portfolio: &portfolio,
            benchmark: dataset.benchmark(),
            start: selection.start,
            end: selection.end,
        });

        if run.portfolio_weights.is_empty() {
            warn!(fund = %selection.fund, start = %selection.start, "fund has no priced holdings");
        }
        if run.benchmark_weights.is_empty() {
            warn!(start = %selection.start, "benchmark has no priced holdings");
        }

        let table = AttributionTable::from_run(&run);
        info!(
            selection = %selection,
            fund_return = run.attribution.portfolio_return,
            benchmark_return = run.attribution.benchmark_return,
            alpha = run.attribution.alpha,
            "attribution computed"
        );

        let mut validation = dataset.report().clone();
        validation.merge(fund_report);

        Ok(AttributionOutcome {
            selection: selection.clone(),
            run,
            table,
            validation,
        })
    }
}

impl Default for AttributionSession {
    fn default() -> Self {
        Self::new(BrinsonConfig::default())
    }
}
