//! Selectable options and their defaults.
//!
//! The control surface offers the dates that have prices, the attribute
//! table's classification dimensions and the configured funds. Choices left
//! open fall back to defaults; explicit choices are validated against what
//! the dataset actually holds.

use crate::config::BrinsonConfig;
use crate::error::{BrinsonError, Result};
use brinson_data::{Dataset, FundSpec};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// A validated choice of period, dimension and fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Period start.
    pub start: NaiveDate,
    /// Period end.
    pub end: NaiveDate,
    /// Classification dimension.
    pub dimension: String,
    /// Fund name, as configured.
    pub fund: String,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} from {} to {}",
            self.fund, self.dimension, self.start, self.end
        )
    }
}

/// Choices requested by the caller. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRequest {
    /// Requested start date.
    pub start: Option<NaiveDate>,
    /// Requested end date.
    pub end: Option<NaiveDate>,
    /// Requested dimension.
    pub dimension: Option<String>,
    /// Requested fund.
    pub fund: Option<String>,
}

/// Options available over one dataset.
#[derive(Debug, Clone, Copy)]
pub struct ControlSurface<'a> {
    dataset: &'a Dataset,
    config: &'a BrinsonConfig,
}

impl<'a> ControlSurface<'a> {
    /// Create a control surface over a loaded dataset.
    pub const fn new(dataset: &'a Dataset, config: &'a BrinsonConfig) -> Self {
        Self { dataset, config }
    }

    /// Distinct price dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.dataset.prices().dates()
    }

    /// Classification dimensions in attribute-sheet order.
    pub fn dimensions(&self) -> &'a [String] {
        self.dataset.attributes().dimensions()
    }

    /// Configured fund names.
    pub fn funds(&self) -> Vec<&'a str> {
        self.config.fund_names()
    }

    /// Configured start date when it has prices, otherwise the earliest
    /// price date.
    ///
    /// # Errors
    ///
    /// Returns [`BrinsonError::NoPriceDates`] for an empty price table.
    pub fn default_start(&self) -> Result<NaiveDate> {
        let prices = self.dataset.prices();
        if prices.contains_date(self.config.default_start_date) {
            return Ok(self.config.default_start_date);
        }
        prices.first_date().ok_or(BrinsonError::NoPriceDates)
    }

    /// Latest price date.
    ///
    /// # Errors
    ///
    /// Returns [`BrinsonError::NoPriceDates`] for an empty price table.
    pub fn default_end(&self) -> Result<NaiveDate> {
        self.dataset
            .prices()
            .last_date()
            .ok_or(BrinsonError::NoPriceDates)
    }

    /// Configured default attribute when it exists, otherwise the first
    /// dimension.
    pub fn default_dimension(&self) -> Option<&'a str> {
        let dimensions = self.dimensions();
        self.config
            .default_attribute
            .as_deref()
            .and_then(|wanted| dimensions.iter().find(|d| d.as_str() == wanted))
            .or_else(|| dimensions.first())
            .map(String::as_str)
    }

    /// First configured fund.
    pub fn default_fund(&self) -> Option<&'a FundSpec> {
        self.config.funds.first()
    }

    /// Resolve a request into a validated selection.
    ///
    /// # Errors
    ///
    /// Returns an error when a requested date has no prices or the dimension
    /// or fund is unknown. A period ending before it starts is accepted and
    /// yields returns measured backwards from `start` to `end`.
    pub fn select(&self, request: &SelectionRequest) -> Result<Selection> {
        let start = request
            .start
            .map_or_else(|| self.default_start(), |date| self.check_date(date))?;
        let end = request
            .end
            .map_or_else(|| self.default_end(), |date| self.check_date(date))?;
        if end < start {
            warn!(%start, %end, "period ends before it starts");
        }

        let dimension = match request.dimension.as_deref() {
            Some(name) => self.check_dimension(name)?,
            None => self
                .default_dimension()
                .ok_or_else(|| self.unknown_dimension(""))?,
        };
        let fund = match request.fund.as_deref() {
            Some(name) => self.fund_spec(name)?,
            None => self.default_fund().ok_or_else(|| self.unknown_fund(""))?,
        };

        Ok(Selection {
            start,
            end,
            dimension: dimension.to_string(),
            fund: fund.name.clone(),
        })
    }

    /// Selection with every choice defaulted.
    ///
    /// # Errors
    ///
    /// See [`ControlSurface::select`].
    pub fn default_selection(&self) -> Result<Selection> {
        self.select(&SelectionRequest::default())
    }

    /// Check that a finished selection still fits this dataset.
    ///
    /// # Errors
    ///
    /// See [`ControlSurface::select`].
    pub fn validate(&self, selection: &Selection) -> Result<()> {
        self.select(&SelectionRequest {
            start: Some(selection.start),
            end: Some(selection.end),
            dimension: Some(selection.dimension.clone()),
            fund: Some(selection.fund.clone()),
        })
        .map(|_| ())
    }

    /// Configured fund by name, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`BrinsonError::UnknownFund`] when no fund matches.
    pub fn fund_spec(&self, name: &str) -> Result<&'a FundSpec> {
        self.config.fund(name).ok_or_else(|| self.unknown_fund(name))
    }

    fn check_date(&self, date: NaiveDate) -> Result<NaiveDate> {
        if self.dataset.prices().contains_date(date) {
            Ok(date)
        } else {
            Err(BrinsonError::UnknownDate(date))
        }
    }

    fn check_dimension(&self, name: &str) -> Result<&'a str> {
        self.dimensions()
            .iter()
            .find(|d| d.as_str() == name)
            .map(String::as_str)
            .ok_or_else(|| self.unknown_dimension(name))
    }

    fn unknown_dimension(&self, name: &str) -> BrinsonError {
        BrinsonError::UnknownDimension {
            name: name.to_string(),
            available: self.dimensions().to_vec(),
        }
    }

    fn unknown_fund(&self, name: &str) -> BrinsonError {
        BrinsonError::UnknownFund {
            name: name.to_string(),
            available: self.funds().iter().map(ToString::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brinson_data::{DatasetLoader, InMemoryWorkbook};
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dataset(dates: &[&str]) -> Dataset {
        let mut prices = vec![vec!["Date", "Asset ID", "Price"]];
        for d in dates {
            prices.push(vec![*d, "X", "10"]);
        }
        let source = InMemoryWorkbook::new()
            .with_sheet("prices", prices)
            .with_sheet(
                "attributes",
                vec![vec!["Asset ID", "Sector", "Region"], vec!["X", "Tech", "US"]],
            )
            .with_sheet("benchmark", vec![vec!["Asset ID", "Holdings"], vec!["X", "1"]])
            .with_sheet(
                "funds_20231231",
                vec![vec!["Fund A", ""], vec!["Asset ID", "Holdings"], vec!["X", "1"]],
            );
        DatasetLoader::default().load(&source).unwrap()
    }

    #[test]
    fn defaults_prefer_configured_start() {
        let data = dataset(&["2023-06-30", "2023-12-31", "2024-06-30"]);
        let config = BrinsonConfig::default();
        let controls = ControlSurface::new(&data, &config);

        let selection = controls.default_selection().unwrap();
        assert_eq!(selection.start, date(2023, 12, 31));
        assert_eq!(selection.end, date(2024, 6, 30));
        assert_eq!(selection.dimension, "Sector");
        assert_eq!(selection.fund, "Fund A");
        assert_eq!(controls.dates().len(), 3);
        assert_eq!(controls.funds(), vec!["Fund A", "Fund B"]);
    }

    #[test]
    fn start_falls_back_to_earliest_date() {
        let data = dataset(&["2024-03-31", "2024-01-31", "2024-06-30"]);
        let config = BrinsonConfig::default();
        let controls = ControlSurface::new(&data, &config);

        assert_eq!(controls.default_start().unwrap(), date(2024, 1, 31));
        assert_eq!(controls.default_end().unwrap(), date(2024, 6, 30));
    }

    #[test]
    fn configured_attribute_is_the_default_dimension() {
        let data = dataset(&["2023-12-31"]);
        let config = BrinsonConfig {
            default_attribute: Some("Region".to_string()),
            ..BrinsonConfig::default()
        };
        let controls = ControlSurface::new(&data, &config);
        assert_eq!(controls.default_dimension(), Some("Region"));

        let missing = BrinsonConfig {
            default_attribute: Some("Style".to_string()),
            ..BrinsonConfig::default()
        };
        assert_eq!(
            ControlSurface::new(&data, &missing).default_dimension(),
            Some("Sector")
        );
    }

    #[test]
    fn explicit_choices_are_honoured() {
        let data = dataset(&["2023-12-31", "2024-03-31", "2024-06-30"]);
        let config = BrinsonConfig::default();
        let controls = ControlSurface::new(&data, &config);

        let selection = controls
            .select(&SelectionRequest {
                start: Some(date(2024, 3, 31)),
                end: Some(date(2024, 3, 31)),
                dimension: Some("Region".to_string()),
                fund: Some("fund b".to_string()),
            })
            .unwrap();
        assert_eq!(selection.start, selection.end);
        assert_eq!(selection.dimension, "Region");
        assert_eq!(selection.fund, "Fund B");
        assert!(controls.validate(&selection).is_ok());
        assert_eq!(
            selection.to_string(),
            "Fund B by Region from 2024-03-31 to 2024-03-31"
        );
    }

    #[test]
    fn reversed_period_is_selectable() {
        let data = dataset(&["2023-12-31", "2024-06-30"]);
        let config = BrinsonConfig::default();
        let selection = ControlSurface::new(&data, &config)
            .select(&SelectionRequest {
                start: Some(date(2024, 6, 30)),
                end: Some(date(2023, 12, 31)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(selection.start, date(2024, 6, 30));
        assert_eq!(selection.end, date(2023, 12, 31));
    }

    #[rstest]
    #[case(
        SelectionRequest { start: Some(date(2024, 1, 1)), ..Default::default() },
        "UnknownDate"
    )]
    #[case(
        SelectionRequest { dimension: Some("Style".into()), ..Default::default() },
        "UnknownDimension"
    )]
    #[case(
        SelectionRequest { fund: Some("Fund C".into()), ..Default::default() },
        "UnknownFund"
    )]
    fn invalid_choices_are_rejected(#[case] request: SelectionRequest, #[case] kind: &str) {
        let data = dataset(&["2023-12-31", "2024-06-30"]);
        let config = BrinsonConfig::default();
        let err = ControlSurface::new(&data, &config)
            .select(&request)
            .unwrap_err();
        assert!(format!("{err:?}").starts_with(kind), "{err:?}");
    }

    #[test]
    fn empty_price_table_has_no_defaults() {
        let data = dataset(&[]);
        let config = BrinsonConfig::default();
        let controls = ControlSurface::new(&data, &config);
        assert!(controls.dates().is_empty());
        assert!(matches!(
            controls.default_selection(),
            Err(BrinsonError::NoPriceDates)
        ));
    }
}
