//! Session configuration.
//!
//! Every field has a default, so an empty TOML file is a valid configuration:
//!
//! ```toml
//! data_dir = "data"
//! default_start_date = "2023-12-31"
//! default_attribute = "Sector"
//!
//! [sheets]
//! prices = "prices"
//! funds = ["funds_20231231", "funds"]
//!
//! [[funds]]
//! name = "Fund A"
//! fallback_columns = [0, 1]
//! ```

use crate::error::Result;
use brinson_data::{FundSpec, SheetNames};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for an attribution session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrinsonConfig {
    /// Directory holding the workbook's sheet files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Sheet names to read.
    #[serde(default)]
    pub sheets: SheetNames,

    /// Preferred period start when it has prices.
    #[serde(default = "default_start_date")]
    pub default_start_date: NaiveDate,

    /// Preferred classification dimension when it exists.
    #[serde(default)]
    pub default_attribute: Option<String>,

    /// Selectable funds, the first being the default.
    #[serde(default = "FundSpec::defaults")]
    pub funds: Vec<FundSpec>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default()
}

impl Default for BrinsonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sheets: SheetNames::default(),
            default_start_date: default_start_date(),
            default_attribute: None,
            funds: FundSpec::defaults(),
        }
    }
}

impl BrinsonConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Replace the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Look up a configured fund, ignoring ASCII case.
    pub fn fund(&self, name: &str) -> Option<&FundSpec> {
        self.funds.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Configured fund names in order.
    pub fn fund_names(&self) -> Vec<&str> {
        self.funds.iter().map(|f| f.name.as_str()).collect()
    }
}
