//! Error types for attribution sessions.

use brinson_data::{DataError, SheetNames};
use brinson_output::ReportError;
use chrono::NaiveDate;
use thiserror::Error;

/// Result type for attribution sessions.
pub type Result<T> = std::result::Result<T, BrinsonError>;

/// Errors surfaced at the session boundary.
#[derive(Debug, Error)]
pub enum BrinsonError {
    /// Loading the dataset failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// The price table has no dates to choose from
    #[error("Price table has no dates")]
    NoPriceDates,

    /// A selected date is not in the price table
    #[error("No prices on {0}")]
    UnknownDate(NaiveDate),

    /// A selected classification dimension does not exist
    #[error("Unknown attribute '{name}' (available: {})", available.join(", "))]
    UnknownDimension {
        /// Requested dimension
        name: String,
        /// Dimensions in the attribute table
        available: Vec<String>,
    },

    /// A selected fund is not configured
    #[error("Unknown fund '{name}' (available: {})", available.join(", "))]
    UnknownFund {
        /// Requested fund
        name: String,
        /// Configured funds
        available: Vec<String>,
    },

    /// Report assembly failed
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BrinsonError {
    /// Returns whether the error comes from loading the dataset.
    #[must_use]
    pub const fn is_load_error(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    /// User-facing hint for load errors, naming the expected sheets.
    pub fn guidance(&self, names: &SheetNames) -> Option<String> {
        if !self.is_load_error() {
            return None;
        }
        let expected = names.expected();
        let listed = match expected.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{}, and {last}", rest.join(", ")),
            Some((last, _)) => (*last).to_string(),
            None => String::new(),
        };
        Some(format!("Ensure sheet names are: {listed}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_carry_guidance() {
        let err = BrinsonError::from(DataError::SheetNotFound {
            tried: vec!["prices".to_string()],
        });
        assert!(err.is_load_error());
        assert_eq!(
            err.guidance(&SheetNames::default()).unwrap(),
            "Ensure sheet names are: prices, attributes, benchmark, and funds_20231231"
        );
    }

    #[test]
    fn selection_errors_have_no_guidance() {
        let err = BrinsonError::UnknownDimension {
            name: "Region".to_string(),
            available: vec!["Sector".to_string(), "Style".to_string()],
        };
        assert!(!err.is_load_error());
        assert!(err.guidance(&SheetNames::default()).is_none());
        assert_eq!(
            err.to_string(),
            "Unknown attribute 'Region' (available: Sector, Style)"
        );
    }
}
