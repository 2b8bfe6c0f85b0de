#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/brinson/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod funds;
pub mod loader;
pub mod tables;
pub mod validation;
pub mod workbook;

pub use cache::{CacheStats, DatasetCache, Fingerprint};
pub use error::{DataError, Result};
pub use funds::{FundBlock, FundSpec, FundTable};
pub use loader::{Dataset, DatasetLoader, SheetNames};
pub use tables::{AssetId, AttributeTable, Classification, GroupKey, HoldingSet, PriceTable};
pub use validation::{DropReason, DroppedRow, ValidationReport};
pub use workbook::{CsvWorkbook, InMemoryWorkbook, Sheet, SheetSource};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
