#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/brinson/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod controls;
pub mod error;
pub mod session;

// Re-export main types from sub-crates
pub use brinson_data as data;
pub use brinson_engine as engine;
pub use brinson_output as output;

pub use config::BrinsonConfig;
pub use controls::{ControlSurface, Selection, SelectionRequest};
pub use error::{BrinsonError, Result};
pub use session::{AttributionOutcome, AttributionSession};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
