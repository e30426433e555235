#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ledgerline/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aggregator;
pub mod error;
pub mod lookup;
pub mod report;

// Re-export the data layer
pub use ledgerline_data as data;

pub use aggregator::Aggregator;
pub use error::{ReportError, Result};
pub use lookup::Lookup;
pub use report::{CompanyIdentity, CompanyReport};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
