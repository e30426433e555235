#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ledgerline/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod artifact;
pub mod config;
pub mod error;
pub mod ixbrl;
pub mod registry;

pub use artifact::{DocumentArtifact, DocumentFetcher};
pub use config::{ApiKey, RegistryConfig};
pub use error::{DataError, Result};
pub use ixbrl::{FactExtractor, FactFilter, FactMapping};
pub use registry::{RegistryClient, RegistrySource};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
