//! Errors surfaced to callers of the aggregator.

use thiserror::Error;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// The only failures a report request can end with.
///
/// Registry outages, missing filings and unparsable documents never show up
/// here; they degrade individual report fields instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// No company name, or only whitespace
    #[error("company_name is required")]
    MissingInput,

    /// The registry search produced no usable company id
    #[error("Company number not found")]
    CompanyNotFound(String),
}
