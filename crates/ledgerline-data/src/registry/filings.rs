//! Filing history records and accounts filing selection.
//!
//! The registry returns filing history most-recent-first. Selection trusts that
//! order and never re-sorts by date, so "first accounts record" means "latest
//! accounts filing" only as far as the registry's ordering is correct.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Category assigned by the registry to annual accounts filings.
pub const ACCOUNTS_CATEGORY: &str = "accounts";

/// Link relation pointing at a filing's document metadata.
pub const DOCUMENT_METADATA_LINK: &str = "document_metadata";

/// A single entry of a company's filing history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    /// Filing category (e.g., "accounts", "confirmation-statement")
    #[serde(default)]
    pub category: Option<String>,
    /// Date the filing was registered
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Form type (e.g., "AA")
    #[serde(default, rename = "type")]
    pub form_type: Option<String>,
    /// Registry description key
    #[serde(default)]
    pub description: Option<String>,
    /// Registry transaction identifier
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Relation name to URL
    #[serde(default)]
    pub links: IndexMap<String, String>,
}

impl FilingRecord {
    /// Returns true if this record belongs to the accounts category.
    pub fn is_accounts(&self) -> bool {
        self.category.as_deref() == Some(ACCOUNTS_CATEGORY)
    }

    /// URL of the document metadata resource, if the registry linked one.
    pub fn document_metadata_url(&self) -> Option<&str> {
        self.links
            .get(DOCUMENT_METADATA_LINK)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }
}

/// Filing history response for one company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingHistory {
    /// Filings in registry order
    #[serde(default)]
    pub items: Vec<FilingRecord>,
    /// Total number of filings the registry holds
    #[serde(default)]
    pub total_count: Option<u64>,
    /// Page size used by the registry
    #[serde(default)]
    pub items_per_page: Option<u64>,
    /// Offset of the first item
    #[serde(default)]
    pub start_index: Option<u64>,
}

impl FilingHistory {
    /// All accounts filings, in registry order.
    pub fn accounts(&self) -> impl Iterator<Item = &FilingRecord> {
        self.items.iter().filter(|record| record.is_accounts())
    }

    /// The accounts filing the pipeline should process.
    pub fn latest_accounts(&self) -> Result<&FilingRecord> {
        select_accounts_filing(&self.items)
    }
}

/// Pick the first accounts filing from registry-ordered records.
///
/// # Errors
/// Returns `DataError::NoAccountsFiling` if no record has the accounts category.
pub fn select_accounts_filing(records: &[FilingRecord]) -> Result<&FilingRecord> {
    records
        .iter()
        .find(|record| record.is_accounts())
        .ok_or(DataError::NoAccountsFiling)
}
