//! Companies House registry access.
//!
//! This module provides:
//! - An authenticated, rate limited registry client with bounded retries
//! - Filing history types and accounts filing selection
//! - Document metadata resolution to a downloadable XHTML rendering
//!
//! # Example
//!
//! ```no_run
//! use ledgerline_data::RegistryConfig;
//! use ledgerline_data::registry::{DocumentResolver, RegistryClient, RegistrySource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RegistryClient::new(RegistryConfig::new("my-api-key"))?;
//!     let company_id = client.search_company("Acme Ltd").await?;
//!     let history = client.filing_history(&company_id).await?;
//!     let filing = history.latest_accounts()?;
//!     let document = DocumentResolver::new(&client).resolve(filing).await?;
//!     println!("XHTML accounts at {}", document.url);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod documents;
pub mod filings;

pub use client::RegistryClient;
pub use documents::{
    DocumentLinks, DocumentMetadata, DocumentResolver, ResolvedDocument, XHTML_CONTENT_TYPE,
};
pub use filings::{ACCOUNTS_CATEGORY, FilingHistory, FilingRecord, select_accounts_filing};

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWrite;

/// Read access to the company registry.
///
/// [`RegistryClient`] is the production implementation. Every method is one
/// stateless read and is safe to retry.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Registry id of the best match for `name`.
    ///
    /// Fails with `DataError::RegistryNotFound` when the search has no results.
    async fn search_company(&self, name: &str) -> Result<String>;

    /// Company profile.
    async fn company_profile(&self, company_id: &str) -> Result<Value>;

    /// Filing history, most recent first.
    async fn filing_history(&self, company_id: &str) -> Result<FilingHistory>;

    /// Officer list.
    async fn officers(&self, company_id: &str) -> Result<Value>;

    /// Persons with significant control.
    async fn persons_with_significant_control(&self, company_id: &str) -> Result<Value>;

    /// Metadata for the document at `url`.
    async fn document_metadata(&self, url: &str) -> Result<DocumentMetadata>;

    /// Stream the document at `url` into `destination`, returning bytes written.
    async fn download_document(
        &self,
        url: &str,
        accept: &str,
        destination: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64>;
}
