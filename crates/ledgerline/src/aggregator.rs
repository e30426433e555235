//! Company report aggregation.
//!
//! One call to [`Aggregator::report`] is one pipeline:
//!
//! 1. Resolve the company name to a registry id (the only hard failure point)
//! 2. Fetch profile, officers, PSC and filing history concurrently
//! 3. Latest accounts filing → XHTML document → download → fact extraction
//! 4. Assemble the [`CompanyReport`]
//!
//! Steps 2 and 3 never fail the request; each failure is logged with the
//! company id and stage and leaves its field empty.

use crate::error::{ReportError, Result};
use crate::lookup::Lookup;
use crate::report::{CompanyIdentity, CompanyReport};
use ledgerline_data::registry::{DocumentResolver, FilingHistory, RegistrySource};
use ledgerline_data::{DataError, DocumentFetcher, FactExtractor, FactMapping};
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Builds company reports from a registry source.
#[derive(Debug)]
pub struct Aggregator<S> {
    source: S,
    fetcher: DocumentFetcher,
    extractor: FactExtractor,
}

impl<S: RegistrySource> Aggregator<S> {
    /// Aggregator using the OS temp directory and the numeric-only fact filter.
    pub fn new(source: S) -> Self {
        Self {
            source,
            fetcher: DocumentFetcher::new(),
            extractor: FactExtractor::new(),
        }
    }

    /// Use `fetcher` for document downloads.
    pub fn with_fetcher(mut self, fetcher: DocumentFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Use `extractor` for fact extraction.
    pub const fn with_extractor(mut self, extractor: FactExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// The underlying registry source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Resolve `company_name` to a registry id.
    ///
    /// The search uses the trimmed name; the identity keeps `company_name` as given.
    ///
    /// # Errors
    /// `MissingInput` for a blank name (no registry call is made) and
    /// `CompanyNotFound` for any search failure.
    pub async fn resolve(&self, company_name: &str) -> Result<CompanyIdentity> {
        let name = company_name.trim();
        if name.is_empty() {
            return Err(ReportError::MissingInput);
        }

        match self.source.search_company(name).await {
            Ok(company_id) => Ok(CompanyIdentity {
                name: company_name.to_string(),
                company_id,
            }),
            Err(e) => {
                warn!(company_name = name, stage = e.stage(), error = %e, "company search failed");
                Err(ReportError::CompanyNotFound(name.to_string()))
            }
        }
    }

    /// Build the full report for `company_name`.
    ///
    /// # Errors
    /// Only the errors of [`Self::resolve`].
    #[instrument(skip(self), fields(company_id))]
    pub async fn report(&self, company_name: &str) -> Result<CompanyReport> {
        let identity = self.resolve(company_name).await?;
        let company_id = identity.company_id.as_str();
        tracing::Span::current().record("company_id", company_id);

        let (profile, officers, psc, history) = tokio::join!(
            self.source.company_profile(company_id),
            self.source.officers(company_id),
            self.source.persons_with_significant_control(company_id),
            self.source.filing_history(company_id),
        );

        let financial_data = match self.financial_data(company_id, history).await {
            Ok(facts) => Lookup::Found(facts),
            Err(e) => {
                warn!(company_id, stage = e.stage(), error = %e, "financial data unavailable");
                Lookup::from_error(&e)
            }
        };

        let company_profile = passthrough(company_id, "company_profile", profile);
        let officers = passthrough(company_id, "officers", officers);
        let psc = passthrough(company_id, "psc", psc);

        let report = CompanyReport {
            financial_data,
            company_profile,
            officers,
            psc,
            company_id: identity.company_id,
            company_name: identity.name,
        };

        info!(
            company_id = %report.company_id,
            facts = report.financial_data.found().map_or(0, FactMapping::len),
            degraded = ?report.degraded_fields(),
            "report assembled"
        );
        Ok(report)
    }

    /// Financial facts from the latest accounts filing in `history`.
    ///
    /// The downloaded document is parsed on a blocking worker and deleted
    /// there, whether parsing succeeds or not.
    pub async fn financial_data(
        &self,
        company_id: &str,
        history: ledgerline_data::Result<FilingHistory>,
    ) -> ledgerline_data::Result<FactMapping> {
        let history = history?;
        let filing = history.latest_accounts()?;
        let document = DocumentResolver::new(&self.source).resolve(filing).await?;
        let artifact = self
            .fetcher
            .fetch(&self.source, company_id, &document)
            .await?;

        let extractor = self.extractor;
        tokio::task::spawn_blocking(move || extractor.extract_artifact(artifact))
            .await
            .map_err(|e| DataError::ExtractionFailed(format!("extraction task failed: {}", e)))?
    }
}

fn passthrough(
    company_id: &str,
    field: &'static str,
    result: ledgerline_data::Result<Value>,
) -> Lookup<Value> {
    if let Err(e) = &result {
        warn!(company_id, stage = e.stage(), field, error = %e, "registry lookup degraded");
    }
    Lookup::from_result(result)
}
