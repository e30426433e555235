//! Error types for registry and document operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while talking to the registry or processing a filing.
#[derive(Debug, Error)]
pub enum DataError {
    /// Transport failure, timeout, unexpected HTTP status or undecodable body
    #[error("Registry unavailable at {url}: {reason}")]
    RegistryUnavailable {
        /// URL that was requested
        url: String,
        /// HTTP status, if the registry answered at all
        status: Option<u16>,
        /// Human readable cause
        reason: String,
    },

    /// The registry has no resource matching the request
    #[error("Registry resource not found: {0}")]
    RegistryNotFound(String),

    /// Filing history holds no record in the accounts category
    #[error("No accounts filing in filing history")]
    NoAccountsFiling,

    /// The selected filing has no XHTML rendering to download
    #[error("No renderable document: {0}")]
    NoRenderableDocument(String),

    /// Document bytes could not be retrieved or stored
    #[error("Document download failed: {0}")]
    DownloadFailed(String),

    /// The downloaded document could not be parsed
    #[error("Fact extraction failed: {0}")]
    ExtractionFailed(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Whether retrying the same request may succeed.
    ///
    /// Transport failures (no status), rate limiting and server errors are
    /// transient. Everything else, including 404, is final.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::RegistryUnavailable { status, .. } => match status {
                None => true,
                Some(code) => *code == 429 || *code >= 500,
            },
            _ => false,
        }
    }

    /// Whether the error means "nothing there" rather than "something broke".
    pub const fn is_absence(&self) -> bool {
        matches!(
            self,
            Self::RegistryNotFound(_) | Self::NoAccountsFiling | Self::NoRenderableDocument(_)
        )
    }

    /// Short label of the pipeline stage that produced the error, for logs.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::RegistryUnavailable { .. } | Self::RegistryNotFound(_) => "registry",
            Self::NoAccountsFiling => "filing_selection",
            Self::NoRenderableDocument(_) => "document_resolution",
            Self::DownloadFailed(_) => "download",
            Self::ExtractionFailed(_) => "extraction",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable(status: Option<u16>) -> DataError {
        DataError::RegistryUnavailable {
            url: "https://registry.test/company/1".to_string(),
            status,
            reason: "boom".to_string(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(unavailable(None).is_transient());
        assert!(unavailable(Some(429)).is_transient());
        assert!(unavailable(Some(503)).is_transient());
        assert!(!unavailable(Some(400)).is_transient());
        assert!(!unavailable(Some(401)).is_transient());
        assert!(!DataError::RegistryNotFound("x".into()).is_transient());
        assert!(!DataError::ExtractionFailed("x".into()).is_transient());
    }

    #[test]
    fn test_absence_classification() {
        assert!(DataError::NoAccountsFiling.is_absence());
        assert!(DataError::NoRenderableDocument("pdf only".into()).is_absence());
        assert!(DataError::RegistryNotFound("company".into()).is_absence());
        assert!(!DataError::DownloadFailed("reset".into()).is_absence());
        assert!(!unavailable(Some(500)).is_absence());
    }

    #[test]
    fn test_display_includes_url() {
        let message = unavailable(Some(502)).to_string();
        assert!(message.contains("https://registry.test/company/1"));
        assert!(message.contains("boom"));
    }
}
