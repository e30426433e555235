//! Document metadata and renderable document resolution.

use super::RegistrySource;
use super::filings::FilingRecord;
use crate::error::{DataError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// MIME type of inline-XBRL accounts documents.
pub const XHTML_CONTENT_TYPE: &str = "application/xhtml+xml";

/// Links section of a document metadata response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLinks {
    /// Metadata resource itself
    #[serde(default, rename = "self")]
    pub self_link: Option<String>,
    /// Document content endpoint
    #[serde(default)]
    pub document: Option<String>,
}

/// Metadata describing the representations available for a filed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Available representations keyed by MIME type
    #[serde(default)]
    pub resources: Option<IndexMap<String, Value>>,
    /// Related URLs
    #[serde(default)]
    pub links: DocumentLinks,
    /// Company the document belongs to
    #[serde(default)]
    pub company_number: Option<String>,
    /// Original filename
    #[serde(default)]
    pub filename: Option<String>,
}

/// A concrete document download the pipeline can perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    /// Document content URL
    pub url: String,
    /// Value for the Accept header
    pub content_type: String,
}

impl DocumentMetadata {
    /// Returns true if a non-empty resource entry exists for `content_type`.
    pub fn advertises(&self, content_type: &str) -> bool {
        self.resources
            .as_ref()
            .and_then(|resources| resources.get(content_type))
            .is_some_and(is_present)
    }

    /// The XHTML download for this document, if one is advertised.
    ///
    /// # Errors
    /// Returns `DataError::NoRenderableDocument` when no XHTML resource is
    /// advertised or the metadata lacks a document link.
    pub fn xhtml_document(&self) -> Result<ResolvedDocument> {
        if !self.advertises(XHTML_CONTENT_TYPE) {
            return Err(DataError::NoRenderableDocument(format!(
                "{} not among advertised resources",
                XHTML_CONTENT_TYPE
            )));
        }

        let url = self
            .links
            .document
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                DataError::NoRenderableDocument("metadata has no document link".to_string())
            })?;

        Ok(ResolvedDocument {
            url: url.to_string(),
            content_type: XHTML_CONTENT_TYPE.to_string(),
        })
    }
}

/// `null`, `false`, empty strings, arrays and objects count as not advertised.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Number(_) => true,
    }
}

/// Turns a selected filing into a downloadable XHTML document.
#[derive(Debug)]
pub struct DocumentResolver<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: RegistrySource + ?Sized> DocumentResolver<'a, S> {
    /// Create a resolver reading metadata through `source`.
    pub const fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Resolve the XHTML rendering of `filing`.
    ///
    /// Missing metadata links, unreachable metadata and metadata without an
    /// XHTML resource all yield `DataError::NoRenderableDocument`.
    pub async fn resolve(&self, filing: &FilingRecord) -> Result<ResolvedDocument> {
        let metadata_url = filing.document_metadata_url().ok_or_else(|| {
            DataError::NoRenderableDocument("filing has no document metadata link".to_string())
        })?;

        let metadata = self
            .source
            .document_metadata(metadata_url)
            .await
            .map_err(|e| {
                DataError::NoRenderableDocument(format!("document metadata unavailable: {}", e))
            })?;

        let document = metadata.xhtml_document()?;
        debug!(url = %document.url, "resolved XHTML document");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(resources: Value, document: Option<&str>) -> DocumentMetadata {
        serde_json::from_value(json!({
            "resources": resources,
            "links": {
                "self": "https://document-api.test/document/abc",
                "document": document,
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_xhtml_document_resolved() {
        let meta = metadata(
            json!({
                "application/pdf": {"content_length": 1000},
                "application/xhtml+xml": {"content_length": 5000}
            }),
            Some("https://document-api.test/document/abc/content"),
        );
        let document = meta.xhtml_document().unwrap();
        assert_eq!(document.url, "https://document-api.test/document/abc/content");
        assert_eq!(document.content_type, XHTML_CONTENT_TYPE);
    }

    #[test]
    fn test_pdf_only_is_not_renderable() {
        let meta = metadata(
            json!({"application/pdf": {"content_length": 1000}}),
            Some("https://document-api.test/document/abc/content"),
        );
        assert!(matches!(
            meta.xhtml_document(),
            Err(DataError::NoRenderableDocument(_))
        ));
    }

    #[test]
    fn test_empty_or_null_resource_is_not_advertised() {
        let doc = Some("https://document-api.test/document/abc/content");
        assert!(!metadata(json!({"application/xhtml+xml": {}}), doc).advertises(XHTML_CONTENT_TYPE));
        assert!(
            !metadata(json!({"application/xhtml+xml": null}), doc).advertises(XHTML_CONTENT_TYPE)
        );
        assert!(!metadata(Value::Null, doc).advertises(XHTML_CONTENT_TYPE));
    }

    #[test]
    fn test_missing_document_link() {
        let meta = metadata(json!({"application/xhtml+xml": {"content_length": 5}}), None);
        assert!(meta.advertises(XHTML_CONTENT_TYPE));
        assert!(matches!(
            meta.xhtml_document(),
            Err(DataError::NoRenderableDocument(_))
        ));
    }

    #[test]
    fn test_metadata_without_resources_key() {
        let meta: DocumentMetadata = serde_json::from_str(r#"{"links": {}}"#).unwrap();
        assert!(meta.resources.is_none());
        assert!(meta.xhtml_document().is_err());
    }
}
