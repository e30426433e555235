//! Transient storage for downloaded filing documents.
//!
//! A [`DocumentArtifact`] owns a uniquely named file in the scratch directory
//! and removes it when dropped. Early returns, errors and panics therefore
//! cannot leave a downloaded document behind.

use crate::error::{DataError, Result};
use crate::registry::{RegistrySource, ResolvedDocument};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A downloaded document, deleted from disk on drop.
#[derive(Debug)]
pub struct DocumentArtifact {
    file: NamedTempFile,
    bytes: u64,
    content_type: String,
}

impl DocumentArtifact {
    /// Location of the document on disk.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Number of bytes downloaded.
    pub const fn len(&self) -> u64 {
        self.bytes
    }

    /// Returns true if the download was empty.
    pub const fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    /// MIME type that was requested.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Delete the file now, reporting any IO error instead of ignoring it.
    pub fn release(self) -> Result<()> {
        self.file.close()?;
        Ok(())
    }
}

/// Downloads resolved documents into the scratch directory.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    scratch_dir: PathBuf,
}

impl DocumentFetcher {
    /// Fetcher writing into the operating system's temp directory.
    pub fn new() -> Self {
        Self::with_scratch_dir(std::env::temp_dir())
    }

    /// Fetcher writing into `scratch_dir`.
    pub fn with_scratch_dir(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Directory artifacts are created in.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Download `document` for `company_id` into a fresh artifact.
    ///
    /// The file name starts with the company id and carries a random suffix,
    /// so concurrent requests for one company never share a file.
    ///
    /// # Errors
    /// Every failure is reported as `DataError::DownloadFailed`; the partial
    /// file is removed before returning.
    pub async fn fetch<S: RegistrySource + ?Sized>(
        &self,
        source: &S,
        company_id: &str,
        document: &ResolvedDocument,
    ) -> Result<DocumentArtifact> {
        let file = tempfile::Builder::new()
            .prefix(&format!("{}_account_", file_stem(company_id)))
            .suffix(".xhtml")
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| {
                DataError::DownloadFailed(format!(
                    "cannot create file in {}: {}",
                    self.scratch_dir.display(),
                    e
                ))
            })?;

        let handle = file
            .as_file()
            .try_clone()
            .map_err(|e| DataError::DownloadFailed(format!("cannot open artifact: {}", e)))?;
        let mut writer = tokio::fs::File::from_std(handle);

        let bytes = source
            .download_document(&document.url, &document.content_type, &mut writer)
            .await
            .map_err(|e| match e {
                DataError::DownloadFailed(_) => e,
                other => DataError::DownloadFailed(other.to_string()),
            })?;
        drop(writer);

        debug!(path = %file.path().display(), bytes, "stored document artifact");
        Ok(DocumentArtifact {
            file,
            bytes,
            content_type: document.content_type.clone(),
        })
    }
}

impl Default for DocumentFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry ids are alphanumeric; anything else is replaced to keep the name a single path component.
fn file_stem(company_id: &str) -> String {
    let stem: String = company_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "company".to_string()
    } else {
        stem
    }
}
