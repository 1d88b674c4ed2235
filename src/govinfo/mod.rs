//! GovInfo document archive access.
//!
//! The [`DocumentArchive`] trait is the seam between the acquisition
//! workflow and the network: [`GovInfoClient`] talks to the real API, and
//! tests substitute an in-memory archive.

mod client;
mod response;
mod retry;

pub use client::{ArchiveConfig, GovInfoClient, DEFAULT_BASE_URL, DOC_CLASS};
pub use response::check_response;
pub use retry::{is_transient, with_retry, RetryConfig};

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Congress, DocumentId, FileFormat};

/// Errors talking to the document archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The archive returned a non-success status code.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The archive returned something we could not interpret.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// No API key was configured.
    #[error("no GovInfo API key configured (set GOVINFO_KEY or run `cht check-key KEY`)")]
    MissingCredential,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// A remote archive of hearing packages.
#[async_trait]
pub trait DocumentArchive: Send + Sync {
    /// Every identifier belonging to a Congress, following pagination to the end.
    ///
    /// All-or-nothing: any failed page fails the whole listing.
    async fn list_congress(&self, congress: Congress) -> Result<BTreeSet<DocumentId>, ArchiveError>;

    /// Retrieve the content of one rendition of a package.
    async fn fetch_content(
        &self,
        id: &DocumentId,
        format: FileFormat,
    ) -> Result<Vec<u8>, ArchiveError>;
}
