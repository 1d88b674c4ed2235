//! Download service types and events.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::govinfo::ArchiveError;
use crate::models::{Congress, DocumentId, ValidationError};
use crate::repository::DbError;

/// Something to acquire: one package, or every package of a Congress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireTarget {
    Document(DocumentId),
    Congress(Congress),
}

/// Events emitted during an acquisition run.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// Session listing fetched from the archive
    Listed { congress: Congress, count: usize },
    /// Queue built; this many identifiers will be examined
    Queued { total: usize },
    /// Content already present, nothing to do
    Skipped { id: DocumentId },
    /// Fetch started
    Started { id: DocumentId },
    /// Content written to disk
    Completed { id: DocumentId, bytes: usize },
    /// Fetch failed; the record will be rolled back
    Failed { id: DocumentId, error: String },
}

/// One identifier that could not be acquired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDownload {
    pub id: DocumentId,
    pub reason: String,
}

/// Result of an acquisition run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AcquireReport {
    pub downloaded: Vec<DocumentId>,
    pub skipped: Vec<DocumentId>,
    pub failed: Vec<FailedDownload>,
    /// Pending rows added to the catalog by session listings.
    pub registered: usize,
}

impl AcquireReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Configuration for the download service.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Root of the `<format>/<congress>/<id>.<ext>` tree.
    pub downloads_dir: PathBuf,
}

/// Errors that abort an acquisition run.
///
/// Per-identifier fetch failures are not errors; they are reported in
/// [`AcquireReport::failed`].
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("archive listing failed: {0}")]
    Archive(#[from] ArchiveError),
    #[error("database error: {0}")]
    Database(#[from] DbError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

