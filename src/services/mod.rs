//! Service layer for acquisition, reconciliation and ingestion.
//!
//! Services sit between the CLI and the repositories and emit events rather
//! than drawing progress themselves.

pub mod download;
pub mod ingest;
pub mod reconcile;

pub use download::{
    AcquireError, AcquireReport, AcquireTarget, DownloadConfig, DownloadEvent, DownloadService,
    FailedDownload,
};
pub use ingest::{IngestError, IngestOutcome, IngestService, ParsedTranscript, TranscriptParser};
pub use reconcile::{DriftRepair, ReconcileReport, Reconciler};
