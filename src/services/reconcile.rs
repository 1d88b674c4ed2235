//! Drift repair between the catalog and the filesystem.
//!
//! The catalog keeps the last path it recorded. Files moved or deleted
//! behind its back are repaired only here: any recorded path that no longer
//! resolves is cleared, returning the row to pending.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::models::{DocumentId, FileFormat, FileStatus};
use crate::repository::{status_of, DbContext, DbError};

/// One row whose stale path was cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftRepair {
    pub id: DocumentId,
    pub format: FileFormat,
    pub stale_path: PathBuf,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Rows with a recorded path that were examined.
    pub checked: usize,
    pub cleared: Vec<DriftRepair>,
}

/// Recomputes file status for every tracked row and repairs drift.
pub struct Reconciler {
    ctx: DbContext,
}

impl Reconciler {
    pub fn new(ctx: DbContext) -> Self {
        Self { ctx }
    }

    /// Clear every recorded path that no longer resolves.
    ///
    /// Idempotent: a second consecutive run finds nothing to clear.
    pub async fn reconcile(&self) -> Result<ReconcileReport, DbError> {
        let files = self.ctx.files();
        let tracked = files.tracked().await?;
        let mut report = ReconcileReport {
            checked: tracked.len(),
            cleared: Vec::new(),
        };

        for record in tracked {
            if status_of(&record).await != FileStatus::Missing {
                continue;
            }
            let Some(stale_path) = record.path else {
                continue;
            };

            if files.clear_path(&record.id, record.format).await? {
                warn!(
                    "{} {} no longer at {}; marked pending",
                    record.id,
                    record.format,
                    stale_path.display()
                );
                report.cleared.push(DriftRepair {
                    id: record.id,
                    format: record.format,
                    stale_path,
                });
            }
        }

        info!(
            "Reconciled {} tracked files, {} cleared",
            report.checked,
            report.cleared.len()
        );
        Ok(report)
    }
}
