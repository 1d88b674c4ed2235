//! Acquisition of hearing content.
//!
//! For a set of targets and a format, makes sure every involved Congress's
//! identifier set is known to the catalog, fetches whatever is not present,
//! and rolls back the records of fetches that failed so the next run starts
//! them from scratch. Fetches run one at a time.

mod types;

pub use types::{
    AcquireError, AcquireReport, AcquireTarget, DownloadConfig, DownloadEvent, FailedDownload,
};

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::govinfo::DocumentArchive;
use crate::models::{Congress, DocumentId, FileFormat};
use crate::repository::{DbContext, FileRepository};
use crate::storage::{content_storage_path, write_atomic};

/// Service that drives the acquisition state machine.
pub struct DownloadService<A> {
    ctx: DbContext,
    archive: A,
    config: DownloadConfig,
    events: Option<mpsc::Sender<DownloadEvent>>,
}

impl<A: DocumentArchive> DownloadService<A> {
    /// Create a new download service.
    pub fn new(ctx: DbContext, archive: A, config: DownloadConfig) -> Self {
        Self {
            ctx,
            archive,
            config,
            events: None,
        }
    }

    /// Send progress events to `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<DownloadEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    async fn emit(&self, event: DownloadEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }

    /// Acquire `format` content for every target.
    ///
    /// Input is validated before any network or catalog activity. A failed
    /// listing aborts the run; a failed fetch only fails its identifier.
    pub async fn acquire(
        &self,
        targets: &[AcquireTarget],
        format: FileFormat,
    ) -> Result<AcquireReport, AcquireError> {
        // Every explicit identifier must map to a valid Congress
        let mut explicit: Vec<(DocumentId, Congress)> = Vec::new();
        let mut sessions: Vec<Congress> = Vec::new();
        for target in targets {
            match target {
                AcquireTarget::Document(id) => explicit.push((id.clone(), id.congress()?)),
                AcquireTarget::Congress(c) => sessions.push(*c),
            }
        }

        let files = self.ctx.files();
        let mut report = AcquireReport::default();

        // Expand session targets into their identifier sets
        let mut listings: BTreeMap<Congress, BTreeSet<DocumentId>> = BTreeMap::new();
        for congress in &sessions {
            self.listing(*congress, &mut listings).await?;
        }

        let mut queue: Vec<(DocumentId, Congress)> = Vec::new();
        let mut queued = HashSet::new();
        for congress in &sessions {
            if let Some(ids) = listings.get(congress) {
                for id in ids {
                    if queued.insert(id.clone()) {
                        queue.push((id.clone(), *congress));
                    }
                }
            }
        }
        for (id, congress) in &explicit {
            if queued.insert(id.clone()) {
                queue.push((id.clone(), *congress));
            }
        }

        // Make sibling identifiers known for sessions seen for the first time
        let involved: BTreeSet<Congress> = queue.iter().map(|(_, c)| *c).collect();
        for congress in involved {
            let listed_now = listings.contains_key(&congress);
            if listed_now || files.count_for(congress, format).await? == 0 {
                let ids = self.listing(congress, &mut listings).await?;
                report.registered += files
                    .register_session_listing(congress, ids.iter(), format)
                    .await?;
            }
        }
        for (id, congress) in &explicit {
            report.registered += files
                .register_session_listing(*congress, [id], format)
                .await?;
        }

        info!(
            "Acquiring {} {} files ({} new catalog rows)",
            queue.len(),
            format,
            report.registered
        );
        self.emit(DownloadEvent::Queued { total: queue.len() }).await;

        let outcome = self.process_queue(&files, &queue, format, &mut report).await;
        // Failed identifiers go back to unknown, even when the run is aborting
        let rolled_back = self.roll_back(&files, &report.failed, format).await;
        outcome?;
        rolled_back?;

        info!(
            "Acquisition finished: {} downloaded, {} skipped, {} failed",
            report.downloaded.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Fetch every queued identifier that is not already present.
    ///
    /// A catalog error stops the queue. The identifier being processed at
    /// that point is recorded as failed so its row can be rolled back.
    async fn process_queue(
        &self,
        files: &FileRepository,
        queue: &[(DocumentId, Congress)],
        format: FileFormat,
        report: &mut AcquireReport,
    ) -> Result<(), AcquireError> {
        for (id, congress) in queue {
            let status = files.file_status(id, format).await?;
            if !status.needs_fetch() {
                debug!("{} {} already present", id, format);
                report.skipped.push(id.clone());
                self.emit(DownloadEvent::Skipped { id: id.clone() }).await;
                continue;
            }

            debug!("{} {} is {}", id, format, status);
            let fetched = match self.fetch_one(files, id, *congress, format).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    report.failed.push(FailedDownload {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                    return Err(e);
                }
            };

            match fetched {
                Ok(bytes) => {
                    info!("Downloaded {} {} ({} bytes)", id, format, bytes);
                    report.downloaded.push(id.clone());
                    self.emit(DownloadEvent::Completed {
                        id: id.clone(),
                        bytes,
                    })
                    .await;
                }
                Err(reason) => {
                    warn!("Failed to download {} {}: {}", id, format, reason);
                    self.emit(DownloadEvent::Failed {
                        id: id.clone(),
                        error: reason.clone(),
                    })
                    .await;
                    report.failed.push(FailedDownload {
                        id: id.clone(),
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    /// Delete the rows of failed identifiers.
    ///
    /// Every failure is attempted; the first error is returned.
    async fn roll_back(
        &self,
        files: &FileRepository,
        failed: &[FailedDownload],
        format: FileFormat,
    ) -> Result<(), AcquireError> {
        let mut first_error = None;
        for failure in failed {
            if let Err(e) = files.delete_file_record(&failure.id, format).await {
                warn!("Failed to roll back {} {}: {}", failure.id, format, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Listing for a Congress, fetched at most once per run.
    async fn listing<'a>(
        &self,
        congress: Congress,
        cache: &'a mut BTreeMap<Congress, BTreeSet<DocumentId>>,
    ) -> Result<&'a BTreeSet<DocumentId>, AcquireError> {
        if !cache.contains_key(&congress) {
            let ids = self.archive.list_congress(congress).await?;
            // The archive's session filter is not trusted
            let ids: BTreeSet<DocumentId> =
                ids.into_iter().filter(|id| id.belongs_to(congress)).collect();
            self.emit(DownloadEvent::Listed {
                congress,
                count: ids.len(),
            })
            .await;
            cache.insert(congress, ids);
        }
        Ok(cache.entry(congress).or_default())
    }

    /// Fetch one identifier. The outer error aborts the run; the inner one
    /// is a per-identifier failure.
    async fn fetch_one(
        &self,
        files: &FileRepository,
        id: &DocumentId,
        congress: Congress,
        format: FileFormat,
    ) -> Result<Result<usize, String>, AcquireError> {
        let dest = content_storage_path(&self.config.downloads_dir, format, congress, id);
        files.commit_path(id, format, &dest).await?;

        self.emit(DownloadEvent::Started { id: id.clone() }).await;
        debug!("Fetching {} {} to {}", id, format, dest.display());

        let content = match self.archive.fetch_content(id, format).await {
            Ok(content) => content,
            Err(e) => return Ok(Err(e.to_string())),
        };

        let bytes = content.len();
        let written = tokio::task::spawn_blocking(move || write_atomic(&dest, &content))
            .await
            .map_err(std::io::Error::other)?;
        Ok(written.map(|()| bytes).map_err(|e| e.to_string()))
    }
}
