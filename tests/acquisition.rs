//! Acquisition workflow tests against an in-memory archive.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::{tempdir, TempDir};
use tokio::sync::mpsc;

use cht::govinfo::{ArchiveError, DocumentArchive};
use cht::models::{current_congress, Congress, DocumentId, FileFormat, FileStatus, ValidationError};
use cht::repository::DbContext;
use cht::services::{
    AcquireError, AcquireTarget, DownloadConfig, DownloadEvent, DownloadService, Reconciler,
};

/// Archive double: fixed listings, content derived from the identifier.
#[derive(Default)]
struct FakeArchive {
    listings: HashMap<u32, Vec<String>>,
    failing: Mutex<HashSet<String>>,
    listing_broken: bool,
    list_calls: AtomicUsize,
    fetched: Mutex<Vec<String>>,
}

impl FakeArchive {
    fn with_listing(mut self, congress: u32, ids: &[&str]) -> Self {
        self.listings
            .insert(congress, ids.iter().map(|s| s.to_string()).collect());
        self
    }

    fn failing(self, id: &str) -> Self {
        self.failing.lock().unwrap().insert(id.to_string());
        self
    }

    fn recover(&self, id: &str) {
        self.failing.lock().unwrap().remove(id);
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn fetch_count(&self, id: &str) -> usize {
        self.fetched.lock().unwrap().iter().filter(|f| *f == id).count()
    }

    fn total_fetches(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentArchive for FakeArchive {
    async fn list_congress(&self, congress: Congress) -> Result<BTreeSet<DocumentId>, ArchiveError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_broken {
            return Err(ArchiveError::Api {
                status: 403,
                body: "API_KEY_INVALID".to_string(),
            });
        }
        Ok(self
            .listings
            .get(&congress.number())
            .into_iter()
            .flatten()
            .map(|id| DocumentId::parse(id).unwrap())
            .collect())
    }

    async fn fetch_content(
        &self,
        id: &DocumentId,
        format: FileFormat,
    ) -> Result<Vec<u8>, ArchiveError> {
        self.fetched.lock().unwrap().push(id.to_string());
        if self.failing.lock().unwrap().contains(id.as_str()) {
            return Err(ArchiveError::Api {
                status: 404,
                body: "not found".to_string(),
            });
        }
        Ok(format!("{} as {}", id, format).into_bytes())
    }
}

struct Harness {
    ctx: DbContext,
    service: DownloadService<FakeArchive>,
    downloads: TempDir,
    db: TempDir,
}

async fn harness(archive: FakeArchive) -> Harness {
    let db = tempdir().unwrap();
    let downloads = tempdir().unwrap();
    let ctx = DbContext::new(&db.path().join("cht.db"));
    ctx.init_schema().await.unwrap();

    let service = DownloadService::new(
        ctx.clone(),
        archive,
        DownloadConfig {
            downloads_dir: downloads.path().to_path_buf(),
        },
    );
    Harness {
        ctx,
        service,
        downloads,
        db,
    }
}

fn id(s: &str) -> DocumentId {
    DocumentId::parse(s).unwrap()
}

fn congress(n: u32) -> Congress {
    Congress::new(n).unwrap()
}

const SESSION_105: [&str; 3] = ["CHRG-105hhrg10001", "CHRG-105hhrg10002", "CHRG-105hhrg10003"];

#[tokio::test]
async fn explicit_identifier_registers_its_whole_session() {
    let h = harness(FakeArchive::default().with_listing(105, &SESSION_105)).await;
    let files = h.ctx.files();
    assert_eq!(files.count_for(congress(105), FileFormat::Txt).await.unwrap(), 0);

    let report = h
        .service
        .acquire(
            &[AcquireTarget::Document(id("CHRG-105hhrg10002"))],
            FileFormat::Txt,
        )
        .await
        .unwrap();

    assert_eq!(report.downloaded, vec![id("CHRG-105hhrg10002")]);
    assert_eq!(report.registered, 3);
    assert_eq!(h.service.archive().total_fetches(), 1);

    assert_eq!(files.count_for(congress(105), FileFormat::Txt).await.unwrap(), 3);
    assert_eq!(
        files.file_status(&id("CHRG-105hhrg10001"), FileFormat::Txt).await.unwrap(),
        FileStatus::Pending
    );
    assert_eq!(
        files.file_status(&id("CHRG-105hhrg10003"), FileFormat::Txt).await.unwrap(),
        FileStatus::Pending
    );
    assert_eq!(
        files.file_status(&id("CHRG-105hhrg10002"), FileFormat::Txt).await.unwrap(),
        FileStatus::Present
    );

    let stored = h
        .downloads
        .path()
        .join("txt/105/CHRG-105hhrg10002.txt");
    assert_eq!(
        std::fs::read_to_string(stored).unwrap(),
        "CHRG-105hhrg10002 as txt"
    );

    // Other formats are tracked separately
    assert_eq!(files.count_for(congress(105), FileFormat::Pdf).await.unwrap(), 0);
}

#[tokio::test]
async fn second_explicit_request_does_not_relist_known_session() {
    let h = harness(FakeArchive::default().with_listing(105, &SESSION_105)).await;

    for target in ["CHRG-105hhrg10001", "CHRG-105hhrg10003"] {
        h.service
            .acquire(&[AcquireTarget::Document(id(target))], FileFormat::Pdf)
            .await
            .unwrap();
    }

    assert_eq!(h.service.archive().list_calls(), 1);
    assert_eq!(h.service.archive().total_fetches(), 2);
}

#[tokio::test]
async fn registration_is_idempotent() {
    let h = harness(FakeArchive::default()).await;
    let files = h.ctx.files();
    let first: Vec<DocumentId> = SESSION_105[..2].iter().map(|s| id(s)).collect();
    let overlapping: Vec<DocumentId> = SESSION_105.iter().map(|s| id(s)).collect();

    let inserted = files
        .register_session_listing(congress(105), first.iter(), FileFormat::Txt)
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    let inserted = files
        .register_session_listing(congress(105), overlapping.iter(), FileFormat::Txt)
        .await
        .unwrap();
    assert_eq!(inserted, 1);
    let count = files.count_for(congress(105), FileFormat::Txt).await.unwrap();

    let inserted = files
        .register_session_listing(congress(105), overlapping.iter(), FileFormat::Txt)
        .await
        .unwrap();
    assert_eq!(inserted, 0);
    assert_eq!(
        files.count_for(congress(105), FileFormat::Txt).await.unwrap(),
        count
    );
}

#[tokio::test]
async fn failed_fetch_rolls_back_to_unknown() {
    let archive = FakeArchive::default()
        .with_listing(105, &SESSION_105)
        .failing("CHRG-105hhrg10002");
    let h = harness(archive).await;
    let files = h.ctx.files();

    let report = h
        .service
        .acquire(&[AcquireTarget::Congress(congress(105))], FileFormat::Txt)
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, id("CHRG-105hhrg10002"));
    assert!(report.failed[0].reason.contains("404"));
    // The remaining queue still ran
    assert_eq!(report.downloaded.len(), 2);

    assert_eq!(
        files.file_status(&id("CHRG-105hhrg10002"), FileFormat::Txt).await.unwrap(),
        FileStatus::Unknown
    );
    assert!(!h
        .downloads
        .path()
        .join("txt/105/CHRG-105hhrg10002.txt")
        .exists());

    // The next run re-registers and fetches only the failed identifier
    h.service.archive().recover("CHRG-105hhrg10002");
    let report = h
        .service
        .acquire(&[AcquireTarget::Congress(congress(105))], FileFormat::Txt)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.downloaded, vec![id("CHRG-105hhrg10002")]);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.registered, 1);
    assert_eq!(
        files.file_status(&id("CHRG-105hhrg10002"), FileFormat::Txt).await.unwrap(),
        FileStatus::Present
    );
}

#[tokio::test]
async fn catalog_error_mid_queue_still_rolls_back_failures() {
    let h = harness(
        FakeArchive::default()
            .with_listing(105, &SESSION_105)
            .failing("CHRG-105hhrg10001"),
    )
    .await;

    // Recording a path for the last identifier fails inside the catalog
    let conn = rusqlite::Connection::open(h.db.path().join("cht.db")).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER block_path BEFORE UPDATE OF path ON files \
         WHEN NEW.id = 'CHRG-105hhrg10003' \
         BEGIN SELECT RAISE(ABORT, 'path rejected'); END;",
    )
    .unwrap();
    drop(conn);

    let err = h
        .service
        .acquire(&[AcquireTarget::Congress(congress(105))], FileFormat::Txt)
        .await
        .unwrap_err();
    assert!(matches!(err, AcquireError::Database(_)));

    let files = h.ctx.files();
    assert_eq!(
        files.file_status(&id("CHRG-105hhrg10001"), FileFormat::Txt).await.unwrap(),
        FileStatus::Unknown
    );
    assert_eq!(
        files.file_status(&id("CHRG-105hhrg10002"), FileFormat::Txt).await.unwrap(),
        FileStatus::Present
    );
    assert_eq!(
        files.file_status(&id("CHRG-105hhrg10003"), FileFormat::Txt).await.unwrap(),
        FileStatus::Unknown
    );
}

#[tokio::test]
async fn deleted_file_is_reconciled_and_refetched() {
    let h = harness(FakeArchive::default().with_listing(105, &SESSION_105)).await;
    let files = h.ctx.files();
    let target = id("CHRG-105hhrg10001");

    h.service
        .acquire(&[AcquireTarget::Document(target.clone())], FileFormat::Txt)
        .await
        .unwrap();
    let record = files.get(&target, FileFormat::Txt).await.unwrap().unwrap();
    let path = record.path.unwrap();

    std::fs::remove_file(&path).unwrap();
    assert_eq!(
        files.file_status(&target, FileFormat::Txt).await.unwrap(),
        FileStatus::Missing
    );

    let reconciler = Reconciler::new(h.ctx.clone());
    let report = reconciler.reconcile().await.unwrap();
    assert_eq!(report.cleared.len(), 1);
    assert_eq!(report.cleared[0].id, target);
    assert_eq!(report.cleared[0].format, FileFormat::Txt);
    assert_eq!(report.cleared[0].stale_path, path);
    assert_eq!(
        files.file_status(&target, FileFormat::Txt).await.unwrap(),
        FileStatus::Pending
    );

    // Second pass changes nothing
    let again = reconciler.reconcile().await.unwrap();
    assert!(again.cleared.is_empty());

    let report = h
        .service
        .acquire(&[AcquireTarget::Document(target.clone())], FileFormat::Txt)
        .await
        .unwrap();
    assert_eq!(report.downloaded, vec![target.clone()]);
    assert_eq!(h.service.archive().fetch_count(target.as_str()), 2);
    assert!(path.exists());
}

#[tokio::test]
async fn current_session_is_rejected_before_network() {
    let h = harness(FakeArchive::default().with_listing(105, &SESSION_105)).await;
    let current = current_congress();

    assert!(matches!(
        Congress::new(current),
        Err(ValidationError::CongressOutOfRange { .. })
    ));
    assert!(Congress::parse(&current.to_string()).is_err());

    let in_progress = id(&format!("CHRG-{}hhrg00001", current));
    let err = h
        .service
        .acquire(
            &[
                AcquireTarget::Congress(congress(105)),
                AcquireTarget::Document(in_progress),
            ],
            FileFormat::Txt,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AcquireError::Validation(ValidationError::CongressOutOfRange { .. })
    ));
    assert_eq!(h.service.archive().list_calls(), 0);
    assert_eq!(h.service.archive().total_fetches(), 0);
    assert_eq!(
        h.ctx.files().count_for(congress(105), FileFormat::Txt).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn listing_failure_aborts_the_run() {
    let archive = FakeArchive {
        listing_broken: true,
        ..FakeArchive::default()
    };
    let h = harness(archive).await;

    let err = h
        .service
        .acquire(&[AcquireTarget::Congress(congress(106))], FileFormat::Xml)
        .await
        .unwrap_err();

    assert!(matches!(err, AcquireError::Archive(ArchiveError::Api { status: 403, .. })));
    assert_eq!(h.service.archive().total_fetches(), 0);
    assert_eq!(
        h.ctx.files().count_for(congress(106), FileFormat::Xml).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn listing_entries_from_other_sessions_are_ignored() {
    let archive = FakeArchive::default().with_listing(
        107,
        &["CHRG-107hhrg70001", "CHRG-108hhrg80001"],
    );
    let h = harness(archive).await;

    let report = h
        .service
        .acquire(&[AcquireTarget::Congress(congress(107))], FileFormat::Txt)
        .await
        .unwrap();

    assert_eq!(report.downloaded, vec![id("CHRG-107hhrg70001")]);
    assert_eq!(
        h.ctx
            .files()
            .file_status(&id("CHRG-108hhrg80001"), FileFormat::Txt)
            .await
            .unwrap(),
        FileStatus::Unknown
    );
}

#[tokio::test]
async fn commit_path_round_trip() {
    let h = harness(FakeArchive::default()).await;
    let files = h.ctx.files();
    let target = id("CHRG-109hhrg1");

    files
        .register_session_listing(congress(109), [&target], FileFormat::Pdf)
        .await
        .unwrap();

    let existing = h.downloads.path().join("present.pdf");
    std::fs::write(&existing, b"%PDF").unwrap();
    assert!(files.commit_path(&target, FileFormat::Pdf, &existing).await.unwrap());
    assert_eq!(
        files.file_status(&target, FileFormat::Pdf).await.unwrap(),
        FileStatus::Present
    );

    let absent = h.downloads.path().join("absent.pdf");
    assert!(files.commit_path(&target, FileFormat::Pdf, &absent).await.unwrap());
    assert_eq!(
        files.file_status(&target, FileFormat::Pdf).await.unwrap(),
        FileStatus::Missing
    );
}

#[tokio::test]
async fn status_counts_match_direct_recount() {
    let archive = FakeArchive::default()
        .with_listing(105, &SESSION_105)
        .with_listing(106, &["CHRG-106hhrg60001", "CHRG-106hhrg60002"])
        .failing("CHRG-105hhrg10003");
    let h = harness(archive).await;

    h.service
        .acquire(
            &[
                AcquireTarget::Congress(congress(105)),
                AcquireTarget::Document(id("CHRG-106hhrg60002")),
            ],
            FileFormat::Txt,
        )
        .await
        .unwrap();

    // Drift on one file, counted before any reconciliation
    let drifted = h.ctx.files().get(&id("CHRG-105hhrg10001"), FileFormat::Txt).await.unwrap();
    std::fs::remove_file(drifted.unwrap().path.unwrap()).unwrap();

    let files = h.ctx.files();
    for _pass in 0..2 {
        let summaries = h.ctx.congresses().summaries().await.unwrap();
        for summary in &summaries {
            let mut present = 0;
            for record in files.list_for(summary.congress, FileFormat::Txt).await.unwrap() {
                if files.file_status(&record.id, FileFormat::Txt).await.unwrap()
                    == FileStatus::Present
                {
                    present += 1;
                }
            }
            assert_eq!(summary.downloaded(FileFormat::Txt), present, "{}", summary.congress);
        }

        let s105 = summaries.iter().find(|s| s.congress == congress(105)).unwrap();
        assert_eq!(s105.txts, 1);
        let s106 = summaries.iter().find(|s| s.congress == congress(106)).unwrap();
        assert_eq!(s106.txts, 1);
        assert_eq!(s106.total, 2);

        // Same figures once the drift is repaired
        Reconciler::new(h.ctx.clone()).reconcile().await.unwrap();
    }
}

#[tokio::test]
async fn events_follow_the_queue() {
    let h = harness(FakeArchive::default()).await;
    let (tx, mut rx) = mpsc::channel(64);
    let service = DownloadService::new(
        h.ctx.clone(),
        FakeArchive::default()
            .with_listing(105, &SESSION_105)
            .failing("CHRG-105hhrg10003"),
        DownloadConfig {
            downloads_dir: h.downloads.path().to_path_buf(),
        },
    )
    .with_events(tx);

    service
        .acquire(&[AcquireTarget::Congress(congress(105))], FileFormat::Txt)
        .await
        .unwrap();
    drop(service);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert!(matches!(events[0], DownloadEvent::Listed { count: 3, .. }));
    assert!(matches!(events[1], DownloadEvent::Queued { total: 3 }));
    let completed = events
        .iter()
        .filter(|e| matches!(e, DownloadEvent::Completed { .. }))
        .count();
    let failed = events
        .iter()
        .filter(|e| matches!(e, DownloadEvent::Failed { .. }))
        .count();
    assert_eq!((completed, failed), (2, 1));
}
