//! File acquisition records.
//!
//! A row in `files` means "this identifier belongs to this Congress for this
//! format". The `path` column moves the row through the acquisition states:
//! NULL is pending, a path that resolves is present, and a path that no
//! longer resolves is drift awaiting reconciliation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use super::diesel_models::{FileRow, NewFile};
use super::pool::{DbError, SqlitePool};
use super::util::{to_deserialization_error, to_diesel_error};
use crate::models::{Congress, DocumentId, FileFormat, FileRecord, FileStatus};
use crate::schema::{congresses, files};

impl TryFrom<FileRow> for FileRecord {
    type Error = DbError;

    fn try_from(row: FileRow) -> Result<Self, Self::Error> {
        Ok(FileRecord {
            id: DocumentId::parse(&row.id).map_err(to_deserialization_error)?,
            format: FileFormat::parse(&row.format).map_err(to_deserialization_error)?,
            congress: Congress::from_stored(row.congress),
            path: row.path.map(PathBuf::from),
        })
    }
}

/// Number of file rows for one (congress, format, presence) group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceCount {
    pub congress: Congress,
    pub format: FileFormat,
    /// Whether the rows' content is on disk.
    pub present: bool,
    pub count: u64,
}

/// Repository for the `files` relation.
#[derive(Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the record for one (identifier, format) pair.
    pub async fn get(
        &self,
        id: &DocumentId,
        format: FileFormat,
    ) -> Result<Option<FileRecord>, DbError> {
        let mut conn = self.pool.get().await?;
        files::table
            .find((id.as_str(), format.as_str()))
            .select(FileRow::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .map(FileRecord::try_from)
            .transpose()
    }

    /// Compute the acquisition state of one (identifier, format) pair.
    ///
    /// Reads the stored row and checks the filesystem; never writes.
    pub async fn file_status(
        &self,
        id: &DocumentId,
        format: FileFormat,
    ) -> Result<FileStatus, DbError> {
        Ok(match self.get(id, format).await? {
            None => FileStatus::Unknown,
            Some(record) => status_of(&record).await,
        })
    }

    /// Insert a pending row for every identifier not yet known for `format`.
    ///
    /// Existing rows are left untouched. Returns the number of rows inserted.
    pub async fn register_session_listing<'a, I>(
        &self,
        congress: Congress,
        ids: I,
        format: FileFormat,
    ) -> Result<usize, DbError>
    where
        I: IntoIterator<Item = &'a DocumentId>,
    {
        let ids: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
        let number = congress.as_i32();

        let mut conn = self.pool.get().await?;
        let inserted = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    diesel::insert_or_ignore_into(congresses::table)
                        .values(congresses::number.eq(number))
                        .execute(conn)
                        .await?;

                    let mut inserted = 0;
                    for id in &ids {
                        inserted += diesel::insert_or_ignore_into(files::table)
                            .values(&NewFile {
                                id,
                                format: format.as_str(),
                                congress: number,
                            })
                            .execute(conn)
                            .await?;
                    }
                    Ok::<_, DbError>(inserted)
                })
            })
            .await?;

        debug!(
            "Registered {} new {} rows for the {}",
            inserted, format, congress
        );
        Ok(inserted)
    }

    /// Record the storage path for an existing row.
    ///
    /// A row that was never registered is left alone; returns whether a row
    /// was updated. Paths must be valid UTF-8 so they read back unchanged.
    pub async fn commit_path(
        &self,
        id: &DocumentId,
        format: FileFormat,
        path: &Path,
    ) -> Result<bool, DbError> {
        let path = path
            .to_str()
            .ok_or_else(|| to_diesel_error(format!("path is not UTF-8: {}", path.display())))?
            .to_string();
        let mut conn = self.pool.get().await?;
        let rows = diesel::update(files::table.find((id.as_str(), format.as_str())))
            .set(files::path.eq(Some(path)))
            .execute(&mut conn)
            .await?;
        Ok(rows > 0)
    }

    /// Return a row to pending by clearing its path.
    pub async fn clear_path(&self, id: &DocumentId, format: FileFormat) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;
        let rows = diesel::update(files::table.find((id.as_str(), format.as_str())))
            .set(files::path.eq(None::<String>))
            .execute(&mut conn)
            .await?;
        Ok(rows > 0)
    }

    /// Remove a row entirely so the pair reads as unknown again.
    pub async fn delete_file_record(
        &self,
        id: &DocumentId,
        format: FileFormat,
    ) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;
        let rows = diesel::delete(files::table.find((id.as_str(), format.as_str())))
            .execute(&mut conn)
            .await?;
        Ok(rows > 0)
    }

    /// Count rows registered for a (congress, format) pair.
    pub async fn count_for(&self, congress: Congress, format: FileFormat) -> Result<u64, DbError> {
        use diesel::dsl::count_star;

        let mut conn = self.pool.get().await?;
        let count: i64 = files::table
            .filter(files::congress.eq(congress.as_i32()))
            .filter(files::format.eq(format.as_str()))
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }

    /// All rows for a (congress, format) pair, ordered by identifier.
    pub async fn list_for(
        &self,
        congress: Congress,
        format: FileFormat,
    ) -> Result<Vec<FileRecord>, DbError> {
        let mut conn = self.pool.get().await?;
        files::table
            .filter(files::congress.eq(congress.as_i32()))
            .filter(files::format.eq(format.as_str()))
            .order(files::id.asc())
            .select(FileRow::as_select())
            .load(&mut conn)
            .await?
            .into_iter()
            .map(FileRecord::try_from)
            .collect()
    }

    /// Every row that carries a recorded path.
    pub async fn tracked(&self) -> Result<Vec<FileRecord>, DbError> {
        let mut conn = self.pool.get().await?;
        files::table
            .filter(files::path.is_not_null())
            .order((files::congress.asc(), files::format.asc(), files::id.asc()))
            .select(FileRow::as_select())
            .load(&mut conn)
            .await?
            .into_iter()
            .map(FileRecord::try_from)
            .collect()
    }

    /// Row counts grouped by (congress, format, presence).
    ///
    /// Presence is checked on disk, so a drifted row counts as absent even
    /// before the reconciler has cleared it.
    pub async fn presence_counts(&self) -> Result<Vec<PresenceCount>, DbError> {
        let rows: Vec<FileRow> = {
            let mut conn = self.pool.get().await?;
            files::table
                .select(FileRow::as_select())
                .load(&mut conn)
                .await?
        };

        let mut groups: BTreeMap<(Congress, FileFormat, bool), u64> = BTreeMap::new();
        for row in rows {
            let record = FileRecord::try_from(row)?;
            let present = status_of(&record).await == FileStatus::Present;
            *groups
                .entry((record.congress, record.format, present))
                .or_default() += 1;
        }

        Ok(groups
            .into_iter()
            .map(|((congress, format, present), count)| PresenceCount {
                congress,
                format,
                present,
                count,
            })
            .collect())
    }
}

/// Acquisition state of a stored row, checked against the filesystem.
pub async fn status_of(record: &FileRecord) -> FileStatus {
    match &record.path {
        None => FileStatus::Pending,
        Some(path) => match tokio::fs::try_exists(path).await {
            Ok(true) => FileStatus::Present,
            _ => FileStatus::Missing,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup_test_db;

    fn id(s: &str) -> DocumentId {
        DocumentId::parse(s).unwrap()
    }

    fn congress(n: u32) -> Congress {
        Congress::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let (ctx, dir) = setup_test_db().await;
        let repo = ctx.files();
        let doc = id("CHRG-105hhrg10001");

        assert_eq!(
            repo.file_status(&doc, FileFormat::Txt).await.unwrap(),
            FileStatus::Unknown
        );

        repo.register_session_listing(congress(105), [&doc], FileFormat::Txt)
            .await
            .unwrap();
        assert_eq!(
            repo.file_status(&doc, FileFormat::Txt).await.unwrap(),
            FileStatus::Pending
        );

        let path = dir.path().join("CHRG-105hhrg10001.txt");
        assert!(repo.commit_path(&doc, FileFormat::Txt, &path).await.unwrap());
        assert_eq!(
            repo.file_status(&doc, FileFormat::Txt).await.unwrap(),
            FileStatus::Missing
        );

        std::fs::write(&path, b"transcript").unwrap();
        assert_eq!(
            repo.file_status(&doc, FileFormat::Txt).await.unwrap(),
            FileStatus::Present
        );

        // Other formats are tracked independently
        assert_eq!(
            repo.file_status(&doc, FileFormat::Pdf).await.unwrap(),
            FileStatus::Unknown
        );
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.files();
        let first = [id("CHRG-106hhrg1"), id("CHRG-106hhrg2")];
        let overlap = [id("CHRG-106hhrg2"), id("CHRG-106hhrg3")];

        let inserted = repo
            .register_session_listing(congress(106), &first, FileFormat::Pdf)
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let inserted = repo
            .register_session_listing(congress(106), &overlap, FileFormat::Pdf)
            .await
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(repo.count_for(congress(106), FileFormat::Pdf).await.unwrap(), 3);

        let inserted = repo
            .register_session_listing(congress(106), first.iter().chain(&overlap), FileFormat::Pdf)
            .await
            .unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(repo.count_for(congress(106), FileFormat::Pdf).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_register_leaves_existing_paths() {
        let (ctx, dir) = setup_test_db().await;
        let repo = ctx.files();
        let doc = id("CHRG-107hhrg7");
        let path = dir.path().join("kept.xml");

        repo.register_session_listing(congress(107), [&doc], FileFormat::Xml)
            .await
            .unwrap();
        repo.commit_path(&doc, FileFormat::Xml, &path).await.unwrap();
        repo.register_session_listing(congress(107), [&doc], FileFormat::Xml)
            .await
            .unwrap();

        let record = repo.get(&doc, FileFormat::Xml).await.unwrap().unwrap();
        assert_eq!(record.path, Some(path));
    }

    #[tokio::test]
    async fn test_commit_path_without_row_is_noop() {
        let (ctx, dir) = setup_test_db().await;
        let repo = ctx.files();
        let doc = id("CHRG-108hhrg8");

        let updated = repo
            .commit_path(&doc, FileFormat::Txt, &dir.path().join("x.txt"))
            .await
            .unwrap();
        assert!(!updated);
        assert!(repo.get(&doc, FileFormat::Txt).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_file_record() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.files();
        let doc = id("CHRG-109hhrg9");

        repo.register_session_listing(congress(109), [&doc], FileFormat::Txt)
            .await
            .unwrap();
        assert!(repo.delete_file_record(&doc, FileFormat::Txt).await.unwrap());
        assert!(!repo.delete_file_record(&doc, FileFormat::Txt).await.unwrap());
        assert_eq!(
            repo.file_status(&doc, FileFormat::Txt).await.unwrap(),
            FileStatus::Unknown
        );
    }

    #[tokio::test]
    async fn test_presence_counts() {
        let (ctx, dir) = setup_test_db().await;
        let repo = ctx.files();
        let docs = [id("CHRG-110hhrg1"), id("CHRG-110hhrg2"), id("CHRG-110hhrg3")];

        repo.register_session_listing(congress(110), &docs, FileFormat::Txt)
            .await
            .unwrap();
        let written = dir.path().join("a.txt");
        std::fs::write(&written, b"transcript").unwrap();
        repo.commit_path(&docs[0], FileFormat::Txt, &written)
            .await
            .unwrap();
        // Recorded but never written
        repo.commit_path(&docs[1], FileFormat::Txt, &dir.path().join("b.txt"))
            .await
            .unwrap();

        let counts = repo.presence_counts().await.unwrap();
        let present: u64 = counts.iter().filter(|c| c.present).map(|c| c.count).sum();
        let absent: u64 = counts.iter().filter(|c| !c.present).map(|c| c.count).sum();
        assert_eq!(present, 1);
        assert_eq!(absent, 2);
        assert_eq!(
            repo.file_status(&docs[1], FileFormat::Txt).await.unwrap(),
            FileStatus::Missing
        );

        assert_eq!(repo.tracked().await.unwrap().len(), 2);
        assert_eq!(repo.list_for(congress(110), FileFormat::Txt).await.unwrap().len(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_commit_path_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (ctx, dir) = setup_test_db().await;
        let repo = ctx.files();
        let doc = id("CHRG-111hhrg1");
        repo.register_session_listing(congress(111), [&doc], FileFormat::Txt)
            .await
            .unwrap();

        let path = dir.path().join(OsStr::from_bytes(b"bad\xff.txt"));
        assert!(repo.commit_path(&doc, FileFormat::Txt, &path).await.is_err());
        assert_eq!(
            repo.file_status(&doc, FileFormat::Txt).await.unwrap(),
            FileStatus::Pending
        );
    }
}
