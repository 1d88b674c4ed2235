//! Per-Congress aggregates.
//!
//! Nothing here is stored: every figure is counted from `files` and
//! `documents` at the moment it is read.

use std::collections::BTreeMap;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;

use super::diesel_models::CongressRecord;
use super::documents::DocumentRepository;
use super::files::FileRepository;
use super::pool::{DbError, SqlitePool};
use crate::models::{Congress, FileFormat};
use crate::schema::congresses;

/// Completeness figures for one Congress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CongressSummary {
    pub congress: Congress,
    /// Distinct identifiers known in any format or as a document.
    pub total: u64,
    /// Documents whose transcript has been fully parsed.
    pub parsed: u64,
    pub txts: u64,
    pub pdfs: u64,
    pub xmls: u64,
}

impl CongressSummary {
    fn empty(congress: Congress) -> Self {
        Self {
            congress,
            total: 0,
            parsed: 0,
            txts: 0,
            pdfs: 0,
            xmls: 0,
        }
    }

    /// Downloaded count for one format.
    pub fn downloaded(&self, format: FileFormat) -> u64 {
        match format {
            FileFormat::Txt => self.txts,
            FileFormat::Pdf => self.pdfs,
            FileFormat::Xml => self.xmls,
        }
    }
}

/// Repository for the `congresses` relation and its derived counters.
#[derive(Clone)]
pub struct CongressRepository {
    pool: SqlitePool,
}

impl CongressRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Make sure a row exists for the given Congress.
    pub async fn ensure(&self, congress: Congress) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        diesel::insert_or_ignore_into(congresses::table)
            .values(&CongressRecord {
                number: congress.as_i32(),
            })
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// All Congresses with a catalog row, oldest first.
    pub async fn list(&self) -> Result<Vec<Congress>, DbError> {
        let mut conn = self.pool.get().await?;
        let records: Vec<CongressRecord> = congresses::table
            .order(congresses::number.asc())
            .select(CongressRecord::as_select())
            .load(&mut conn)
            .await?;
        Ok(records
            .into_iter()
            .map(|r| Congress::from_stored(r.number))
            .collect())
    }

    /// Distinct known identifiers per Congress.
    pub async fn known_totals(&self) -> Result<BTreeMap<Congress, u64>, DbError> {
        #[derive(diesel::QueryableByName)]
        struct Row {
            #[diesel(sql_type = diesel::sql_types::Integer)]
            congress: i32,
            #[diesel(sql_type = diesel::sql_types::BigInt)]
            total: i64,
        }

        let mut conn = self.pool.get().await?;
        let rows: Vec<Row> = diesel::sql_query(
            "SELECT congress, COUNT(*) AS total FROM (\
                 SELECT id, congress FROM files \
                 UNION SELECT id, congress FROM documents\
             ) GROUP BY congress",
        )
        .load(&mut conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (Congress::from_stored(r.congress), r.total as u64))
            .collect())
    }

    /// Per-Congress summary, computed from current rows.
    ///
    /// Downloaded counts are rows whose content is present on disk.
    pub async fn summaries(&self) -> Result<Vec<CongressSummary>, DbError> {
        let mut summaries: BTreeMap<Congress, CongressSummary> = self
            .list()
            .await?
            .into_iter()
            .map(|c| (c, CongressSummary::empty(c)))
            .collect();

        for (congress, total) in self.known_totals().await? {
            summaries
                .entry(congress)
                .or_insert_with(|| CongressSummary::empty(congress))
                .total = total;
        }

        let files = FileRepository::new(self.pool.clone());
        for group in files.presence_counts().await?.into_iter().filter(|g| g.present) {
            let summary = summaries
                .entry(group.congress)
                .or_insert_with(|| CongressSummary::empty(group.congress));
            match group.format {
                FileFormat::Txt => summary.txts += group.count,
                FileFormat::Pdf => summary.pdfs += group.count,
                FileFormat::Xml => summary.xmls += group.count,
            }
        }

        let documents = DocumentRepository::new(self.pool.clone());
        for group in documents
            .completeness_counts()
            .await?
            .into_iter()
            .filter(|g| g.complete)
        {
            summaries
                .entry(group.congress)
                .or_insert_with(|| CongressSummary::empty(group.congress))
                .parsed += group.count;
        }

        Ok(summaries.into_values().collect())
    }
}
