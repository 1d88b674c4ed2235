//! Hearing documents, participants, legislators, and transcript entries.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use thiserror::Error;
use tracing::debug;

use super::diesel_models::{
    DocumentRecord, EntryRecord, LegislatorRecord, NewDocument, NewEntryRecord, NewLegislator,
    NewParticipant, NewParticipantDocument, ParticipantRecord,
};
use super::pool::{DbError, SqliteConn, SqlitePool};
use super::util::{to_deserialization_error, to_diesel_error};
use crate::models::{
    parse_state, Congress, Document, DocumentId, Entry, Gender, Legislator, NewEntry, Participant,
    Party, Role, ValidationError,
};
use crate::schema::{congresses, documents, entries, legislators, participants, participants_documents};

const DATE_FORMAT: &str = "%Y-%m-%d";

impl TryFrom<DocumentRecord> for Document {
    type Error = DbError;

    fn try_from(record: DocumentRecord) -> Result<Self, Self::Error> {
        Ok(Document {
            id: DocumentId::parse(&record.id).map_err(to_deserialization_error)?,
            title: record.title,
            committee: record.committee,
            subcommittee: record.subcommittee,
            congress: Congress::from_stored(record.congress),
            chairperson: record.chairperson,
            complete: record.complete,
        })
    }
}

impl TryFrom<ParticipantRecord> for Participant {
    type Error = DbError;

    fn try_from(record: ParticipantRecord) -> Result<Self, Self::Error> {
        let role = Role::from_str(&record.role)
            .ok_or_else(|| to_diesel_error(format!("unknown role: {}", record.role)))?;
        let state = record
            .state
            .as_deref()
            .map(parse_state)
            .transpose()
            .map_err(to_deserialization_error)?;

        Ok(Participant {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            title: record.title,
            state,
            role,
            bioguide: record.bioguide,
        })
    }
}

impl TryFrom<LegislatorRecord> for Legislator {
    type Error = DbError;

    fn try_from(record: LegislatorRecord) -> Result<Self, Self::Error> {
        let gender = Gender::from_str(&record.gender)
            .ok_or_else(|| to_diesel_error(format!("unknown gender code: {}", record.gender)))?;
        let party = Party::from_str(&record.party)
            .ok_or_else(|| to_diesel_error(format!("unknown party code: {}", record.party)))?;

        Ok(Legislator {
            bioguide: record.bioguide,
            congress: Congress::from_stored(record.congress),
            first_name: record.first_name,
            last_name: record.last_name,
            gender,
            state: parse_state(&record.state).map_err(to_deserialization_error)?,
            party,
        })
    }
}

impl TryFrom<EntryRecord> for Entry {
    type Error = DbError;

    fn try_from(record: EntryRecord) -> Result<Self, Self::Error> {
        Ok(Entry {
            id: record.id,
            document: DocumentId::parse(&record.document).map_err(to_deserialization_error)?,
            date: NaiveDate::parse_from_str(&record.date, DATE_FORMAT)
                .map_err(to_deserialization_error)?,
            participant: record.participant,
            content: record.content,
        })
    }
}

fn new_document(doc: &Document) -> NewDocument<'_> {
    NewDocument {
        id: doc.id.as_str(),
        title: &doc.title,
        committee: &doc.committee,
        subcommittee: doc.subcommittee.as_deref(),
        congress: doc.congress.as_i32(),
        chairperson: doc.chairperson.as_deref(),
        complete: doc.complete,
    }
}

fn new_participant(participant: &Participant) -> NewParticipant<'_> {
    NewParticipant {
        id: &participant.id,
        first_name: &participant.first_name,
        last_name: &participant.last_name,
        title: participant.title.as_deref(),
        state: participant.state.as_ref().map(|s| s.as_str()),
        role: participant.role.as_str(),
        bioguide: participant.bioguide.as_deref(),
    }
}

/// Criteria for [`DocumentRepository::list_documents`]. Unset fields match all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub congress: Option<Congress>,
    pub complete: Option<bool>,
}

/// Number of documents for one (congress, completeness) group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletenessCount {
    pub congress: Congress,
    pub complete: bool,
    pub count: u64,
}

/// Failure while storing a parsed transcript.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("database error: {0}")]
    Database(#[from] DbError),
}

/// Repository for documents and their transcript content.
#[derive(Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new document. Fails if the identifier already exists.
    pub async fn create_document(&self, doc: &Document) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        ensure_congress(&mut conn, doc.congress).await?;
        diesel::insert_into(documents::table)
            .values(&new_document(doc))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Get a document by identifier.
    pub async fn get_document(&self, id: &DocumentId) -> Result<Option<Document>, DbError> {
        let mut conn = self.pool.get().await?;
        documents::table
            .find(id.as_str())
            .select(DocumentRecord::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .map(Document::try_from)
            .transpose()
    }

    /// List documents matching a filter, ordered by identifier.
    pub async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<Document>, DbError> {
        use diesel::sql_types::{Bool, Integer, Nullable};

        let mut conn = self.pool.get().await?;
        let records: Vec<DocumentRecord> = diesel::sql_query(
            "SELECT * FROM documents \
             WHERE (?1 IS NULL OR congress = ?1) AND (?2 IS NULL OR complete = ?2) \
             ORDER BY id",
        )
        .bind::<Nullable<Integer>, _>(filter.congress.map(|c| c.as_i32()))
        .bind::<Nullable<Bool>, _>(filter.complete)
        .load(&mut conn)
        .await?;

        records.into_iter().map(Document::try_from).collect()
    }

    /// Delete a document together with its entries and participant links.
    pub async fn delete_document(&self, id: &DocumentId) -> Result<bool, DbError> {
        let id = id.to_string();
        let mut conn = self.pool.get().await?;
        conn.transaction(move |conn| {
            Box::pin(async move {
                diesel::delete(entries::table.filter(entries::document.eq(&id)))
                    .execute(conn)
                    .await?;
                diesel::delete(
                    participants_documents::table.filter(participants_documents::document.eq(&id)),
                )
                .execute(conn)
                .await?;
                let rows = diesel::delete(documents::table.find(&id))
                    .execute(conn)
                    .await?;
                Ok(rows > 0)
            })
        })
        .await
    }

    /// Insert or update a participant.
    pub async fn save_participant(&self, participant: &Participant) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        upsert_participant(&mut conn, participant).await
    }

    /// Get a participant by identifier.
    pub async fn get_participant(&self, id: &str) -> Result<Option<Participant>, DbError> {
        let mut conn = self.pool.get().await?;
        participants::table
            .find(id)
            .select(ParticipantRecord::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .map(Participant::try_from)
            .transpose()
    }

    /// Participants linked to a document, ordered by identifier.
    pub async fn participants_for_document(
        &self,
        id: &DocumentId,
    ) -> Result<Vec<Participant>, DbError> {
        let mut conn = self.pool.get().await?;
        participants::table
            .inner_join(
                participants_documents::table
                    .on(participants_documents::participant.eq(participants::id)),
            )
            .filter(participants_documents::document.eq(id.as_str()))
            .order(participants::id.asc())
            .select(ParticipantRecord::as_select())
            .load(&mut conn)
            .await?
            .into_iter()
            .map(Participant::try_from)
            .collect()
    }

    /// Insert or replace the legislator row for (bioguide, congress).
    pub async fn save_legislator(&self, legislator: &Legislator) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        ensure_congress(&mut conn, legislator.congress).await?;
        diesel::replace_into(legislators::table)
            .values(&NewLegislator {
                bioguide: &legislator.bioguide,
                congress: legislator.congress.as_i32(),
                first_name: &legislator.first_name,
                last_name: &legislator.last_name,
                gender: legislator.gender.as_str(),
                state: legislator.state.as_str(),
                party: legislator.party.as_str(),
            })
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Get the legislator row for one person in one session.
    pub async fn get_legislator(
        &self,
        bioguide: &str,
        congress: Congress,
    ) -> Result<Option<Legislator>, DbError> {
        let mut conn = self.pool.get().await?;
        legislators::table
            .find((bioguide, congress.as_i32()))
            .select(LegislatorRecord::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .map(Legislator::try_from)
            .transpose()
    }

    /// Transcript entries of a document in insertion order.
    pub async fn entries_for_document(&self, id: &DocumentId) -> Result<Vec<Entry>, DbError> {
        let mut conn = self.pool.get().await?;
        entries::table
            .filter(entries::document.eq(id.as_str()))
            .order(entries::id.asc())
            .select(EntryRecord::as_select())
            .load(&mut conn)
            .await?
            .into_iter()
            .map(Entry::try_from)
            .collect()
    }

    /// Store a fully parsed transcript in one transaction.
    ///
    /// Writes participants, the document (marked complete), participant
    /// links, and entries. Any previous entries and links for the document
    /// are replaced. Every `legislator` participant must resolve to a
    /// legislator row for the document's session.
    pub async fn store_parsed(
        &self,
        doc: &Document,
        people: &[Participant],
        new_entries: &[NewEntry],
    ) -> Result<usize, StoreError> {
        if !doc.complete {
            return Err(ValidationError::IncompleteTranscript(doc.id.to_string()).into());
        }

        let doc = doc.clone();
        let people = people.to_vec();
        let new_entries = new_entries.to_vec();

        let mut conn = self.pool.get().await?;
        let stored = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    ensure_congress(conn, doc.congress).await?;

                    for person in &people {
                        if person.role == Role::Legislator {
                            resolve_legislator(conn, person, doc.congress).await?;
                        }
                        upsert_participant(conn, person).await?;
                    }

                    let record = new_document(&doc);
                    diesel::insert_into(documents::table)
                        .values(&record)
                        .on_conflict(documents::id)
                        .do_update()
                        .set(&record)
                        .execute(conn)
                        .await?;

                    let id = doc.id.as_str();
                    diesel::delete(entries::table.filter(entries::document.eq(id)))
                        .execute(conn)
                        .await?;
                    diesel::delete(
                        participants_documents::table
                            .filter(participants_documents::document.eq(id)),
                    )
                    .execute(conn)
                    .await?;

                    for person in &people {
                        diesel::insert_or_ignore_into(participants_documents::table)
                            .values(&NewParticipantDocument {
                                participant: &person.id,
                                document: id,
                            })
                            .execute(conn)
                            .await?;
                    }

                    let mut stored = 0;
                    for entry in &new_entries {
                        stored += diesel::insert_into(entries::table)
                            .values(&NewEntryRecord {
                                document: id,
                                date: entry.date.format(DATE_FORMAT).to_string(),
                                participant: entry.participant.as_deref(),
                                content: &entry.content,
                            })
                            .execute(conn)
                            .await?;
                    }

                    debug!(
                        "Stored {} entries and {} participants for {}",
                        stored,
                        people.len(),
                        id
                    );
                    Ok::<_, StoreError>(stored)
                })
            })
            .await?;

        Ok(stored)
    }

    /// Document counts grouped by (congress, completeness).
    pub async fn completeness_counts(&self) -> Result<Vec<CompletenessCount>, DbError> {
        use diesel::dsl::count_star;

        let mut conn = self.pool.get().await?;
        let rows: Vec<(i32, bool, i64)> = documents::table
            .group_by((documents::congress, documents::complete))
            .select((documents::congress, documents::complete, count_star()))
            .order((documents::congress.asc(), documents::complete.asc()))
            .load(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(congress, complete, count)| CompletenessCount {
                congress: Congress::from_stored(congress),
                complete,
                count: count as u64,
            })
            .collect())
    }
}

async fn ensure_congress(conn: &mut SqliteConn, congress: Congress) -> Result<(), DbError> {
    diesel::insert_or_ignore_into(congresses::table)
        .values(congresses::number.eq(congress.as_i32()))
        .execute(conn)
        .await?;
    Ok(())
}

async fn upsert_participant(conn: &mut SqliteConn, participant: &Participant) -> Result<(), DbError> {
    let record = new_participant(participant);
    diesel::insert_into(participants::table)
        .values(&record)
        .on_conflict(participants::id)
        .do_update()
        .set(&record)
        .execute(conn)
        .await?;
    Ok(())
}

/// Check that a legislator participant maps to exactly one legislator row.
async fn resolve_legislator(
    conn: &mut SqliteConn,
    participant: &Participant,
    congress: Congress,
) -> Result<(), StoreError> {
    use diesel::dsl::count_star;

    let unresolved = || ValidationError::UnresolvedLegislator {
        participant: participant.id.clone(),
        bioguide: participant.bioguide.clone().unwrap_or_default(),
        congress,
    };

    let Some(bioguide) = participant.bioguide.as_deref() else {
        return Err(unresolved().into());
    };

    let count: i64 = legislators::table
        .filter(legislators::bioguide.eq(bioguide))
        .filter(legislators::congress.eq(congress.as_i32()))
        .select(count_star())
        .first(conn)
        .await?;

    if count == 1 {
        Ok(())
    } else {
        Err(unresolved().into())
    }
}
