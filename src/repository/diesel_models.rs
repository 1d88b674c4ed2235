//! Diesel ORM models for database tables.
//!
//! Records mirror the stored rows; conversion into domain types happens in
//! the repositories so that malformed rows surface as deserialization errors.

use diesel::prelude::*;

use crate::schema;

/// Congress record from the database.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::congresses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CongressRecord {
    pub number: i32,
}

/// Document record from the database.
#[derive(Queryable, QueryableByName, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    pub committee: String,
    pub subcommittee: Option<String>,
    pub congress: i32,
    pub chairperson: Option<String>,
    pub complete: bool,
}

/// New document for insertion.
#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = schema::documents)]
#[diesel(treat_none_as_null = true)]
pub struct NewDocument<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub committee: &'a str,
    pub subcommittee: Option<&'a str>,
    pub congress: i32,
    pub chairperson: Option<&'a str>,
    pub complete: bool,
}

/// Legislator record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::legislators)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LegislatorRecord {
    pub bioguide: String,
    pub congress: i32,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub state: String,
    pub party: String,
}

/// New legislator for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::legislators)]
pub struct NewLegislator<'a> {
    pub bioguide: &'a str,
    pub congress: i32,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub gender: &'a str,
    pub state: &'a str,
    pub party: &'a str,
}

/// Participant record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::participants)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ParticipantRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub title: Option<String>,
    pub state: Option<String>,
    pub role: String,
    pub bioguide: Option<String>,
}

/// New participant for insertion.
#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = schema::participants)]
#[diesel(treat_none_as_null = true)]
pub struct NewParticipant<'a> {
    pub id: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub title: Option<&'a str>,
    pub state: Option<&'a str>,
    pub role: &'a str,
    pub bioguide: Option<&'a str>,
}

/// Participant-to-document link for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::participants_documents)]
pub struct NewParticipantDocument<'a> {
    pub participant: &'a str,
    pub document: &'a str,
}

/// Transcript entry record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EntryRecord {
    pub id: i64,
    pub document: String,
    pub date: String,
    pub participant: Option<String>,
    pub content: String,
}

/// New transcript entry for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::entries)]
pub struct NewEntryRecord<'a> {
    pub document: &'a str,
    pub date: String,
    pub participant: Option<&'a str>,
    pub content: &'a str,
}

/// File acquisition record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::files)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FileRow {
    pub id: String,
    pub format: String,
    pub congress: i32,
    pub path: Option<String>,
}

/// New file record for insertion. The path always starts out unset.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::files)]
pub struct NewFile<'a> {
    pub id: &'a str,
    pub format: &'a str,
    pub congress: i32,
}
