//! Data models for the hearing catalog.

mod congress;
mod document;
mod file;
mod participant;

pub use congress::{congress_for_year, current_congress, Congress, FIRST_CONGRESS};
pub use document::{Document, DocumentId};
pub use file::{FileFormat, FileRecord, FileStatus};
pub use participant::{
    parse_state, Entry, Gender, Legislator, NewEntry, Participant, Party, Role, UsState,
};

use thiserror::Error;

/// Input that can be rejected before any network or catalog activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{congress} is not a valid Congress (expected {min} through {max})")]
    CongressOutOfRange { congress: u32, min: u32, max: u32 },
    #[error("not a Congress number: {0:?}")]
    MalformedCongress(String),
    #[error("malformed document identifier: {0:?}")]
    MalformedIdentifier(String),
    #[error("unknown file format: {0:?} (expected txt, text, pdf, xml or metadata)")]
    UnknownFormat(String),
    #[error("unknown state or territory code: {0:?}")]
    UnknownState(String),
    #[error("document {id} does not belong to the {expected}")]
    CongressMismatch { id: String, expected: Congress },
    #[error("participant {participant} has no legislator record {bioguide} for the {congress}")]
    UnresolvedLegislator {
        participant: String,
        bioguide: String,
        congress: Congress,
    },
    #[error("transcript for {0} is not marked complete")]
    IncompleteTranscript(String),
}
