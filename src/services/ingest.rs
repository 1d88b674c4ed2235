//! Transcript ingestion.
//!
//! Turning hearing text into participants and entries is the job of a
//! [`TranscriptParser`]. This module feeds it downloaded text and stores
//! what it produces.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::models::{Document, DocumentId, FileFormat, FileStatus, NewEntry, Participant, ValidationError};
use crate::repository::{status_of, DbContext, DbError, StoreError};

/// Everything a parser extracts from one transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTranscript {
    /// The document, with `complete` set once every entry was produced.
    pub document: Document,
    pub participants: Vec<Participant>,
    pub entries: Vec<NewEntry>,
}

/// Converts raw transcript text into structured records.
pub trait TranscriptParser: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn parse(&self, id: &DocumentId, text: &str) -> Result<ParsedTranscript, Self::Error>;
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0} has no downloaded text file")]
    NotDownloaded(DocumentId),
    #[error("parser returned {found} for {expected}")]
    DocumentMismatch {
        expected: DocumentId,
        found: DocumentId,
    },
    #[error("failed to parse transcript: {0}")]
    Parse(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("database error: {0}")]
    Database(#[from] DbError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for IngestError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(e) => Self::Validation(e),
            StoreError::Database(e) => Self::Database(e),
        }
    }
}

/// Result of ingesting one transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub participants: usize,
    pub entries: usize,
}

/// Reads downloaded transcripts, parses them, and stores the result.
pub struct IngestService<P> {
    ctx: DbContext,
    parser: P,
}

impl<P: TranscriptParser> IngestService<P> {
    pub fn new(ctx: DbContext, parser: P) -> Self {
        Self { ctx, parser }
    }

    /// Parse and store the transcript of one downloaded document.
    pub async fn ingest(&self, id: &DocumentId) -> Result<IngestOutcome, IngestError> {
        let congress = id.congress()?;

        let record = self
            .ctx
            .files()
            .get(id, FileFormat::Txt)
            .await?
            .ok_or_else(|| IngestError::NotDownloaded(id.clone()))?;
        if status_of(&record).await != FileStatus::Present {
            return Err(IngestError::NotDownloaded(id.clone()));
        }
        let Some(path) = record.path else {
            return Err(IngestError::NotDownloaded(id.clone()));
        };

        let text = tokio::fs::read_to_string(&path).await?;
        let parsed = self
            .parser
            .parse(id, &text)
            .map_err(|e| IngestError::Parse(Box::new(e)))?;

        if &parsed.document.id != id {
            return Err(IngestError::DocumentMismatch {
                expected: id.clone(),
                found: parsed.document.id,
            });
        }
        if parsed.document.congress != congress {
            return Err(ValidationError::CongressMismatch {
                id: id.to_string(),
                expected: congress,
            }
            .into());
        }

        let entries = self
            .ctx
            .documents()
            .store_parsed(&parsed.document, &parsed.participants, &parsed.entries)
            .await?;

        info!(
            "Ingested {}: {} participants, {} entries",
            id,
            parsed.participants.len(),
            entries
        );
        Ok(IngestOutcome {
            participants: parsed.participants.len(),
            entries,
        })
    }
}
