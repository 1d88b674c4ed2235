//! File acquisition records and formats.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{Congress, DocumentId, ValidationError};

/// A downloadable encoding of a hearing package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Txt,
    Pdf,
    Xml,
}

impl FileFormat {
    pub const ALL: [FileFormat; 3] = [FileFormat::Txt, FileFormat::Pdf, FileFormat::Xml];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Pdf => "pdf",
            Self::Xml => "xml",
        }
    }

    /// Parse a format name, accepting the `text` and `metadata` aliases.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "pdf" => Ok(Self::Pdf),
            "xml" | "metadata" => Ok(Self::Xml),
            _ => Err(ValidationError::UnknownFormat(s.to_string())),
        }
    }

    /// Link-type token the archive uses to select this rendition.
    pub fn link_type(&self) -> &'static str {
        match self {
            Self::Txt => "htm",
            Self::Pdf => "pdf",
            Self::Xml => "mods",
        }
    }

    /// File extension used on disk.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Human-readable label for status output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Txt => "Text files",
            Self::Pdf => "PDF files",
            Self::Xml => "Metadata",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acquisition state of one (document, format) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// No catalog row.
    Unknown,
    /// Row exists, nothing fetched.
    Pending,
    /// Recorded path resolves on disk.
    Present,
    /// Recorded path no longer resolves.
    Missing,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Pending => "pending",
            Self::Present => "present",
            Self::Missing => "missing",
        }
    }

    /// Whether the orchestrator must fetch content for this state.
    pub fn needs_fetch(&self) -> bool {
        !matches!(self, Self::Present)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `files` relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: DocumentId,
    pub format: FileFormat,
    pub congress: Congress,
    pub path: Option<PathBuf>,
}
