//! Hearing documents and their identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Congress, ValidationError};

/// Archive-assigned package identifier, e.g. `CHRG-105hhrg12345`.
///
/// The first run of ASCII digits encodes the owning Congress.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Parse an identifier, rejecting anything without a session digit run.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        let well_formed = !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !well_formed || leading_digits(s).is_none() {
            return Err(ValidationError::MalformedIdentifier(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw session number encoded in the identifier.
    pub fn congress_number(&self) -> u32 {
        // parse() guarantees a digit run
        leading_digits(&self.0).unwrap_or(0)
    }

    /// The owning session, validated against the current range.
    pub fn congress(&self) -> Result<Congress, ValidationError> {
        Congress::new(self.congress_number())
    }

    /// Whether this identifier belongs to the given session.
    pub fn belongs_to(&self, congress: Congress) -> bool {
        self.congress_number() == congress.number()
    }
}

/// Value of the first run of ASCII digits, if any.
fn leading_digits(s: &str) -> Option<u32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// A hearing transcript package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub committee: String,
    pub subcommittee: Option<String>,
    pub congress: Congress,
    /// Participant ID of the presiding member.
    pub chairperson: Option<String>,
    /// Set once every entry of the transcript has been parsed.
    pub complete: bool,
}

impl Document {
    /// Create an incomplete document; the session is derived from the identifier.
    pub fn new(
        id: DocumentId,
        title: impl Into<String>,
        committee: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let congress = id.congress()?;
        Ok(Self {
            id,
            title: title.into(),
            committee: committee.into(),
            subcommittee: None,
            congress,
            chairperson: None,
            complete: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifier() {
        let id = DocumentId::parse("CHRG-105hhrg12345").unwrap();
        assert_eq!(id.congress_number(), 105);
        assert_eq!(id.as_str(), "CHRG-105hhrg12345");
        assert!(id.belongs_to(Congress::new(105).unwrap()));
        assert!(!id.belongs_to(Congress::new(106).unwrap()));
    }

    #[test]
    fn test_malformed_identifiers() {
        assert!(DocumentId::parse("").is_err());
        assert!(DocumentId::parse("CHRG-hhrg").is_err());
        assert!(DocumentId::parse("CHRG 105 hhrg").is_err());
        assert!(DocumentId::parse("../105").is_err());
    }

    #[test]
    fn test_document_derives_congress() {
        let id = DocumentId::parse("CHRG-110hhrg40001").unwrap();
        let doc = Document::new(id, "Oversight Hearing", "Judiciary").unwrap();
        assert_eq!(doc.congress.number(), 110);
        assert!(!doc.complete);
    }

    #[test]
    fn test_document_outside_range() {
        let id = DocumentId::parse("CHRG-104hhrg1").unwrap();
        assert!(matches!(
            Document::new(id, "t", "c"),
            Err(ValidationError::CongressOutOfRange { .. })
        ));
    }
}
