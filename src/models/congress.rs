//! Legislative sessions ("Congresses").
//!
//! Only completed sessions from the 105th Congress onward are valid
//! acquisition targets. The session currently in progress is never valid.

use std::fmt;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;
use crate::utils::ordinal;

/// Earliest session with published hearing transcripts in the archive.
pub const FIRST_CONGRESS: u32 = 105;

/// A validated Congress number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Congress(u32);

impl Congress {
    /// Validate a Congress number against the current calendar year.
    pub fn new(number: u32) -> Result<Self, ValidationError> {
        Self::new_as_of(number, current_congress())
    }

    /// Validate a Congress number against an explicit current session.
    pub fn new_as_of(number: u32, current: u32) -> Result<Self, ValidationError> {
        let max = current.saturating_sub(1);
        if (FIRST_CONGRESS..=max).contains(&number) {
            Ok(Self(number))
        } else {
            Err(ValidationError::CongressOutOfRange {
                congress: number,
                min: FIRST_CONGRESS,
                max,
            })
        }
    }

    /// Parse a Congress number from user input.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let number = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::MalformedCongress(s.to_string()))?;
        Self::new(number)
    }

    /// Wrap a number already stored in the catalog.
    ///
    /// Catalog rows were validated on the way in, so no range check is done.
    pub(crate) fn from_stored(number: i32) -> Self {
        Self(number.max(0) as u32)
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    pub(crate) fn as_i32(&self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for Congress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Congress", ordinal(self.0))
    }
}

/// The session in progress for the current calendar year.
pub fn current_congress() -> u32 {
    congress_for_year(Utc::now().year())
}

/// The session in progress during a given calendar year.
pub fn congress_for_year(year: i32) -> u32 {
    ((year - 1789) / 2 + 1).max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_congress_for_year() {
        assert_eq!(congress_for_year(1997), 105);
        assert_eq!(congress_for_year(2021), 117);
        assert_eq!(congress_for_year(2022), 117);
        assert_eq!(congress_for_year(2023), 118);
    }

    #[test]
    fn test_valid_range() {
        assert!(Congress::new_as_of(105, 118).is_ok());
        assert!(Congress::new_as_of(117, 118).is_ok());
        assert!(matches!(
            Congress::new_as_of(104, 118),
            Err(ValidationError::CongressOutOfRange { min: 105, max: 117, .. })
        ));
    }

    #[test]
    fn test_current_congress_rejected() {
        let current = current_congress();
        assert!(Congress::new(current).is_err());
        assert!(Congress::new(current - 1).is_ok());
    }

    #[test]
    fn test_parse() {
        assert_eq!(Congress::parse(" 110 ").unwrap().number(), 110);
        assert!(matches!(
            Congress::parse("one-ten"),
            Err(ValidationError::MalformedCongress(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Congress::new(111).unwrap().to_string(), "111th Congress");
        assert_eq!(Congress::new(112).unwrap().to_string(), "112th Congress");
        assert_eq!(Congress::new(113).unwrap().to_string(), "113th Congress");
        assert_eq!(Congress::new(106).unwrap().to_string(), "106th Congress");
    }
}
