//! Hearing participants, per-session legislator snapshots, and transcript entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Congress, DocumentId, ValidationError};

/// Whether a participant sits on the committee or testifies before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Legislator,
    Witness,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legislator => "legislator",
            Self::Witness => "witness",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "legislator" => Some(Self::Legislator),
            "witness" => Some(Self::Witness),
            _ => None,
        }
    }
}

/// Party affiliation for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Party {
    #[serde(rename = "D")]
    Democrat,
    #[serde(rename = "I")]
    Independent,
    #[serde(rename = "R")]
    Republican,
}

impl Party {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Democrat => "D",
            Self::Independent => "I",
            Self::Republican => "R",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "D" => Some(Self::Democrat),
            "I" => Some(Self::Independent),
            "R" => Some(Self::Republican),
            _ => None,
        }
    }
}

/// Gender code as published in the biographical directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }
}

macro_rules! us_states {
    ($($variant:ident => $code:literal),+ $(,)?) => {
        /// U.S. states, the District of Columbia, and territories with a delegate.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum UsState {
            $(#[serde(rename = $code)] $variant,)+
        }

        impl UsState {
            pub const ALL: &'static [UsState] = &[$(UsState::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            pub fn from_str(s: &str) -> Option<Self> {
                match s {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

us_states! {
    Alabama => "AL", Alaska => "AK", Arizona => "AZ", Arkansas => "AR",
    California => "CA", Colorado => "CO", Connecticut => "CT", Delaware => "DE",
    Florida => "FL", Georgia => "GA", Hawaii => "HI", Idaho => "ID",
    Illinois => "IL", Indiana => "IN", Iowa => "IA", Kansas => "KS",
    Kentucky => "KY", Louisiana => "LA", Maine => "ME", Maryland => "MD",
    Massachusetts => "MA", Michigan => "MI", Minnesota => "MN", Mississippi => "MS",
    Missouri => "MO", Montana => "MT", Nebraska => "NE", Nevada => "NV",
    NewHampshire => "NH", NewJersey => "NJ", NewMexico => "NM", NewYork => "NY",
    NorthCarolina => "NC", NorthDakota => "ND", Ohio => "OH", Oklahoma => "OK",
    Oregon => "OR", Pennsylvania => "PA", RhodeIsland => "RI", SouthCarolina => "SC",
    SouthDakota => "SD", Tennessee => "TN", Texas => "TX", Utah => "UT",
    Vermont => "VT", Virginia => "VA", Washington => "WA", WestVirginia => "WV",
    Wisconsin => "WI", Wyoming => "WY",
    DistrictOfColumbia => "DC", AmericanSamoa => "AS", Guam => "GU",
    NorthernMarianaIslands => "MP", PuertoRico => "PR", VirginIslands => "VI",
}

/// A person appearing in a hearing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub title: Option<String>,
    pub state: Option<UsState>,
    pub role: Role,
    /// Biographical directory ID; required for legislators.
    pub bioguide: Option<String>,
}

impl Participant {
    pub fn witness(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            title: None,
            state: None,
            role: Role::Witness,
            bioguide: None,
        }
    }

    pub fn legislator(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        bioguide: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            title: None,
            state: None,
            role: Role::Legislator,
            bioguide: Some(bioguide.into()),
        }
    }
}

/// An officeholder as recorded for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legislator {
    pub bioguide: String,
    pub congress: Congress,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub state: UsState,
    pub party: Party,
}

/// One utterance of transcript content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub document: DocumentId,
    pub date: NaiveDate,
    pub participant: Option<String>,
    pub content: String,
}

/// A transcript entry before insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub participant: Option<String>,
    pub content: String,
}

/// Parse a two-letter state code from stored or parsed text.
pub fn parse_state(code: &str) -> Result<UsState, ValidationError> {
    UsState::from_str(code.trim()).ok_or_else(|| ValidationError::UnknownState(code.to_string()))
}
