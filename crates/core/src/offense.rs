//! Offenses and source findings
//!
//! A data source answers one query with a [`SourceFinding`]: did it
//! recognise the identity, and which [`Offense`]s does it hold.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Risk category a source reports on
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    /// Court and arrest records
    Criminal,
    /// Sanctions and watchlists
    Sanctions,
    /// Identity verification (deceased, synthetic, mismatched)
    Identity,
    /// Healthcare exclusion lists
    Health,
}

impl Pillar {
    pub const ALL: [Pillar; 4] = [
        Pillar::Criminal,
        Pillar::Sanctions,
        Pillar::Identity,
        Pillar::Health,
    ];
}

/// One adverse finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offense {
    /// Severity tag, e.g. "Felony", "Sanction", "Deceased"
    pub level: String,
    /// Occurrence date (YYYY-MM-DD)
    pub date: String,
    /// Where it happened
    pub location: String,
    /// Free-text detail
    pub details: String,
    /// Name of the source that reported it
    pub source: String,
    /// Risk category used for scoring
    pub pillar: Pillar,
}

impl Offense {
    pub fn new(
        level: impl Into<String>,
        date: impl Into<String>,
        location: impl Into<String>,
        details: impl Into<String>,
        source: impl Into<String>,
        pillar: Pillar,
    ) -> Self {
        Self {
            level: level.into(),
            date: date.into(),
            location: location.into(),
            details: details.into(),
            source: source.into(),
            pillar,
        }
    }

    /// Deduplication key: two offenses with the same date and location
    /// are the same underlying event.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.date, &self.location)
    }
}

/// Result of one successful probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFinding {
    pub source: String,
    pub pillar: Pillar,
    /// Whether the source recognised the queried identity at all
    pub identity_match: bool,
    pub offenses: Vec<Offense>,
}

impl SourceFinding {
    /// A source that matched the identity and found nothing
    pub fn clear(source: impl Into<String>, pillar: Pillar) -> Self {
        Self {
            source: source.into(),
            pillar,
            identity_match: true,
            offenses: Vec::new(),
        }
    }

    /// A source that does not know the identity
    pub fn no_match(source: impl Into<String>, pillar: Pillar) -> Self {
        Self {
            source: source.into(),
            pillar,
            identity_match: false,
            offenses: Vec::new(),
        }
    }

    /// A matched source with offenses
    pub fn hit(source: impl Into<String>, pillar: Pillar, offenses: Vec<Offense>) -> Self {
        Self {
            source: source.into(),
            pillar,
            identity_match: true,
            offenses,
        }
    }

    /// Hit source: matched the identity and reported at least one offense
    pub fn is_hit(&self) -> bool {
        self.identity_match && !self.offenses.is_empty()
    }
}
