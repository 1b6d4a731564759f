/*!
 * Narration voices.
 *
 * Transcript files carry the narrator as a trailing tag (`03_Rogzy.txt`).
 * The tag maps to a fixed synthesis voice; unknown tags are rejected.
 */

use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// Narrator voices available for synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Voice {
    Rogzy,
    Giacomo,
    DavidStOnge,
    Fanis,
    Loic,
    Mogenet,
    Pantamis,
    Renaud,
    SpanishQuestion,
    EnglishQuestion,
}

impl Voice {
    /// Every registered voice
    pub const ALL: [Voice; 10] = [
        Voice::Rogzy,
        Voice::Giacomo,
        Voice::DavidStOnge,
        Voice::Fanis,
        Voice::Loic,
        Voice::Mogenet,
        Voice::Pantamis,
        Voice::Renaud,
        Voice::SpanishQuestion,
        Voice::EnglishQuestion,
    ];

    /// Tag used in artifact filenames
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Rogzy => "Rogzy",
            Self::Giacomo => "Giacomo",
            Self::DavidStOnge => "David St-onge",
            Self::Fanis => "Fanis",
            Self::Loic => "Loic",
            Self::Mogenet => "Mogenet",
            Self::Pantamis => "Pantamis",
            Self::Renaud => "Renaud",
            Self::SpanishQuestion => "es-question",
            Self::EnglishQuestion => "en-question",
        }
    }

    /// Synthesis service voice identifier
    pub fn id(&self) -> &'static str {
        match self {
            Self::Rogzy => "RmicS1jU3ei6Vxlpkqj4",
            Self::Giacomo => "gFpPxLJAJCez7afCJ8Pd",
            Self::DavidStOnge => "0PfKe742JfrBvOr7Gyx9",
            Self::Fanis => "HIRH46f2SFLDptj86kJG",
            Self::Loic => "hOYgbRZsrkPHWJ2kdEIu",
            Self::Mogenet => "ld8UrJoCOHSibD1DlYXB",
            Self::Pantamis => "naFOP0Eb03OaLMVhdCxd",
            Self::Renaud => "UVJB9VPhLrNHNsH4ZatL",
            Self::SpanishQuestion => "5K2SjAdgoClKG1acJ17G",
            Self::EnglishQuestion => "ER8xHNz0kNywE1Pc5ogG",
        }
    }

    /// Resolve a filename tag
    pub fn from_tag(tag: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .iter()
            .copied()
            .find(|voice| voice.tag() == tag)
            .ok_or_else(|| ValidationError::UnknownVoice(tag.to_string()))
    }
}

impl FromStr for Voice {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
