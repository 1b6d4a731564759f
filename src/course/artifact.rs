/*!
 * Canonical artifact filename schema.
 *
 * Per-slide artifacts are named `<base>[_<voice>].<ext>`, where `<base>`
 * starts with a numeric index (`03-01`, `7`, `12-2-1`) that orders slides
 * within a chapter. Every stage parses and formats names through
 * `ArtifactName` so they agree on what a stem, a voice tag and an index are.
 */

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::ValidationError;

/// What an artifact file holds, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Narration transcript (`.txt`)
    Transcript,
    /// Narration audio (`.mp3`)
    Audio,
    /// Rendered slide image (`.png`, `.jpg`, `.jpeg`)
    Image,
    /// Chapter video (`.mp4`)
    Video,
    /// Anything else
    Other,
}

impl ArtifactKind {
    /// Classify an extension (case-insensitive, without the dot)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Self::Transcript,
            "mp3" => Self::Audio,
            "png" | "jpg" | "jpeg" => Self::Image,
            "mp4" => Self::Video,
            _ => Self::Other,
        }
    }
}

/// Parsed artifact filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    /// Part before the voice tag, e.g. `03-01`
    pub base: String,
    /// Voice tag after the last underscore, e.g. `Rogzy`
    pub voice_tag: Option<String>,
    /// Extension without the dot
    pub extension: String,
}

impl ArtifactName {
    /// Parse a bare filename (no directories)
    pub fn parse(file_name: &str) -> Result<Self, ValidationError> {
        let (stem, extension) = file_name
            .rsplit_once('.')
            .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .ok_or_else(|| ValidationError::MalformedArtifactName(file_name.to_string()))?;

        let (base, voice_tag) = match stem.rsplit_once('_') {
            Some((base, voice)) if !base.is_empty() && !voice.is_empty() => {
                (base.to_string(), Some(voice.to_string()))
            }
            _ => (stem.to_string(), None),
        };

        Ok(Self {
            base,
            voice_tag,
            extension: extension.to_string(),
        })
    }

    /// Parse the filename component of a path
    pub fn from_path(path: &Path) -> Result<Self, ValidationError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ValidationError::MalformedArtifactName(path.display().to_string()))?;
        Self::parse(name)
    }

    /// Stem without extension (`<base>[_<voice>]`)
    pub fn stem(&self) -> String {
        match &self.voice_tag {
            Some(voice) => format!("{}_{}", self.base, voice),
            None => self.base.clone(),
        }
    }

    /// Same artifact with another extension
    pub fn with_extension(&self, extension: &str) -> Self {
        Self {
            extension: extension.to_string(),
            ..self.clone()
        }
    }

    /// Kind of artifact this name denotes
    pub fn kind(&self) -> ArtifactKind {
        ArtifactKind::from_extension(&self.extension)
    }

    /// Leading numeric index of the base, e.g. `03-01b` → `[3, 1]`
    pub fn index(&self) -> Option<SlideIndex> {
        SlideIndex::parse_leading(&self.base)
    }

    /// Sibling path of `path` carrying this name
    pub fn sibling_of(&self, path: &Path) -> PathBuf {
        path.with_file_name(self.to_string())
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stem(), self.extension)
    }
}

/// Numeric slide position, compared group by group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlideIndex(pub Vec<u32>);

impl SlideIndex {
    /// Read the leading `\d+(-\d+)*` groups of a name
    pub fn parse_leading(name: &str) -> Option<Self> {
        let mut groups = Vec::new();
        for part in name.split('-') {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                break;
            }
            groups.push(digits.parse().ok()?);
            if digits.len() != part.len() {
                break;
            }
        }
        if groups.is_empty() { None } else { Some(Self(groups)) }
    }
}

impl Ord for SlideIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for SlideIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
