/*!
 * Version folder arithmetic.
 *
 * Every language of a course holds zero-padded, strictly increasing
 * snapshots named `v001`, `v002`, ... This module parses, orders and
 * increments those names and locates the version component inside a path.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::errors::ValidationError;

static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v(\d{3})$").expect("version pattern is valid")
});

/// A version snapshot number, always in `1..=999`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u16);

impl Version {
    /// The first version of any language
    pub const FIRST: Version = Version(1);

    /// Create a version from its number
    pub fn new(number: u16) -> Result<Self, ValidationError> {
        if (1..=999).contains(&number) {
            Ok(Self(number))
        } else {
            Err(ValidationError::MalformedVersion(format!("v{}", number)))
        }
    }

    /// Numeric value of the version
    pub fn number(&self) -> u16 {
        self.0
    }

    /// The version that follows this one
    pub fn next(&self) -> Result<Self, ValidationError> {
        if self.0 >= 999 {
            return Err(ValidationError::VersionOverflow(self.to_string()));
        }
        Ok(Self(self.0 + 1))
    }

    /// The version that precedes this one, `None` for `v001`
    pub fn previous(&self) -> Option<Self> {
        if self.0 > 1 { Some(Self(self.0 - 1)) } else { None }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{:03}", self.0)
    }
}

impl FromStr for Version {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = VERSION_PATTERN
            .captures(s)
            .ok_or_else(|| ValidationError::MalformedVersion(s.to_string()))?;
        let number: u16 = caps[1]
            .parse()
            .map_err(|_| ValidationError::MalformedVersion(s.to_string()))?;
        Self::new(number).map_err(|_| ValidationError::MalformedVersion(s.to_string()))
    }
}

/// Increment a version string such as `v004` to `v005`
pub fn next_version(current: &str) -> Result<Version, ValidationError> {
    current.parse::<Version>()?.next()
}

/// Highest version folder inside a language directory
pub fn latest_version<P: AsRef<Path>>(language_dir: P) -> io::Result<Option<Version>> {
    Ok(list_versions(language_dir)?.into_iter().max())
}

/// All version folders inside a language directory, ascending
pub fn list_versions<P: AsRef<Path>>(language_dir: P) -> io::Result<Vec<Version>> {
    let mut versions = Vec::new();
    for entry in fs::read_dir(language_dir.as_ref())? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(version) = entry.file_name().to_str().and_then(|n| n.parse::<Version>().ok()) {
            versions.push(version);
        }
    }
    versions.sort();
    Ok(versions)
}

/// The same path with its version component decremented by one.
///
/// The version component is the one at `<course_root>/<language>/<vNNN>`;
/// folders above the course root are never considered. Returns `None`
/// when `path` is not inside a version of that course or the version is
/// already `v001`.
pub fn previous_version_path(course_root: &Path, path: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(course_root).ok()?;
    let mut components = relative.components();

    let language = match components.next()? {
        Component::Normal(name) => name,
        _ => return None,
    };
    let version = match components.next()? {
        Component::Normal(name) => name.to_str()?.parse::<Version>().ok()?,
        _ => return None,
    };

    let mut result = course_root.join(language).join(version.previous()?.to_string());
    let rest = components.as_path();
    if !rest.as_os_str().is_empty() {
        result.push(rest);
    }
    Some(result)
}
