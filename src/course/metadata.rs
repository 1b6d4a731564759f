use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// @module: Course-level metadata (course.yml)

/// File name of the course metadata document
pub const COURSE_METADATA_FILE: &str = "course.yml";

/// Contents of `course.yml`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CourseMetadata {
    /// Language the course was authored in
    #[serde(default)]
    pub original_language: Option<String>,
}

impl CourseMetadata {
    /// Load `course.yml` from a course root; missing file yields defaults
    pub fn load<P: AsRef<Path>>(course_root: P) -> Result<Self> {
        let path = course_root.as_ref().join(COURSE_METADATA_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }
}
