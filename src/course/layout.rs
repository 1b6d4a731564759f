/*!
 * Course directory model.
 *
 * Layout of a course on disk:
 *
 * ```text
 * <course>/<language>/v<NNN>/<chapter>/<chapter>.<doc_ext>
 * <course>/<language>/v<NNN>/<chapter>/<chapter>.mp4
 * <course>/<language>/v<NNN>/<chapter>/slides/<stem>[_<voice>].<ext>
 * ```
 *
 * `CourseLayout` derives every path the pipeline touches and creates the
 * directory skeleton of new target versions.
 */

use log::{debug, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::{PipelineError, ValidationError};
use super::version::{latest_version, Version};

/// Folder holding per-slide artifacts inside a chapter
pub const SLIDES_DIR: &str = "slides";

/// Whether a target language reuses its latest version or starts a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionPolicy {
    /// Continue filling the most recent existing version
    #[default]
    ReuseLatest,
    /// Always create `latest + 1`
    CreateNew,
}

/// A chapter folder inside a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Folder name, also the stem of the chapter document and video
    pub name: String,
    /// Absolute path of the chapter folder
    pub dir: PathBuf,
}

impl Chapter {
    /// Chapter presentation document
    pub fn document_path(&self, document_ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, document_ext))
    }

    /// Chapter-level video artifact
    pub fn video_path(&self) -> PathBuf {
        self.dir.join(format!("{}.mp4", self.name))
    }

    /// Per-slide artifact folder
    pub fn slides_dir(&self) -> PathBuf {
        self.dir.join(SLIDES_DIR)
    }
}

/// Path arithmetic over one course tree
#[derive(Debug, Clone)]
pub struct CourseLayout {
    /// Course root directory
    root: PathBuf,
    /// Chapters whose name contains this marker are never processed
    do_not_translate_marker: String,
}

impl CourseLayout {
    /// Create a layout for the course rooted at `root`
    pub fn new(root: impl Into<PathBuf>, do_not_translate_marker: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            do_not_translate_marker: do_not_translate_marker.into(),
        }
    }

    /// Course root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Course name (last component of the root)
    pub fn course_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Directory of one language
    pub fn language_dir(&self, language: &str) -> PathBuf {
        self.root.join(language)
    }

    /// Directory of one version of a language
    pub fn version_dir(&self, language: &str, version: Version) -> PathBuf {
        self.language_dir(language).join(version.to_string())
    }

    /// Whether a chapter name ends with the do-not-translate marker (`03-extra-DNT`)
    pub fn is_excluded(&self, chapter_name: &str) -> bool {
        !self.do_not_translate_marker.is_empty() && chapter_name.ends_with(&self.do_not_translate_marker)
    }

    /// Latest version of a language, `None` if the language has none
    pub fn latest_version(&self, language: &str) -> Result<Option<Version>, PipelineError> {
        let dir = self.language_dir(language);
        if !dir.is_dir() {
            return Ok(None);
        }
        Ok(latest_version(dir)?)
    }

    /// Chapters of a version, sorted by name, excluding do-not-translate chapters
    pub fn chapters(&self, version_dir: &Path) -> Result<Vec<Chapter>, PipelineError> {
        if !version_dir.is_dir() {
            return Err(ValidationError::MissingDirectory(version_dir.display().to_string()).into());
        }

        let mut chapters = Vec::new();
        for entry in fs::read_dir(version_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if self.is_excluded(&name) {
                debug!("Skipping do-not-translate chapter {}", name);
                continue;
            }
            chapters.push(Chapter { name, dir: entry.path() });
        }
        chapters.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(chapters)
    }

    /// Chapter with the same name inside another version directory
    pub fn counterpart(&self, chapter: &Chapter, version_dir: &Path) -> Chapter {
        Chapter {
            name: chapter.name.clone(),
            dir: version_dir.join(&chapter.name),
        }
    }

    /// Resolve (and create if needed) the version directory a target language writes into.
    ///
    /// - no target language directory, or one without versions: create `v001`
    ///   and copy the skeleton of the source `v001`
    /// - otherwise reuse the latest target version, or create `latest + 1`
    ///   with the skeleton of the selected source version, per `policy`
    pub fn resolve_target_version_path(
        &self,
        source_language: &str,
        target_language: &str,
        source_version: Version,
        policy: VersionPolicy,
    ) -> Result<PathBuf, PipelineError> {
        let selected_source = self.version_dir(source_language, source_version);
        if !selected_source.is_dir() {
            return Err(ValidationError::MissingDirectory(selected_source.display().to_string()).into());
        }

        let target_language_dir = self.language_dir(target_language);
        let latest = self.latest_version(target_language)?;

        let (version, skeleton_source) = match latest {
            None => {
                let source_first = self.version_dir(source_language, Version::FIRST);
                if !source_first.is_dir() {
                    return Err(ValidationError::MissingDirectory(source_first.display().to_string()).into());
                }
                (Version::FIRST, source_first)
            }
            Some(latest) => match policy {
                VersionPolicy::ReuseLatest => {
                    let path = target_language_dir.join(latest.to_string());
                    info!("Using existing version {} for {}", latest, target_language);
                    return Ok(path);
                }
                VersionPolicy::CreateNew => (latest.next()?, selected_source),
            },
        };

        let target = target_language_dir.join(version.to_string());
        fs::create_dir_all(&target)?;
        self.copy_skeleton(&skeleton_source, &target)?;
        info!("Created version {} for {}", version, target_language);
        Ok(target)
    }

    /// Recreate the directory tree of `source` under `target`.
    ///
    /// Only directories are created; no artifact files are copied.
    /// Top-level chapters for which `is_excluded` holds are skipped.
    pub fn copy_skeleton(&self, source: &Path, target: &Path) -> io::Result<()> {
        copy_tree(source, target, &|name| self.is_excluded(name))
    }
}

/// Directory-only tree copy; `exclude` filters the first level of `source`
pub fn copy_tree(source: &Path, target: &Path, exclude: &dyn Fn(&str) -> bool) -> io::Result<()> {
    let walker = WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() != 1 || !exclude(&entry.file_name().to_string_lossy()));

    for entry in walker {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let relative = entry.path().strip_prefix(source).map_err(io::Error::other)?;
        fs::create_dir_all(target.join(relative))?;
    }
    Ok(())
}
