/*!
 * Content-hash change detection between a version and its predecessor.
 */

use log::debug;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use super::version::previous_version_path;

/// Block size used when hashing files
const DIGEST_BLOCK_SIZE: usize = 4096;

/// Result of comparing a file against the previous version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeRecord {
    /// Same bytes in both versions
    Unchanged,
    /// Content differs
    Changed,
    /// One of the two files does not exist
    Incomparable,
}

/// SHA-256 of a file, read in fixed-size blocks
pub fn file_digest<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut block = [0u8; DIGEST_BLOCK_SIZE];
    loop {
        let read = reader.read(&mut block)?;
        if read == 0 {
            break;
        }
        hasher.update(&block[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compares artifacts with the same relative path one version lower
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    /// Course root the version component is looked up under
    course_root: PathBuf,
}

impl ChangeDetector {
    /// Create a change detector for the course at `course_root`
    pub fn new(course_root: impl Into<PathBuf>) -> Self {
        Self {
            course_root: course_root.into(),
        }
    }

    /// Compare `path` with its counterpart in the previous version
    pub fn compare<P: AsRef<Path>>(&self, path: P) -> io::Result<ChangeRecord> {
        let path = path.as_ref();
        let Some(previous) = previous_version_path(&self.course_root, path) else {
            return Ok(ChangeRecord::Incomparable);
        };
        if !path.is_file() || !previous.is_file() {
            debug!("Nothing to compare for {:?}", path);
            return Ok(ChangeRecord::Incomparable);
        }

        if file_digest(path)? == file_digest(&previous)? {
            Ok(ChangeRecord::Unchanged)
        } else {
            Ok(ChangeRecord::Changed)
        }
    }

    /// Whether `path` differs from the previous version.
    ///
    /// Missing files on either side count as unchanged.
    pub fn has_changed<P: AsRef<Path>>(&self, path: P) -> io::Result<bool> {
        Ok(self.compare(path)? == ChangeRecord::Changed)
    }
}
