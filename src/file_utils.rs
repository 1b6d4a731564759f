use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Write bytes so that `path` either keeps its old content or holds the
    /// complete new content, never a partial write.
    ///
    /// The data goes to a temporary file in the same directory which is then
    /// renamed over the destination.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> io::Result<()> {
        let path = path.as_ref();
        let parent = Self::parent_dir(path);
        Self::ensure_dir(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)?;
        temp.write_all(content)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Create a temporary file next to `path` for writers that need a `File`
    pub fn temp_file_beside<P: AsRef<Path>>(path: P, suffix: &str) -> io::Result<NamedTempFile> {
        let parent = Self::parent_dir(path.as_ref());
        Self::ensure_dir(&parent)?;
        tempfile::Builder::new()
            .prefix(".partial-")
            .suffix(suffix)
            .tempfile_in(parent)
    }

    /// Files directly inside `dir` whose extension is one of `extensions`
    pub fn list_files<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> io::Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && Self::has_extension(&path, extensions) {
                result.push(path);
            }
        }
        result.sort();
        Ok(result)
    }

    /// Case-insensitive extension check
    pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                extensions.iter().any(|e| ext.eq_ignore_ascii_case(e))
            })
            .unwrap_or(false)
    }

    fn parent_dir(path: &Path) -> PathBuf {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
