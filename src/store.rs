// src/store.rs
//! The File Store seam. The engine never touches the filesystem
//! directly; everything goes through this trait so hosts can supply
//! their own VFS and tests can run on fixture trees.
//!
//! All paths crossing this boundary are project-relative.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HoundError, Result};

pub trait FileStore: Send + Sync {
    /// Project root (absolute).
    fn root(&self) -> &Path;

    fn exists(&self, path: &Path) -> bool;

    fn is_directory(&self, path: &Path) -> bool;

    /// Reads a file as text.
    ///
    /// # Errors
    /// Returns an I/O error for missing or unreadable files; callers
    /// recover locally and skip the file.
    fn read(&self, path: &Path) -> Result<String>;

    /// Lists entry names (not paths) of a directory.
    ///
    /// # Errors
    /// Returns an I/O error for unreadable directories.
    fn list(&self, dir: &Path) -> Result<Vec<String>>;

    /// Converts a project-relative path to an absolute one.
    fn to_absolute(&self, path: &Path) -> PathBuf {
        self.root().join(path)
    }

    /// Converts an absolute path back to a project-relative one, if it
    /// lives under the root.
    fn to_relative(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(self.root()).ok().map(Path::to_path_buf)
    }
}

/// Filesystem-backed store rooted at the project directory.
pub struct FsFileStore {
    root: PathBuf,
}

impl FsFileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileStore for FsFileStore {
    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).exists()
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.root.join(path).is_dir()
    }

    fn read(&self, path: &Path) -> Result<String> {
        let abs = self.root.join(path);
        fs::read_to_string(&abs).map_err(|e| HoundError::io(e, &abs))
    }

    fn list(&self, dir: &Path) -> Result<Vec<String>> {
        let abs = self.root.join(dir);
        let entries = fs::read_dir(&abs).map_err(|e| HoundError::io(e, &abs))?;

        let mut names: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        Ok(names)
    }
}
