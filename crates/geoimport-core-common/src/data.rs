//! Import candidates.
//!
//! An [`ImportData`] is what the coordinator hands to the registry: a file,
//! a directory of files, or a remote resource. Handlers never mutate it.

use std::path::{Path, PathBuf};

use url::Url;

/// A candidate resource offered for import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportData {
    /// A single file on the local filesystem.
    File(SpatialFile),
    /// A directory that may hold several importable files.
    Directory(PathBuf),
    /// A resource that is not backed by a local file.
    Remote(Url),
}

impl ImportData {
    /// Creates a file candidate.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(SpatialFile::new(path))
    }

    /// Returns the local path backing this candidate, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(file) => Some(file.path()),
            Self::Directory(path) => Some(path),
            Self::Remote(_) => None,
        }
    }

    /// Returns the file when this candidate is file-backed.
    #[must_use]
    pub fn as_file(&self) -> Option<&SpatialFile> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    /// Display form used in logs and error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::File(file) => file.path().display().to_string(),
            Self::Directory(path) => path.display().to_string(),
            Self::Remote(url) => url.to_string(),
        }
    }
}

/// A file candidate together with its extension hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialFile {
    path: PathBuf,
    extension: Option<String>,
}

impl SpatialFile {
    /// Wraps a path. The extension hint is lower-cased.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        Self { path, extension }
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lower-cased extension without the leading dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Returns `true` if the extension matches one of `extensions` (case-insensitive).
    #[must_use]
    pub fn has_extension(&self, extensions: &[&str]) -> bool {
        self.extension
            .as_deref()
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// File name without its extension, used as a default layer name.
    #[must_use]
    pub fn stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|stem| stem.to_str())
    }
}
