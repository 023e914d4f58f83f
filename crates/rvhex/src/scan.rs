//! Directory scanning and name-based filtering.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::{Error, Result};

/// Suffixes of files produced by a previous run (or by objdump); never inputs.
pub const ARTIFACT_SUFFIXES: &[&str] = &[".bin", ".hex", ".dump"];

/// Why a directory entry was or was not converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Not a regular file.
    Directory,
    /// Name does not start with the configured prefix.
    WrongPrefix,
    /// Name ends with an artifact suffix.
    AlreadyArtifact,
    /// Rejected by the validator.
    NonElf,
    /// Accepted by the validator; conversion is attempted.
    ValidElf,
}

impl Classification {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::WrongPrefix => "wrong-prefix",
            Self::AlreadyArtifact => "artifact",
            Self::NonElf => "non-elf",
            Self::ValidElf => "valid-elf",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directory entry under consideration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Basename (lossy UTF-8).
    pub name: String,
    pub is_file: bool,
}

impl Candidate {
    /// Build a candidate from a path, querying the filesystem for its type.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_file = path.is_file();
        Self {
            path,
            name,
            is_file,
        }
    }

    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.name.starts_with(prefix)
    }

    /// The artifact suffix this name ends with, if any.
    #[must_use]
    pub fn artifact_suffix(&self) -> Option<&'static str> {
        ARTIFACT_SUFFIXES
            .iter()
            .copied()
            .find(|suffix| self.name.ends_with(suffix))
    }
}

/// Apply the name and type filters.
///
/// Returns the skip classification, or `None` if the candidate should go on
/// to validation. Filters apply in order: file type, prefix, suffix.
#[must_use]
pub fn prefilter(candidate: &Candidate, prefix: &str) -> Option<Classification> {
    if !candidate.is_file {
        Some(Classification::Directory)
    } else if !candidate.has_prefix(prefix) {
        Some(Classification::WrongPrefix)
    } else if candidate.artifact_suffix().is_some() {
        Some(Classification::AlreadyArtifact)
    } else {
        None
    }
}

/// A scanned entry with its filter verdict.
#[derive(Debug, Clone)]
pub struct ScanEntry {
    pub candidate: Candidate,
    /// `Some` if the entry was filtered out by name or type.
    pub skip: Option<Classification>,
}

/// Enumerate `dir` and tag every entry.
///
/// Entries come back in filesystem order; callers must not rely on it.
/// Entries that cannot be read are logged and left out.
///
/// # Errors
///
/// [`Error::DirectoryNotFound`] if `dir` is not an existing directory, or
/// [`Error::Io`] if it cannot be listed.
pub fn scan_dir(dir: &Path, prefix: &str) -> Result<Vec<ScanEntry>> {
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "unreadable directory entry");
                continue;
            }
        };
        let candidate = Candidate::from_path(entry.path());
        let skip = prefilter(&candidate, prefix);
        entries.push(ScanEntry { candidate, skip });
    }

    Ok(entries)
}
