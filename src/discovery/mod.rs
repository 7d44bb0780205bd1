//! Candidate discovery: which directories get published
//!
//! Sources are expanded into [`Candidate`]s, each candidate is checked
//! against the ignore list and for a manifest, and survivors become
//! [`Target`]s.

pub mod manifest;
pub mod path_filter;
pub mod sources;

use std::path::{Path, PathBuf};

pub use manifest::{MANIFEST_FILE, read_module_name};
pub use path_filter::{has_manifest, ignored_by, is_eligible};
pub use sources::{collect_candidates, discover_candidates};

/// A directory that may be published
///
/// `source` is the path as it was written in the source list, or relative
/// to the discovery root as written. Ignore entries are matched against it,
/// never against the resolved location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    path: PathBuf,
    source: PathBuf,
}

impl Candidate {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Resolved location on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path as written
    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl From<PathBuf> for Candidate {
    fn from(path: PathBuf) -> Self {
        Self {
            source: path.clone(),
            path,
        }
    }
}

/// An eligible directory together with its module name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    path: PathBuf,
    name: String,
}

impl Target {
    pub fn new<P: Into<PathBuf>>(path: P, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Module name from the manifest
    pub fn name(&self) -> &str {
        &self.name
    }
}
