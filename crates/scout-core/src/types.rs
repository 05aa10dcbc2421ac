//! Core data types for Scout.
//!
//! `Entry` is the record the indexer produces and every search returns.
//! Entries are plain values: snapshots own them, results clone them, and
//! nothing mutates them after construction.

use crate::backend::{normalize_key, DirEntryInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::path::{Path, PathBuf};

/// A single file or directory known to the index or returned by a search.
///
/// ## Design Notes
///
/// - `name` is stored separately from `path` for filename-only matching
/// - `name_lower` and `relative_lower` are pre-computed for fast
///   case-insensitive matching
/// - `relative_path` is relative to the index root (or to the directory a
///   fallback walk started from)
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    /// Absolute path including the filename
    pub path: PathBuf,

    /// Filename without path (e.g., "report.pdf")
    pub name: String,

    /// Pre-computed lowercase filename for fast case-insensitive search
    #[serde(skip)]
    pub name_lower: String,

    /// True if this is a directory, false for files
    pub is_dir: bool,

    /// File size in bytes (None for directories or if unavailable)
    pub size: Option<u64>,

    /// Last modification time
    pub modified: Option<DateTime<Utc>>,

    /// Path relative to the root the entry was discovered from
    pub relative_path: PathBuf,

    /// Pre-computed lowercase `relative_path` for substring search
    #[serde(skip)]
    pub relative_lower: String,
}

impl Entry {
    /// Create a new entry.
    ///
    /// The lowercase search fields are computed from `name` and
    /// `relative_path`.
    pub fn new(path: PathBuf, name: String, is_dir: bool, relative_path: PathBuf) -> Self {
        let name_lower = name.to_lowercase();
        let relative_lower = relative_path.to_string_lossy().to_lowercase();
        Entry {
            path,
            name,
            name_lower,
            is_dir,
            size: None,
            modified: None,
            relative_path,
            relative_lower,
        }
    }

    /// Build an entry from enumerator output, relative to `root`.
    pub fn from_dir_entry(info: DirEntryInfo, root: &Path) -> Self {
        let relative_path = crate::backend::relative_path(root, &info.path);
        let mut entry = Entry::new(info.path, info.name, info.is_dir, relative_path);
        if !entry.is_dir {
            entry.size = info.size;
        }
        entry.modified = info.modified;
        entry
    }

    /// Set the file size
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Normalized (case-insensitive) key of this entry's absolute path.
    pub fn key(&self) -> String {
        normalize_key(&self.path)
    }

    /// Get the file extension, if any
    pub fn extension(&self) -> Option<&str> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| ext.len() < self.name.len())
    }

    /// Check if this entry has the given extension (case-insensitive).
    ///
    /// Directories never have an extension.
    pub fn has_extension(&self, ext: &str) -> bool {
        !self.is_dir
            && self
                .extension()
                .map(|e| e.eq_ignore_ascii_case(ext))
                .unwrap_or(false)
    }

    /// Number of components in the relative path (1 for a direct child).
    pub fn depth(&self) -> usize {
        self.relative_path.components().count()
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entry {}

impl Hash for Entry {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Statistics about an index snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of files in the snapshot
    pub total_files: u64,

    /// Number of directories in the snapshot
    pub total_dirs: u64,

    /// Total size of all indexed files in bytes
    pub total_size: u64,

    /// When the snapshot was built
    pub built_at: Option<DateTime<Utc>>,
}

impl IndexStats {
    /// Total number of entries (files + directories)
    pub fn total_entries(&self) -> u64 {
        self.total_files + self.total_dirs
    }
}
