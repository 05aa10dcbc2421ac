//! Immutable, point-in-time index of a directory subtree.
//!
//! An `IndexSnapshot` is produced once by the `IndexBuilder` and never
//! modified afterwards. The store hands snapshots out as `Arc`s, so a search
//! keeps using the snapshot it started with even if a rebuild publishes a
//! newer one in the meantime.
//!
//! ## Architecture
//!
//! - A `HashMap<String, Entry>` keyed by normalized (lowercased) path gives
//!   case-insensitive O(1) lookups and makes duplicate paths impossible
//! - `IndexStats` are computed once at construction

use crate::backend::{is_within, normalize_key, CancelSignal};
use crate::error::Result;
use crate::query::{search_entries, SearchQuery};
use crate::types::{Entry, IndexStats};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Immutable mapping from normalized path to entry, plus build metadata.
pub struct IndexSnapshot {
    /// Directory the snapshot was built from
    root: PathBuf,

    /// When the build finished
    built_at: DateTime<Utc>,

    /// All entries, keyed by normalized path
    entries: HashMap<String, Entry>,

    /// Statistics about the entries
    stats: IndexStats,

    /// True if the build was cancelled before the walk finished
    partial: bool,
}

impl IndexSnapshot {
    /// Create a snapshot from entries already keyed by normalized path.
    pub fn new(root: PathBuf, entries: HashMap<String, Entry>, partial: bool) -> Self {
        let built_at = Utc::now();
        let mut stats = IndexStats {
            built_at: Some(built_at),
            ..Default::default()
        };

        for entry in entries.values() {
            if entry.is_dir {
                stats.total_dirs += 1;
            } else {
                stats.total_files += 1;
                stats.total_size += entry.size.unwrap_or(0);
            }
        }

        IndexSnapshot {
            root,
            built_at,
            entries,
            stats,
            partial,
        }
    }

    /// Create a complete snapshot from a list of entries.
    ///
    /// When two entries share a normalized path the first one is kept.
    pub fn from_entries(root: PathBuf, entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            map.entry(entry.key()).or_insert(entry);
        }
        Self::new(root, map, false)
    }

    /// Directory the snapshot covers
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// When the snapshot was built
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Number of entries (files and directories)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the snapshot holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Statistics computed at build time
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// True if the build behind this snapshot was cancelled
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Look up an entry by path, ignoring case.
    pub fn get(&self, path: &Path) -> Option<&Entry> {
        self.entries.get(&normalize_key(path))
    }

    /// Check whether a path is indexed, ignoring case.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(&normalize_key(path))
    }

    /// Iterate over all entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Search the whole snapshot.
    pub fn search(
        &self,
        query: &SearchQuery,
        limit: usize,
        cancel: &dyn CancelSignal,
    ) -> Result<Vec<Entry>> {
        search_entries(self.entries.values(), query, limit, cancel)
    }

    /// Search only entries strictly inside `scope`.
    ///
    /// The scope is applied while scanning so that out-of-scope matches do
    /// not use up the result cap.
    pub fn search_within(
        &self,
        query: &SearchQuery,
        scope: &Path,
        limit: usize,
        cancel: &dyn CancelSignal,
    ) -> Result<Vec<Entry>> {
        let scope_key = normalize_key(scope);
        let in_scope = self
            .entries
            .iter()
            .filter(|(key, entry)| **key != scope_key && is_within(&entry.path, scope))
            .map(|(_, entry)| entry);

        search_entries(in_scope, query, limit, cancel)
    }
}

impl std::fmt::Debug for IndexSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexSnapshot")
            .field("root", &self.root)
            .field("entries", &self.len())
            .field("built_at", &self.built_at)
            .field("partial", &self.partial)
            .finish()
    }
}
