//! Direct filesystem search for directories the index does not cover.
//!
//! The walk is breadth-first, one level at a time. All directories of a level
//! are read in parallel on the global rayon pool, then their matches are
//! appended in level order, so shallow results always come first and the
//! result cap stops the walk before it goes deeper than it needs to.

use crate::backend::{CancelSignal, DirectoryEnumerator};
use crate::builder::Denylist;
use crate::config::Config;
use crate::error::{Result, ScoutError};
use crate::query::{rank, SearchQuery, MAX_RESULTS};
use crate::types::Entry;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Limits of a fallback walk.
#[derive(Debug, Clone)]
pub struct FallbackOptions {
    /// Deepest level walked (0 = only the starting directory's children)
    pub max_depth: usize,

    /// Stop collecting after this many matches
    pub max_results: usize,

    /// Directory names neither matched nor descended into
    pub denylist: Denylist,
}

impl Default for FallbackOptions {
    fn default() -> Self {
        FallbackOptions {
            max_depth: 10,
            max_results: MAX_RESULTS,
            denylist: Denylist::default(),
        }
    }
}

impl FallbackOptions {
    pub fn from_config(config: &Config) -> Self {
        FallbackOptions {
            max_depth: config.search.fallback_max_depth,
            max_results: config.general.max_results.clamp(1, MAX_RESULTS),
            denylist: config.denylist(),
        }
    }
}

/// Walk `dir` breadth-first and return ranked matches of `query`.
///
/// Relative paths of the results are computed from `dir`. Returns
/// `Err(Cancelled)` if the signal fires before the walk finishes.
#[instrument(skip(enumerator, dir, query, options, cancel), fields(dir = %dir.display()))]
pub fn fallback_search(
    enumerator: &dyn DirectoryEnumerator,
    dir: &Path,
    query: &SearchQuery,
    options: &FallbackOptions,
    cancel: &dyn CancelSignal,
) -> Result<Vec<Entry>> {
    let limit = options.max_results.min(MAX_RESULTS);
    let mut results: Vec<Entry> = Vec::new();
    let mut level = vec![dir.to_path_buf()];

    for depth in 0..=options.max_depth {
        if level.is_empty() || results.len() >= limit {
            break;
        }
        if cancel.is_cancelled() {
            return Err(ScoutError::Cancelled);
        }

        let scanned: Vec<LevelScan> = level
            .par_iter()
            .map(|current| scan_directory(enumerator, dir, current, query, options, cancel))
            .collect();

        let mut next_level = Vec::new();
        for scan in scanned {
            let room = limit - results.len();
            results.extend(scan.matches.into_iter().take(room));
            next_level.extend(scan.subdirs);
        }

        debug!(depth, matches = results.len(), "Fallback level complete");
        level = next_level;
    }

    if cancel.is_cancelled() {
        return Err(ScoutError::Cancelled);
    }

    rank(&mut results, query.free_text());
    Ok(results)
}

#[derive(Default)]
struct LevelScan {
    matches: Vec<Entry>,
    subdirs: Vec<PathBuf>,
}

fn scan_directory(
    enumerator: &dyn DirectoryEnumerator,
    base: &Path,
    current: &Path,
    query: &SearchQuery,
    options: &FallbackOptions,
    cancel: &dyn CancelSignal,
) -> LevelScan {
    let mut scan = LevelScan::default();
    if cancel.is_cancelled() {
        return scan;
    }

    let children = match enumerator.read_dir(current) {
        Ok(children) => children,
        Err(ScoutError::PermissionDenied { .. }) => {
            debug!(dir = %current.display(), "Permission denied, skipping subtree");
            return scan;
        }
        Err(e) => {
            warn!(dir = %current.display(), error = %e, "Cannot read directory, skipping subtree");
            return scan;
        }
    };

    for child in children {
        let info = match child {
            Ok(info) => info,
            Err(e) => {
                debug!(dir = %current.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if info.is_dir {
            if options.denylist.contains(&info.name) {
                continue;
            }
            scan.subdirs.push(info.path.clone());
        }

        let entry = Entry::from_dir_entry(info, base);
        if scan.matches.len() < options.max_results && query.matches(&entry) {
            scan.matches.push(entry);
        }
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CancellationToken, FsEnumerator, NeverCancel};
    use std::fs;
    use tempfile::TempDir;

    fn make_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("docs/deep/deeper")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();
        fs::write(root.join("docs/report.txt"), b"x").unwrap();
        fs::write(root.join("docs/report.csv"), vec![0u8; 2 * 1024 * 1024]).unwrap();
        fs::write(root.join("docs/deep/deeper/report.txt"), b"x").unwrap();
        fs::write(root.join("node_modules/pkg/report.txt"), b"x").unwrap();
        temp
    }

    fn search(dir: &Path, raw: &str, options: &FallbackOptions) -> Vec<Entry> {
        fallback_search(
            &FsEnumerator::new(),
            dir,
            &SearchQuery::parse(raw),
            options,
            &NeverCancel,
        )
        .unwrap()
    }

    #[test]
    fn test_fallback_finds_nested_matches() {
        let temp = make_tree();
        let results = search(temp.path(), "report", &FallbackOptions::default());

        let paths: Vec<PathBuf> = results.iter().map(|e| e.relative_path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("docs/report.csv"),
                PathBuf::from("docs/report.txt"),
                PathBuf::from("docs/deep/deeper/report.txt"),
            ]
        );
    }

    #[test]
    fn test_fallback_skips_denylist() {
        let temp = make_tree();
        let results = search(temp.path(), "pkg", &FallbackOptions::default());
        assert!(results.is_empty());
    }

    #[test]
    fn test_fallback_applies_filters() {
        let temp = make_tree();
        let results = search(temp.path(), "report ext:csv size:>1MB", &FallbackOptions::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "report.csv");

        let folders = search(temp.path(), "folder:true", &FallbackOptions::default());
        assert!(folders.iter().all(|e| e.is_dir));
        assert_eq!(folders.len(), 3);
    }

    #[test]
    fn test_fallback_depth_limit() {
        let temp = make_tree();
        let options = FallbackOptions {
            max_depth: 1,
            ..Default::default()
        };
        let results = search(temp.path(), "report.txt", &options);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].relative_path, PathBuf::from("docs/report.txt"));
    }

    #[test]
    fn test_fallback_result_cap() {
        let temp = TempDir::new().unwrap();
        for i in 0..20 {
            fs::write(temp.path().join(format!("item{}.log", i)), b"x").unwrap();
        }
        let options = FallbackOptions {
            max_results: 5,
            ..Default::default()
        };
        assert_eq!(search(temp.path(), "*.log", &options).len(), 5);
    }

    #[test]
    fn test_fallback_cancelled() {
        let temp = make_tree();
        let token = CancellationToken::new();
        token.cancel();

        let result = fallback_search(
            &FsEnumerator::new(),
            temp.path(),
            &SearchQuery::parse("report"),
            &FallbackOptions::default(),
            &token,
        );
        assert!(matches!(result, Err(ScoutError::Cancelled)));
    }
}
