//! Concurrent directory walker that produces index snapshots.
//!
//! The walk is a two-stage pipeline over crossbeam work queues. Descent
//! workers, on a pool half as wide as the entry pool, pull directories and
//! read them; the batch of children goes to entry workers on the full-width
//! pool, which turn children into entries and queue subdirectories back to
//! the descent stage. Neither stage ever blocks waiting for the other pool,
//! so stack depth stays flat no matter how wide or deep the tree is.
//!
//! Entries land in a sharded `DashMap` keyed by normalized path, so no path
//! is ever recorded twice even if the enumerator misbehaves.
//!
//! ## Failure Handling
//!
//! An unreadable directory abandons its subtree; an unreadable child is
//! skipped. Neither stops the walk. Cancellation is checked once per
//! directory in both stages, and a cancelled build still returns its partial
//! snapshot, flagged with `is_partial()`, for the caller to discard.

use crate::backend::{CancelSignal, DirEntryInfo, DirectoryEnumerator, ProgressSink};
use crate::config::Config;
use crate::error::{Result, ScoutError};
use crate::index::IndexSnapshot;
use crate::types::Entry;
use crossbeam_channel::{Receiver, Sender};
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Report progress every this many indexed entries.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 5000;

/// Directory names never indexed or searched.
///
/// Version control, build output, package caches and OS system folders.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".vs",
    ".vscode",
    "bin",
    "obj",
    ".idea",
    "packages",
    ".nuget",
    "__pycache__",
    ".svn",
    ".hg",
    "bower_components",
    "vendor",
    ".next",
    ".cache",
    "$RECYCLE.BIN",
    "System Volume Information",
    "ProgramData",
    "Windows",
    "Program Files",
    "Program Files (x86)",
];

/// Case-insensitive set of excluded directory names.
#[derive(Debug, Clone)]
pub struct Denylist {
    names: HashSet<String>,
}

impl Default for Denylist {
    fn default() -> Self {
        Denylist {
            names: EXCLUDED_DIRS.iter().map(|n| n.to_lowercase()).collect(),
        }
    }
}

impl Denylist {
    /// The fixed denylist plus additional names.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Denylist::default();
        list.names
            .extend(extra.into_iter().map(|n| n.as_ref().to_lowercase()));
        list
    }

    /// Check whether a directory name is excluded
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }
}

/// Builds `IndexSnapshot`s by walking a directory tree.
pub struct IndexBuilder {
    enumerator: Arc<dyn DirectoryEnumerator>,
    denylist: Denylist,
    progress_interval: u64,

    /// Workers turning directory children into entries
    entry_threads: usize,

    /// Workers reading directories, at reduced width
    descent_threads: usize,
}

impl IndexBuilder {
    /// Create a builder using all available parallelism.
    pub fn new(enumerator: Arc<dyn DirectoryEnumerator>) -> Result<Self> {
        Self::with_threads(enumerator, 0)
    }

    /// Create a builder with an explicit entry-pool width (0 = automatic).
    ///
    /// The descent pool gets half the width, at least one thread. Every walk
    /// starts its own pools, so concurrent builds never compete for workers.
    pub fn with_threads(enumerator: Arc<dyn DirectoryEnumerator>, threads: usize) -> Result<Self> {
        let width = if threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            threads
        };
        let descent_width = (width / 2).max(1);
        debug!(width, descent_width, "Index builder configured");

        Ok(IndexBuilder {
            enumerator,
            denylist: Denylist::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            entry_threads: width,
            descent_threads: descent_width,
        })
    }

    /// Create a builder from configuration.
    pub fn from_config(config: &Config, enumerator: Arc<dyn DirectoryEnumerator>) -> Result<Self> {
        Ok(Self::with_threads(enumerator, config.index.threads)?
            .with_denylist(config.denylist())
            .with_progress_interval(config.index.progress_interval))
    }

    /// Replace the denylist
    pub fn with_denylist(mut self, denylist: Denylist) -> Self {
        self.denylist = denylist;
        self
    }

    /// Set how many entries pass between progress reports
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Walk `root` and build a snapshot of everything beneath it.
    ///
    /// Blocks the calling thread until the walk ends. The root itself is not
    /// an entry. Returns `InvalidArgument` only for an empty root path.
    #[instrument(skip(self, root, progress, cancel), fields(root = %root.display()))]
    pub fn build(
        &self,
        root: &Path,
        progress: &dyn ProgressSink,
        cancel: &dyn CancelSignal,
    ) -> Result<IndexSnapshot> {
        if root.as_os_str().is_empty() {
            return Err(ScoutError::invalid_argument("root path is empty"));
        }

        info!("Building file index");
        progress.report("Building file index...");
        let start = Instant::now();

        let (dir_sender, dir_receiver) = crossbeam_channel::unbounded();
        let (batch_sender, batch_receiver) = crossbeam_channel::unbounded();
        let walk = Walk {
            root,
            entries: DashMap::new(),
            indexed: AtomicU64::new(0),
            pending: AtomicUsize::new(0),
            dirs: dir_sender,
            batches: batch_sender,
            descent_workers: self.descent_threads,
            entry_workers: self.entry_threads,
            progress,
            cancel,
            interval: self.progress_interval,
        };
        self.run_walk(&walk, &dir_receiver, &batch_receiver)?;

        let cancelled = cancel.is_cancelled();
        let count = walk.entries.len();
        let entries = walk.entries.into_iter().collect();
        let snapshot = IndexSnapshot::new(root.to_path_buf(), entries, cancelled);

        if cancelled {
            info!(entries = count, "Indexing cancelled");
            progress.report("Indexing cancelled");
        } else {
            let elapsed = start.elapsed();
            info!(
                entries = count,
                elapsed_ms = elapsed.as_millis() as u64,
                "Indexing complete"
            );
            progress.report(&format!(
                "Indexed {} entries in {}ms",
                count,
                elapsed.as_millis()
            ));
        }

        Ok(snapshot)
    }

    fn run_walk(
        &self,
        walk: &Walk<'_>,
        dirs: &Receiver<DirJob>,
        batches: &Receiver<Batch>,
    ) -> Result<()> {
        let entry_pool = start_pool("scout-entries", walk.entry_workers)?;
        let descent_pool = start_pool("scout-descent", walk.descent_workers)?;
        walk.queue_dir(walk.root.to_path_buf());

        entry_pool.in_place_scope(|entry_scope| {
            for _ in 0..walk.entry_workers {
                entry_scope.spawn(move |_| self.entry_worker(walk, batches));
            }
            descent_pool.in_place_scope(|descent_scope| {
                for _ in 0..walk.descent_workers {
                    descent_scope.spawn(move |_| self.descent_worker(walk, dirs));
                }
            });
        });
        Ok(())
    }

    /// Read queued directories and hand their children to the entry stage.
    fn descent_worker(&self, walk: &Walk<'_>, dirs: &Receiver<DirJob>) {
        while let Ok(DirJob::Read(dir)) = dirs.recv() {
            if walk.cancel.is_cancelled() {
                walk.finish_dir();
                continue;
            }

            match self.enumerator.read_dir(&dir) {
                Ok(children) => walk.send_batch(Batch::Children { dir, children }),
                Err(ScoutError::PermissionDenied { .. }) => {
                    debug!(dir = %dir.display(), "Permission denied, skipping subtree");
                    walk.finish_dir();
                }
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Cannot read directory, skipping subtree");
                    walk.finish_dir();
                }
            }
        }
    }

    /// Record the children of one directory and queue its subdirectories.
    fn entry_worker(&self, walk: &Walk<'_>, batches: &Receiver<Batch>) {
        while let Ok(Batch::Children { dir, children }) = batches.recv() {
            if !walk.cancel.is_cancelled() {
                for child in children {
                    self.record_child(walk, &dir, child);
                }
            }
            walk.finish_dir();
        }
    }

    fn record_child(&self, walk: &Walk<'_>, dir: &Path, child: Result<DirEntryInfo>) {
        let info = match child {
            Ok(info) => info,
            Err(ScoutError::PermissionDenied { path }) => {
                debug!(path = %path.display(), "Permission denied, skipping entry");
                return;
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                return;
            }
        };

        if info.is_dir && self.denylist.contains(&info.name) {
            return;
        }

        let subdir = info.is_dir.then(|| info.path.clone());
        let entry = Entry::from_dir_entry(info, walk.root);

        match walk.entries.entry(entry.key()) {
            MapEntry::Occupied(_) => return,
            MapEntry::Vacant(slot) => {
                slot.insert(entry);
            }
        }

        walk.record_indexed();
        if let Some(subdir) = subdir {
            walk.queue_dir(subdir);
        }
    }
}

impl std::fmt::Debug for IndexBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("entry_threads", &self.entry_threads)
            .field("descent_threads", &self.descent_threads)
            .field("progress_interval", &self.progress_interval)
            .finish()
    }
}

fn start_pool(name: &'static str, threads: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("{}-{}", name, i))
        .build()
        .map_err(|e| ScoutError::Internal(format!("failed to start {} pool: {}", name, e)))
}

/// Work for the descent stage.
enum DirJob {
    Read(PathBuf),
    Stop,
}

/// Work for the entry stage.
enum Batch {
    Children {
        dir: PathBuf,
        children: Vec<Result<DirEntryInfo>>,
    },
    Stop,
}

/// State shared by every worker of one build.
struct Walk<'a> {
    root: &'a Path,
    entries: DashMap<String, Entry>,
    indexed: AtomicU64,

    /// Directories queued but not yet fully recorded
    pending: AtomicUsize,
    dirs: Sender<DirJob>,
    batches: Sender<Batch>,
    descent_workers: usize,
    entry_workers: usize,

    progress: &'a dyn ProgressSink,
    cancel: &'a dyn CancelSignal,
    interval: u64,
}

impl Walk<'_> {
    fn queue_dir(&self, dir: PathBuf) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        // Receivers outlive every worker of the walk
        let _ = self.dirs.send(DirJob::Read(dir));
    }

    fn send_batch(&self, batch: Batch) {
        let _ = self.batches.send(batch);
    }

    /// Mark one directory done; the last one stops every worker.
    fn finish_dir(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            for _ in 0..self.descent_workers {
                let _ = self.dirs.send(DirJob::Stop);
            }
            for _ in 0..self.entry_workers {
                let _ = self.batches.send(Batch::Stop);
            }
        }
    }

    fn record_indexed(&self) {
        let count = self.indexed.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.interval == 0 {
            self.progress.report(&format!("Indexed {} entries...", count));
        }
    }
}
