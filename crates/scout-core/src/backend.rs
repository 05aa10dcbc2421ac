//! Filesystem access traits and path utilities.
//!
//! The indexer, the fallback walk and the directory listing only touch the
//! disk through `DirectoryEnumerator`. The default `FsEnumerator` wraps
//! `std::fs`; tests and embedders can substitute their own.
//!
//! Progress reporting and cancellation are also expressed as small traits
//! here so that long-running walks stay decoupled from whoever drives them.

use crate::error::{Result, ScoutError};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A child of a directory as reported by an enumerator.
#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    /// Absolute path of the child
    pub path: PathBuf,

    /// Filename of the child
    pub name: String,

    /// True if the child is a directory
    pub is_dir: bool,

    /// Size in bytes, if known
    pub size: Option<u64>,

    /// Last modification time, if known
    pub modified: Option<DateTime<Utc>>,
}

/// Abstract directory enumerator.
///
/// ## Error Handling
///
/// The outer `Result` fails when the directory itself cannot be read; callers
/// abandon that subtree. Each inner `Result` is a single child; a failing
/// child (typically `PermissionDenied`) is skipped and enumeration of its
/// siblings continues.
pub trait DirectoryEnumerator: Send + Sync {
    /// List the immediate children of `dir`.
    fn read_dir(&self, dir: &Path) -> Result<Vec<Result<DirEntryInfo>>>;
}

/// Enumerator backed by `std::fs`.
///
/// Symbolic links are reported with their own metadata and never treated as
/// directories, so walks cannot loop through link cycles.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsEnumerator;

impl FsEnumerator {
    pub fn new() -> Self {
        FsEnumerator
    }
}

impl DirectoryEnumerator for FsEnumerator {
    fn read_dir(&self, dir: &Path) -> Result<Vec<Result<DirEntryInfo>>> {
        let iter = fs::read_dir(dir).map_err(|e| ScoutError::from_io(dir, e))?;

        let entries = iter
            .map(|item| {
                let item = item.map_err(|e| ScoutError::from_io(dir, e))?;
                let path = item.path();
                let meta = item
                    .metadata()
                    .map_err(|e| ScoutError::from_io(&path, e))?;
                let is_dir = meta.is_dir();
                Ok(DirEntryInfo {
                    name: item.file_name().to_string_lossy().into_owned(),
                    is_dir,
                    size: if is_dir { None } else { Some(meta.len()) },
                    modified: meta.modified().ok().map(DateTime::<Utc>::from),
                    path,
                })
            })
            .collect();

        Ok(entries)
    }
}

// === Path Utilities ===

/// Normalized, case-insensitive key for a path.
///
/// Separators are unified to `/`, trailing separators dropped (except for a
/// bare root) and the result lowercased.
pub fn normalize_key(path: &Path) -> String {
    let mut key = path.to_string_lossy().replace('\\', "/").to_lowercase();
    while key.len() > 1 && key.ends_with('/') {
        key.pop();
    }
    key
}

/// True if `path` equals `root` or lies underneath it (case-insensitive).
///
/// The check is component aware: `/data2` is not within `/data`.
pub fn is_within(path: &Path, root: &Path) -> bool {
    let path = normalize_key(path);
    let root = normalize_key(root);

    if path == root {
        return true;
    }
    match path.strip_prefix(&root) {
        Some(rest) => root.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

/// Path of `path` relative to `root`.
///
/// Falls back to the final component when `path` is not under `root`.
pub fn relative_path(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf()),
    }
}

/// Resolve `path` against `base` and fold away `.` and `..` components.
///
/// Resolution is lexical; `..` at the filesystem root stays at the root.
/// An absolute `path` ignores `base`.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    let joined = base.join(path);
    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(resolved.components().next_back(), Some(Component::Normal(_))) {
                    resolved.pop();
                } else if !resolved.has_root() {
                    resolved.push(component);
                }
            }
            other => resolved.push(other),
        }
    }
    resolved
}

/// Absolute, `..`-free form of `path`, resolved against the working directory.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(ScoutError::invalid_argument("path is empty"));
    }
    let cwd = std::env::current_dir()?;
    Ok(resolve_path(&cwd, path))
}

/// Parent directory of `path`, or None at a filesystem root.
pub fn parent_of(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    match components.next_back() {
        None | Some(Component::RootDir) | Some(Component::Prefix(_)) => None,
        Some(_) => {
            let parent = components.as_path();
            if parent.as_os_str().is_empty() {
                None
            } else {
                Some(parent.to_path_buf())
            }
        }
    }
}

// === Progress ===

/// Progress reporting for long-running walks.
///
/// Implementations must not block: reports are emitted from worker threads
/// in the middle of a walk.
pub trait ProgressSink: Send + Sync {
    /// Called with a human-readable status line
    fn report(&self, message: &str);
}

/// A progress sink that only logs through tracing
pub struct LoggingProgress;

impl ProgressSink for LoggingProgress {
    fn report(&self, message: &str) {
        tracing::debug!(progress = %message, "Index progress");
    }
}

/// A progress sink that forwards messages into a channel
pub struct ChannelProgress {
    sender: crossbeam_channel::Sender<String>,
}

impl ChannelProgress {
    /// Create a sink and the receiving end of its stream
    pub fn new() -> (Self, crossbeam_channel::Receiver<String>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (ChannelProgress { sender }, receiver)
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, message: &str) {
        let _ = self.sender.try_send(message.to_string());
    }
}

// === Cancellation ===

/// Cooperative cancel signal checked at directory and batch boundaries.
pub trait CancelSignal: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

/// Shared cancellation flag.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to every clone of this token
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl CancelSignal for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A signal that never fires.
pub struct NeverCancel;

impl CancelSignal for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}
