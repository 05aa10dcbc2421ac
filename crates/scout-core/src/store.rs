//! Session-scoped holder of the published index snapshot.
//!
//! ## Architecture
//!
//! The store owns a single slot, `RwLock<Option<Arc<IndexSnapshot>>>`.
//! Readers clone the `Arc` under a momentary read lock and then scan without
//! holding any lock; a rebuild replaces the slot's contents with one write.
//! A reader that started before the swap keeps its old snapshot until it
//! drops the `Arc`.
//!
//! Builds run on background threads. Every build takes the next value of a
//! build generation counter and cancels whichever build was in flight; when a
//! build finishes it publishes only if its generation is still the newest,
//! so a slow superseded walk can never replace the result of a later one.
//! Cancelled (partial) snapshots are never published.

use crate::backend::{
    normalize_key, CancelSignal, CancellationToken, DirectoryEnumerator, ProgressSink,
};
use crate::builder::IndexBuilder;
use crate::config::Config;
use crate::error::{Result, ScoutError};
use crate::index::IndexSnapshot;
use crate::query::{SearchQuery, MAX_RESULTS};
use crate::types::Entry;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Handle to work running on a background thread.
///
/// Dropping the handle detaches the work; it still runs to completion.
pub struct Task<T> {
    handle: Option<JoinHandle<T>>,
    ready: Option<T>,
    cancel: CancellationToken,
}

impl<T: Send + 'static> Task<T> {
    fn spawn<F>(name: &str, cancel: CancellationToken, work: F) -> Result<Self>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(work)?;

        Ok(Task {
            handle: Some(handle),
            ready: None,
            cancel,
        })
    }

    fn ready(value: T) -> Self {
        Task {
            handle: None,
            ready: Some(value),
            cancel: CancellationToken::new(),
        }
    }

    /// Request cooperative cancellation of the work
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the work has finished
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    /// Block until the work finishes and return its output.
    pub fn wait(mut self) -> Result<T> {
        if let Some(value) = self.ready.take() {
            return Ok(value);
        }
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ScoutError::Internal("background task panicked".to_string())),
            None => Err(ScoutError::Internal("task has no result".to_string())),
        }
    }
}

/// How a build request ended.
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// The root was already indexed; no walk was performed
    AlreadyIndexed(Arc<IndexSnapshot>),

    /// A new snapshot was built and published
    Published(Arc<IndexSnapshot>),

    /// The build was cancelled; nothing was published
    Cancelled,

    /// A newer build started before this one finished; nothing was published
    Superseded,

    /// The build failed; nothing was published
    Failed(String),
}

impl BuildOutcome {
    /// The snapshot now serving searches, if this build produced or found one
    pub fn snapshot(&self) -> Option<&Arc<IndexSnapshot>> {
        match self {
            BuildOutcome::AlreadyIndexed(s) | BuildOutcome::Published(s) => Some(s),
            _ => None,
        }
    }
}

/// Handle to a background index build
pub type IndexTask = Task<BuildOutcome>;

/// Handle to a background index search
pub type SearchTask = Task<Vec<Entry>>;

/// Holder of the currently published index snapshot.
///
/// Cloning an `IndexStore` yields another handle to the same store.
#[derive(Clone)]
pub struct IndexStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    builder: IndexBuilder,
    current: RwLock<Option<Arc<IndexSnapshot>>>,
    build_generation: AtomicU64,
    active_build: Mutex<Option<CancellationToken>>,
    subscribers: Mutex<Vec<Sender<String>>>,
    max_results: usize,
}

impl IndexStore {
    /// Create an empty store around a builder
    pub fn new(builder: IndexBuilder) -> Self {
        Self::with_max_results(builder, MAX_RESULTS)
    }

    /// Create an empty store whose searches return at most `max_results`.
    ///
    /// The limit never exceeds the hard cap of 1000.
    pub fn with_max_results(builder: IndexBuilder, max_results: usize) -> Self {
        IndexStore {
            inner: Arc::new(StoreInner {
                builder,
                current: RwLock::new(None),
                build_generation: AtomicU64::new(0),
                active_build: Mutex::new(None),
                subscribers: Mutex::new(Vec::new()),
                max_results: max_results.clamp(1, MAX_RESULTS),
            }),
        }
    }

    /// Create a store configured from `config`.
    pub fn from_config(config: &Config, enumerator: Arc<dyn DirectoryEnumerator>) -> Result<Self> {
        let builder = IndexBuilder::from_config(config, enumerator)?;
        Ok(Self::with_max_results(builder, config.general.max_results))
    }

    // === Accessors ===

    /// The current snapshot, if one has been published.
    pub fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.inner.current.read().clone()
    }

    /// True once any snapshot has been published, even an empty one
    pub fn is_indexed(&self) -> bool {
        self.inner.current.read().is_some()
    }

    /// Number of entries in the published snapshot (0 if none)
    pub fn file_count(&self) -> usize {
        self.inner.current.read().as_ref().map(|s| s.len()).unwrap_or(0)
    }

    /// Root of the published snapshot
    pub fn indexed_root(&self) -> Option<PathBuf> {
        self.inner
            .current
            .read()
            .as_ref()
            .map(|s| s.root().to_path_buf())
    }

    /// Maximum number of results a search returns
    pub fn max_results(&self) -> usize {
        self.inner.max_results
    }

    /// Subscribe to human-readable progress messages of every future build.
    pub fn subscribe_progress(&self) -> Receiver<String> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.inner.subscribers.lock().push(sender);
        receiver
    }

    // === Building ===

    /// Index `root` unless it is already the indexed root.
    ///
    /// When the root is already indexed the returned task is complete and
    /// yields `AlreadyIndexed` with the existing snapshot.
    pub fn build_index(&self, root: &Path) -> Result<IndexTask> {
        validate_root(root)?;

        if let Some(snapshot) = self.snapshot() {
            if normalize_key(snapshot.root()) == normalize_key(root) {
                debug!(root = %root.display(), "Root already indexed, skipping build");
                return Ok(Task::ready(BuildOutcome::AlreadyIndexed(snapshot)));
            }
        }

        self.rebuild_index(root)
    }

    /// Walk `root` afresh and publish the result.
    ///
    /// Any build already in flight is cancelled.
    #[instrument(skip(self, root), fields(root = %root.display()))]
    pub fn rebuild_index(&self, root: &Path) -> Result<IndexTask> {
        validate_root(root)?;

        let token = CancellationToken::new();
        let generation = {
            let mut active = self.inner.active_build.lock();
            if let Some(previous) = active.replace(token.clone()) {
                debug!("Cancelling in-flight build");
                previous.cancel();
            }
            self.inner.build_generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        info!(generation, "Starting index build");

        let inner = Arc::clone(&self.inner);
        let root = root.to_path_buf();
        let build_token = token.clone();
        Task::spawn("scout-index", token, move || {
            inner.run_build(&root, generation, &build_token)
        })
    }

    // === Searching ===

    /// Search the published snapshot on the calling thread.
    ///
    /// Returns an empty list when nothing is indexed or the query is blank,
    /// and `Err(Cancelled)` if `cancel` fires during the scan.
    pub fn search(&self, raw: &str, cancel: &dyn CancelSignal) -> Result<Vec<Entry>> {
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        match self.snapshot() {
            Some(snapshot) => {
                snapshot.search(&SearchQuery::parse(raw), self.inner.max_results, cancel)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Search the published snapshot on a background thread.
    ///
    /// Recoverable failures, cancellation included, are absorbed and yield
    /// an empty list.
    pub fn search_index(&self, raw: &str, cancel: CancellationToken) -> Result<SearchTask> {
        let store = self.clone();
        let raw = raw.to_string();
        let search_token = cancel.clone();
        Task::spawn("scout-search", cancel, move || {
            match store.search(&raw, &search_token) {
                Ok(results) => results,
                Err(e) if e.is_recoverable() => {
                    debug!(query = %raw, error = %e, "Index search ended early");
                    Vec::new()
                }
                Err(e) => {
                    error!(query = %raw, error = %e, "Index search failed");
                    Vec::new()
                }
            }
        })
    }
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore")
            .field("snapshot", &self.snapshot())
            .field(
                "build_generation",
                &self.inner.build_generation.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl StoreInner {
    fn run_build(&self, root: &Path, generation: u64, token: &CancellationToken) -> BuildOutcome {
        let outcome = match self.builder.build(root, self, token) {
            Ok(snapshot) if snapshot.is_partial() => BuildOutcome::Cancelled,
            Ok(snapshot) => self.publish(snapshot, generation),
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Index build failed");
                self.report(&format!("Indexing failed: {}", e));
                BuildOutcome::Failed(e.to_string())
            }
        };

        let mut active = self.active_build.lock();
        if self.build_generation.load(Ordering::SeqCst) == generation {
            *active = None;
        }

        outcome
    }

    fn publish(&self, snapshot: IndexSnapshot, generation: u64) -> BuildOutcome {
        let mut slot = self.current.write();
        if self.build_generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Discarding superseded build");
            return BuildOutcome::Superseded;
        }

        let snapshot = Arc::new(snapshot);
        *slot = Some(Arc::clone(&snapshot));
        info!(
            root = %snapshot.root().display(),
            entries = snapshot.len(),
            generation,
            "Published index snapshot"
        );
        BuildOutcome::Published(snapshot)
    }
}

impl ProgressSink for StoreInner {
    fn report(&self, message: &str) {
        debug!(progress = %message, "Index progress");
        self.subscribers
            .lock()
            .retain(|sender| sender.send(message.to_string()).is_ok());
    }
}

fn validate_root(root: &Path) -> Result<()> {
    if root.as_os_str().is_empty() {
        return Err(ScoutError::invalid_argument("root path is empty"));
    }
    if !root.is_dir() {
        return Err(ScoutError::invalid_argument(format!(
            "root is not a directory: {}",
            root.display()
        )));
    }
    Ok(())
}
