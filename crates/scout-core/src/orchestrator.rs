//! Debounced, single-flight search driven by query-text changes.
//!
//! ## Architecture
//!
//! Callers change the query (or the directory) from any thread; those calls
//! never touch the filesystem. Each change takes the next value of a
//! generation counter. Non-empty queries are handed to one worker thread over
//! a channel; the worker waits until the query has been quiet for the
//! debounce delay, then runs exactly one search for the newest request.
//!
//! The listing of the current directory is cached. A directory change drops
//! the cache and the worker re-reads it ahead of any debounced search; while
//! the cache is warm an empty query completes on the caller's thread.
//!
//! The generation is checked at three points:
//!
//! 1. Before a debounced search runs: a newer change means it never starts
//! 2. During the scan: the generation doubles as the cancel signal
//! 3. Before any state is published: stale completions are dropped
//!
//! Publication happens under the state mutex after the generation check, so
//! a published generation can only ever increase.
//!
//! ## Search Selection
//!
//! If a snapshot is published and the current directory lies within its
//! root, the index is searched (restricted to the current directory when it
//! is a strict subdirectory). Otherwise a breadth-first fallback walk of the
//! current directory runs.

use crate::backend::{is_within, normalize_key, CancelSignal, DirectoryEnumerator};
use crate::config::Config;
use crate::error::Result;
use crate::fallback::{fallback_search, FallbackOptions};
use crate::listing::list_directory;
use crate::query::{SearchQuery, MAX_RESULTS};
use crate::store::IndexStore;
use crate::types::Entry;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Published state of the orchestrator.
#[derive(Debug, Clone)]
pub enum SearchState {
    /// Nothing has been asked yet
    Idle,

    /// Waiting for the query to settle
    Typing { query: String },

    /// One search attempt is in flight
    Searching { query: String },

    /// Results for `query`; an empty query lists the current directory
    Completed {
        query: String,
        results: Arc<Vec<Entry>>,
        used_index: bool,
    },
}

impl SearchState {
    /// Human-readable status line for this state.
    pub fn status(&self) -> String {
        match self {
            SearchState::Idle => String::new(),
            SearchState::Typing { .. } => "Typing...".to_string(),
            SearchState::Searching { query } => format!("Searching for '{}'...", query),
            SearchState::Completed { query, .. } if query.trim().is_empty() => String::new(),
            SearchState::Completed {
                results,
                used_index,
                ..
            } => {
                let suffix = if *used_index { " (indexed)" } else { "" };
                if results.is_empty() {
                    format!("No results found{}", suffix)
                } else {
                    format!("Found {} result(s){}", results.len(), suffix)
                }
            }
        }
    }

    /// The results, if the state is `Completed`
    pub fn results(&self) -> Option<&[Entry]> {
        match self {
            SearchState::Completed { results, .. } => Some(results.as_slice()),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SearchState::Completed { .. })
    }
}

/// A state together with the generation that produced it.
#[derive(Debug, Clone)]
pub struct SearchUpdate {
    pub generation: u64,
    pub state: SearchState,
}

impl SearchUpdate {
    pub fn status(&self) -> String {
        self.state.status()
    }
}

/// Timing and limits of the orchestrator.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Quiet period before a typed query is searched
    pub debounce: Duration,

    /// Result cap for index searches
    pub max_results: usize,

    /// Limits of the filesystem fallback walk
    pub fallback: FallbackOptions,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            debounce: Duration::from_millis(300),
            max_results: MAX_RESULTS,
            fallback: FallbackOptions::default(),
        }
    }
}

impl SearchOptions {
    pub fn from_config(config: &Config) -> Self {
        SearchOptions {
            debounce: config.debounce(),
            max_results: config.general.max_results.clamp(1, MAX_RESULTS),
            fallback: FallbackOptions::from_config(config),
        }
    }

    /// Set the debounce delay
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Debounced search state machine over an `IndexStore`.
pub struct SearchOrchestrator {
    shared: Arc<Shared>,
    requests: Sender<Request>,
    worker: Option<JoinHandle<()>>,
}

struct Shared {
    store: IndexStore,
    enumerator: Arc<dyn DirectoryEnumerator>,
    options: SearchOptions,
    generation: AtomicU64,
    view: Mutex<View>,
    published: Mutex<SearchUpdate>,
    settled: Condvar,
    subscribers: Mutex<Vec<Sender<SearchUpdate>>>,
    executed: AtomicU64,
}

/// What the user is currently looking at.
struct View {
    query: String,
    directory: PathBuf,

    /// None until the worker has read `directory`
    listing: Option<Arc<Vec<Entry>>>,
}

#[derive(Debug)]
struct SearchJob {
    generation: u64,
    query: String,
    directory: PathBuf,
}

enum Request {
    List(SearchJob),
    Search(SearchJob),
    Shutdown,
}

impl SearchOrchestrator {
    /// Start an orchestrator in `directory`, in the `Idle` state.
    ///
    /// Reads `directory` once before returning so that the first empty query
    /// completes immediately.
    pub fn new(
        store: IndexStore,
        enumerator: Arc<dyn DirectoryEnumerator>,
        options: SearchOptions,
        directory: impl Into<PathBuf>,
    ) -> Result<Self> {
        let directory = directory.into();
        let listing = Arc::new(list_directory(enumerator.as_ref(), &directory));

        let shared = Arc::new(Shared {
            store,
            enumerator,
            options,
            generation: AtomicU64::new(0),
            view: Mutex::new(View {
                query: String::new(),
                directory,
                listing: Some(listing),
            }),
            published: Mutex::new(SearchUpdate {
                generation: 0,
                state: SearchState::Idle,
            }),
            settled: Condvar::new(),
            subscribers: Mutex::new(Vec::new()),
            executed: AtomicU64::new(0),
        });

        let (requests, receiver) = crossbeam_channel::unbounded();
        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("scout-search".to_string())
            .spawn(move || worker_shared.run(receiver))?;

        Ok(SearchOrchestrator {
            shared,
            requests,
            worker: Some(worker),
        })
    }

    /// Replace the query text.
    ///
    /// Empty text completes immediately with the cached listing of the
    /// current directory, or as soon as the worker has read it after a
    /// directory change. Anything else moves to `Typing` and schedules a
    /// debounced search.
    pub fn set_query(&self, text: &str) {
        let (generation, directory, listing) = {
            let mut view = self.shared.view.lock();
            let generation = self.shared.next_generation();
            view.query = text.to_string();
            (generation, view.directory.clone(), view.listing.clone())
        };
        self.dispatch(generation, text.to_string(), directory, listing);
    }

    /// Change the current directory and re-run the current query there.
    ///
    /// The new directory is read on the worker thread.
    pub fn set_directory(&self, directory: &Path) {
        let (generation, query) = {
            let mut view = self.shared.view.lock();
            let generation = self.shared.next_generation();
            view.directory = directory.to_path_buf();
            view.listing = None;
            (generation, view.query.clone())
        };
        debug!(dir = %directory.display(), generation, "Directory changed");
        self.dispatch(generation, query, directory.to_path_buf(), None);
    }

    /// Re-read the current directory's listing and re-run the current query.
    pub fn refresh(&self) {
        let directory = self.directory();
        self.set_directory(&directory);
    }

    fn dispatch(
        &self,
        generation: u64,
        query: String,
        directory: PathBuf,
        listing: Option<Arc<Vec<Entry>>>,
    ) {
        if query.trim().is_empty() {
            match listing {
                Some(listing) => {
                    self.shared.publish(generation, listing_state(listing));
                }
                None => self.send(Request::List(SearchJob {
                    generation,
                    query,
                    directory,
                })),
            }
            return;
        }

        self.shared.publish(
            generation,
            SearchState::Typing {
                query: query.clone(),
            },
        );

        self.send(Request::Search(SearchJob {
            generation,
            query,
            directory,
        }));
    }

    fn send(&self, request: Request) {
        if self.requests.send(request).is_err() {
            warn!("Search worker has stopped, dropping request");
        }
    }

    // === Accessors ===

    /// The latest published state and its generation
    pub fn state(&self) -> SearchUpdate {
        self.shared.published.lock().clone()
    }

    /// Status line of the latest published state
    pub fn status(&self) -> String {
        self.state().status()
    }

    /// The current query text
    pub fn query(&self) -> String {
        self.shared.view.lock().query.clone()
    }

    /// The current directory
    pub fn directory(&self) -> PathBuf {
        self.shared.view.lock().directory.clone()
    }

    /// The newest generation handed out
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Number of searches that actually ran
    pub fn executed_searches(&self) -> u64 {
        self.shared.executed.load(Ordering::SeqCst)
    }

    /// The store searches are served from
    pub fn store(&self) -> &IndexStore {
        &self.shared.store
    }

    /// Receive every state published from now on.
    pub fn subscribe(&self) -> Receiver<SearchUpdate> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.shared.subscribers.lock().push(sender);
        receiver
    }

    /// Block until the newest generation has completed, or `timeout` passes.
    pub fn wait_settled(&self, timeout: Duration) -> Option<SearchUpdate> {
        let deadline = Instant::now() + timeout;
        let mut published = self.shared.published.lock();
        loop {
            let latest = self.shared.generation.load(Ordering::SeqCst);
            if published.generation == latest && published.state.is_completed() {
                return Some(published.clone());
            }
            if self
                .shared
                .settled
                .wait_until(&mut published, deadline)
                .timed_out()
            {
                return None;
            }
        }
    }
}

impl Drop for SearchOrchestrator {
    fn drop(&mut self) {
        // Cancels any search in flight
        self.shared.next_generation();
        let _ = self.requests.send(Request::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("generation", &self.generation())
            .field("state", &self.state().state)
            .finish()
    }
}

impl Shared {
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Publish `state` if `generation` is still the newest.
    fn publish(&self, generation: u64, state: SearchState) -> bool {
        let mut published = self.published.lock();
        if !self.is_current(generation) {
            debug!(generation, "Discarding stale search state");
            return false;
        }

        let update = SearchUpdate { generation, state };
        self.subscribers
            .lock()
            .retain(|sender| sender.send(update.clone()).is_ok());
        *published = update;
        self.settled.notify_all();
        true
    }

    /// Debounce loop: run the newest request once it has been quiet long enough.
    fn run(&self, requests: Receiver<Request>) {
        let mut pending: Option<(SearchJob, Instant)> = None;

        loop {
            let received = match &pending {
                Some((_, deadline)) => {
                    requests.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => requests.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(Request::List(job)) => self.list(job),
                Ok(Request::Search(job)) => {
                    pending = Some((job, Instant::now() + self.options.debounce));
                }
                Ok(Request::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    if let Some((job, _)) = pending.take() {
                        self.execute(job);
                    }
                }
            }
        }

        debug!("Search worker stopped");
    }

    /// Read the job's directory, cache it, and publish it as the empty-query result.
    fn list(&self, job: SearchJob) {
        if !self.is_current(job.generation) {
            debug!(generation = job.generation, "Skipping superseded listing");
            return;
        }

        let listing = Arc::new(list_directory(self.enumerator.as_ref(), &job.directory));
        {
            let mut view = self.view.lock();
            if view.directory == job.directory {
                view.listing = Some(Arc::clone(&listing));
            }
        }
        self.publish(job.generation, listing_state(listing));
    }

    fn execute(&self, job: SearchJob) {
        if !self.is_current(job.generation) {
            debug!(generation = job.generation, "Skipping superseded search");
            return;
        }

        self.executed.fetch_add(1, Ordering::SeqCst);
        self.publish(
            job.generation,
            SearchState::Searching {
                query: job.query.clone(),
            },
        );

        let signal = GenerationSignal {
            counter: &self.generation,
            generation: job.generation,
        };
        let query = SearchQuery::parse(&job.query);
        let snapshot = self
            .store
            .snapshot()
            .filter(|snapshot| is_within(&job.directory, snapshot.root()));

        let (outcome, used_index) = match snapshot {
            Some(snapshot) => {
                let limit = self.options.max_results;
                let outcome = if normalize_key(&job.directory) == normalize_key(snapshot.root()) {
                    snapshot.search(&query, limit, &signal)
                } else {
                    snapshot.search_within(&query, &job.directory, limit, &signal)
                };
                (outcome, true)
            }
            None => (
                fallback_search(
                    self.enumerator.as_ref(),
                    &job.directory,
                    &query,
                    &self.options.fallback,
                    &signal,
                ),
                false,
            ),
        };

        let results = match outcome {
            Ok(results) => results,
            Err(e) if e.is_cancellation() => {
                debug!(query = %job.query, "Search superseded mid-flight");
                return;
            }
            Err(e) if e.is_recoverable() => {
                warn!(query = %job.query, error = %e, "Search failed, publishing no results");
                Vec::new()
            }
            Err(e) => {
                error!(query = %job.query, error = %e, "Search failed unexpectedly");
                Vec::new()
            }
        };

        info!(
            query = %job.query,
            results = results.len(),
            used_index,
            "Search complete"
        );
        self.publish(
            job.generation,
            SearchState::Completed {
                query: job.query,
                results: Arc::new(results),
                used_index,
            },
        );
    }
}

fn listing_state(listing: Arc<Vec<Entry>>) -> SearchState {
    SearchState::Completed {
        query: String::new(),
        results: listing,
        used_index: false,
    }
}

/// Cancel signal that fires once a newer generation exists.
struct GenerationSignal<'a> {
    counter: &'a AtomicU64,
    generation: u64,
}

impl CancelSignal for GenerationSignal<'_> {
    fn is_cancelled(&self) -> bool {
        self.counter.load(Ordering::SeqCst) != self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DirEntryInfo, FsEnumerator};
    use crate::builder::IndexBuilder;
    use std::fs;
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    const WAIT: Duration = Duration::from_secs(5);

    fn make_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("docs/report.pdf"), b"%PDF").unwrap();
        fs::write(root.join("docs/report.txt"), b"text").unwrap();
        fs::write(root.join("src/main"), b"bin").unwrap();
        fs::write(root.join("src/report_gen"), b"bin").unwrap();
        temp
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    fn make_store(enumerator: Arc<dyn DirectoryEnumerator>) -> IndexStore {
        IndexStore::new(IndexBuilder::with_threads(enumerator, 2).unwrap())
    }

    fn make_orchestrator(
        enumerator: Arc<dyn DirectoryEnumerator>,
        store: IndexStore,
        dir: &Path,
        debounce_ms: u64,
    ) -> SearchOrchestrator {
        init_tracing();
        let options = SearchOptions::default().with_debounce(Duration::from_millis(debounce_ms));
        SearchOrchestrator::new(store, enumerator, options, dir).unwrap()
    }

    fn names(update: &SearchUpdate) -> Vec<String> {
        update
            .state
            .results()
            .unwrap_or_default()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    #[test]
    fn test_status_text() {
        let entry = Entry::new(
            PathBuf::from("/a/x"),
            "x".to_string(),
            false,
            PathBuf::from("x"),
        );
        assert_eq!(SearchState::Idle.status(), "");
        assert_eq!(
            SearchState::Typing { query: "r".into() }.status(),
            "Typing..."
        );
        assert_eq!(
            SearchState::Searching { query: "rep".into() }.status(),
            "Searching for 'rep'..."
        );
        assert_eq!(
            SearchState::Completed {
                query: "rep".into(),
                results: Arc::new(vec![]),
                used_index: false
            }
            .status(),
            "No results found"
        );
        assert_eq!(
            SearchState::Completed {
                query: "rep".into(),
                results: Arc::new(vec![entry.clone(), entry.clone()]),
                used_index: true
            }
            .status(),
            "Found 2 result(s) (indexed)"
        );
        assert_eq!(
            SearchState::Completed {
                query: String::new(),
                results: Arc::new(vec![entry]),
                used_index: false
            }
            .status(),
            ""
        );
    }

    #[test]
    fn test_starts_idle() {
        let temp = make_tree();
        let enumerator: Arc<dyn DirectoryEnumerator> = Arc::new(FsEnumerator::new());
        let orchestrator = make_orchestrator(
            enumerator.clone(),
            make_store(enumerator),
            temp.path(),
            50,
        );
        assert!(matches!(orchestrator.state().state, SearchState::Idle));
        assert_eq!(orchestrator.executed_searches(), 0);
    }

    #[test]
    fn test_empty_query_lists_directory_immediately() {
        let temp = make_tree();
        let enumerator: Arc<dyn DirectoryEnumerator> = Arc::new(FsEnumerator::new());
        let orchestrator = make_orchestrator(
            enumerator.clone(),
            make_store(enumerator),
            temp.path(),
            1000,
        );

        orchestrator.set_query("   ");
        let update = orchestrator.state();
        assert_eq!(names(&update), vec!["docs", "src"]);
        assert!(matches!(
            update.state,
            SearchState::Completed {
                used_index: false,
                ..
            }
        ));
        assert_eq!(update.status(), "");
        assert_eq!(orchestrator.executed_searches(), 0);
    }

    #[test]
    fn test_burst_of_updates_runs_one_search() {
        let temp = make_tree();
        let enumerator: Arc<dyn DirectoryEnumerator> = Arc::new(FsEnumerator::new());
        let orchestrator = make_orchestrator(
            enumerator.clone(),
            make_store(enumerator),
            temp.path(),
            200,
        );

        orchestrator.set_query("r");
        assert_eq!(orchestrator.status(), "Typing...");
        std::thread::sleep(Duration::from_millis(30));
        orchestrator.set_query("re");
        std::thread::sleep(Duration::from_millis(30));
        orchestrator.set_query("report.");

        let update = orchestrator.wait_settled(WAIT).unwrap();
        assert!(matches!(
            &update.state,
            SearchState::Completed { query, .. } if query == "report."
        ));
        assert_eq!(names(&update), vec!["report.pdf", "report.txt"]);

        std::thread::sleep(Duration::from_millis(400));
        assert_eq!(orchestrator.executed_searches(), 1);
    }

    #[test]
    fn test_uses_index_when_directory_is_covered() {
        let temp = make_tree();
        let enumerator: Arc<dyn DirectoryEnumerator> = Arc::new(FsEnumerator::new());
        let store = make_store(enumerator.clone());
        store.build_index(temp.path()).unwrap().wait().unwrap();

        let orchestrator = make_orchestrator(enumerator, store, temp.path(), 20);

        orchestrator.set_query("report");
        let update = orchestrator.wait_settled(WAIT).unwrap();
        assert!(matches!(
            update.state,
            SearchState::Completed {
                used_index: true,
                ..
            }
        ));
        assert_eq!(names(&update), vec!["report.pdf", "report.txt", "report_gen"]);
        assert_eq!(update.status(), "Found 3 result(s) (indexed)");

        // Subdirectory of the indexed root: index results scoped to it
        orchestrator.set_directory(&temp.path().join("docs"));
        let update = orchestrator.wait_settled(WAIT).unwrap();
        assert!(matches!(
            update.state,
            SearchState::Completed {
                used_index: true,
                ..
            }
        ));
        assert_eq!(names(&update), vec!["report.pdf", "report.txt"]);
    }

    #[test]
    fn test_falls_back_outside_indexed_root() {
        let indexed = make_tree();
        let other = make_tree();
        let enumerator: Arc<dyn DirectoryEnumerator> = Arc::new(FsEnumerator::new());
        let store = make_store(enumerator.clone());
        store.build_index(&indexed.path().join("docs")).unwrap().wait().unwrap();

        let orchestrator = make_orchestrator(enumerator, store, other.path(), 20);
        orchestrator.set_query("main");

        let update = orchestrator.wait_settled(WAIT).unwrap();
        assert!(matches!(
            update.state,
            SearchState::Completed {
                used_index: false,
                ..
            }
        ));
        assert_eq!(names(&update), vec!["main"]);
        assert_eq!(update.status(), "Found 1 result(s)");
    }

    /// Enumerator that sleeps on every call while `slow` is set.
    struct SlowEnumerator {
        inner: FsEnumerator,
        slow: AtomicBool,
    }

    impl DirectoryEnumerator for SlowEnumerator {
        fn read_dir(&self, dir: &Path) -> Result<Vec<Result<DirEntryInfo>>> {
            if self.slow.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(300));
            }
            self.inner.read_dir(dir)
        }
    }

    #[test]
    fn test_stale_completion_never_overwrites_newer_state() {
        let temp = make_tree();
        let slow = Arc::new(SlowEnumerator {
            inner: FsEnumerator::new(),
            slow: AtomicBool::new(false),
        });
        let enumerator: Arc<dyn DirectoryEnumerator> = slow.clone();
        let orchestrator = make_orchestrator(
            enumerator.clone(),
            make_store(enumerator),
            temp.path(),
            20,
        );
        let updates = orchestrator.subscribe();

        slow.slow.store(true, Ordering::SeqCst);
        orchestrator.set_query("report");

        // Wait until the fallback walk is in flight
        loop {
            let update = updates.recv_timeout(WAIT).unwrap();
            if matches!(update.state, SearchState::Searching { .. }) {
                break;
            }
        }

        orchestrator.set_query("");
        let newer = orchestrator.state();
        assert!(matches!(
            &newer.state,
            SearchState::Completed { query, .. } if query.is_empty()
        ));

        // Give the stale walk time to finish
        std::thread::sleep(Duration::from_millis(1000));

        let latest = orchestrator.state();
        assert_eq!(latest.generation, newer.generation);
        assert!(matches!(
            &latest.state,
            SearchState::Completed { query, .. } if query.is_empty()
        ));
        assert!(updates.try_iter().all(|u| !matches!(
            &u.state,
            SearchState::Completed { query, .. } if query == "report"
        )));
    }

    #[test]
    fn test_directory_change_lists_on_worker() {
        let temp = make_tree();
        let slow = Arc::new(SlowEnumerator {
            inner: FsEnumerator::new(),
            slow: AtomicBool::new(false),
        });
        let enumerator: Arc<dyn DirectoryEnumerator> = slow.clone();
        let orchestrator = make_orchestrator(
            enumerator.clone(),
            make_store(enumerator),
            temp.path(),
            20,
        );

        slow.slow.store(true, Ordering::SeqCst);
        let start = Instant::now();
        orchestrator.set_directory(&temp.path().join("docs"));
        assert!(start.elapsed() < Duration::from_millis(200));
        assert!(!orchestrator.state().state.is_completed());

        let update = orchestrator.wait_settled(WAIT).unwrap();
        assert_eq!(names(&update), vec!["report.pdf", "report.txt"]);
        assert_eq!(orchestrator.executed_searches(), 0);

        // The listing is cached now: an empty query needs no disk access
        let start = Instant::now();
        orchestrator.set_query("");
        assert!(start.elapsed() < Duration::from_millis(200));
        assert_eq!(names(&orchestrator.state()), vec!["report.pdf", "report.txt"]);
    }

    #[test]
    fn test_published_generations_increase() {
        let temp = make_tree();
        let enumerator: Arc<dyn DirectoryEnumerator> = Arc::new(FsEnumerator::new());
        let orchestrator = make_orchestrator(
            enumerator.clone(),
            make_store(enumerator),
            temp.path(),
            10,
        );
        let updates = orchestrator.subscribe();

        for text in ["m", "ma", "", "mai", "main"] {
            orchestrator.set_query(text);
            std::thread::sleep(Duration::from_millis(5));
        }
        orchestrator.wait_settled(WAIT).unwrap();

        let generations: Vec<u64> = updates.try_iter().map(|u| u.generation).collect();
        assert!(!generations.is_empty());
        assert!(generations.windows(2).all(|w| w[0] <= w[1]));
    }
}
