//! A browsing session: navigation history, index and search wired together.
//!
//! Every change of the current directory is forwarded to the orchestrator,
//! which lists the new directory or re-runs the current query there.

use crate::backend::{absolute_path, resolve_path, DirectoryEnumerator};
use crate::config::Config;
use crate::error::{Result, ScoutError};
use crate::history::NavigationHistory;
use crate::orchestrator::{SearchOptions, SearchOrchestrator, SearchUpdate};
use crate::store::{IndexStore, IndexTask};
use crossbeam_channel::Receiver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// One user's browsing session.
pub struct Browser {
    history: NavigationHistory,
    store: IndexStore,
    search: SearchOrchestrator,
}

impl Browser {
    /// Open a session at the configured root path.
    pub fn new(config: &Config, enumerator: Arc<dyn DirectoryEnumerator>) -> Result<Self> {
        Self::open_at(config, enumerator, config.root_path())
    }

    /// Open a session at `start`.
    ///
    /// A relative `start` resolves against the working directory.
    pub fn open_at(
        config: &Config,
        enumerator: Arc<dyn DirectoryEnumerator>,
        start: impl Into<PathBuf>,
    ) -> Result<Self> {
        let start = absolute_path(&start.into())?;
        ensure_directory(&start)?;

        let store = IndexStore::from_config(config, Arc::clone(&enumerator))?;
        let search = SearchOrchestrator::new(
            store.clone(),
            enumerator,
            SearchOptions::from_config(config),
            start.clone(),
        )?;
        search.set_query("");

        info!(start = %start.display(), "Browser session opened");
        Ok(Browser {
            history: NavigationHistory::new(start),
            store,
            search,
        })
    }

    /// The directory being browsed.
    pub fn current_dir(&self) -> &Path {
        // A session always starts with a current path
        self.history.current().unwrap_or_else(|| Path::new("."))
    }

    /// Navigate to `path`, recording history.
    ///
    /// Relative paths resolve against the current directory; `.` and `..`
    /// are folded away before the path enters history.
    pub fn navigate_to(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ScoutError::invalid_argument("path is empty"));
        }
        let target = resolve_path(self.current_dir(), path);
        ensure_directory(&target)?;

        if self.history.navigate_to(target, true) {
            self.directory_changed();
        }
        Ok(())
    }

    /// Step back in history. Returns false if there is nothing to go back to.
    pub fn go_back(&mut self) -> bool {
        let changed = self.history.go_back();
        if changed {
            self.directory_changed();
        }
        changed
    }

    /// Step forward in history. Returns false if there is nothing ahead.
    pub fn go_forward(&mut self) -> bool {
        let changed = self.history.go_forward();
        if changed {
            self.directory_changed();
        }
        changed
    }

    /// Go to the parent directory. Returns false at a filesystem root.
    pub fn go_up(&mut self) -> bool {
        let changed = self.history.go_up();
        if changed {
            self.directory_changed();
        }
        changed
    }

    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    /// Replace the query text; see `SearchOrchestrator::set_query`.
    pub fn set_query(&self, text: &str) {
        self.search.set_query(text);
    }

    /// Index the current directory unless it is already the indexed root.
    pub fn ensure_index(&self) -> Result<IndexTask> {
        self.store.build_index(self.current_dir())
    }

    /// Re-index the current directory from scratch.
    pub fn rebuild_index(&self) -> Result<IndexTask> {
        self.store.rebuild_index(self.current_dir())
    }

    /// Latest published search state
    pub fn state(&self) -> SearchUpdate {
        self.search.state()
    }

    /// Receive every search state published from now on
    pub fn subscribe(&self) -> Receiver<SearchUpdate> {
        self.search.subscribe()
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn search(&self) -> &SearchOrchestrator {
        &self.search
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    fn directory_changed(&self) {
        let dir = self.current_dir().to_path_buf();
        debug!(dir = %dir.display(), "Current directory changed");
        self.search.set_directory(&dir);
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(ScoutError::invalid_argument("path is empty"));
    }
    if !path.is_dir() {
        return Err(ScoutError::invalid_argument(format!(
            "not a directory: {}",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FsEnumerator;
    use crate::orchestrator::SearchState;
    use crate::store::BuildOutcome;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    const WAIT: Duration = Duration::from_secs(5);

    fn make_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("docs/archive")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("docs/report.pdf"), b"%PDF").unwrap();
        fs::write(root.join("docs/archive/report-2019.txt"), b"old").unwrap();
        fs::write(root.join("src/main"), b"bin").unwrap();
        temp
    }

    fn make_browser(root: &Path) -> Browser {
        let mut config = Config::default();
        config.search.debounce_ms = 20;
        config.index.threads = 2;
        Browser::open_at(&config, Arc::new(FsEnumerator::new()), root).unwrap()
    }

    fn listed_names(browser: &Browser) -> Vec<String> {
        let update = browser.search().wait_settled(WAIT).unwrap();
        update
            .state
            .results()
            .unwrap_or_default()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    #[test]
    fn test_opens_with_directory_listing() {
        let temp = make_tree();
        let browser = make_browser(temp.path());
        assert_eq!(browser.current_dir(), temp.path());
        assert_eq!(listed_names(&browser), vec!["docs", "src"]);
    }

    #[test]
    fn test_open_rejects_missing_directory() {
        let temp = TempDir::new().unwrap();
        let config = Config::default();
        let result = Browser::open_at(
            &config,
            Arc::new(FsEnumerator::new()),
            temp.path().join("missing"),
        );
        assert!(matches!(result, Err(ScoutError::InvalidArgument { .. })));
    }

    #[test]
    fn test_navigation_relists() {
        let temp = make_tree();
        let mut browser = make_browser(temp.path());

        browser.navigate_to("docs").unwrap();
        assert_eq!(browser.current_dir(), temp.path().join("docs"));
        assert_eq!(listed_names(&browser), vec!["archive", "report.pdf"]);

        assert!(browser.go_up());
        assert_eq!(browser.current_dir(), temp.path());
        assert_eq!(listed_names(&browser), vec!["docs", "src"]);

        assert!(browser.go_back());
        assert_eq!(browser.current_dir(), temp.path().join("docs"));
        assert!(browser.can_go_forward());

        assert!(browser.navigate_to("nope").is_err());
        assert_eq!(browser.current_dir(), temp.path().join("docs"));
    }

    #[test]
    fn test_parent_navigation_is_resolved() {
        let temp = make_tree();
        let mut browser = make_browser(temp.path());
        browser.ensure_index().unwrap().wait().unwrap();

        browser.navigate_to("docs").unwrap();
        browser.navigate_to("..").unwrap();
        assert_eq!(browser.current_dir(), temp.path());

        browser.set_query("main");
        let update = browser.search().wait_settled(WAIT).unwrap();
        assert_eq!(update.status(), "Found 1 result(s) (indexed)");
        assert_eq!(listed_names(&browser), vec!["main"]);

        browser.navigate_to("./docs/archive/../..").unwrap();
        assert_eq!(browser.current_dir(), temp.path());

        // Up from the root of the tree goes to its real parent
        browser.set_query("");
        assert!(browser.go_up());
        assert_eq!(Some(browser.current_dir()), temp.path().parent());
    }

    #[test]
    fn test_relative_start_is_absolute() {
        let config = Config::default();
        let browser = Browser::open_at(&config, Arc::new(FsEnumerator::new()), ".").unwrap();
        assert!(browser.current_dir().is_absolute());
        assert_eq!(browser.current_dir(), std::env::current_dir().unwrap());
    }

    #[test]
    fn test_query_follows_directory_changes() {
        let temp = make_tree();
        let mut browser = make_browser(temp.path());

        let outcome = browser.ensure_index().unwrap().wait().unwrap();
        assert!(matches!(outcome, BuildOutcome::Published(_)));

        browser.set_query("report");
        let update = browser.search().wait_settled(WAIT).unwrap();
        assert!(matches!(
            update.state,
            SearchState::Completed {
                used_index: true,
                ..
            }
        ));
        assert_eq!(update.state.results().map(|r| r.len()), Some(2));

        browser.navigate_to("docs/archive").unwrap();
        assert_eq!(listed_names(&browser), vec!["report-2019.txt"]);

        // Already indexed from the root: nothing to do
        browser.go_up();
        browser.go_up();
        let outcome = browser.ensure_index().unwrap().wait().unwrap();
        assert!(matches!(outcome, BuildOutcome::AlreadyIndexed(_)));
    }
}
