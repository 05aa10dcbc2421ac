//! Application state management.

use scout_core::{
    absolute_path, BuildOutcome, Config, DirectoryEnumerator, Entry, FsEnumerator, IndexSnapshot,
    IndexStore, IndexTask,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Shared application state.
pub struct App {
    /// Configuration
    pub config: Config,

    /// Filesystem access
    pub enumerator: Arc<dyn DirectoryEnumerator>,

    /// Holder of the in-memory index
    pub store: IndexStore,
}

impl App {
    /// Create a new application instance.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let enumerator: Arc<dyn DirectoryEnumerator> = Arc::new(FsEnumerator::new());
        let store = IndexStore::from_config(&config, Arc::clone(&enumerator))?;

        info!(root = %config.root_path().display(), "Application initialized");

        Ok(App {
            config,
            enumerator,
            store,
        })
    }

    /// The directory given on the command line, else the configured root,
    /// as an absolute path.
    pub fn resolve_root(&self, root: Option<PathBuf>) -> anyhow::Result<PathBuf> {
        let root = root.unwrap_or_else(|| self.config.root_path());
        Ok(absolute_path(&root)?)
    }

    /// Build the index over `root`, streaming progress lines to stderr.
    pub fn build_index(&self, root: &Path, quiet: bool) -> anyhow::Result<Arc<IndexSnapshot>> {
        let progress = self.store.subscribe_progress();
        let task = self.store.build_index(root)?;
        let outcome = wait_with_progress(task, &progress, quiet)?;

        match outcome {
            BuildOutcome::Published(snapshot) | BuildOutcome::AlreadyIndexed(snapshot) => {
                Ok(snapshot)
            }
            BuildOutcome::Cancelled | BuildOutcome::Superseded => {
                anyhow::bail!("Indexing of {} was interrupted", root.display())
            }
            BuildOutcome::Failed(reason) => {
                anyhow::bail!("Indexing of {} failed: {}", root.display(), reason)
            }
        }
    }
}

/// Wait for a build, echoing progress messages as they arrive.
pub fn wait_with_progress(
    task: IndexTask,
    progress: &crossbeam_channel::Receiver<String>,
    quiet: bool,
) -> anyhow::Result<BuildOutcome> {
    while !task.is_finished() {
        if let Ok(message) = progress.recv_timeout(Duration::from_millis(100)) {
            if !quiet {
                eprintln!("{}", message);
            }
        }
    }
    for message in progress.try_iter() {
        if !quiet {
            eprintln!("{}", message);
        }
    }
    Ok(task.wait()?)
}

/// Print entries one per line with a type marker and size.
pub fn print_entries(entries: &[Entry], limit: usize) {
    for entry in entries.iter().take(limit) {
        let type_indicator = if entry.is_dir { "📁" } else { "📄" };
        match entry.size {
            Some(size) => println!("{} {} ({} bytes)", type_indicator, entry.path.display(), size),
            None => println!("{} {}", type_indicator, entry.path.display()),
        }
    }
    if entries.len() > limit {
        println!("... and {} more", entries.len() - limit);
    }
}

/// Render a byte count for humans.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_build_index_and_reuse() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/notes.md"), b"# notes").unwrap();

        let mut config = Config::default();
        config.general.root_path = Some(temp.path().to_path_buf());
        let app = App::new(config).unwrap();

        let root = app.resolve_root(None).unwrap();
        assert_eq!(root, temp.path());

        let first = app.build_index(&root, true).unwrap();
        assert_eq!(first.len(), 2);

        let second = app.build_index(&root, true).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_build_index_rejects_missing_root() {
        let temp = TempDir::new().unwrap();
        let app = App::new(Config::default()).unwrap();
        assert!(app.build_index(&temp.path().join("missing"), true).is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
