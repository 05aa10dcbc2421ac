//! # Scout Core Library
//!
//! This crate provides session-scoped file indexing and search for the Scout
//! file browser. The index lives only in memory; it is built on demand by a
//! concurrent directory walk and replaced wholesale on rebuild.
//!
//! ## Architecture
//!
//! - **Backend** (`backend`): Directory enumeration trait, path utilities,
//!   progress and cancellation signals
//! - **Types** (`types`): The `Entry` record and index statistics
//! - **Builder** (`builder`): Concurrent tree walk producing snapshots
//! - **Index** (`index`): Immutable snapshot keyed by normalized path
//! - **Store** (`store`): Holds the published snapshot, runs builds
//! - **Query** (`query`): Query parsing, matching, and ranking
//! - **Fallback** (`fallback`): Breadth-first search for unindexed folders
//! - **Listing** (`listing`): Natural-order directory listing
//! - **Orchestrator** (`orchestrator`): Debounced single-flight search
//! - **History** (`history`): Back/forward navigation
//! - **Browser** (`browser`): A session tying the pieces together
//! - **Config** (`config`): Configuration management
//!
//! ## Example
//!
//! ```rust,ignore
//! use scout_core::{FsEnumerator, IndexBuilder, IndexStore, NeverCancel};
//! use std::sync::Arc;
//!
//! let builder = IndexBuilder::new(Arc::new(FsEnumerator::new()))?;
//! let store = IndexStore::new(builder);
//! store.build_index("/home/me/projects".as_ref())?.wait()?;
//!
//! for entry in store.search("report ext:pdf", &NeverCancel)? {
//!     println!("{}", entry.path.display());
//! }
//! ```

pub mod backend;
pub mod browser;
pub mod builder;
pub mod config;
pub mod error;
pub mod fallback;
pub mod history;
pub mod index;
pub mod listing;
pub mod orchestrator;
pub mod query;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use backend::{
    absolute_path, resolve_path, CancelSignal, CancellationToken, ChannelProgress, DirEntryInfo,
    DirectoryEnumerator, FsEnumerator, LoggingProgress, NeverCancel, ProgressSink,
};
pub use browser::Browser;
pub use builder::{Denylist, IndexBuilder};
pub use config::Config;
pub use error::{Result, ScoutError};
pub use fallback::{fallback_search, FallbackOptions};
pub use history::NavigationHistory;
pub use index::IndexSnapshot;
pub use listing::{list_directory, natural_cmp};
pub use orchestrator::{SearchOptions, SearchOrchestrator, SearchState, SearchUpdate};
pub use query::{parse_query, ParsedQuery, SearchFilter, SearchQuery, MAX_RESULTS};
pub use store::{BuildOutcome, IndexStore, IndexTask, SearchTask, Task};
pub use types::{Entry, IndexStats};
