//! Error types for Scout core operations.
//!
//! Library code returns `ScoutError` through the crate-wide `Result` alias.
//! Most variants never reach a caller: background work (indexing, fallback
//! walks, debounced searches) absorbs them and reports at most an empty
//! result set plus a status message. Only invalid arguments passed to a
//! synchronous entry point are returned directly.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using ScoutError
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Core error types for Scout operations.
#[derive(Error, Debug)]
pub enum ScoutError {
    // === Caller Errors ===
    /// An argument was rejected before any work started (e.g. empty root path)
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // === Filesystem Errors ===
    /// Permission denied when accessing a directory or entry
    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // === Search Errors ===
    /// A superseded operation observed its cancel signal
    #[error("operation cancelled")]
    Cancelled,

    /// A query filter could not be parsed (e.g. `size:>abc`)
    #[error("malformed filter {name}:{value}: {reason}")]
    MalformedFilter {
        name: String,
        value: String,
        reason: String,
    },

    // === Configuration Errors ===
    /// Configuration file parsing failed
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    // === Internal Errors ===
    /// Internal error that should not happen
    #[error("internal error: {0}")]
    Internal(String),
}

impl ScoutError {
    /// Map an I/O error raised while touching `path`.
    ///
    /// Permission failures get their own variant so walkers can skip them
    /// quietly; everything else stays an `Io` error.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            ScoutError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            ScoutError::Io(err)
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        ScoutError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Returns true if this error is the expected outcome of a superseded attempt
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ScoutError::Cancelled)
    }

    /// Returns true if background work should absorb this error and carry on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScoutError::PermissionDenied { .. }
                | ScoutError::Io(_)
                | ScoutError::Cancelled
                | ScoutError::MalformedFilter { .. }
        )
    }
}
