//! Configuration management for Scout.
//!
//! This module provides configuration loading, saving, and defaults.
//! Configuration is stored in TOML format in a platform-appropriate location.

use crate::builder::{Denylist, DEFAULT_PROGRESS_INTERVAL};
use crate::error::{Result, ScoutError};
use crate::query::MAX_RESULTS;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Main configuration structure for Scout.
///
/// ## Example Configuration File (scout.toml)
///
/// ```toml
/// [general]
/// root_path = "/home/me/projects"
/// max_results = 1000
/// log_level = "info"
///
/// [index]
/// extra_excluded_dirs = ["target", "dist"]
/// progress_interval = 5000
/// threads = 0
///
/// [search]
/// debounce_ms = 300
/// fallback_max_depth = 10
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Index builder settings
    pub index: IndexConfig,

    /// Search orchestration settings
    pub search: SearchConfig,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory to start from (None = user home directory)
    pub root_path: Option<PathBuf>,

    /// Maximum number of search results to return
    pub max_results: usize,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            root_path: None,
            max_results: MAX_RESULTS,
            log_level: "info".to_string(),
        }
    }
}

/// Index builder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory names excluded in addition to the built-in denylist
    pub extra_excluded_dirs: Vec<String>,

    /// Entries between progress reports
    pub progress_interval: u64,

    /// Worker threads for entry processing (0 = available parallelism)
    pub threads: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            extra_excluded_dirs: Vec::new(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            threads: 0,
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a search runs
    pub debounce_ms: u64,

    /// Maximum depth of the filesystem fallback walk
    pub fallback_max_depth: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            debounce_ms: 300,
            fallback_max_depth: 10,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default config if no config file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        info!(path = %path.display(), "Loading configuration");
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| ScoutError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
        })?;

        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Saving configuration");
        let contents = toml::to_string_pretty(self).map_err(|e| ScoutError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "scout").ok_or_else(|| ScoutError::ConfigError {
            reason: "Could not determine config directory".to_string(),
        })?;

        Ok(dirs.config_dir().join("scout.toml"))
    }

    /// Directory to start from: configured root, else home, else cwd.
    pub fn root_path(&self) -> PathBuf {
        if let Some(ref path) = self.general.root_path {
            return path.clone();
        }
        BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// The built-in denylist extended with configured names.
    pub fn denylist(&self) -> Denylist {
        Denylist::with_extra(&self.index.extra_excluded_dirs)
    }

    /// Check if a directory name is excluded from indexing and search.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.denylist().contains(name)
    }

    /// Debounce delay as a `Duration`
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.max_results, 1000);
        assert_eq!(config.index.progress_interval, 5000);
        assert_eq!(config.search.debounce_ms, 300);
        assert_eq!(config.search.fallback_max_depth, 10);
        assert_eq!(config.debounce(), Duration::from_millis(300));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("test.toml");

        let mut config = Config::default();
        config.general.root_path = Some(PathBuf::from("/srv/data"));
        config.index.extra_excluded_dirs = vec!["target".to_string()];
        config.search.debounce_ms = 50;

        config.save_to(&config_path).unwrap();
        let loaded = Config::load_from(&config_path).unwrap();

        assert_eq!(loaded.general.root_path, Some(PathBuf::from("/srv/data")));
        assert_eq!(loaded.index.extra_excluded_dirs, vec!["target".to_string()]);
        assert_eq!(loaded.search.debounce_ms, 50);
        assert_eq!(loaded.root_path(), PathBuf::from("/srv/data"));
    }

    #[test]
    fn test_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.general.max_results, 1000);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "[search]\ndebounce_ms = 120\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.search.debounce_ms, 120);
        assert_eq!(config.search.fallback_max_depth, 10);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[search\n").unwrap();

        let result = Config::load_from(&config_path);
        assert!(matches!(result, Err(ScoutError::ConfigError { .. })));
    }

    #[test]
    fn test_is_excluded_dir() {
        let mut config = Config::default();
        config.index.extra_excluded_dirs = vec!["Target".to_string()];

        assert!(config.is_excluded_dir("node_modules"));
        assert!(config.is_excluded_dir("NODE_MODULES"));
        assert!(config.is_excluded_dir("target"));
        assert!(!config.is_excluded_dir("src"));
    }
}
