//! Link graph configuration
//!
//! [`LinkGraphConfig`] is plain serde data with builder-style setters. It can
//! be written by hand in TOML:
//!
//! ```toml
//! lock_timeout_ms = 2000
//! unique_targets = true
//! max_targets_per_replace = 500
//! snapshot_path = "links.json"
//! ```

use reslink_store::ReplaceOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for [`LinkGraphConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Link graph configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkGraphConfig {
    /// Maximum wait for a `(from, name)` key lock, in milliseconds
    pub lock_timeout_ms: u64,
    /// Collapse duplicate targets in a replacement
    pub unique_targets: bool,
    /// Reject replacements with more targets than this
    pub max_targets_per_replace: Option<usize>,
    /// JSON snapshot backing the store
    pub snapshot_path: Option<PathBuf>,
}

impl LinkGraphConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With lock timeout
    #[inline]
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With duplicate collapsing
    #[inline]
    #[must_use]
    pub fn with_unique_targets(mut self, unique: bool) -> Self {
        self.unique_targets = unique;
        self
    }

    /// With target limit
    #[inline]
    #[must_use]
    pub fn with_max_targets(mut self, max: usize) -> Self {
        self.max_targets_per_replace = Some(max);
        self
    }

    /// With snapshot file
    #[inline]
    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Lock timeout as a duration
    #[inline]
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Options for the replacement transaction
    #[must_use]
    pub fn replace_options(&self) -> ReplaceOptions {
        let options = ReplaceOptions::new()
            .with_lock_timeout(self.lock_timeout())
            .with_unique_targets(self.unique_targets);
        match self.max_targets_per_replace {
            Some(max) => options.with_max_targets(max),
            None => options,
        }
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on invalid TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as [`Self::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

impl Default for LinkGraphConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5_000,
            unique_targets: false,
            max_targets_per_replace: None,
            snapshot_path: None,
        }
    }
}
