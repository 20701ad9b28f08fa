//! Runtime settings: retry bounds, duplicate handling and scan filters.
//!
//! Settings live in a TOML file:
//!
//! ```toml
//! [retry]
//! max_attempts = 3
//! delay_ms = 2000
//!
//! [duplicates]
//! backup_dir = "backup"
//!
//! [filters]
//! skip_hidden = true
//! exclude_filenames = ["Thumbs.db", "desktop.ini"]
//! exclude_extensions = ["part", "crdownload"]
//! exclude_patterns = ["*.tmp"]
//! exclude_regex = []
//! ```
//!
//! Lookup order: an explicit path, then `.refilerc.toml` in the working
//! directory, then `~/.config/refile/config.toml`, then built-in defaults.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::file_mover::RetryPolicy;

/// Top-level settings, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub duplicates: DuplicateSettings,
    #[serde(default)]
    pub filters: FilterSettings,
}

/// Retry bounds for single-file moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    2000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            delay: Duration::from_millis(self.delay_ms),
        }
    }
}

/// Duplicate-handling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateSettings {
    /// Directory duplicates are relocated into, relative to the organize
    /// root unless absolute.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
}

fn default_backup_dir() -> String {
    "backup".to_string()
}

impl Default for DuplicateSettings {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
        }
    }
}

/// Which files a scan considers at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Skip files whose name starts with a dot. Defaults to true, which
    /// also keeps the ledger and rules stores out of the scan.
    #[serde(default = "default_skip_hidden")]
    pub skip_hidden: bool,

    /// Exact filenames to exclude.
    #[serde(default)]
    pub exclude_filenames: Vec<String>,

    /// Extensions (without dot) to exclude.
    #[serde(default)]
    pub exclude_extensions: Vec<String>,

    /// Glob patterns to exclude.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub exclude_regex: Vec<String>,
}

fn default_skip_hidden() -> bool {
    true
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            skip_hidden: default_skip_hidden(),
            exclude_filenames: Vec::new(),
            exclude_extensions: Vec::new(),
            exclude_patterns: Vec::new(),
            exclude_regex: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads settings, falling back through the lookup order to defaults.
    ///
    /// An explicitly given path must exist and parse; the fallback
    /// locations are only used when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(".refilerc.toml");
        if local.exists() {
            return Self::load_from_file(&local);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("refile")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))
    }
}

impl FilterSettings {
    /// Compiles the filter rules into matchers so per-file checks don't
    /// reparse patterns.
    pub fn compile(&self) -> Result<ScanFilter> {
        let patterns = self
            .exclude_patterns
            .iter()
            .map(|p| Pattern::new(p).map_err(|e| Error::Config(format!("invalid glob '{p}': {e}"))))
            .collect::<Result<Vec<_>>>()?;

        let regexes = self
            .exclude_regex
            .iter()
            .map(|p| Regex::new(p).map_err(|e| Error::Config(format!("invalid regex '{p}': {e}"))))
            .collect::<Result<Vec<_>>>()?;

        Ok(ScanFilter {
            skip_hidden: self.skip_hidden,
            filenames: self.exclude_filenames.iter().cloned().collect(),
            extensions: self
                .exclude_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            patterns,
            regexes,
        })
    }
}

/// Compiled filter rules applied during the scan.
pub struct ScanFilter {
    skip_hidden: bool,
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl ScanFilter {
    /// Whether the scan should consider this file at all.
    pub fn admits(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.skip_hidden && file_name.starts_with('.') {
            return false;
        }
        if self.filenames.contains(file_name.as_ref()) {
            return false;
        }
        if let Some(ext) = path.extension()
            && self.extensions.contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }
        if self.patterns.iter().any(|p| p.matches_path(path)) {
            return false;
        }
        if self.regexes.iter().any(|r| r.is_match(&file_name)) {
            return false;
        }
        true
    }
}
