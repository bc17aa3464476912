//! Selection configuration.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SelectionError};

/// Name of the configuration file looked up in the root directory.
pub const CONFIG_FILE_NAME: &str = "sink-config.yaml";

/// Default debounce window for watch sessions.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Inputs to file selection.
///
/// Values are immutable once built; a reload produces a fresh value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectionConfig {
    /// Only files matching one of these are selected. Empty selects all.
    pub filter_patterns: Vec<String>,

    /// Files and directories matching any of these are skipped.
    pub exclude_patterns: Vec<String>,

    /// Whether pattern matching respects case.
    pub case_sensitive: bool,

    /// Debounce window in milliseconds.
    pub debounce_ms: u64,

    /// Extension to language tag overrides.
    pub syntax_map: HashMap<String, String>,

    /// Whether the user-wide ignore file is loaded.
    pub global_ignore: bool,

    /// Whether the system-wide ignore file is loaded.
    pub system_ignore: bool,
}

impl SelectionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            filter_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            case_sensitive: false,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            syntax_map: HashMap::new(),
            global_ignore: true,
            system_ignore: true,
        }
    }

    /// Add a filter pattern.
    pub fn filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter_patterns.push(pattern.into());
        self
    }

    /// Add an exclude pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Set case sensitivity.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Set the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Map an extension to a language tag.
    pub fn with_syntax(mut self, extension: impl Into<String>, language: impl Into<String>) -> Self {
        self.syntax_map.insert(extension.into(), language.into());
        self
    }

    /// Skip the user and system ignore files; only the local one is read.
    pub fn local_ignore_only(mut self) -> Self {
        self.global_ignore = false;
        self.system_ignore = false;
        self
    }

    /// The debounce window.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Parse YAML text. `path` is only used for error messages.
    pub fn from_yaml(contents: &str, path: &Path) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::new());
        }

        serde_yaml::from_str(contents).map_err(|err| SelectionError::ConfigParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Load a YAML configuration file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| SelectionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents, path)
    }

    /// Load a YAML configuration file, falling back to defaults when it does
    /// not exist.
    pub fn load_file_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_file(path)
        } else {
            Ok(Self::new())
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self::new()
    }
}
