//! Configuration assembled from the YAML file and command line flags.

use std::path::{Path, PathBuf};

use sink_directory_watcher::ConfigSource;
use sink_selection::{CONFIG_FILE_NAME, SelectionConfig};

/// Values given on the command line. Each one, when set, replaces the
/// corresponding file value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub filter: Vec<String>,
    pub exclude: Vec<String>,
    pub case_sensitive: bool,
    pub debounce_ms: Option<u64>,
}

impl Overrides {
    fn apply(&self, mut config: SelectionConfig) -> SelectionConfig {
        if !self.filter.is_empty() {
            config.filter_patterns = self.filter.clone();
        }
        if !self.exclude.is_empty() {
            config.exclude_patterns = self.exclude.clone();
        }
        if self.case_sensitive {
            config.case_sensitive = true;
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.debounce_ms = debounce_ms;
        }
        config
    }
}

/// Re-reads the configuration file on every load and layers flags on top.
#[derive(Debug, Clone)]
pub struct CliConfigSource {
    path: PathBuf,
    explicit: bool,
    overrides: Overrides,
}

impl CliConfigSource {
    /// Use `config` when given, otherwise the default file under `root`,
    /// which may be absent.
    pub fn new(root: &Path, config: Option<PathBuf>, overrides: Overrides) -> Self {
        let explicit = config.is_some();
        let path = config.unwrap_or_else(|| root.join(CONFIG_FILE_NAME));
        Self {
            path,
            explicit,
            overrides,
        }
    }
}

impl ConfigSource for CliConfigSource {
    fn path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }

    fn load(&self) -> sink_selection::Result<SelectionConfig> {
        let config = if self.explicit {
            SelectionConfig::load_file(&self.path)?
        } else {
            SelectionConfig::load_file_or_default(&self.path)?
        };
        Ok(self.overrides.apply(config))
    }
}
