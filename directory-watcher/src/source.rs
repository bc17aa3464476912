//! Where a watch session gets its selection configuration.

use std::path::PathBuf;

use sink_selection::SelectionConfig;

/// Supplies the selection configuration, on start and on every reload.
pub trait ConfigSource: Send + Sync {
    /// File whose changes trigger a reload, if any.
    fn path(&self) -> Option<PathBuf>;

    /// Read the current configuration.
    fn load(&self) -> sink_selection::Result<SelectionConfig>;
}

/// A configuration that never changes.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig(pub SelectionConfig);

impl ConfigSource for StaticConfig {
    fn path(&self) -> Option<PathBuf> {
        None
    }

    fn load(&self) -> sink_selection::Result<SelectionConfig> {
        Ok(self.0.clone())
    }
}

/// Configuration read from a YAML file, falling back to defaults when the
/// file is missing.
#[derive(Debug, Clone)]
pub struct FileConfig {
    path: PathBuf,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigSource for FileConfig {
    fn path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }

    fn load(&self) -> sink_selection::Result<SelectionConfig> {
        SelectionConfig::load_file_or_default(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_file_config_reads_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sink-config.yaml");
        fs::write(&path, "filter-patterns: ['*.go']\ndebounce-ms: 50\n").unwrap();

        let source = FileConfig::new(&path);
        let config = source.load().unwrap();

        assert_eq!(source.path(), Some(path));
        assert_eq!(config.filter_patterns, vec!["*.go".to_string()]);
        assert_eq!(config.debounce_ms, 50);
    }

    #[test]
    fn test_file_config_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let source = FileConfig::new(temp_dir.path().join("absent.yaml"));

        assert!(source.load().unwrap().filter_patterns.is_empty());
        assert_eq!(StaticConfig::default().path(), None);
    }
}
