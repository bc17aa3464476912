//! Selection output and the regeneration sink used by `sink watch`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sink_directory_watcher::{ConfigSource, RegenerationSink};
use sink_selection::{FileRecord, select_files};
use tracing::info;

/// Render records as one relative path per line, or as JSON metadata.
pub fn render(records: &[FileRecord], json: bool) -> anyhow::Result<String> {
    if json {
        return serde_json::to_string_pretty(records).context("failed to encode file listing");
    }

    let mut out = String::new();
    for record in records {
        out.push_str(&record.path.to_string_lossy());
        out.push('\n');
    }
    Ok(out)
}

/// Run one selection walk off the async runtime.
pub async fn select(root: PathBuf, source: &dyn ConfigSource) -> anyhow::Result<Vec<FileRecord>> {
    let config = source.load()?;
    let records = tokio::task::spawn_blocking(move || select_files(&root, config))
        .await
        .context("selection task panicked")??;
    Ok(records)
}

/// Re-runs the selection and prints the result.
pub struct ListingSink {
    root: PathBuf,
    source: Arc<dyn ConfigSource>,
    json: bool,
}

impl ListingSink {
    pub fn new(root: PathBuf, source: Arc<dyn ConfigSource>, json: bool) -> Self {
        Self { root, source, json }
    }
}

#[async_trait]
impl RegenerationSink for ListingSink {
    async fn regenerate(&self) -> anyhow::Result<()> {
        let records = select(self.root.clone(), self.source.as_ref()).await?;
        let total: u64 = records.iter().map(|record| record.size).sum();

        print!("{}", render(&records, self.json)?);
        info!("Selected {} files ({total} bytes)", records.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sink_directory_watcher::StaticConfig;
    use sink_selection::SelectionConfig;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_select_and_render_plain() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("src")).unwrap();
        fs::write(temp_dir.path().join("src/main.go"), "package main\n").unwrap();
        fs::write(temp_dir.path().join("README.md"), "# hi\n").unwrap();

        let source = StaticConfig(SelectionConfig::new().filter("*.go").local_ignore_only());
        let records = select(temp_dir.path().to_path_buf(), &source).await.unwrap();

        assert_eq!(render(&records, false).unwrap(), "src/main.go\n");
    }

    #[tokio::test]
    async fn test_render_json_omits_content() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("lib.py"), "print('x')\n").unwrap();

        let source = StaticConfig(SelectionConfig::new().local_ignore_only());
        let records = select(temp_dir.path().to_path_buf(), &source).await.unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&render(&records, true).unwrap()).unwrap();

        assert_eq!(value[0]["path"], "lib.py");
        assert_eq!(value[0]["language"], "python");
        assert_eq!(value[0]["size"], 11);
        assert!(value[0].get("content").is_none());
    }
}
