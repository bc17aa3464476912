//! Downstream regeneration seam.

use async_trait::async_trait;

/// Receives a request to rebuild output after changes settle.
#[async_trait]
pub trait RegenerationSink: Send + Sync {
    /// Rebuild output from the current file selection.
    async fn regenerate(&self) -> anyhow::Result<()>;
}
