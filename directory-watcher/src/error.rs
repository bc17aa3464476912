//! Error types for the directory watcher.

use std::path::PathBuf;

use sink_selection::SelectionError;
use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Errors that can occur in the directory watcher.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Loading configuration or ignore rules failed.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Watch root not found.
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    /// Registering a watch failed.
    #[error("failed to watch {}: {source}", .path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// A notification channel closed; the session cannot continue.
    #[error("watch session terminated: {0} channel closed")]
    ChannelClosed(&'static str),

    /// Notify error.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatcherError {
    /// Whether this error came from watch registration.
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup { .. })
    }

    /// Whether the session ended because a notification channel closed.
    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::ChannelClosed(_))
    }
}
