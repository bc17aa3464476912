//! Error types for file selection.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for selection operations.
pub type Result<T> = std::result::Result<T, SelectionError>;

/// Errors that can occur while loading selection rules or walking a tree.
#[derive(Error, Debug)]
pub enum SelectionError {
    /// An ignore or configuration file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An ignore or configuration file could not be parsed.
    #[error("malformed {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// A directory entry or file could not be read during a walk.
    #[error("traversal failed at {}: {source}", .path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SelectionError {
    /// Whether this error came from loading rules or configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConfigRead { .. } | Self::ConfigParse { .. })
    }

    pub(crate) fn traversal(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Traversal {
            path: path.into(),
            source,
        }
    }
}

impl From<walkdir::Error> for SelectionError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        Self::Traversal {
            path,
            source: err.into(),
        }
    }
}
