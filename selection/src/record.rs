//! Selected file snapshots.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SelectionError};
use crate::language::LanguageMap;

/// An accepted file with its content and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the walk root.
    pub path: PathBuf,

    /// Full path to the file.
    pub absolute_path: PathBuf,

    /// Extension without the dot, if any.
    pub extension: Option<String>,

    /// Raw file content.
    #[serde(skip)]
    pub content: Vec<u8>,

    /// Detected language tag.
    pub language: String,

    /// File size in bytes.
    pub size: u64,

    /// When the file was last modified.
    pub modified: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// Read a file into a record.
    pub fn read(absolute: &Path, relative: &Path, languages: &LanguageMap) -> Result<Self> {
        let metadata =
            fs::metadata(absolute).map_err(|err| SelectionError::traversal(absolute, err))?;
        let content = fs::read(absolute).map_err(|err| SelectionError::traversal(absolute, err))?;

        Ok(Self {
            path: relative.to_path_buf(),
            absolute_path: absolute.to_path_buf(),
            extension: relative
                .extension()
                .and_then(|e| e.to_str())
                .map(String::from),
            language: languages.detect(relative),
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            content,
        })
    }

    /// Content as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}
