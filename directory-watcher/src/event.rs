//! File events from directory watching.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// A file system event.
#[derive(Debug, Clone)]
pub struct FileEvent {
    /// The kind of event.
    pub kind: FileEventKind,

    /// Path to the affected file or directory.
    pub path: PathBuf,

    /// When the event was received.
    pub timestamp: DateTime<Utc>,

    /// Attributes observed when the event was received.
    pub attributes: FileAttributes,
}

impl FileEvent {
    /// Create a new file event, capturing the path's current attributes.
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            kind,
            attributes: FileAttributes::from_path(&path),
            path,
            timestamp: Utc::now(),
        }
    }

    /// Split a notify event into one event per path.
    ///
    /// A two-path rename becomes a renamed-from event for the old path and a
    /// renamed-to event for the new one.
    pub fn from_notify(event: notify::Event) -> Vec<Self> {
        use notify::event::{ModifyKind, RenameMode};

        if let notify::EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind {
            if let [from, to] = event.paths.as_slice() {
                return vec![
                    Self::new(FileEventKind::RenamedFrom, from),
                    Self::new(FileEventKind::RenamedTo, to),
                ];
            }
        }

        let kind = FileEventKind::from(event.kind);
        event
            .paths
            .into_iter()
            .map(|path| Self::new(kind, path))
            .collect()
    }

    /// Check if this is a file event (not directory).
    pub fn is_file(&self) -> bool {
        self.attributes.is_file
    }

    /// Check if this is a directory event.
    pub fn is_directory(&self) -> bool {
        self.attributes.is_directory
    }

    /// Whether the path still existed when the event was received.
    pub fn exists(&self) -> bool {
        self.attributes.is_file || self.attributes.is_directory
    }
}

/// Kind of file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// File was created.
    Created,

    /// File was modified.
    Modified,

    /// File was deleted.
    Deleted,

    /// File was renamed (old path).
    RenamedFrom,

    /// File was renamed (new path).
    RenamedTo,

    /// File was renamed; direction unknown.
    Renamed,

    /// File metadata changed.
    MetadataChanged,

    /// Access time changed.
    Accessed,

    /// Unknown event type.
    Unknown,
}

impl FileEventKind {
    /// Whether the event can change the selection or its content.
    pub fn is_relevant(self) -> bool {
        !matches!(self, Self::MetadataChanged | Self::Accessed | Self::Unknown)
    }

    /// Whether the event adds or removes paths.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::Created | Self::Deleted | Self::RenamedFrom | Self::RenamedTo | Self::Renamed
        )
    }
}

impl From<notify::EventKind> for FileEventKind {
    fn from(kind: notify::EventKind) -> Self {
        match kind {
            notify::EventKind::Create(_) => Self::Created,
            notify::EventKind::Modify(modify_kind) => match modify_kind {
                notify::event::ModifyKind::Name(rename) => match rename {
                    notify::event::RenameMode::From => Self::RenamedFrom,
                    notify::event::RenameMode::To => Self::RenamedTo,
                    _ => Self::Renamed,
                },
                notify::event::ModifyKind::Metadata(_) => Self::MetadataChanged,
                _ => Self::Modified,
            },
            notify::EventKind::Remove(_) => Self::Deleted,
            notify::EventKind::Access(_) => Self::Accessed,
            _ => Self::Unknown,
        }
    }
}

/// Additional file attributes.
#[derive(Debug, Clone, Default)]
pub struct FileAttributes {
    /// Whether the path is a file.
    pub is_file: bool,

    /// Whether the path is a directory.
    pub is_directory: bool,

    /// File size in bytes (if known).
    pub size: Option<u64>,

    /// File extension (if any).
    pub extension: Option<String>,
}

impl FileAttributes {
    /// Create attributes from a path.
    pub fn from_path(path: &Path) -> Self {
        let metadata = path.metadata().ok();

        Self {
            is_file: metadata.as_ref().is_some_and(|m| m.is_file()),
            is_directory: metadata.as_ref().is_some_and(|m| m.is_dir()),
            size: metadata.as_ref().map(|m| m.len()),
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .map(String::from),
        }
    }
}

/// Whether `path` names an editor or OS artifact that never triggers work:
/// dotfiles, backups ending in `~`, swap files, vim's `4913` test file and
/// `#name#` auto-saves.
pub fn is_transient(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    name.starts_with('.')
        || name.ends_with('~')
        || name == "Thumbs.db"
        || name == "4913"
        || (name.len() > 1 && name.starts_with('#') && name.ends_with('#'))
        || [".swp", ".swo", ".swx"]
            .iter()
            .any(|suffix| name.ends_with(suffix))
}
