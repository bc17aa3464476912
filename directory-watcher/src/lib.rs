//! # Directory Watcher
//!
//! This crate keeps a live watch over a root directory and asks a
//! [`RegenerationSink`] to rebuild output once changes settle.
//!
//! ## Features
//!
//! - **Selective Watching**: One non-recursive watch per selected directory
//! - **Event Classification**: Transient, ignored and binary paths are dropped
//! - **Live Reload**: Configuration file changes rebuild the selection policy
//! - **Debouncing**: A burst of changes produces a single regeneration
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Directory Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  notify ──► FileEvent ──► EventCoordinator ──► Debouncer        │
//! │                                │                    │           │
//! │                                ▼                    ▼           │
//! │                  SelectionPolicy + WatchTree  RegenerationSink  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod event;
pub mod sink;
pub mod source;
pub mod watch_tree;

#[cfg(test)]
mod testing;

pub use coordinator::{
    DEFAULT_HEARTBEAT, DropReason, EventCoordinator, EventOutcome, MIN_HEARTBEAT, watch,
};
pub use debounce::Debouncer;
pub use error::{Result, WatcherError};
pub use event::{FileAttributes, FileEvent, FileEventKind, is_transient};
pub use sink::RegenerationSink;
pub use source::{ConfigSource, FileConfig, StaticConfig};
pub use watch_tree::{WatchBackend, WatchTree, WatchedPath};
