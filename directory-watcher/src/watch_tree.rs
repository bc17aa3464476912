//! The live set of watched paths.
//!
//! Every selected directory under the root gets its own non-recursive watch,
//! so ignored and excluded subtrees never cost a watch descriptor. The set is
//! kept in step with the tree as directories appear and disappear.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use sink_selection::SelectionPolicy;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Result, WatcherError};

/// Registers and drops OS-level watches on single paths.
pub trait WatchBackend: Send {
    /// Start watching `path` (not its descendants).
    fn watch(&mut self, path: &Path) -> notify::Result<()>;

    /// Stop watching `path`.
    fn unwatch(&mut self, path: &Path) -> notify::Result<()>;
}

impl WatchBackend for RecommendedWatcher {
    fn watch(&mut self, path: &Path) -> notify::Result<()> {
        Watcher::watch(self, path, RecursiveMode::NonRecursive)
    }

    fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        Watcher::unwatch(self, path)
    }
}

/// A path registered for change notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedPath {
    /// Absolute path.
    pub path: PathBuf,

    /// Whether the path is a directory.
    pub is_directory: bool,
}

/// Watched paths for one root, guarded by a single lock.
pub struct WatchTree<B> {
    root: PathBuf,
    state: Mutex<WatchState<B>>,
}

struct WatchState<B> {
    backend: B,
    watched: BTreeMap<PathBuf, WatchedPath>,
}

impl<B: WatchBackend> WatchTree<B> {
    /// Create an empty tree for `root`.
    pub fn new(root: impl Into<PathBuf>, backend: B) -> Self {
        Self {
            root: root.into(),
            state: Mutex::new(WatchState {
                backend,
                watched: BTreeMap::new(),
            }),
        }
    }

    /// The watch root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drop every watch, then watch the root and every directory the policy
    /// selects beneath it. Returns the number of watched directories.
    pub fn reconcile(&self, policy: &SelectionPolicy) -> Result<usize> {
        let mut state = self.state.lock();
        state.clear();
        let added = state.add_tree(&self.root, policy)?;

        info!("Watching {added} directories under {}", self.root.display());
        Ok(added)
    }

    /// Watch a newly created directory and its selected descendants.
    pub fn on_directory_created(&self, path: &Path, policy: &SelectionPolicy) -> Result<usize> {
        let Some(relative) = policy.relative(path) else {
            return Ok(0);
        };
        if !policy.should_descend(relative) {
            debug!("Not watching {}: {}", path.display(), policy.directory_verdict(relative));
            return Ok(0);
        }

        self.state.lock().add_tree(path, policy)
    }

    /// Drop the watch on `path` and, for a directory, on everything beneath
    /// it. Returns the number of entries removed.
    pub fn on_path_removed(&self, path: &Path) -> usize {
        self.state.lock().remove_tree(path)
    }

    /// Handle a path renamed away. A watched directory triggers a full
    /// reconcile so a moved subtree is never left unwatched.
    pub fn on_rename(&self, path: &Path, policy: &SelectionPolicy) -> Result<usize> {
        if self.is_watched_dir(path) {
            debug!("Watched directory {} renamed, reconciling", path.display());
            return self.reconcile(policy);
        }
        Ok(self.on_path_removed(path))
    }

    /// Watch a single file, such as the configuration file.
    pub fn watch_file(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock();
        if state.watched.contains_key(path) {
            return Ok(());
        }

        state
            .backend
            .watch(path)
            .map_err(|source| WatcherError::Setup {
                path: path.to_path_buf(),
                source,
            })?;
        state.watched.insert(
            path.to_path_buf(),
            WatchedPath {
                path: path.to_path_buf(),
                is_directory: false,
            },
        );
        debug!("Watching file {}", path.display());
        Ok(())
    }

    /// Drop every watch.
    pub fn clear(&self) {
        self.state.lock().clear();
    }

    /// Whether `path` is watched.
    pub fn contains(&self, path: &Path) -> bool {
        self.state.lock().watched.contains_key(path)
    }

    /// Whether `path` is watched as a directory.
    pub fn is_watched_dir(&self, path: &Path) -> bool {
        self.state
            .lock()
            .watched
            .get(path)
            .is_some_and(|entry| entry.is_directory)
    }

    /// Number of watched paths.
    pub fn len(&self) -> usize {
        self.state.lock().watched.len()
    }

    /// Whether nothing is watched.
    pub fn is_empty(&self) -> bool {
        self.state.lock().watched.is_empty()
    }

    /// Snapshot of watched paths in sorted order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.state.lock().watched.keys().cloned().collect()
    }

    /// Snapshot of watched directories in sorted order.
    pub fn directories(&self) -> Vec<PathBuf> {
        self.state
            .lock()
            .watched
            .values()
            .filter(|entry| entry.is_directory)
            .map(|entry| entry.path.clone())
            .collect()
    }
}

impl<B: WatchBackend> WatchState<B> {
    fn add_tree(&mut self, start: &Path, policy: &SelectionPolicy) -> Result<usize> {
        let mut added = 0;

        let walker = WalkDir::new(start)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.file_type().is_dir()
                    && policy
                        .relative(entry.path())
                        .is_some_and(|relative| policy.should_descend(relative))
            });

        for entry in walker {
            let entry = entry.map_err(|err| WatcherError::Io(err.into()))?;
            let path = entry.path();
            if self.watched.contains_key(path) {
                continue;
            }

            self.backend
                .watch(path)
                .map_err(|source| WatcherError::Setup {
                    path: path.to_path_buf(),
                    source,
                })?;
            self.watched.insert(
                path.to_path_buf(),
                WatchedPath {
                    path: path.to_path_buf(),
                    is_directory: true,
                },
            );
            debug!("Watching {}", path.display());
            added += 1;
        }

        Ok(added)
    }

    fn remove_tree(&mut self, path: &Path) -> usize {
        let Some(entry) = self.watched.remove(path) else {
            return 0;
        };
        self.unwatch(path);
        let mut removed = 1;

        if entry.is_directory {
            // Descendants sort directly after their parent.
            let descendants: Vec<PathBuf> = self
                .watched
                .range(path.to_path_buf()..)
                .take_while(|(candidate, _)| candidate.starts_with(path))
                .map(|(candidate, _)| candidate.clone())
                .collect();

            for descendant in descendants {
                self.watched.remove(&descendant);
                self.unwatch(&descendant);
                removed += 1;
            }
        }

        debug!("Stopped watching {removed} paths under {}", path.display());
        removed
    }

    fn clear(&mut self) {
        let paths: Vec<PathBuf> = self.watched.keys().cloned().collect();
        for path in &paths {
            self.unwatch(path);
        }
        self.watched.clear();
    }

    fn unwatch(&mut self, path: &Path) {
        // The OS drops watches on deleted paths by itself.
        if let Err(err) = self.backend.unwatch(path) {
            debug!("Failed to unwatch {}: {err}", path.display());
        }
    }
}
