//! Shared test doubles.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sink_selection::{IgnoreRuleSet, RuleSources, SelectionConfig, SelectionPolicy};

use crate::sink::RegenerationSink;
use crate::watch_tree::WatchBackend;

/// Backend that records active watches and rejects double registration.
/// Clones share state.
#[derive(Clone, Default)]
pub(crate) struct RecordingBackend {
    active: Arc<Mutex<BTreeSet<PathBuf>>>,
    refused: Arc<Mutex<BTreeSet<PathBuf>>>,
}

impl RecordingBackend {
    pub(crate) fn active(&self) -> Vec<PathBuf> {
        self.active.lock().iter().cloned().collect()
    }

    /// Fail every later attempt to watch `path`.
    pub(crate) fn refuse(&self, path: impl Into<PathBuf>) {
        self.refused.lock().insert(path.into());
    }
}

impl WatchBackend for RecordingBackend {
    fn watch(&mut self, path: &Path) -> notify::Result<()> {
        if self.refused.lock().contains(path) {
            return Err(notify::Error::generic("inotify watch limit reached"));
        }
        if self.active.lock().insert(path.to_path_buf()) {
            Ok(())
        } else {
            Err(notify::Error::generic("path registered twice"))
        }
    }

    fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        if self.active.lock().remove(path) {
            Ok(())
        } else {
            Err(notify::Error::watch_not_found())
        }
    }
}

/// Sink that counts regeneration requests.
#[derive(Default)]
pub(crate) struct CountingSink {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingSink {
    pub(crate) fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegenerationSink for CountingSink {
    async fn regenerate(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("renderer unavailable");
        }
        Ok(())
    }
}

/// Policy that reads only the root's own ignore file.
pub(crate) fn local_policy(root: &Path, config: SelectionConfig) -> SelectionPolicy {
    let rules = IgnoreRuleSet::load_from(root, &RuleSources::local_only(root)).unwrap();
    SelectionPolicy::with_rules(root, config, rules)
}

pub(crate) fn mkdirs(root: &Path, relative: &[&str]) {
    for dir in relative {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
}
