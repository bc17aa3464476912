//! Watch session: classify notifications, keep the watch tree current and
//! debounce regeneration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use parking_lot::RwLock;
use sink_selection::{SelectionPolicy, Verdict};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::debounce::Debouncer;
use crate::error::{Result, WatcherError};
use crate::event::{FileEvent, FileEventKind, is_transient};
use crate::sink::RegenerationSink;
use crate::source::ConfigSource;
use crate::watch_tree::{WatchBackend, WatchTree};

/// Interval between liveness log lines.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(5 * 60);

/// Shortest accepted heartbeat interval.
pub const MIN_HEARTBEAT: Duration = Duration::from_secs(1);

/// Why an event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Editor or OS artifact.
    Transient,
    /// Access, metadata-only or unknown event.
    Irrelevant,
    /// Path outside the watch root.
    OutsideRoot,
    /// Rejected by the selection policy.
    Rejected(Verdict),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => f.write_str("transient"),
            Self::Irrelevant => f.write_str("irrelevant"),
            Self::OutsideRoot => f.write_str("outside root"),
            Self::Rejected(verdict) => write!(f, "{verdict}"),
        }
    }
}

/// Result of classifying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Dropped without side effects.
    Dropped(DropReason),
    /// The configuration file changed; a reload was attempted.
    ConfigReloaded,
    /// A path appeared or disappeared.
    Structural,
    /// A selected file's content changed.
    Modified,
}

impl EventOutcome {
    /// Whether the outcome schedules a regeneration.
    pub fn triggers(self) -> bool {
        !matches!(self, Self::Dropped(_))
    }
}

/// Drives one watch session over a root directory.
pub struct EventCoordinator<B = RecommendedWatcher> {
    root: PathBuf,
    config_source: Arc<dyn ConfigSource>,
    config_path: Option<PathBuf>,
    policy: RwLock<Arc<SelectionPolicy>>,
    tree: WatchTree<B>,
    debouncer: Debouncer,
    heartbeat: Duration,
}

impl<B: WatchBackend> EventCoordinator<B> {
    /// Load configuration, build the selection policy and watch every
    /// selected directory under `root`.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(
        root: impl AsRef<Path>,
        backend: B,
        config_source: Arc<dyn ConfigSource>,
        sink: Arc<dyn RegenerationSink>,
    ) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(WatcherError::DirectoryNotFound(root.display().to_string()));
        }
        let root = root.canonicalize()?;

        let config = config_source.load()?;
        let policy = Arc::new(SelectionPolicy::load(&root, config)?);
        let config_path = config_source.path().map(resolve_config_path);

        let debouncer = Debouncer::new(policy.config().debounce(), move || {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                if let Err(err) = sink.regenerate().await {
                    error!("Regeneration failed: {err:#}");
                }
            });
        });

        let tree = WatchTree::new(&root, backend);
        tree.reconcile(&policy)?;

        let coordinator = Self {
            root,
            config_source,
            config_path,
            policy: RwLock::new(policy),
            tree,
            debouncer,
            heartbeat: DEFAULT_HEARTBEAT,
        };
        coordinator.watch_config_file()?;

        info!("Watch session started for {}", coordinator.root.display());
        Ok(coordinator)
    }

    /// Set the liveness log interval, no shorter than [`MIN_HEARTBEAT`].
    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat.max(MIN_HEARTBEAT);
        self
    }

    /// The canonical watch root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The policy currently in effect.
    pub fn policy(&self) -> Arc<SelectionPolicy> {
        self.policy.read().clone()
    }

    /// Watched paths.
    pub fn tree(&self) -> &WatchTree<B> {
        &self.tree
    }

    /// Whether a regeneration is scheduled.
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Classify one event, apply its structural effect and arm the debounce
    /// timer unless it was dropped.
    pub fn handle_event(&self, event: &FileEvent) -> EventOutcome {
        let outcome = self.classify(event);
        match outcome {
            EventOutcome::Dropped(reason) => {
                trace!("Dropped {:?} {}: {reason}", event.kind, event.path.display());
            }
            _ => {
                debug!("{outcome:?} {:?} {}", event.kind, event.path.display());
                self.debouncer.arm();
            }
        }
        outcome
    }

    fn classify(&self, event: &FileEvent) -> EventOutcome {
        let path = event.path.as_path();
        if is_transient(path) {
            return EventOutcome::Dropped(DropReason::Transient);
        }

        if self.is_config_path(path)
            && matches!(
                event.kind,
                FileEventKind::Created | FileEventKind::Modified | FileEventKind::RenamedTo
            )
        {
            if let Err(err) = self.reload() {
                error!("Configuration reload failed, keeping previous settings: {err}");
            }
            return EventOutcome::ConfigReloaded;
        }

        if !event.kind.is_relevant() {
            return EventOutcome::Dropped(DropReason::Irrelevant);
        }

        let policy = self.policy();
        let Some(relative) = policy.relative(path) else {
            return EventOutcome::Dropped(DropReason::OutsideRoot);
        };

        let is_directory = event.is_directory()
            || (matches!(
                event.kind,
                FileEventKind::Deleted | FileEventKind::RenamedFrom | FileEventKind::Renamed
            ) && self.tree.is_watched_dir(path));

        if is_directory && event.kind == FileEventKind::Modified {
            return EventOutcome::Dropped(DropReason::Irrelevant);
        }

        let verdict = if is_directory {
            policy.directory_verdict(relative)
        } else {
            // A path that vanished before the sniff is not binary.
            policy
                .file_verdict(relative, path)
                .unwrap_or_else(|_| policy.path_verdict(relative))
        };
        if !verdict.is_accepted() {
            return EventOutcome::Dropped(DropReason::Rejected(verdict));
        }

        if !event.kind.is_structural() {
            return EventOutcome::Modified;
        }

        let updated = match event.kind {
            FileEventKind::Created | FileEventKind::RenamedTo if is_directory => {
                self.tree.on_directory_created(path, &policy)
            }
            FileEventKind::Deleted => Ok(self.tree.on_path_removed(path)),
            FileEventKind::RenamedFrom => self.tree.on_rename(path, &policy),
            FileEventKind::Renamed if event.exists() => {
                if is_directory {
                    self.tree.on_directory_created(path, &policy)
                } else {
                    Ok(0)
                }
            }
            FileEventKind::Renamed => self.tree.on_rename(path, &policy),
            _ => Ok(0),
        };
        if let Err(err) = updated {
            warn!("Failed to update watches for {}: {err}", path.display());
        }

        EventOutcome::Structural
    }

    fn is_config_path(&self, path: &Path) -> bool {
        self.config_path.as_deref() == Some(path)
    }

    /// Rebuild the policy from a fresh configuration and re-walk the tree.
    ///
    /// The new policy is swapped in only once the tree has been rebuilt with
    /// it. On failure the previous policy stays in effect and the tree is
    /// rebuilt with that one.
    fn reload(&self) -> Result<()> {
        let config = self.config_source.load()?;
        let policy = Arc::new(SelectionPolicy::load(&self.root, config)?);

        if let Err(err) = self.tree.reconcile(&policy) {
            if let Err(restore_err) = self.tree.reconcile(&self.policy()) {
                error!("Failed to restore previous watches: {restore_err}");
            }
            self.rewatch_config_file();
            return Err(err);
        }

        self.debouncer.set_timeout(policy.config().debounce());
        *self.policy.write() = policy;
        self.rewatch_config_file();

        info!("Configuration reloaded");
        Ok(())
    }

    fn rewatch_config_file(&self) {
        if let Err(err) = self.watch_config_file() {
            warn!("Failed to watch configuration file: {err}");
        }
    }

    /// Watch the configuration file directly when no watched directory
    /// already covers it.
    fn watch_config_file(&self) -> Result<()> {
        let Some(path) = self.config_path.as_deref() else {
            return Ok(());
        };
        if !path.is_file() {
            return Ok(());
        }
        if path
            .parent()
            .is_some_and(|parent| self.tree.is_watched_dir(parent))
        {
            return Ok(());
        }
        self.tree.watch_file(path)
    }

    /// Run the session until `cancel` fires or a notification channel closes.
    ///
    /// Individual notification errors are logged; a closed channel ends the
    /// session with [`WatcherError::ChannelClosed`]. Regenerations already
    /// running are not awaited.
    pub async fn run(
        self,
        mut events: mpsc::UnboundedReceiver<notify::Event>,
        mut errors: mpsc::UnboundedReceiver<notify::Error>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let mut heartbeat =
            tokio::time::interval_at(tokio::time::Instant::now() + self.heartbeat, self.heartbeat);

        let result = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Watch session cancelled");
                    break Ok(());
                }
                _ = heartbeat.tick() => {
                    info!(
                        "Still watching {} ({} paths)",
                        self.root.display(),
                        self.tree.len()
                    );
                }
                event = events.recv() => match event {
                    Some(event) => {
                        for file_event in FileEvent::from_notify(event) {
                            self.handle_event(&file_event);
                        }
                    }
                    None => break Err(WatcherError::ChannelClosed("event")),
                },
                err = errors.recv() => match err {
                    Some(err) => warn!("Watch error: {err}"),
                    None => break Err(WatcherError::ChannelClosed("error")),
                },
            }
        };

        self.shutdown();
        result
    }

    fn shutdown(&self) {
        self.debouncer.cancel();
        self.tree.clear();
        info!("Watch session stopped for {}", self.root.display());
    }
}

/// Resolve the configuration path to the form notifications report, even
/// when the file does not exist yet.
fn resolve_config_path(path: PathBuf) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }

    let name = path.file_name().map(ToOwned::to_owned);
    let parent = path
        .parent()
        .map(|parent| {
            if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            }
        })
        .and_then(|parent| parent.canonicalize().ok());

    match (parent, name) {
        (Some(parent), Some(name)) => parent.join(name),
        _ => path,
    }
}

/// Watch `root` with the platform's native backend until `cancel` fires.
pub async fn watch(
    root: impl AsRef<Path>,
    config_source: Arc<dyn ConfigSource>,
    sink: Arc<dyn RegenerationSink>,
    cancel: CancellationToken,
) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (error_tx, error_rx) = mpsc::unbounded_channel();

    let watcher = notify::recommended_watcher(
        move |res: std::result::Result<notify::Event, notify::Error>| {
            let delivered = match res {
                Ok(event) => event_tx.send(event).is_ok(),
                Err(err) => error_tx.send(err).is_ok(),
            };
            if !delivered {
                trace!("Watch session gone, dropping notification");
            }
        },
    )?;

    let coordinator = EventCoordinator::start(root, watcher, config_source, sink)?;
    coordinator.run(event_rx, error_rx, cancel).await
}
