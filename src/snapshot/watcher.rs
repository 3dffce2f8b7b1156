//! Snapshot watcher for hot reload.
//!
//! Owns one snapshot file. The latest validated snapshot lives behind an
//! `ArcSwap`, so readers never block on the reload loop and never see a
//! partially-built snapshot. Every successful publish bumps a generation
//! counter which doubles as the change signal.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::snapshot::loader::{load_snapshot, SnapshotError};
use crate::snapshot::model::ConfigSnapshot;
use crate::snapshot::validation::ValidationOptions;

/// Lower bound on the file polling interval.
pub const MIN_WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Watcher settings.
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// File polling interval, clamped to [`MIN_WATCH_INTERVAL`].
    pub interval: Duration,
    pub validation: ValidationOptions,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: MIN_WATCH_INTERVAL,
            validation: ValidationOptions::default(),
        }
    }
}

#[derive(Debug)]
enum WatchEvent {
    /// The file watcher observed a change on disk.
    Changed,
    /// Reload requested without a file event.
    Triggered,
    Failed(String),
}

struct Published {
    generation: u64,
    snapshot: Arc<ConfigSnapshot>,
}

/// Keeps one authoritative snapshot in sync with a file.
pub struct SnapshotWatcher {
    path: PathBuf,
    options: WatchOptions,
    current: ArcSwap<Published>,
    changes: watch::Sender<u64>,
    events: mpsc::UnboundedSender<WatchEvent>,
    /// Taken by [`SnapshotWatcher::spawn`]; `None` once the loop runs.
    pending: Mutex<Option<mpsc::UnboundedReceiver<WatchEvent>>>,
    /// Held from read to publish so a slower reload never overwrites a newer one.
    reload_lock: Mutex<()>,
}

impl SnapshotWatcher {
    /// Load the file synchronously and publish it as generation 0.
    ///
    /// Fails if the file cannot be read or does not validate; nothing is
    /// published in that case.
    pub fn initialize(path: impl Into<PathBuf>, options: WatchOptions) -> Result<Self, SnapshotError> {
        let path = path.into();
        let options = WatchOptions {
            interval: options.interval.max(MIN_WATCH_INTERVAL),
            ..options
        };

        let snapshot = load_snapshot(&path, options.validation)?;
        tracing::info!(
            path = %path.display(),
            namespaces = snapshot.namespace_count(),
            "Snapshot loaded"
        );

        let (changes, _) = watch::channel(0);
        let (events, pending) = mpsc::unbounded_channel();
        Ok(Self {
            path,
            options,
            current: ArcSwap::from_pointee(Published {
                generation: 0,
                snapshot: Arc::new(snapshot),
            }),
            changes,
            events,
            pending: Mutex::new(Some(pending)),
            reload_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Latest published snapshot. Lock-free.
    pub fn current_snapshot(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.current.load().snapshot)
    }

    /// Generation of the latest published snapshot.
    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }

    /// Subscribe to change signals. The value is the published generation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Re-read the file now and publish it if it validates.
    ///
    /// On error the current snapshot stays in place and no change is signalled.
    /// Blocks on file IO; async callers use [`SnapshotWatcher::reload_async`].
    pub fn reload(&self) -> Result<u64, SnapshotError> {
        let _serialized = self.reload_lock.lock();
        match load_snapshot(&self.path, self.options.validation) {
            Ok(snapshot) => {
                metrics::record_snapshot_reload(true);
                Ok(self.publish(snapshot))
            }
            Err(e) => {
                metrics::record_snapshot_reload(false);
                Err(e)
            }
        }
    }

    /// [`SnapshotWatcher::reload`] on the blocking pool.
    pub async fn reload_async(self: &Arc<Self>) -> Result<u64, SnapshotError> {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.reload())
            .await
            .map_err(|e| SnapshotError::Watch {
                path: self.path.clone(),
                reason: e.to_string(),
            })?
    }

    /// Ask the background loop to reload as if the file had changed.
    pub fn trigger_reload(&self) {
        let _ = self.events.send(WatchEvent::Triggered);
    }

    fn publish(&self, snapshot: ConfigSnapshot) -> u64 {
        let snapshot = Arc::new(snapshot);
        let previous = self.current.rcu(|current| Published {
            generation: current.generation + 1,
            snapshot: Arc::clone(&snapshot),
        });
        let generation = previous.generation + 1;

        // The signal only moves forward.
        self.changes.send_if_modified(|latest| {
            if generation > *latest {
                *latest = generation;
                true
            } else {
                false
            }
        });
        generation
    }

    /// Start the background reload loop. It runs until `shutdown` fires.
    pub fn spawn(self: &Arc<Self>, shutdown: CancellationToken) -> Result<JoinHandle<()>, SnapshotError> {
        let Some(mut events) = self.pending.lock().take() else {
            return Err(SnapshotError::Watch {
                path: self.path.clone(),
                reason: "watcher is already running".to_string(),
            });
        };
        let fs_watcher = self.watch_file()?;

        tracing::info!(
            path = %self.path.display(),
            interval_ms = self.options.interval.as_millis() as u64,
            "Snapshot watcher started"
        );

        let this = Arc::clone(self);
        Ok(tokio::spawn(async move {
            // Dropping the OS watcher at the end of the loop releases the file.
            let _fs_watcher = fs_watcher;
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => {
                        tracing::debug!(path = %this.path.display(), "Shutdown requested, stopping snapshot watcher");
                        break;
                    }
                    event = events.recv() => match event {
                        Some(event) => this.handle_event(event).await,
                        None => break,
                    },
                }
            }
            tracing::info!(path = %this.path.display(), "Snapshot watcher stopped");
        }))
    }

    fn watch_file(&self) -> Result<PollWatcher, SnapshotError> {
        let tx = self.events.clone();
        let config = Config::default()
            .with_poll_interval(self.options.interval)
            .with_compare_contents(true);

        let mut watcher = PollWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) if event.kind.is_access() => return,
                    Ok(_) => WatchEvent::Changed,
                    Err(e) => WatchEvent::Failed(e.to_string()),
                };
                let _ = tx.send(event);
            },
            config,
        )
        .map_err(|e| SnapshotError::Watch {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        watcher
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(|e| SnapshotError::Watch {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(watcher)
    }

    async fn handle_event(self: &Arc<Self>, event: WatchEvent) {
        match event {
            WatchEvent::Failed(reason) => {
                tracing::error!(path = %self.path.display(), error = %reason, "Watch error");
            }
            WatchEvent::Changed | WatchEvent::Triggered => {
                tracing::debug!(path = %self.path.display(), ?event, "Snapshot source event");
                match self.reload_async().await {
                    Ok(generation) => {
                        tracing::info!(path = %self.path.display(), generation, "Watcher loaded new snapshot");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to reload snapshot. Keeping current snapshot.");
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for SnapshotWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotWatcher")
            .field("path", &self.path)
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}
