//! Poll coordinator.
//!
//! # Responsibilities
//! - Own the snapshot watchers, queried in registration order
//! - Track outstanding polls from registration until their outcome is taken
//! - Fan every watcher change signal out to the registered polls
//!
//! # Design Decisions
//! - One mutex guards the registry; the fan-out holds it for a whole pass,
//!   so new registrations wait for at most one pass
//! - `resolve()` never suspends, so no lock is held across an await point
//! - A poll is only resolved by changes published after it was registered

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::coordinator::registry::PollRegistry;
use crate::observability::metrics;
use crate::poll::{ChangeNotificationRequest, Poll, PollId, PollOutcome};
use crate::snapshot::{NamespaceConfig, SnapshotWatcher};

/// Namespace file suffix clients may or may not include.
pub const PROPERTIES_SUFFIX: &str = ".properties";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Could not load configurations with appId: {app_id}, clusterName: {cluster}, namespace: {namespace}")]
    NamespaceNotFound {
        app_id: String,
        cluster: String,
        namespace: String,
    },
}

/// Bridges snapshot watchers and outstanding long polls.
pub struct PollCoordinator {
    watchers: Vec<Arc<SnapshotWatcher>>,
    registry: Mutex<PollRegistry>,
    poll_timeout: Duration,
    /// Parent of every poll's cancellation token.
    shutdown: CancellationToken,
}

impl PollCoordinator {
    /// Polls created through [`PollCoordinator::long_poll`] resolve as
    /// "no change" once `shutdown` fires.
    pub fn new(watchers: Vec<Arc<SnapshotWatcher>>, poll_timeout: Duration, shutdown: CancellationToken) -> Self {
        Self {
            watchers,
            registry: Mutex::new(PollRegistry::default()),
            poll_timeout,
            shutdown,
        }
    }

    pub fn watchers(&self) -> &[Arc<SnapshotWatcher>] {
        &self.watchers
    }

    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Add a poll to the registry. The poll leaves the registry when the
    /// returned guard is deregistered or dropped.
    pub fn register_poll(self: &Arc<Self>, poll: Arc<Poll>) -> PollRegistration {
        let id = poll.id();
        {
            let mut registry = self.registry.lock();
            let generations = self.watchers.iter().map(|w| w.generation()).collect();
            registry.insert(poll, generations);
            metrics::set_outstanding_polls(registry.len());
        }
        tracing::debug!(poll = %id, "Poll registered");
        PollRegistration {
            coordinator: Arc::clone(self),
            id,
        }
    }

    fn deregister_poll(&self, id: PollId) {
        let mut registry = self.registry.lock();
        if registry.remove(id) {
            metrics::set_outstanding_polls(registry.len());
            tracing::debug!(poll = %id, "Poll deregistered");
        }
    }

    /// Number of polls currently registered.
    pub fn outstanding_polls(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn is_registered(&self, id: PollId) -> bool {
        self.registry.lock().contains(id)
    }

    /// Serve one long poll end to end: create, register, wait, deregister.
    ///
    /// Dropping the returned future counts as client cancellation: the poll
    /// resolves as "no change" and leaves the registry.
    pub async fn long_poll(self: &Arc<Self>, notifications: Vec<ChangeNotificationRequest>) -> PollOutcome {
        let cancel = self.shutdown.child_token();
        let _disconnect = cancel.clone().drop_guard();

        let poll = Poll::create(notifications, self.poll_timeout, cancel);
        let registration = self.register_poll(Arc::clone(&poll));
        let outcome = poll.wait().await;
        registration.deregister();
        outcome
    }

    /// Find a namespace across all watchers, first match wins.
    ///
    /// The name is tried without and with the `.properties` suffix, since
    /// clients reference namespaces both ways.
    pub fn resolve_namespace(
        &self,
        app_id: &str,
        cluster: &str,
        namespace: &str,
    ) -> Result<NamespaceConfig, CoordinatorError> {
        let base = namespace.strip_suffix(PROPERTIES_SUFFIX).unwrap_or(namespace);
        let suffixed = format!("{base}{PROPERTIES_SUFFIX}");

        for watcher in &self.watchers {
            let snapshot = watcher.current_snapshot();
            let found = snapshot
                .namespace(app_id, cluster, base)
                .or_else(|| snapshot.namespace(app_id, cluster, &suffixed));
            if let Some(ns) = found {
                return Ok(ns.clone());
            }
        }

        Err(CoordinatorError::NamespaceNotFound {
            app_id: app_id.to_string(),
            cluster: cluster.to_string(),
            namespace: namespace.to_string(),
        })
    }

    /// Resolve every poll registered before `generation` of watcher `index`.
    ///
    /// Returns how many polls this pass resolved.
    pub fn fan_out(&self, index: usize, generation: u64) -> usize {
        let registry = self.registry.lock();
        let mut resolved = 0;
        for entry in registry.iter() {
            if !entry.precedes(index, generation) {
                continue;
            }
            match entry.poll.resolve() {
                Ok(()) => resolved += 1,
                Err(e) => tracing::debug!(poll = %entry.poll.id(), error = %e, "Poll lost the resolution race"),
            }
        }
        tracing::info!(
            watcher = index,
            generation,
            resolved,
            outstanding = registry.len(),
            "Change notification fanned out"
        );
        resolved
    }

    /// Start one fan-out task per watcher. They stop when `shutdown` fires.
    pub fn spawn_fan_out(self: &Arc<Self>, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        self.watchers
            .iter()
            .enumerate()
            .map(|(index, watcher)| {
                let mut changes = watcher.subscribe();
                let coordinator = Arc::clone(self);
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            () = shutdown.cancelled() => break,
                            changed = changes.changed() => {
                                if changed.is_err() {
                                    break;
                                }
                                let generation = *changes.borrow_and_update();
                                coordinator.fan_out(index, generation);
                            }
                        }
                    }
                    tracing::debug!(watcher = index, "Fan-out task stopped");
                })
            })
            .collect()
    }

    /// Liveness check: acquire and release the registry lock.
    pub fn health_check(&self) {
        drop(self.registry.lock());
    }
}

/// Registry membership of one poll.
#[must_use = "dropping the registration removes the poll from the registry"]
pub struct PollRegistration {
    coordinator: Arc<PollCoordinator>,
    id: PollId,
}

impl PollRegistration {
    pub fn id(&self) -> PollId {
        self.id
    }

    /// Remove the poll from the registry.
    pub fn deregister(self) {}
}

impl Drop for PollRegistration {
    fn drop(&mut self) {
        self.coordinator.deregister_poll(self.id);
    }
}
