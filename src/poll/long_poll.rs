//! Long-poll requests with at-most-once resolution.
//!
//! # Race
//! ```text
//! create() spawns one task racing:
//!     cancellation token fired   → NoChange(Cancelled)
//!     timeout elapsed            → NoChange(TimedOut)
//!     resolve() called           → Changed(echo of the request)
//! ```
//!
//! The winner is decided under the poll's mutex: once `resolve()` has set
//! `resolved`, the outcome is `Changed` even if the timeout or the
//! cancellation woke the task first. After the decision the poll is closed
//! and every further `resolve()` fails.
//!
//! The outcome is published on a completion channel that does not depend
//! on the caller's cancellation token, so it is always delivered exactly once.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::poll::notification::ChangeNotificationRequest;

/// Timeout applied when a poll is created with a zero timeout.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);

static NEXT_POLL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique poll identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PollId(u64);

impl PollId {
    fn next() -> Self {
        Self(NEXT_POLL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "poll-{}", self.0)
    }
}

/// Errors returned by [`Poll::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("poll is closed")]
    Closed,

    #[error("poll has already been updated")]
    AlreadyResolved,
}

/// Why a poll finished without reporting a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoChangeReason {
    TimedOut,
    Cancelled,
}

/// Final result of a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A change was signalled; carries the original request entries.
    Changed(Vec<ChangeNotificationRequest>),
    NoChange(NoChangeReason),
}

impl PollOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Changed(_) => "changed",
            Self::NoChange(NoChangeReason::TimedOut) => "timed_out",
            Self::NoChange(NoChangeReason::Cancelled) => "cancelled",
        }
    }
}

#[derive(Debug, Default)]
struct PollState {
    resolved: bool,
    closed: bool,
}

/// One outstanding wait-for-change request.
pub struct Poll {
    id: PollId,
    notifications: Vec<ChangeNotificationRequest>,
    state: Mutex<PollState>,
    wake: Notify,
    completion: watch::Sender<Option<PollOutcome>>,
}

impl Poll {
    /// Create a poll and start its race. Must be called within a tokio runtime.
    pub fn create(
        notifications: Vec<ChangeNotificationRequest>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        let timeout = if timeout.is_zero() { DEFAULT_POLL_TIMEOUT } else { timeout };
        let (completion, _) = watch::channel(None);
        let poll = Arc::new(Self {
            id: PollId::next(),
            notifications,
            state: Mutex::new(PollState::default()),
            wake: Notify::new(),
            completion,
        });

        tracing::debug!(poll = %poll.id, timeout_ms = timeout.as_millis() as u64, "Poll created");
        tokio::spawn(Arc::clone(&poll).race(timeout, cancel));
        poll
    }

    pub fn id(&self) -> PollId {
        self.id
    }

    pub fn notifications(&self) -> &[ChangeNotificationRequest] {
        &self.notifications
    }

    /// True once the race has been decided.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    async fn race(self: Arc<Self>, timeout: Duration, cancel: CancellationToken) {
        let reason = tokio::select! {
            () = cancel.cancelled() => Some(NoChangeReason::Cancelled),
            () = tokio::time::sleep(timeout) => Some(NoChangeReason::TimedOut),
            () = self.wake.notified() => None,
        };

        let outcome = {
            let mut state = self.state.lock();
            state.closed = true;
            match reason {
                Some(reason) if !state.resolved => PollOutcome::NoChange(reason),
                _ => PollOutcome::Changed(self.notifications.clone()),
            }
        };

        match &outcome {
            PollOutcome::Changed(_) => tracing::info!(poll = %self.id, "Poll received a change notification"),
            PollOutcome::NoChange(NoChangeReason::TimedOut) => {
                tracing::debug!(poll = %self.id, "Poll timed out with no updates");
            }
            PollOutcome::NoChange(NoChangeReason::Cancelled) => {
                tracing::debug!(poll = %self.id, "Poll was cancelled, stopped watching for a change");
            }
        }
        metrics::record_poll_outcome(outcome.label());
        self.completion.send_replace(Some(outcome));
    }

    /// Signal a change. Only the first call on an open poll succeeds.
    pub fn resolve(&self) -> Result<(), PollError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(PollError::Closed);
        }
        if state.resolved {
            return Err(PollError::AlreadyResolved);
        }
        state.resolved = true;
        self.wake.notify_one();
        Ok(())
    }

    /// Wait until the race is decided and the outcome is published.
    pub async fn wait(&self) -> PollOutcome {
        let mut completion = self.completion.subscribe();
        // The `Ref` must not outlive `completion`, so clone it out right away.
        let published = completion.wait_for(Option::is_some).await.map(|outcome| outcome.clone());
        match published {
            Ok(Some(outcome)) => outcome,
            // The sender lives in `self`, so the channel cannot close while we wait.
            Ok(None) | Err(_) => PollOutcome::NoChange(NoChangeReason::Cancelled),
        }
    }
}

impl fmt::Debug for Poll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poll")
            .field("id", &self.id)
            .field("notifications", &self.notifications)
            .field("state", &*self.state.lock())
            .finish()
    }
}
