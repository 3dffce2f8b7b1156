//! Shutdown coordination for the service.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Every long-running task holds a token derived from this one: the
/// servers drain, the watcher and fan-out loops stop, and outstanding polls
/// resolve as "no change".
#[derive(Debug, Clone)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token cancelled together with this coordinator.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Token cancelled with this coordinator, or on its own.
    pub fn child(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("Shutdown triggered");
        }
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until shutdown has been triggered.
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_cancels_children() {
        let shutdown = Shutdown::new();
        let child = shutdown.child();
        let token = shutdown.token();
        assert!(!shutdown.is_triggered());

        shutdown.trigger();
        shutdown.triggered().await;
        assert!(child.is_cancelled());
        assert!(token.is_cancelled());

        // Idempotent.
        shutdown.trigger();
        assert!(shutdown.is_triggered());
    }

    #[test]
    fn test_child_does_not_cancel_parent() {
        let shutdown = Shutdown::new();
        shutdown.child().cancel();
        assert!(!shutdown.is_triggered());
    }
}
