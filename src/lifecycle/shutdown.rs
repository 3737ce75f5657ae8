//! Shutdown coordination for the gateway.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, OnceCell};

use crate::lifecycle::state::Lifecycle;
use crate::persistence::Persistence;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
/// Only the first trigger moves the lifecycle into Draining and broadcasts;
/// later triggers are no-ops.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
    lifecycle: Arc<Lifecycle>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new(lifecycle: Arc<Lifecycle>) -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx, lifecycle }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Returns `true` if this call started the drain.
    pub fn trigger(&self) -> bool {
        if !self.lifecycle.begin_drain() {
            return false;
        }
        let _ = self.tx.send(());
        true
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Outcome of releasing the persistence dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    Failed,
    TimedOut,
}

/// Releases the persistence dependency exactly once, bounded by a grace period.
pub struct ResourceRelease {
    persistence: Arc<dyn Persistence>,
    grace: Duration,
    outcome: OnceCell<ReleaseOutcome>,
}

impl ResourceRelease {
    pub fn new(persistence: Arc<dyn Persistence>, grace: Duration) -> Self {
        Self {
            persistence,
            grace,
            outcome: OnceCell::new(),
        }
    }

    /// Close the dependency. Concurrent and repeated callers share the first outcome.
    pub async fn release(&self) -> ReleaseOutcome {
        *self
            .outcome
            .get_or_init(|| async {
                match tokio::time::timeout(self.grace, self.persistence.close()).await {
                    Ok(Ok(())) => {
                        tracing::info!("Persistence released");
                        ReleaseOutcome::Released
                    }
                    Ok(Err(e)) => {
                        tracing::error!(error = %e, "Failed to release persistence; exiting anyway");
                        ReleaseOutcome::Failed
                    }
                    Err(_) => {
                        tracing::error!(
                            grace_secs = self.grace.as_secs(),
                            "Persistence release exceeded grace period; exiting anyway"
                        );
                        ReleaseOutcome::TimedOut
                    }
                }
            })
            .await
    }

    pub fn outcome(&self) -> Option<ReleaseOutcome> {
        self.outcome.get().copied()
    }
}
