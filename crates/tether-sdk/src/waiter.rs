//! Bounded waits for a connection to become stable.
//!
//! A wait races "next stable snapshot for this id" against a timer. The
//! subscription and the timer both live inside the wait future, so
//! resolving, timing out, or dropping the wait releases them.

use crate::error::{Result, TetherError};
use crate::registry::ConnectionRegistry;
use crate::settled::{SettleGuard, SettledOutcome, SettledSignal};
use crate::sink::{StabilizationResult, UsageEvent, UsageRecorder};
use std::sync::Arc;
use std::time::Duration;
use tether_core::{is_stable, ConnectionId, ConnectionKind, ConnectionSnapshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Coordinates waits for stability.
#[derive(Clone)]
pub struct StabilizationWaiter {
    registry: Arc<ConnectionRegistry>,
    settled: SettledSignal,
    usage: Arc<dyn UsageRecorder>,
    default_timeout: Duration,
}

impl StabilizationWaiter {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        settled: SettledSignal,
        usage: Arc<dyn UsageRecorder>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            settled,
            usage,
            default_timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Wait with the default timeout.
    pub async fn wait_for_stable(&self, id: &ConnectionId) -> Option<Arc<ConnectionSnapshot>> {
        self.wait_for_stable_within(id, self.default_timeout).await
    }

    /// Wait until the connection's latest snapshot is stable, or `timeout`
    /// elapses. Returns the stable snapshot, or `None` on timeout.
    ///
    /// Fires the settled signal exactly once, including when the future is
    /// dropped mid-wait.
    pub async fn wait_for_stable_within(
        &self,
        id: &ConnectionId,
        timeout: Duration,
    ) -> Option<Arc<ConnectionSnapshot>> {
        let guard = SettleGuard::new(self.settled.clone(), id.clone());
        self.wait_guarded(id, timeout, guard).await
    }

    /// Run a wait on its own task.
    pub fn spawn_wait(&self, id: ConnectionId, timeout: Duration) -> WaitHandle {
        // Taken before spawning so an abort that lands before the task is
        // first polled still fires the signal.
        let guard = SettleGuard::new(self.settled.clone(), id.clone());
        let waiter = self.clone();
        let task = tokio::spawn(async move { waiter.wait_guarded(&id, timeout, guard).await });
        WaitHandle { task: Some(task) }
    }

    async fn wait_guarded(
        &self,
        id: &ConnectionId,
        timeout: Duration,
        guard: SettleGuard,
    ) -> Option<Arc<ConnectionSnapshot>> {
        if let Some(snapshot) = self.registry.latest_for(id).filter(|s| is_stable(s)) {
            trace!(id = %id, "connection already stable");
            self.record_usage(id, Some(&snapshot), StabilizationResult::Stable);
            guard.settle(SettledOutcome::Resolved);
            return Some(snapshot);
        }

        let mut subscription = self.registry.subscribe(id);
        let next_stable = async {
            // covers an ingest landing between the cache check and subscribe
            if let Some(snapshot) = subscription.current().filter(|s| is_stable(s)) {
                return snapshot;
            }
            loop {
                match subscription.next().await {
                    Some(snapshot) if is_stable(&snapshot) => return snapshot,
                    Some(snapshot) => trace!(
                        id = %id,
                        kafka = %snapshot.data_cluster.status,
                        schema_registry = %snapshot.schema_catalog.status,
                        ccloud = %snapshot.cloud_auth.status,
                        "connection not stable yet"
                    ),
                    None => {
                        // Entry purged under us; nothing will ever arrive on
                        // this subscription, so let the timer decide.
                        debug!(id = %id, "connection entry purged during wait");
                        std::future::pending::<()>().await;
                    }
                }
            }
        };

        match tokio::time::timeout(timeout, next_stable).await {
            Ok(snapshot) => {
                debug!(id = %id, kind = %snapshot.kind, "connection stable");
                self.record_usage(id, Some(&snapshot), StabilizationResult::Stable);
                guard.settle(SettledOutcome::Resolved);
                Some(snapshot)
            }
            Err(_) => {
                debug!(id = %id, timeout_ms = timeout.as_millis() as u64, "timed out waiting for connection");
                let last = self.registry.latest_for(id);
                self.record_usage(id, last.as_ref(), StabilizationResult::TimedOut);
                guard.settle(SettledOutcome::TimedOut);
                None
            }
        }
    }

    fn record_usage(
        &self,
        id: &ConnectionId,
        snapshot: Option<&Arc<ConnectionSnapshot>>,
        result: StabilizationResult,
    ) {
        let kind = snapshot.map(|s| s.kind).unwrap_or_else(|| id.kind());
        if kind != ConnectionKind::Direct {
            return;
        }
        self.usage.record(UsageEvent::DirectConnectionStabilized {
            id: id.clone(),
            result,
            kafka: snapshot.map(|s| s.data_cluster.status),
            schema_registry: snapshot.map(|s| s.schema_catalog.status),
        });
    }
}

/// A wait running on its own task.
///
/// Dropping the handle without joining cancels the wait.
pub struct WaitHandle {
    task: Option<JoinHandle<Option<Arc<ConnectionSnapshot>>>>,
}

impl WaitHandle {
    /// Cancel the wait. A later `join` yields `Ok(None)`.
    pub fn cancel(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Wait for the outcome.
    pub async fn join(mut self) -> Result<Option<Arc<ConnectionSnapshot>>> {
        let Some(task) = self.task.take() else {
            return Ok(None);
        };
        match task.await {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_cancelled() => Ok(None),
            Err(e) => {
                warn!(error = %e, "stabilization wait panicked");
                Err(TetherError::Internal(e.to_string()))
            }
        }
    }
}

impl Drop for WaitHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
