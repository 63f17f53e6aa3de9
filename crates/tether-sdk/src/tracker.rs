//! The composition root tying registry, waits, reporting and dispatch
//! together.

use crate::config::TrackerConfig;
use crate::dispatch::{DispatchStats, EventDispatcher};
use crate::error::{Result, TetherError};
use crate::registry::ConnectionRegistry;
use crate::reporter::{ConnectionSummary, UsableStateReporter};
use crate::settled::{Settled, SettledSignal};
use crate::sink::{
    ConnectionSpecLookup, ErrorNotification, MemorySpecStore, Notifier, TracingNotifier,
    TracingUsageRecorder, UsageRecorder,
};
use crate::waiter::{StabilizationWaiter, WaitHandle};
use std::sync::Arc;
use std::time::Duration;
use tether_core::{ConnectionId, ConnectionSnapshot, SubResourceStatus};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Tracks readiness of every known connection.
///
/// # Example
///
/// ```rust
/// use tether_sdk::{ConnectionTracker, TrackerConfig};
/// use tether_core::{ConnectionKind, ConnectionSnapshot, SubResourceStatus};
///
/// # tokio_test::block_on(async {
/// let tracker = ConnectionTracker::with_tracing_sinks(TrackerConfig::default());
///
/// tracker
///     .ingest(
///         ConnectionSnapshot::new("c1", ConnectionKind::Direct)
///             .with_data_cluster(SubResourceStatus::Success),
///     )
///     .unwrap();
///
/// let snapshot = tracker.wait_for_stable(&"c1".into()).await;
/// assert!(snapshot.is_some());
/// # });
/// ```
pub struct ConnectionTracker {
    config: TrackerConfig,
    registry: Arc<ConnectionRegistry>,
    settled: SettledSignal,
    waiter: StabilizationWaiter,
    reporter: Arc<UsableStateReporter>,
    dispatcher: EventDispatcher,
}

impl ConnectionTracker {
    /// Create a tracker with custom sinks.
    pub fn new(
        config: TrackerConfig,
        notifier: Arc<dyn Notifier>,
        usage: Arc<dyn UsageRecorder>,
        specs: Arc<dyn ConnectionSpecLookup>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let settled = SettledSignal::new(config.settled_capacity);
        let waiter = StabilizationWaiter::new(
            registry.clone(),
            settled.clone(),
            usage,
            config.default_timeout(),
        );
        let reporter = Arc::new(UsableStateReporter::new(specs, notifier));
        let dispatcher = EventDispatcher::new(registry.clone(), reporter.clone());

        Self {
            config,
            registry,
            settled,
            waiter,
            reporter,
            dispatcher,
        }
    }

    /// Create a tracker that logs notifications and usage, with no
    /// persisted direct connection specs.
    pub fn with_tracing_sinks(config: TrackerConfig) -> Self {
        Self::new(
            config,
            Arc::new(TracingNotifier),
            Arc::new(TracingUsageRecorder),
            Arc::new(MemorySpecStore::new()),
        )
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn waiter(&self) -> &StabilizationWaiter {
        &self.waiter
    }

    pub fn reporter(&self) -> &Arc<UsableStateReporter> {
        &self.reporter
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Subscribe to the settled signal.
    pub fn subscribe_settled(&self) -> broadcast::Receiver<Settled> {
        self.settled.subscribe()
    }

    pub fn settled_count(&self) -> u64 {
        self.settled.fired_count()
    }

    pub fn ingest(&self, snapshot: impl Into<Arc<ConnectionSnapshot>>) -> Result<()> {
        self.registry.ingest(snapshot)
    }

    pub fn latest_for(&self, id: &ConnectionId) -> Option<Arc<ConnectionSnapshot>> {
        self.registry.latest_for(id)
    }

    /// Forget a connection entirely.
    pub fn purge(&self, id: &ConnectionId) -> bool {
        self.reporter.forget(id);
        self.registry.purge(id)
    }

    pub async fn wait_for_stable(&self, id: &ConnectionId) -> Option<Arc<ConnectionSnapshot>> {
        self.waiter.wait_for_stable(id).await
    }

    pub async fn wait_for_stable_within(
        &self,
        id: &ConnectionId,
        timeout: Duration,
    ) -> Option<Arc<ConnectionSnapshot>> {
        self.waiter.wait_for_stable_within(id, timeout).await
    }

    pub fn spawn_wait(&self, id: ConnectionId, timeout: Duration) -> WaitHandle {
        self.waiter.spawn_wait(id, timeout)
    }

    pub async fn summarize(
        &self,
        snapshot: &ConnectionSnapshot,
        target: SubResourceStatus,
    ) -> Vec<ConnectionSummary> {
        self.reporter.summarize(snapshot, target).await
    }

    pub fn report_outcome(&self, snapshot: &Arc<ConnectionSnapshot>) -> Option<ErrorNotification> {
        self.reporter.report_outcome(snapshot)
    }

    /// Wait for stability, then report any terminal failure unless
    /// `notify_failures` is off.
    pub async fn wait_and_report(
        &self,
        id: &ConnectionId,
        timeout: Duration,
    ) -> Option<Arc<ConnectionSnapshot>> {
        let snapshot = self.waiter.wait_for_stable_within(id, timeout).await?;
        if self.config.notify_failures {
            self.reporter.report_outcome(&snapshot);
        }
        Some(snapshot)
    }

    /// Start a dispatch loop fed by the returned sender.
    pub fn start_dispatch(&self) -> DispatchHandle {
        let (tx, rx) = mpsc::channel(self.config.dispatch_buffer.max(1));
        let dispatcher = self.dispatcher.clone();
        let task = tokio::spawn(async move { dispatcher.run(rx).await });
        DispatchHandle { tx, task }
    }
}

/// Feeds raw events to a running dispatch loop.
pub struct DispatchHandle {
    tx: mpsc::Sender<String>,
    task: JoinHandle<DispatchStats>,
}

impl DispatchHandle {
    pub async fn send(&self, raw: impl Into<String>) -> Result<()> {
        self.tx
            .send(raw.into())
            .await
            .map_err(|e| TetherError::Channel(e.to_string()))
    }

    pub fn sender(&self) -> mpsc::Sender<String> {
        self.tx.clone()
    }

    /// Close the channel and wait for the loop to drain.
    pub async fn finish(self) -> Result<DispatchStats> {
        drop(self.tx);
        self.task
            .await
            .map_err(|e| TetherError::Internal(e.to_string()))
    }
}
