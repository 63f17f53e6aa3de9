//! Routes inbound connection events into the registry.

use crate::error::Result;
use crate::registry::ConnectionRegistry;
use crate::reporter::UsableStateReporter;
use crate::wire::{decode_event, ConnectionEvent, EventAction};
use futures::stream::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Counters from a dispatch loop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub received: u64,
    pub ingested: u64,
    pub purged: u64,
    /// Events that failed to decode or route.
    pub dropped: u64,
}

/// What happened to one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatched {
    Ingested,
    Purged,
    Dropped,
}

/// Applies connection events to a registry.
#[derive(Clone)]
pub struct EventDispatcher {
    registry: Arc<ConnectionRegistry>,
    reporter: Arc<UsableStateReporter>,
}

impl EventDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>, reporter: Arc<UsableStateReporter>) -> Self {
        Self { registry, reporter }
    }

    /// Apply a decoded event.
    pub fn handle(&self, event: ConnectionEvent) -> Result<Dispatched> {
        match event.action {
            EventAction::Created | EventAction::Updated => {
                self.registry.ingest(event.snapshot)?;
                Ok(Dispatched::Ingested)
            }
            EventAction::Deleted => {
                let id = &event.snapshot.id;
                debug!(id = %id, "connection deleted");
                self.registry.purge(id);
                self.reporter.forget(id);
                Ok(Dispatched::Purged)
            }
        }
    }

    /// Decode and apply a raw event. Failures are logged and dropped so one
    /// bad message never affects other connections.
    pub fn handle_raw(&self, raw: &str) -> Dispatched {
        let event = match decode_event(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, len = raw.len(), "dropping undecodable connection event");
                return Dispatched::Dropped;
            }
        };

        match self.handle(event) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "failed to route connection event");
                Dispatched::Dropped
            }
        }
    }

    /// Dispatch every message until the channel closes.
    pub async fn run(&self, mut rx: mpsc::Receiver<String>) -> DispatchStats {
        let mut stats = DispatchStats::default();
        while let Some(raw) = rx.recv().await {
            self.count(&mut stats, &raw);
        }
        debug!(?stats, "dispatch channel closed");
        stats
    }

    /// Dispatch every message of a stream until it ends.
    pub async fn run_stream<S>(&self, stream: S) -> DispatchStats
    where
        S: Stream<Item = String>,
    {
        let mut stats = DispatchStats::default();
        let mut stream = std::pin::pin!(stream);
        while let Some(raw) = stream.next().await {
            self.count(&mut stats, &raw);
        }
        debug!(?stats, "dispatch stream ended");
        stats
    }

    fn count(&self, stats: &mut DispatchStats, raw: &str) {
        stats.received += 1;
        match self.handle_raw(raw) {
            Dispatched::Ingested => stats.ingested += 1,
            Dispatched::Purged => stats.purged += 1,
            Dispatched::Dropped => stats.dropped += 1,
        }
    }
}
