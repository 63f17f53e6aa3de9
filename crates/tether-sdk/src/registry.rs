//! Connection registry: id -> entry, lazily populated.

use crate::entry::{ConnectionEntry, EntrySubscription};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tether_core::{ConnectionId, ConnectionSnapshot};
use tracing::debug;

/// Map from connection id to its entry.
///
/// Constructed explicitly and shared by `Arc`. All access goes through one
/// lock, so an ingest never interleaves with a purge or a subscribe for the
/// same id.
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: RwLock<HashMap<ConnectionId, Arc<ConnectionEntry>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the entry for `id`.
    pub fn entry(&self, id: &ConnectionId) -> Arc<ConnectionEntry> {
        if let Some(entry) = self.entries.read().get(id) {
            return entry.clone();
        }

        self.entries
            .write()
            .entry(id.clone())
            .or_insert_with(|| {
                debug!(id = %id, "created connection entry");
                Arc::new(ConnectionEntry::new(id.clone()))
            })
            .clone()
    }

    /// Route a snapshot to its entry.
    pub fn ingest(&self, snapshot: impl Into<Arc<ConnectionSnapshot>>) -> Result<()> {
        let snapshot = snapshot.into();
        let mut entries = self.entries.write();
        let entry = entries
            .entry(snapshot.id.clone())
            .or_insert_with(|| {
                debug!(id = %snapshot.id, "created connection entry");
                Arc::new(ConnectionEntry::new(snapshot.id.clone()))
            });
        entry.update(snapshot)
    }

    /// Last known snapshot for `id`.
    pub fn latest_for(&self, id: &ConnectionId) -> Option<Arc<ConnectionSnapshot>> {
        self.entry(id).latest()
    }

    /// Subscribe to updates for `id`.
    pub fn subscribe(&self, id: &ConnectionId) -> EntrySubscription {
        self.entry(id).subscribe()
    }

    /// Remove the entry for `id`. Returns whether one existed.
    ///
    /// Subscriptions taken from the removed entry are detached; a later
    /// ingest for the same id starts a fresh, empty entry.
    pub fn purge(&self, id: &ConnectionId) -> bool {
        let removed = self.entries.write().remove(id);
        if let Some(entry) = &removed {
            debug!(
                id = %id,
                subscribers = entry.subscriber_count(),
                "purged connection entry"
            );
        }
        removed.is_some()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Ids with an entry, in no particular order.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
