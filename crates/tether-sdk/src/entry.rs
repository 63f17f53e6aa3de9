//! Per-connection snapshot holder.

use crate::error::{Result, TetherError};
use std::sync::Arc;
use tether_core::{ConnectionId, ConnectionKind, ConnectionSnapshot};
use tokio::sync::watch;
use tracing::{error, trace};

type SnapshotCell = Option<Arc<ConnectionSnapshot>>;

/// Latest known snapshot of one connection plus its notification channel.
///
/// The channel keeps only the newest value, so a subscriber that falls
/// behind skips straight to the latest snapshot.
pub struct ConnectionEntry {
    id: ConnectionId,
    tx: watch::Sender<SnapshotCell>,
}

impl ConnectionEntry {
    /// Create an empty entry.
    pub fn new(id: ConnectionId) -> Self {
        let (tx, _) = watch::channel(None);
        Self { id, tx }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Kind of the latest snapshot, or the kind implied by the id before
    /// any snapshot has arrived.
    pub fn kind(&self) -> ConnectionKind {
        self.tx
            .borrow()
            .as_ref()
            .map(|s| s.kind)
            .unwrap_or_else(|| self.id.kind())
    }

    /// Replace the latest snapshot and wake subscribers.
    ///
    /// The value is stored before any subscriber is notified, so a woken
    /// subscriber always reads the snapshot that woke it (or a newer one).
    pub fn update(&self, snapshot: Arc<ConnectionSnapshot>) -> Result<()> {
        if snapshot.id != self.id {
            error!(
                entry = %self.id,
                snapshot = %snapshot.id,
                "snapshot routed to the wrong connection entry"
            );
            return Err(TetherError::IdMismatch {
                expected: self.id.clone(),
                actual: snapshot.id.clone(),
            });
        }

        trace!(
            id = %self.id,
            kafka = %snapshot.data_cluster.status,
            schema_registry = %snapshot.schema_catalog.status,
            ccloud = %snapshot.cloud_auth.status,
            subscribers = self.tx.receiver_count(),
            "connection snapshot updated"
        );
        self.tx.send_replace(Some(snapshot));
        Ok(())
    }

    /// Latest snapshot, if any. Never blocks.
    pub fn latest(&self) -> Option<Arc<ConnectionSnapshot>> {
        self.tx.borrow().clone()
    }

    /// Subscribe to future updates. Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> EntrySubscription {
        EntrySubscription {
            id: self.id.clone(),
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl std::fmt::Debug for ConnectionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionEntry")
            .field("id", &self.id)
            .field("latest", &self.latest())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// A live subscription to one entry instance.
///
/// Bound to the entry it was taken from: if that entry is purged the
/// subscription is detached and never sees snapshots ingested afterwards.
pub struct EntrySubscription {
    id: ConnectionId,
    rx: watch::Receiver<SnapshotCell>,
}

impl EntrySubscription {
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Snapshot current at this moment, marking it as seen.
    pub fn current(&mut self) -> Option<Arc<ConnectionSnapshot>> {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next update and return the newest snapshot.
    ///
    /// Returns `None` once the entry has been purged.
    pub async fn next(&mut self) -> Option<Arc<ConnectionSnapshot>> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }

    /// Whether the owning entry is gone.
    pub fn is_detached(&self) -> bool {
        self.rx.has_changed().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::SubResourceStatus;

    fn snapshot(id: &str, kafka: SubResourceStatus) -> Arc<ConnectionSnapshot> {
        Arc::new(ConnectionSnapshot::new(id, ConnectionKind::Direct).with_data_cluster(kafka))
    }

    #[test]
    fn test_update_replaces_latest() {
        let entry = ConnectionEntry::new(ConnectionId::new("c1"));
        assert!(entry.latest().is_none());

        entry.update(snapshot("c1", SubResourceStatus::Attempting)).unwrap();
        entry.update(snapshot("c1", SubResourceStatus::Success)).unwrap();

        let latest = entry.latest().unwrap();
        assert_eq!(latest.data_cluster.status, SubResourceStatus::Success);
    }

    #[test]
    fn test_update_rejects_mismatched_id() {
        let entry = ConnectionEntry::new(ConnectionId::new("c1"));
        entry.update(snapshot("c1", SubResourceStatus::Success)).unwrap();

        let err = entry
            .update(snapshot("c2", SubResourceStatus::Failed))
            .unwrap_err();

        assert!(matches!(err, TetherError::IdMismatch { .. }));
        // the rejected snapshot must not leak into the entry
        assert_eq!(
            entry.latest().unwrap().data_cluster.status,
            SubResourceStatus::Success
        );
    }

    #[test]
    fn test_kind_follows_snapshot() {
        let entry = ConnectionEntry::new(ConnectionId::new("ccloud"));
        assert_eq!(entry.kind(), ConnectionKind::Direct);

        entry
            .update(Arc::new(ConnectionSnapshot::new(
                "ccloud",
                ConnectionKind::ManagedCloud,
            )))
            .unwrap();
        assert_eq!(entry.kind(), ConnectionKind::ManagedCloud);
    }

    #[tokio::test]
    async fn test_subscriber_sees_value_after_wake() {
        let entry = ConnectionEntry::new(ConnectionId::new("c1"));
        let mut sub = entry.subscribe();
        assert_eq!(entry.subscriber_count(), 1);

        entry.update(snapshot("c1", SubResourceStatus::Success)).unwrap();

        let seen = sub.next().await.unwrap();
        assert_eq!(seen.data_cluster.status, SubResourceStatus::Success);

        drop(sub);
        assert_eq!(entry.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_subscriber_observes_only_newest() {
        let entry = ConnectionEntry::new(ConnectionId::new("c1"));
        let mut sub = entry.subscribe();

        entry.update(snapshot("c1", SubResourceStatus::Attempting)).unwrap();
        entry.update(snapshot("c1", SubResourceStatus::Failed)).unwrap();

        let seen = sub.next().await.unwrap();
        assert_eq!(seen.data_cluster.status, SubResourceStatus::Failed);
        assert!(!sub.rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_dropping_entry_detaches_subscription() {
        let entry = ConnectionEntry::new(ConnectionId::new("c1"));
        let mut sub = entry.subscribe();

        drop(entry);

        assert!(sub.is_detached());
        assert!(sub.next().await.is_none());
    }
}
