//! The "settled" signal fired once per concluded wait.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tether_core::ConnectionId;
use tokio::sync::broadcast;

/// How a wait concluded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettledOutcome {
    /// A stable snapshot was observed.
    Resolved,
    /// The timeout elapsed first.
    TimedOut,
    /// The wait was cancelled or dropped before concluding.
    Abandoned,
}

/// Emitted when a wait concludes, whatever the outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settled {
    pub id: ConnectionId,
    pub outcome: SettledOutcome,
}

/// Broadcast of [`Settled`] events, shared by every waiter of a tracker.
///
/// Loading indicators subscribe to this to retire themselves regardless of
/// whether the connection they were waiting on came up.
#[derive(Clone)]
pub struct SettledSignal {
    tx: broadcast::Sender<Settled>,
    fired: Arc<AtomicU64>,
}

impl SettledSignal {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            fired: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Settled> {
        self.tx.subscribe()
    }

    pub fn fire(&self, id: ConnectionId, outcome: SettledOutcome) {
        self.fired.fetch_add(1, Ordering::SeqCst);
        // no subscribers is fine
        let _ = self.tx.send(Settled { id, outcome });
    }

    /// Total signals fired since creation.
    pub fn fired_count(&self) -> u64 {
        self.fired.load(Ordering::SeqCst)
    }
}

impl Default for SettledSignal {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Fires the signal exactly once: explicitly via [`SettleGuard::settle`],
/// or as `Abandoned` when dropped unsettled.
pub(crate) struct SettleGuard {
    signal: SettledSignal,
    id: ConnectionId,
    done: bool,
}

impl SettleGuard {
    pub(crate) fn new(signal: SettledSignal, id: ConnectionId) -> Self {
        Self {
            signal,
            id,
            done: false,
        }
    }

    pub(crate) fn settle(mut self, outcome: SettledOutcome) {
        self.done = true;
        self.signal.fire(self.id.clone(), outcome);
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if !self.done {
            self.signal
                .fire(self.id.clone(), SettledOutcome::Abandoned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_reaches_subscribers() {
        let signal = SettledSignal::new(4);
        let mut rx = signal.subscribe();

        signal.fire(ConnectionId::new("c1"), SettledOutcome::Resolved);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.id, ConnectionId::new("c1"));
        assert_eq!(event.outcome, SettledOutcome::Resolved);
        assert_eq!(signal.fired_count(), 1);
    }

    #[test]
    fn test_guard_fires_once_when_settled() {
        let signal = SettledSignal::new(4);
        let mut rx = signal.subscribe();

        SettleGuard::new(signal.clone(), ConnectionId::new("c1")).settle(SettledOutcome::TimedOut);

        assert_eq!(rx.try_recv().unwrap().outcome, SettledOutcome::TimedOut);
        assert!(rx.try_recv().is_err());
        assert_eq!(signal.fired_count(), 1);
    }

    #[test]
    fn test_guard_fires_abandoned_on_drop() {
        let signal = SettledSignal::new(4);
        let mut rx = signal.subscribe();

        drop(SettleGuard::new(signal.clone(), ConnectionId::new("c1")));

        assert_eq!(rx.try_recv().unwrap().outcome, SettledOutcome::Abandoned);
        assert_eq!(signal.fired_count(), 1);
    }
}
