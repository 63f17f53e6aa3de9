//! Tether SDK - waits on externally managed connections until they settle
//!
//! An external process owns the actual Kafka, Schema Registry and Confluent
//! Cloud connections and pushes whole-connection snapshots whenever any of
//! them changes. This SDK keeps the latest snapshot per connection and lets
//! callers wait, with a timeout, until a connection has stopped
//! transitioning.
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use tether_sdk::{ConnectionTracker, TrackerConfig};
//! use tether_core::{ConnectionKind, ConnectionSnapshot, SubResourceStatus};
//!
//! # tokio_test::block_on(async {
//! let tracker = ConnectionTracker::with_tracing_sinks(TrackerConfig::default());
//!
//! // Start waiting before the connection has reported anything
//! let wait = tracker.spawn_wait("c1".into(), Duration::from_secs(5));
//!
//! // The transport pushes a snapshot
//! tracker
//!     .ingest(
//!         ConnectionSnapshot::new("c1", ConnectionKind::Direct)
//!             .with_data_cluster(SubResourceStatus::Success),
//!     )
//!     .unwrap();
//!
//! let snapshot = wait.join().await.unwrap();
//! assert!(snapshot.is_some());
//! # });
//! ```
//!
//! # Architecture
//!
//! - [`entry`] - Latest snapshot and notification channel per connection
//! - [`registry`] - Connection id to entry map
//! - [`waiter`] - Bounded waits for stability
//! - [`settled`] - Signal fired once per concluded wait
//! - [`reporter`] - Summaries and once-only failure notifications
//! - [`wire`] - JSON event decoding
//! - [`dispatch`] - Routes inbound events into the registry
//! - [`sink`] - Notification, telemetry and spec lookup seams
//! - [`tracker`] - Composition root
//! - [`config`] - Tracker configuration
//! - [`error`] - Error types

pub mod config;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod registry;
pub mod reporter;
pub mod settled;
pub mod sink;
pub mod tracker;
pub mod waiter;
pub mod wire;

// Re-exports for convenience
pub use config::{TrackerConfig, TrackerConfigBuilder};
pub use dispatch::{DispatchStats, Dispatched, EventDispatcher};
pub use entry::{ConnectionEntry, EntrySubscription};
pub use error::{Result, TetherError};
pub use registry::ConnectionRegistry;
pub use reporter::{failure_notification, ConnectionSummary, UsableStateReporter};
pub use settled::{Settled, SettledOutcome, SettledSignal};
pub use sink::{
    ConnectionSpecLookup, DirectConnectionSpec, EndpointSpec, ErrorNotification, MemorySpecStore,
    NotificationAction, Notifier, RecordingNotifier, RecordingUsageRecorder, StabilizationResult,
    TracingNotifier, TracingUsageRecorder, UsageEvent, UsageRecorder,
};
pub use tracker::{ConnectionTracker, DispatchHandle};
pub use waiter::{StabilizationWaiter, WaitHandle};
pub use wire::{decode_event, encode_event, ConnectionEvent, EventAction};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::TrackerConfig;
    pub use crate::error::TetherError;
    pub use crate::settled::{Settled, SettledOutcome};
    pub use crate::tracker::ConnectionTracker;
    pub use tether_core::{
        ConnectionId, ConnectionKind, ConnectionSnapshot, SubResource, SubResourceStatus,
    };
}
