//! Seams to the host: user notifications, usage telemetry, and the
//! persisted connection configuration.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tether_core::{ConnectionId, SubResource, SubResourceStatus};
use tracing::{error, info};

/// Action attached to a notification; the host executes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationAction {
    /// Open the details view for a connection.
    ViewConnectionDetails(ConnectionId),
}

impl NotificationAction {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationAction::ViewConnectionDetails(_) => "View Connection Details",
        }
    }
}

/// A user-visible error notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorNotification {
    pub connection_id: ConnectionId,
    pub message: String,
    pub actions: Vec<NotificationAction>,
}

/// Delivers notifications to the user.
pub trait Notifier: Send + Sync + 'static {
    fn notify_error(&self, notification: &ErrorNotification);
}

/// Notifier that writes to the log.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_error(&self, notification: &ErrorNotification) {
        error!(
            target: "tether::notify",
            id = %notification.connection_id,
            actions = notification.actions.len(),
            "{}",
            notification.message
        );
    }
}

/// Notifier that keeps every notification (for tests and demos).
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<ErrorNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<ErrorNotification> {
        self.sent.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_error(&self, notification: &ErrorNotification) {
        self.sent.lock().push(notification.clone());
    }
}

/// How a wait on a direct connection ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilizationResult {
    Stable,
    TimedOut,
}

/// Usage telemetry events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageEvent {
    /// Recorded once per wait on a direct connection.
    DirectConnectionStabilized {
        id: ConnectionId,
        result: StabilizationResult,
        /// Last known statuses; absent if no snapshot ever arrived.
        kafka: Option<SubResourceStatus>,
        schema_registry: Option<SubResourceStatus>,
    },
}

/// Records usage telemetry.
pub trait UsageRecorder: Send + Sync + 'static {
    fn record(&self, event: UsageEvent);
}

/// Usage recorder that logs each event.
#[derive(Debug, Default)]
pub struct TracingUsageRecorder;

impl UsageRecorder for TracingUsageRecorder {
    fn record(&self, event: UsageEvent) {
        match event {
            UsageEvent::DirectConnectionStabilized {
                id,
                result,
                kafka,
                schema_registry,
            } => info!(
                target: "tether::usage",
                id = %id,
                result = ?result,
                kafka = ?kafka,
                schema_registry = ?schema_registry,
                "direct connection stabilization"
            ),
        }
    }
}

/// Usage recorder that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingUsageRecorder {
    events: Mutex<Vec<UsageEvent>>,
}

impl RecordingUsageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UsageEvent> {
        self.events.lock().clone()
    }
}

impl UsageRecorder for RecordingUsageRecorder {
    fn record(&self, event: UsageEvent) {
        self.events.lock().push(event);
    }
}

/// Endpoint settings of a direct connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub address: String,
    #[serde(default)]
    pub tls: bool,
}

/// User-chosen configuration of a direct connection, as persisted by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectConnectionSpec {
    pub name: String,
    /// Platform label picked in the connection form, e.g. "Apache Kafka".
    pub platform: Option<String>,
    pub kafka: Option<EndpointSpec>,
    pub schema_registry: Option<EndpointSpec>,
}

impl DirectConnectionSpec {
    /// TLS flag of the endpoint backing `resource`, if configured.
    pub fn tls_for(&self, resource: SubResource) -> Option<bool> {
        let endpoint = match resource {
            SubResource::DataCluster => self.kafka.as_ref(),
            SubResource::SchemaCatalog => self.schema_registry.as_ref(),
            SubResource::CloudAuth => None,
        };
        endpoint.map(|e| e.tls)
    }
}

/// Read access to persisted direct connection configuration.
#[async_trait]
pub trait ConnectionSpecLookup: Send + Sync + 'static {
    async fn direct_spec(&self, id: &ConnectionId) -> Option<DirectConnectionSpec>;
}

/// In-memory spec store.
#[derive(Debug, Default)]
pub struct MemorySpecStore {
    specs: RwLock<HashMap<ConnectionId, DirectConnectionSpec>>,
}

impl MemorySpecStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: ConnectionId, spec: DirectConnectionSpec) {
        self.specs.write().insert(id, spec);
    }

    pub fn remove(&self, id: &ConnectionId) -> Option<DirectConnectionSpec> {
        self.specs.write().remove(id)
    }
}

#[async_trait]
impl ConnectionSpecLookup for MemorySpecStore {
    async fn direct_spec(&self, id: &ConnectionId) -> Option<DirectConnectionSpec> {
        self.specs.read().get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_label() {
        let action = NotificationAction::ViewConnectionDetails(ConnectionId::new("c1"));
        assert_eq!(action.label(), "View Connection Details");
    }

    #[test]
    fn test_tls_for() {
        let spec = DirectConnectionSpec {
            name: "c1".to_string(),
            platform: Some("Apache Kafka".to_string()),
            kafka: Some(EndpointSpec {
                address: "localhost:9092".to_string(),
                tls: true,
            }),
            schema_registry: None,
        };

        assert_eq!(spec.tls_for(SubResource::DataCluster), Some(true));
        assert_eq!(spec.tls_for(SubResource::SchemaCatalog), None);
        assert_eq!(spec.tls_for(SubResource::CloudAuth), None);
    }

    #[tokio::test]
    async fn test_memory_spec_store() {
        let store = MemorySpecStore::new();
        let id = ConnectionId::new("c1");
        assert!(store.direct_spec(&id).await.is_none());

        store.insert(id.clone(), DirectConnectionSpec::default());
        assert!(store.direct_spec(&id).await.is_some());
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.notify_error(&ErrorNotification {
            connection_id: ConnectionId::new("c1"),
            message: "boom".to_string(),
            actions: Vec::new(),
        });

        assert_eq!(notifier.len(), 1);
        assert_eq!(notifier.notifications()[0].message, "boom");
    }
}
