//! Summaries of a connection's sub-resources and once-only failure
//! notifications.

use crate::sink::{ConnectionSpecLookup, ErrorNotification, NotificationAction, Notifier};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tether_core::{
    failed_resources, relevant_resources, ConnectionId, ConnectionKind, ConnectionSnapshot,
    SubResource, SubResourceStatus,
};
use tracing::{debug, info};

/// One sub-resource of a connection that matched a queried status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConnectionSummary {
    pub kind: ConnectionKind,
    pub resource: SubResource,
    pub label: &'static str,
    pub status: SubResourceStatus,
    /// First non-empty diagnostic, if any.
    pub reason: Option<String>,
    /// Platform picked for a direct connection.
    pub platform: Option<String>,
    /// Whether the direct connection's endpoint for this resource uses TLS.
    pub tls: Option<bool>,
}

/// Builds summaries and delivers failure notifications.
pub struct UsableStateReporter {
    specs: Arc<dyn ConnectionSpecLookup>,
    notifier: Arc<dyn Notifier>,
    /// Last failure notified per connection, cleared by a non-failing outcome.
    reported: Mutex<HashMap<ConnectionId, ErrorNotification>>,
}

impl UsableStateReporter {
    pub fn new(specs: Arc<dyn ConnectionSpecLookup>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            specs,
            notifier,
            reported: Mutex::new(HashMap::new()),
        }
    }

    /// One record per relevant sub-resource whose status is `target`.
    ///
    /// Direct connections are enriched with the persisted platform label
    /// and TLS flag; a missing spec leaves those fields empty.
    pub async fn summarize(
        &self,
        snapshot: &ConnectionSnapshot,
        target: SubResourceStatus,
    ) -> Vec<ConnectionSummary> {
        let matching: Vec<SubResource> = relevant_resources(snapshot.kind)
            .iter()
            .copied()
            .filter(|r| snapshot.status(*r) == target)
            .collect();
        if matching.is_empty() {
            return Vec::new();
        }

        let spec = match snapshot.kind {
            ConnectionKind::Direct => self.specs.direct_spec(&snapshot.id).await,
            _ => None,
        };

        matching
            .into_iter()
            .map(|resource| {
                let state = snapshot.resource(resource);
                ConnectionSummary {
                    kind: snapshot.kind,
                    resource,
                    label: resource.label(),
                    status: state.status,
                    reason: state.diagnostics.first_reason().map(str::to_string),
                    platform: spec.as_ref().and_then(|s| s.platform.clone()),
                    tls: spec.as_ref().and_then(|s| s.tls_for(resource)),
                }
            })
            .collect()
    }

    /// Notify the user about a terminal failure in `snapshot`.
    ///
    /// Success and local connections never notify. A failure identical to
    /// the last one reported for the connection is a no-op, so duplicate or
    /// replayed snapshots notify once. A non-failing outcome resets this,
    /// and a later failure is reported again.
    pub fn report_outcome(&self, snapshot: &Arc<ConnectionSnapshot>) -> Option<ErrorNotification> {
        let Some(notification) = failure_notification(snapshot) else {
            self.reported.lock().remove(&snapshot.id);
            return None;
        };

        {
            let mut reported = self.reported.lock();
            if reported.get(&snapshot.id) == Some(&notification) {
                debug!(id = %snapshot.id, "failure already reported");
                return None;
            }
            reported.insert(snapshot.id.clone(), notification.clone());
        }

        info!(id = %snapshot.id, kind = %snapshot.kind, "reporting connection failure");
        self.notifier.notify_error(&notification);
        Some(notification)
    }

    /// Drop the reporting memory for a deleted connection.
    pub fn forget(&self, id: &ConnectionId) {
        self.reported.lock().remove(id);
    }
}

/// The notification a snapshot warrants, if any.
pub fn failure_notification(snapshot: &ConnectionSnapshot) -> Option<ErrorNotification> {
    let failed = failed_resources(snapshot);
    if failed.is_empty() {
        return None;
    }

    let with_details = match snapshot.kind {
        ConnectionKind::Local => return None,
        ConnectionKind::Direct => true,
        ConnectionKind::ManagedCloud => false,
    };

    let targets = failed
        .iter()
        .map(|r| r.label())
        .collect::<Vec<_>>()
        .join(" and ");
    let actions = if with_details {
        vec![NotificationAction::ViewConnectionDetails(snapshot.id.clone())]
    } else {
        Vec::new()
    };

    Some(ErrorNotification {
        connection_id: snapshot.id.clone(),
        message: format!(
            "Failed to establish connection to {} for \"{}\".",
            targets,
            snapshot.display_name()
        ),
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{DirectConnectionSpec, EndpointSpec, MemorySpecStore, RecordingNotifier};
    use tether_core::{Diagnostics, ErrorPhase, ResourceState};
    use SubResourceStatus::{Attempting, Failed, Success};

    fn reporter() -> (UsableStateReporter, Arc<RecordingNotifier>, Arc<MemorySpecStore>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let specs = Arc::new(MemorySpecStore::new());
        let reporter = UsableStateReporter::new(specs.clone(), notifier.clone());
        (reporter, notifier, specs)
    }

    fn direct(kafka: impl Into<ResourceState>, sr: impl Into<ResourceState>) -> ConnectionSnapshot {
        ConnectionSnapshot::new("c1", ConnectionKind::Direct)
            .with_data_cluster(kafka)
            .with_schema_catalog(sr)
    }

    #[test]
    fn test_direct_messages() {
        let kafka = failure_notification(&direct(Failed, Success)).unwrap();
        assert_eq!(
            kafka.message,
            "Failed to establish connection to Kafka for \"c1\"."
        );
        assert_eq!(
            kafka.actions,
            vec![NotificationAction::ViewConnectionDetails("c1".into())]
        );

        let sr = failure_notification(&direct(Success, Failed)).unwrap();
        assert_eq!(
            sr.message,
            "Failed to establish connection to Schema Registry for \"c1\"."
        );

        let both = failure_notification(&direct(Failed, Failed)).unwrap();
        assert_eq!(
            both.message,
            "Failed to establish connection to Kafka and Schema Registry for \"c1\"."
        );
    }

    #[test]
    fn test_ccloud_message_has_no_action() {
        let snapshot = ConnectionSnapshot::new("ccloud", ConnectionKind::ManagedCloud)
            .with_name("Confluent Cloud")
            .with_cloud_auth(Failed);

        let notification = failure_notification(&snapshot).unwrap();
        assert_eq!(
            notification.message,
            "Failed to establish connection to Confluent Cloud for \"Confluent Cloud\"."
        );
        assert!(notification.actions.is_empty());
    }

    #[test]
    fn test_success_and_local_are_silent() {
        assert!(failure_notification(&direct(Success, Success)).is_none());

        let local = ConnectionSnapshot::new(ConnectionId::LOCAL, ConnectionKind::Local)
            .with_data_cluster(Failed)
            .with_schema_catalog(Failed);
        assert!(failure_notification(&local).is_none());
    }

    #[test]
    fn test_report_outcome_once_per_snapshot() {
        let (reporter, notifier, _) = reporter();
        let failed = Arc::new(direct(Failed, Success));

        assert!(reporter.report_outcome(&failed).is_some());
        assert!(reporter.report_outcome(&failed).is_none());
        assert_eq!(notifier.len(), 1);

        // a different failure is reported
        let both = Arc::new(direct(Failed, Failed));
        assert!(reporter.report_outcome(&both).is_some());
        assert_eq!(notifier.len(), 2);
    }

    #[test]
    fn test_identical_failure_snapshot_reported_once() {
        let (reporter, notifier, _) = reporter();

        // two deliveries of the same failure, as distinct instances
        let first = Arc::new(direct(Failed, Success));
        let replay = Arc::new(direct(Failed, Success));

        assert!(reporter.report_outcome(&first).is_some());
        assert!(reporter.report_outcome(&replay).is_none());
        assert_eq!(notifier.len(), 1);
    }

    #[test]
    fn test_recovery_rearms_failure_report() {
        let (reporter, notifier, _) = reporter();
        let failed = Arc::new(direct(Failed, Success));

        reporter.report_outcome(&failed);
        assert!(reporter
            .report_outcome(&Arc::new(direct(Success, Success)))
            .is_none());
        assert!(reporter.report_outcome(&failed).is_some());

        assert_eq!(notifier.len(), 2);
    }

    #[test]
    fn test_forget_resets_memory() {
        let (reporter, notifier, _) = reporter();
        let failed = Arc::new(direct(Success, Failed));

        reporter.report_outcome(&failed);
        reporter.forget(&"c1".into());
        reporter.report_outcome(&failed);

        assert_eq!(notifier.len(), 2);
    }

    #[tokio::test]
    async fn test_summarize_failed_with_reason_and_spec() {
        let (reporter, _, specs) = reporter();
        specs.insert(
            "c1".into(),
            DirectConnectionSpec {
                name: "c1".to_string(),
                platform: Some("Confluent Platform".to_string()),
                kafka: Some(EndpointSpec {
                    address: "broker:9092".to_string(),
                    tls: false,
                }),
                schema_registry: Some(EndpointSpec {
                    address: "https://sr:8081".to_string(),
                    tls: true,
                }),
            },
        );
        let snapshot = direct(
            Success,
            ResourceState::failed(Diagnostics::new().with(ErrorPhase::SignIn, "bad cert")),
        );

        let failed = reporter.summarize(&snapshot, Failed).await;

        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].resource, SubResource::SchemaCatalog);
        assert_eq!(failed[0].label, "Schema Registry");
        assert_eq!(failed[0].reason.as_deref(), Some("bad cert"));
        assert_eq!(failed[0].platform.as_deref(), Some("Confluent Platform"));
        assert_eq!(failed[0].tls, Some(true));

        let ok = reporter.summarize(&snapshot, Success).await;
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].resource, SubResource::DataCluster);
        assert!(ok[0].reason.is_none());
    }

    #[tokio::test]
    async fn test_summarize_ccloud_ignores_cluster_resources() {
        let (reporter, _, _) = reporter();
        let snapshot = ConnectionSnapshot::new("ccloud", ConnectionKind::ManagedCloud)
            .with_data_cluster(Attempting)
            .with_cloud_auth(ResourceState::failed(
                Diagnostics::new().with(ErrorPhase::TokenRefresh, "token expired"),
            ));

        assert!(reporter.summarize(&snapshot, Attempting).await.is_empty());

        let failed = reporter.summarize(&snapshot, Failed).await;
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].label, "Confluent Cloud");
        assert_eq!(failed[0].reason.as_deref(), Some("token expired"));
        assert!(failed[0].platform.is_none());
    }
}
