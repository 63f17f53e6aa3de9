//! Stability rules.
//!
//! A snapshot is stable when every sub-resource that matters for its kind
//! has stopped transitioning. Stability says nothing about success: a
//! connection whose schema catalog failed is just as stable as one whose
//! schema catalog connected.

use crate::id::ConnectionKind;
use crate::snapshot::ConnectionSnapshot;
use crate::status::{SubResource, SubResourceStatus};

const CLUSTER_RESOURCES: &[SubResource] = &[SubResource::DataCluster, SubResource::SchemaCatalog];
const CLOUD_RESOURCES: &[SubResource] = &[SubResource::CloudAuth];

/// Sub-resources that decide stability for a kind.
pub fn relevant_resources(kind: ConnectionKind) -> &'static [SubResource] {
    match kind {
        ConnectionKind::ManagedCloud => CLOUD_RESOURCES,
        ConnectionKind::Local | ConnectionKind::Direct => CLUSTER_RESOURCES,
    }
}

/// Whether the snapshot has settled.
///
/// Managed-cloud connections need a terminal auth status; `NotApplicable`
/// does not count there since the cloud connection always authenticates.
/// Local and direct connections accept `NotApplicable` for unconfigured
/// sub-resources, so a direct connection with nothing configured is stable
/// immediately. `None` never counts.
pub fn is_stable(snapshot: &ConnectionSnapshot) -> bool {
    match snapshot.kind {
        ConnectionKind::ManagedCloud => snapshot.cloud_auth.status.is_terminal(),
        ConnectionKind::Local | ConnectionKind::Direct => CLUSTER_RESOURCES
            .iter()
            .all(|r| snapshot.status(*r).is_settled()),
    }
}

/// Relevant sub-resources currently `Failed`, in declaration order.
pub fn failed_resources(snapshot: &ConnectionSnapshot) -> Vec<SubResource> {
    relevant_resources(snapshot.kind)
        .iter()
        .copied()
        .filter(|r| snapshot.status(*r) == SubResourceStatus::Failed)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use SubResourceStatus::*;

    fn direct(kafka: SubResourceStatus, sr: SubResourceStatus) -> ConnectionSnapshot {
        ConnectionSnapshot::new("c1", ConnectionKind::Direct)
            .with_data_cluster(kafka)
            .with_schema_catalog(sr)
    }

    #[test]
    fn test_direct_waits_for_both_configured_resources() {
        assert!(!is_stable(&direct(Attempting, Attempting)));
        assert!(!is_stable(&direct(Success, Attempting)));
        assert!(is_stable(&direct(Success, Failed)));
        assert!(is_stable(&direct(Failed, Failed)));
    }

    #[test]
    fn test_direct_with_nothing_configured_is_stable() {
        assert!(is_stable(&direct(NotApplicable, NotApplicable)));
    }

    #[test]
    fn test_none_is_not_stable() {
        assert!(!is_stable(&direct(Success, None)));
        assert!(!is_stable(&direct(None, NotApplicable)));
    }

    #[test]
    fn test_ccloud_ignores_cluster_resources() {
        let pending = ConnectionSnapshot::new("ccloud", ConnectionKind::ManagedCloud)
            .with_data_cluster(Attempting)
            .with_cloud_auth(Attempting);
        let failed = pending.clone().with_cloud_auth(Failed);
        let unconfigured = ConnectionSnapshot::new("ccloud", ConnectionKind::ManagedCloud);

        assert!(!is_stable(&pending));
        assert!(is_stable(&failed));
        assert!(!is_stable(&unconfigured));
    }

    #[test]
    fn test_failed_resources_only_counts_relevant() {
        let local = ConnectionSnapshot::new("local", ConnectionKind::Local)
            .with_data_cluster(Failed)
            .with_cloud_auth(Failed);
        assert_eq!(failed_resources(&local), vec![SubResource::DataCluster]);

        let cloud = ConnectionSnapshot::new("ccloud", ConnectionKind::ManagedCloud)
            .with_data_cluster(Failed)
            .with_cloud_auth(Failed);
        assert_eq!(failed_resources(&cloud), vec![SubResource::CloudAuth]);
    }
}
