//! Immutable whole-connection snapshots.

use crate::id::{ConnectionId, ConnectionKind};
use crate::status::{AuthStatus, ResourceState, SubResource, SubResourceStatus};
use serde::{Deserialize, Serialize};

/// Full state of a connection at one point in time.
///
/// Snapshots are never mutated after construction; a newer state arrives as
/// a new snapshot. Sub-resources default to `NotApplicable`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub id: ConnectionId,
    pub kind: ConnectionKind,
    /// User-facing name, if the connection has one.
    pub name: Option<String>,
    pub data_cluster: ResourceState,
    pub schema_catalog: ResourceState,
    pub cloud_auth: ResourceState,
    pub auth_status: AuthStatus,
}

impl ConnectionSnapshot {
    /// Create a snapshot with every sub-resource not applicable.
    pub fn new(id: impl Into<ConnectionId>, kind: ConnectionKind) -> Self {
        Self {
            id: id.into(),
            kind,
            name: None,
            data_cluster: ResourceState::not_applicable(),
            schema_catalog: ResourceState::not_applicable(),
            cloud_auth: ResourceState::not_applicable(),
            auth_status: AuthStatus::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_data_cluster(mut self, state: impl Into<ResourceState>) -> Self {
        self.data_cluster = state.into();
        self
    }

    pub fn with_schema_catalog(mut self, state: impl Into<ResourceState>) -> Self {
        self.schema_catalog = state.into();
        self
    }

    pub fn with_cloud_auth(mut self, state: impl Into<ResourceState>) -> Self {
        self.cloud_auth = state.into();
        self
    }

    pub fn with_auth_status(mut self, status: AuthStatus) -> Self {
        self.auth_status = status;
        self
    }

    /// Name for messages; falls back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn resource(&self, resource: SubResource) -> &ResourceState {
        match resource {
            SubResource::DataCluster => &self.data_cluster,
            SubResource::SchemaCatalog => &self.schema_catalog,
            SubResource::CloudAuth => &self.cloud_auth,
        }
    }

    pub fn status(&self, resource: SubResource) -> SubResourceStatus {
        self.resource(resource).status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{Diagnostics, ErrorPhase};

    #[test]
    fn test_defaults_to_not_applicable() {
        let snapshot = ConnectionSnapshot::new("c1", ConnectionKind::Direct);

        assert_eq!(snapshot.status(SubResource::DataCluster), SubResourceStatus::NotApplicable);
        assert_eq!(snapshot.status(SubResource::SchemaCatalog), SubResourceStatus::NotApplicable);
        assert_eq!(snapshot.status(SubResource::CloudAuth), SubResourceStatus::NotApplicable);
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let unnamed = ConnectionSnapshot::new("c1", ConnectionKind::Direct);
        let named = unnamed.clone().with_name("Prod cluster");

        assert_eq!(unnamed.display_name(), "c1");
        assert_eq!(named.display_name(), "Prod cluster");
    }

    #[test]
    fn test_resource_accessors() {
        let snapshot = ConnectionSnapshot::new("c1", ConnectionKind::Direct)
            .with_data_cluster(SubResourceStatus::Success)
            .with_schema_catalog(ResourceState::failed(
                Diagnostics::new().with(ErrorPhase::SignIn, "bad cert"),
            ));

        assert_eq!(snapshot.status(SubResource::DataCluster), SubResourceStatus::Success);
        assert_eq!(
            snapshot.resource(SubResource::SchemaCatalog).diagnostics.first_reason(),
            Some("bad cert")
        );
    }
}
