//! JSON form of connection events as pushed by the external process.
//!
//! ```text
//! {"action":"UPDATED","id":"c1","connection":{
//!   "id":"c1","spec":{"name":"c1","type":"DIRECT"},
//!   "status":{"kafka_cluster":{"state":"SUCCESS"},
//!             "schema_registry":{"state":"FAILED","errors":{"sign_in":{"message":"bad cert"}}},
//!             "authentication":{"status":"NO_TOKEN"}}}}
//! ```
//!
//! A sub-resource object missing from `status` means the connection does
//! not use it.

use crate::error::{Result, TetherError};
use serde::{Deserialize, Serialize};
use tether_core::{
    AuthStatus, ConnectionId, ConnectionKind, ConnectionSnapshot, Diagnostics, ErrorPhase,
    ResourceState, SubResourceStatus,
};

/// What happened to the connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventAction {
    Created,
    Updated,
    Deleted,
}

/// A decoded connection event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionEvent {
    pub action: EventAction,
    pub snapshot: ConnectionSnapshot,
}

impl ConnectionEvent {
    pub fn new(action: EventAction, snapshot: ConnectionSnapshot) -> Self {
        Self { action, snapshot }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEvent {
    action: EventAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    connection: WireConnection,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireConnection {
    id: String,
    spec: WireSpec,
    #[serde(default)]
    status: WireStatus,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: WireKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum WireKind {
    Local,
    Ccloud,
    Direct,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kafka_cluster: Option<WireResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_registry: Option<WireResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ccloud: Option<WireResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authentication: Option<WireAuth>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireResource {
    state: WireState,
    #[serde(default, skip_serializing_if = "WireErrors::is_empty")]
    errors: WireErrors,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum WireState {
    None,
    Attempting,
    Success,
    Failed,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireErrors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sign_in: Option<WireError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_refresh: Option<WireError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_status_check: Option<WireError>,
}

impl WireErrors {
    fn is_empty(&self) -> bool {
        self.sign_in.is_none() && self.token_refresh.is_none() && self.auth_status_check.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireError {
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireAuth {
    status: String,
}

impl From<WireKind> for ConnectionKind {
    fn from(kind: WireKind) -> Self {
        match kind {
            WireKind::Local => ConnectionKind::Local,
            WireKind::Ccloud => ConnectionKind::ManagedCloud,
            WireKind::Direct => ConnectionKind::Direct,
        }
    }
}

impl From<ConnectionKind> for WireKind {
    fn from(kind: ConnectionKind) -> Self {
        match kind {
            ConnectionKind::Local => WireKind::Local,
            ConnectionKind::ManagedCloud => WireKind::Ccloud,
            ConnectionKind::Direct => WireKind::Direct,
        }
    }
}

impl From<WireState> for SubResourceStatus {
    fn from(state: WireState) -> Self {
        match state {
            WireState::None => SubResourceStatus::None,
            WireState::Attempting => SubResourceStatus::Attempting,
            WireState::Success => SubResourceStatus::Success,
            WireState::Failed => SubResourceStatus::Failed,
        }
    }
}

fn resource_state(resource: Option<WireResource>) -> ResourceState {
    let Some(resource) = resource else {
        return ResourceState::not_applicable();
    };

    let mut diagnostics = Diagnostics::new();
    let phases = [
        (ErrorPhase::SignIn, resource.errors.sign_in),
        (ErrorPhase::TokenRefresh, resource.errors.token_refresh),
        (ErrorPhase::StatusCheck, resource.errors.auth_status_check),
    ];
    for (phase, error) in phases {
        if let Some(error) = error {
            diagnostics.insert(phase, error.message);
        }
    }

    ResourceState {
        status: resource.state.into(),
        diagnostics,
    }
}

fn wire_resource(state: &ResourceState) -> Option<WireResource> {
    let wire_state = match state.status {
        SubResourceStatus::NotApplicable => return None,
        SubResourceStatus::None => WireState::None,
        SubResourceStatus::Attempting => WireState::Attempting,
        SubResourceStatus::Success => WireState::Success,
        SubResourceStatus::Failed => WireState::Failed,
    };
    let message = |phase| {
        state.diagnostics.get(phase).map(|m| WireError {
            message: m.to_string(),
        })
    };

    Some(WireResource {
        state: wire_state,
        errors: WireErrors {
            sign_in: message(ErrorPhase::SignIn),
            token_refresh: message(ErrorPhase::TokenRefresh),
            auth_status_check: message(ErrorPhase::StatusCheck),
        },
    })
}

fn auth_status(raw: &str) -> AuthStatus {
    match raw {
        "NO_TOKEN" => AuthStatus::NoToken,
        "VALID_TOKEN" => AuthStatus::ValidToken,
        "INVALID_TOKEN" => AuthStatus::InvalidToken,
        "FAILED" => AuthStatus::Failed,
        other => AuthStatus::Unknown(other.to_string()),
    }
}

fn raw_auth_status(status: &AuthStatus) -> String {
    match status {
        AuthStatus::NoToken => "NO_TOKEN".to_string(),
        AuthStatus::ValidToken => "VALID_TOKEN".to_string(),
        AuthStatus::InvalidToken => "INVALID_TOKEN".to_string(),
        AuthStatus::Failed => "FAILED".to_string(),
        AuthStatus::Unknown(other) => other.clone(),
    }
}

/// Decode one event.
pub fn decode_event(raw: &str) -> Result<ConnectionEvent> {
    let event: WireEvent = serde_json::from_str(raw)?;
    let connection = event.connection;

    if connection.id.is_empty() {
        return Err(TetherError::Decode("connection id is empty".to_string()));
    }
    if let Some(outer) = event.id.as_deref() {
        if outer != connection.id {
            return Err(TetherError::Decode(format!(
                "event id {} does not match connection id {}",
                outer, connection.id
            )));
        }
    }

    let status = connection.status;
    let snapshot = ConnectionSnapshot {
        id: ConnectionId::new(connection.id),
        kind: connection.spec.kind.into(),
        name: connection.spec.name,
        data_cluster: resource_state(status.kafka_cluster),
        schema_catalog: resource_state(status.schema_registry),
        cloud_auth: resource_state(status.ccloud),
        auth_status: status
            .authentication
            .map(|a| auth_status(&a.status))
            .unwrap_or_default(),
    };

    Ok(ConnectionEvent::new(event.action, snapshot))
}

/// Encode one event in the same shape [`decode_event`] reads.
pub fn encode_event(event: &ConnectionEvent) -> Result<String> {
    let snapshot = &event.snapshot;
    let wire = WireEvent {
        action: event.action,
        id: Some(snapshot.id.to_string()),
        connection: WireConnection {
            id: snapshot.id.to_string(),
            spec: WireSpec {
                name: snapshot.name.clone(),
                kind: snapshot.kind.into(),
            },
            status: WireStatus {
                kafka_cluster: wire_resource(&snapshot.data_cluster),
                schema_registry: wire_resource(&snapshot.schema_catalog),
                ccloud: wire_resource(&snapshot.cloud_auth),
                authentication: Some(WireAuth {
                    status: raw_auth_status(&snapshot.auth_status),
                }),
            },
        },
    };
    Ok(serde_json::to_string(&wire)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_direct_failure() {
        let raw = r#"{"action":"UPDATED","id":"c1","connection":{
            "id":"c1","spec":{"name":"c1","type":"DIRECT"},
            "status":{
                "kafka_cluster":{"state":"SUCCESS"},
                "schema_registry":{"state":"FAILED","errors":{"sign_in":{"message":"bad cert"}}},
                "authentication":{"status":"NO_TOKEN"}}}}"#;

        let event = decode_event(raw).unwrap();

        assert_eq!(event.action, EventAction::Updated);
        let s = event.snapshot;
        assert_eq!(s.id, ConnectionId::new("c1"));
        assert_eq!(s.kind, ConnectionKind::Direct);
        assert_eq!(s.data_cluster.status, SubResourceStatus::Success);
        assert_eq!(s.schema_catalog.status, SubResourceStatus::Failed);
        assert_eq!(s.schema_catalog.diagnostics.first_reason(), Some("bad cert"));
        assert_eq!(s.cloud_auth.status, SubResourceStatus::NotApplicable);
        assert_eq!(s.auth_status, AuthStatus::NoToken);
    }

    #[test]
    fn test_decode_ccloud_with_all_phases() {
        let raw = r#"{"action":"CREATED","connection":{
            "id":"vscode-confluent-cloud-connection","spec":{"type":"CCLOUD"},
            "status":{
                "ccloud":{"state":"FAILED","errors":{
                    "auth_status_check":{"message":"unreachable"},
                    "token_refresh":{"message":"expired"}}},
                "authentication":{"status":"SOMETHING_NEW"}}}}"#;

        let s = decode_event(raw).unwrap().snapshot;

        assert_eq!(s.kind, ConnectionKind::ManagedCloud);
        assert!(s.name.is_none());
        assert_eq!(s.cloud_auth.diagnostics.first_reason(), Some("expired"));
        assert_eq!(
            s.cloud_auth.diagnostics.get(ErrorPhase::StatusCheck),
            Some("unreachable")
        );
        assert_eq!(s.auth_status, AuthStatus::Unknown("SOMETHING_NEW".to_string()));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(decode_event("not json"), Err(TetherError::Decode(_))));
        assert!(decode_event(r#"{"action":"EXPLODED","connection":{}}"#).is_err());
        assert!(decode_event(
            r#"{"action":"UPDATED","id":"a","connection":{"id":"b","spec":{"type":"DIRECT"}}}"#
        )
        .is_err());
        assert!(
            decode_event(r#"{"action":"UPDATED","connection":{"id":"","spec":{"type":"LOCAL"}}}"#)
                .is_err()
        );
    }

    #[test]
    fn test_encode_is_readable_by_decode() {
        let snapshot = ConnectionSnapshot::new("c1", ConnectionKind::Direct)
            .with_name("Staging")
            .with_data_cluster(ResourceState::failed(
                Diagnostics::new().with(ErrorPhase::StatusCheck, "timeout"),
            ))
            .with_schema_catalog(SubResourceStatus::Attempting);
        let event = ConnectionEvent::new(EventAction::Deleted, snapshot);

        let raw = encode_event(&event).unwrap();
        assert!(!raw.contains("schema_registry\":{\"state\":\"ATTEMPTING\",\"errors\""));
        assert_eq!(decode_event(&raw).unwrap(), event);
    }
}
