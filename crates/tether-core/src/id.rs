//! Connection identity.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// The kind of a connection, which decides which sub-resources matter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// The singleton local development cluster.
    Local,
    /// The singleton managed-cloud account connection.
    ManagedCloud,
    /// A user-created connection to a self-managed cluster.
    Direct,
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionKind::Local => write!(f, "local"),
            ConnectionKind::ManagedCloud => write!(f, "ccloud"),
            ConnectionKind::Direct => write!(f, "direct"),
        }
    }
}

/// Opaque, stable identifier for a connection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Id of the singleton local connection.
    pub const LOCAL: &'static str = "vscode-local-connection";
    /// Id of the singleton managed-cloud connection.
    pub const CCLOUD: &'static str = "vscode-confluent-cloud-connection";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn local() -> Self {
        Self::new(Self::LOCAL)
    }

    pub fn ccloud() -> Self {
        Self::new(Self::CCLOUD)
    }

    /// Mint an id for a new user-created connection.
    pub fn generate_direct() -> Self {
        Self(Ulid::new().to_string().to_lowercase())
    }

    /// Kind implied by the id. Only the two singletons have well-known ids;
    /// everything else is a direct connection.
    pub fn kind(&self) -> ConnectionKind {
        match self.0.as_str() {
            Self::LOCAL => ConnectionKind::Local,
            Self::CCLOUD => ConnectionKind::ManagedCloud,
            _ => ConnectionKind::Direct,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_well_known_ids() {
        assert_eq!(ConnectionId::local().kind(), ConnectionKind::Local);
        assert_eq!(ConnectionId::ccloud().kind(), ConnectionKind::ManagedCloud);
        assert_eq!(ConnectionId::new("c1").kind(), ConnectionKind::Direct);
    }

    #[test]
    fn test_generated_direct_ids_are_unique() {
        let a = ConnectionId::generate_direct();
        let b = ConnectionId::generate_direct();

        assert_ne!(a, b);
        assert_eq!(a.kind(), ConnectionKind::Direct);
        assert_eq!(a.as_str().len(), 26);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ConnectionId::new("c1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c1\"");
    }
}
