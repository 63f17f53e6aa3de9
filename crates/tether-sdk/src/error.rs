//! Error types for the Tether SDK.

use tether_core::ConnectionId;
use thiserror::Error;

/// Errors raised by SDK operations.
///
/// A remote sub-resource reporting `Failed` is not an error here: it is a
/// valid resolution of a wait and is surfaced through the reporter instead.
#[derive(Error, Debug, Clone)]
pub enum TetherError {
    /// A snapshot was routed to the entry of a different connection.
    #[error("Snapshot for {actual} routed to entry {expected}")]
    IdMismatch {
        expected: ConnectionId,
        actual: ConnectionId,
    },

    /// An inbound event could not be decoded.
    #[error("Undecodable connection event: {0}")]
    Decode(String),

    /// A channel closed while still in use.
    #[error("Channel closed: {0}")]
    Channel(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for TetherError {
    fn from(err: serde_json::Error) -> Self {
        TetherError::Decode(err.to_string())
    }
}

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, TetherError>;
