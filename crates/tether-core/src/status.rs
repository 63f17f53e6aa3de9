//! Per-sub-resource status tracking.
//!
//! Each connection tracks up to three backend dependencies independently.
//! A sub-resource the connection does not use is `NotApplicable`; one that
//! is configured moves through `None -> Attempting -> Success | Failed`,
//! although the owning process may skip or repeat states.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A backend dependency of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubResource {
    DataCluster,
    SchemaCatalog,
    CloudAuth,
}

impl SubResource {
    /// Label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            SubResource::DataCluster => "Kafka",
            SubResource::SchemaCatalog => "Schema Registry",
            SubResource::CloudAuth => "Confluent Cloud",
        }
    }
}

impl std::fmt::Display for SubResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Status of a single sub-resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubResourceStatus {
    /// The connection does not use this sub-resource.
    #[default]
    NotApplicable,
    /// Configured but never attempted.
    None,
    Attempting,
    Success,
    Failed,
}

impl SubResourceStatus {
    /// Success or Failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubResourceStatus::Success | SubResourceStatus::Failed)
    }

    /// Terminal, or not used at all.
    pub fn is_settled(&self) -> bool {
        self.is_terminal() || *self == SubResourceStatus::NotApplicable
    }
}

impl std::fmt::Display for SubResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SubResourceStatus::NotApplicable => "n/a",
            SubResourceStatus::None => "none",
            SubResourceStatus::Attempting => "attempting",
            SubResourceStatus::Success => "success",
            SubResourceStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Phase of the connection handshake a diagnostic was recorded in.
///
/// Declaration order is the order failure reasons are searched in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorPhase {
    SignIn,
    TokenRefresh,
    StatusCheck,
}

/// Diagnostic messages keyed by phase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    messages: BTreeMap<ErrorPhase, String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, phase: ErrorPhase, message: impl Into<String>) -> Self {
        self.insert(phase, message);
        self
    }

    pub fn insert(&mut self, phase: ErrorPhase, message: impl Into<String>) {
        self.messages.insert(phase, message.into());
    }

    pub fn get(&self, phase: ErrorPhase) -> Option<&str> {
        self.messages.get(&phase).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// First non-blank message, searching phases in declaration order.
    pub fn first_reason(&self) -> Option<&str> {
        self.messages
            .values()
            .map(|m| m.trim())
            .find(|m| !m.is_empty())
    }
}

/// Status plus diagnostics for one sub-resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub status: SubResourceStatus,
    pub diagnostics: Diagnostics,
}

impl ResourceState {
    pub fn new(status: SubResourceStatus) -> Self {
        Self {
            status,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn not_applicable() -> Self {
        Self::new(SubResourceStatus::NotApplicable)
    }

    pub fn failed(diagnostics: Diagnostics) -> Self {
        Self {
            status: SubResourceStatus::Failed,
            diagnostics,
        }
    }
}

impl From<SubResourceStatus> for ResourceState {
    fn from(status: SubResourceStatus) -> Self {
        Self::new(status)
    }
}

/// Raw authentication status reported alongside the cloud sub-resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthStatus {
    #[default]
    NoToken,
    ValidToken,
    InvalidToken,
    Failed,
    Unknown(String),
}
