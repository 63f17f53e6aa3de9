// File: `crates/tether-core/src/lib.rs`
//! Core types for the Tether connection readiness engine.
//!
//! A connection is a route to up to three backend services, each tracked as
//! an independent sub-resource. The external process that owns connections
//! pushes whole-connection [`ConnectionSnapshot`]s; [`stability`] decides
//! when a snapshot has settled for its [`ConnectionKind`].

pub mod id;
pub mod snapshot;
pub mod stability;
pub mod status;

pub use id::{ConnectionId, ConnectionKind};
pub use snapshot::ConnectionSnapshot;
pub use stability::{failed_resources, is_stable, relevant_resources};
pub use status::{AuthStatus, Diagnostics, ErrorPhase, ResourceState, SubResource, SubResourceStatus};
