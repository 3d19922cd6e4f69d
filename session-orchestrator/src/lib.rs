//! Session launch orchestration business logic
//!
//! This crate contains the core decision flow for turning a "launch a coding
//! session" request into cluster operations: validate the request, pick the
//! launch path (ephemeral, reuse an existing workspace, or create one),
//! invoke the session launcher, and roll back a freshly created workspace
//! when the launch fails. It is consumed by the session-api HTTP service but
//! can also be used by CLI commands or other entry points.

pub mod cluster;
pub mod error;
pub mod orchestrator;
pub mod request;
pub mod test_utils;

pub use cluster::{AccessPolicy, ClusterClient, SameUserPolicy, Workspace, WorkspaceSpec};
pub use error::{Compensation, OrchestratorError, Result};
pub use orchestrator::{LaunchPath, SessionOrchestrator};
pub use request::{normalize_name, GitInit, LaunchRequest};
