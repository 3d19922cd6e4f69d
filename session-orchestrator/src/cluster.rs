use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::request::{generate_workspace_name, normalize_name, GitInit, LaunchRequest};

/// Specification of a workspace resource.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkspaceSpec {
    /// Normalized resource name, unique per owner.
    pub name: String,

    /// Display label chosen at creation time.
    #[serde(default)]
    pub label: Option<String>,

    /// Application definition the workspace was created for.
    pub app_definition: String,

    /// Owning user.
    pub user: String,

    /// Backing storage identifier, filled in by the cluster.
    #[serde(default)]
    pub storage: Option<String>,

    /// Set by the cluster when the resource could not be brought up.
    /// A returned-but-erroneous creation must be treated as a failure.
    #[serde(default)]
    pub error: Option<String>,
}

impl WorkspaceSpec {
    /// Derive the spec for a workspace to be created for this request.
    ///
    /// The name is the normalized user-chosen name, or a generated one when
    /// the request did not pick any.
    pub fn for_request(request: &LaunchRequest) -> Self {
        let name = match &request.workspace_name {
            Some(raw) => normalize_name(raw),
            None => generate_workspace_name(&request.user, &request.app_definition),
        };

        Self {
            name,
            label: request.label.clone(),
            app_definition: request.app_definition.clone(),
            user: request.user.clone(),
            storage: None,
            error: None,
        }
    }
}

/// A named, owned, durable workspace resource in the cluster.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Workspace {
    pub name: String,
    pub spec: WorkspaceSpec,
}

/// The contract between the orchestrator and the cluster.
///
/// Implementations perform the actual resource operations against the
/// cluster API; the orchestrator only decides what to invoke and in what
/// order. Every call may block and may fail; retries, timeouts, and
/// concurrency control (e.g. create conflicts between racing requests) are
/// the implementation's concern.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Whether an application definition with this name is registered.
    async fn has_app_definition(&self, name: &str) -> anyhow::Result<bool>;

    /// Look up a workspace by owner and normalized name.
    async fn get_workspace(&self, user: &str, name: &str) -> anyhow::Result<Option<Workspace>>;

    /// Create a workspace resource. The returned resource may itself carry
    /// an error state in its spec; callers must check it.
    async fn create_workspace(
        &self,
        correlation_id: &str,
        spec: WorkspaceSpec,
    ) -> anyhow::Result<Workspace>;

    /// Delete a workspace resource.
    async fn delete_workspace(&self, correlation_id: &str, name: &str) -> anyhow::Result<()>;

    /// Launch a session without a backing workspace. Returns the session URL.
    async fn launch_ephemeral_session(
        &self,
        correlation_id: &str,
        app_definition: &str,
        user: &str,
        timeout: Option<u32>,
        env: Option<&BTreeMap<String, String>>,
    ) -> anyhow::Result<String>;

    /// Launch a session against an existing workspace. Returns the session URL.
    async fn launch_workspace_session(
        &self,
        correlation_id: &str,
        workspace: &WorkspaceSpec,
        timeout: Option<u32>,
        env: Option<&BTreeMap<String, String>>,
        git_init: Option<&GitInit>,
    ) -> anyhow::Result<String>;
}

/// Decides whether a caller may launch sessions on behalf of a user.
///
/// Kept as a separate seam so the policy can be replaced (e.g. an admin
/// override) without touching the launch flow.
pub trait AccessPolicy: Send + Sync {
    fn can_launch_for(&self, caller: &str, requested: &str) -> bool;
}

/// Default policy: callers may only launch sessions for themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameUserPolicy;

impl AccessPolicy for SameUserPolicy {
    fn can_launch_for(&self, caller: &str, requested: &str) -> bool {
        !caller.is_empty() && caller == requested
    }
}
