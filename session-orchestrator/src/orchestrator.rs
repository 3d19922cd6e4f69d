use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cluster::{AccessPolicy, ClusterClient, SameUserPolicy, Workspace, WorkspaceSpec};
use crate::error::{Compensation, OrchestratorError, Result};
use crate::request::{normalize_name, LaunchRequest};

/// Which of the mutually exclusive launch paths a request takes.
///
/// Computed once from the request plus the workspace lookup result, then
/// dispatched, so no precondition is re-checked inside a branch.
#[derive(Debug, Clone)]
pub enum LaunchPath {
    /// No durable storage; launch directly.
    Ephemeral,
    /// An existing workspace matched the requested name and owner.
    Reuse(Workspace),
    /// No reusable workspace; create one, then launch against it.
    Create,
}

impl LaunchPath {
    /// Pure path selection. `existing` is the result of the workspace
    /// lookup, which only happens when the request names a workspace.
    pub fn select(request: &LaunchRequest, existing: Option<Workspace>) -> Self {
        if request.is_ephemeral() {
            return LaunchPath::Ephemeral;
        }
        match existing {
            Some(workspace) => LaunchPath::Reuse(workspace),
            None => LaunchPath::Create,
        }
    }
}

/// The request-facing decision layer for launching sessions.
///
/// Holds only handles to its collaborators; every request is an independent
/// unit of work with sequential, awaited cluster calls. The only cross-call
/// transaction is the create/launch/delete-on-failure compensation, which is
/// best-effort rather than atomic.
pub struct SessionOrchestrator {
    client: Arc<dyn ClusterClient>,
    policy: Arc<dyn AccessPolicy>,
}

impl SessionOrchestrator {
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self {
            client,
            policy: Arc::new(SameUserPolicy),
        }
    }

    /// Replace the default same-user policy, e.g. with an admin override.
    pub fn with_policy(client: Arc<dyn ClusterClient>, policy: Arc<dyn AccessPolicy>) -> Self {
        Self { client, policy }
    }

    /// Liveness probe. Always affirmative, never mutates any resource.
    pub fn ping(&self, app_id: &str) -> bool {
        let correlation_id = new_correlation_id();
        info!("[{}] ping for app id '{}'", correlation_id, app_id);
        true
    }

    /// Launch a session for `request` on behalf of the authenticated
    /// `caller`. Returns the URL of the launched session.
    ///
    /// All precondition violations are rejected before any mutating call.
    /// Once a workspace has been created for the request, a launch failure
    /// triggers a best-effort deletion of that workspace; the launch error
    /// is what reaches the caller either way.
    pub async fn launch(&self, caller: &str, request: &LaunchRequest) -> Result<String> {
        let correlation_id = new_correlation_id();
        info!("[{}] launch requested: {}", correlation_id, request);

        if !self
            .client
            .has_app_definition(&request.app_definition)
            .await?
        {
            error!(
                "[{}] app definition '{}' does not exist",
                correlation_id, request.app_definition
            );
            return Err(OrchestratorError::InvalidAppDefinition(
                request.app_definition.clone(),
            ));
        }

        if !self.policy.can_launch_for(caller, &request.user) {
            error!(
                "[{}] user '{}' tried to launch a session for user '{}'",
                correlation_id, caller, request.user
            );
            return Err(OrchestratorError::Forbidden {
                caller: caller.to_string(),
                requested: request.user.clone(),
            });
        }

        if request.git_init.is_some() && request.is_ephemeral() {
            // Git init writes to the mounted volume, which an ephemeral
            // session does not have.
            error!(
                "[{}] git init requested together with an ephemeral session",
                correlation_id
            );
            return Err(OrchestratorError::InvalidGitInitConfiguration);
        }

        let existing = match &request.workspace_name {
            Some(name) if !request.is_ephemeral() => {
                self.client
                    .get_workspace(&request.user, &normalize_name(name))
                    .await?
            }
            _ => None,
        };

        match LaunchPath::select(request, existing) {
            LaunchPath::Ephemeral => {
                info!("[{}] launching ephemeral session: {}", correlation_id, request);
                self.client
                    .launch_ephemeral_session(
                        &correlation_id,
                        &request.app_definition,
                        &request.user,
                        request.timeout,
                        request.env.as_ref(),
                    )
                    .await
                    .map_err(|source| OrchestratorError::LaunchFailed {
                        source,
                        compensation: Compensation::NotNeeded,
                    })
            }
            LaunchPath::Reuse(workspace) => {
                info!(
                    "[{}] launching session for existing workspace '{}'",
                    correlation_id, workspace.name
                );
                self.client
                    .launch_workspace_session(
                        &correlation_id,
                        &workspace.spec,
                        request.timeout,
                        request.env.as_ref(),
                        request.git_init.as_ref(),
                    )
                    .await
                    .map_err(|source| OrchestratorError::LaunchFailed {
                        source,
                        compensation: Compensation::NotNeeded,
                    })
            }
            LaunchPath::Create => self.create_and_launch(&correlation_id, request).await,
        }
    }

    async fn create_and_launch(
        &self,
        correlation_id: &str,
        request: &LaunchRequest,
    ) -> Result<String> {
        let spec = WorkspaceSpec::for_request(request);
        info!(
            "[{}] creating workspace '{}': {}",
            correlation_id, spec.name, request
        );

        let workspace = self
            .client
            .create_workspace(correlation_id, spec)
            .await
            .map_err(|e| {
                error!("[{}] workspace creation failed: {}", correlation_id, e);
                OrchestratorError::WorkspaceCreationFailed(e.to_string())
            })?;

        if let Some(detail) = &workspace.spec.error {
            error!(
                "[{}] cluster reported erroneous workspace '{}': {}",
                correlation_id, workspace.name, detail
            );
            return Err(OrchestratorError::WorkspaceCreationFailed(detail.clone()));
        }

        info!(
            "[{}] launching session for new workspace '{}'",
            correlation_id, workspace.name
        );
        match self
            .client
            .launch_workspace_session(
                correlation_id,
                &workspace.spec,
                request.timeout,
                request.env.as_ref(),
                request.git_init.as_ref(),
            )
            .await
        {
            Ok(url) => Ok(url),
            Err(source) => {
                info!(
                    "[{}] deleting workspace '{}' due to launch error",
                    correlation_id, workspace.name
                );
                let compensation = match self
                    .client
                    .delete_workspace(correlation_id, &workspace.name)
                    .await
                {
                    Ok(()) => Compensation::Deleted {
                        workspace: workspace.name.clone(),
                    },
                    Err(delete_err) => {
                        // The launch error is what the caller must see; the
                        // failed cleanup is only logged.
                        warn!(
                            "[{}] failed to delete workspace '{}': {}",
                            correlation_id, workspace.name, delete_err
                        );
                        Compensation::DeleteFailed {
                            workspace: workspace.name.clone(),
                            detail: delete_err.to_string(),
                        }
                    }
                };
                Err(OrchestratorError::LaunchFailed {
                    source,
                    compensation,
                })
            }
        }
    }
}

fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}
