//! Test support: a scriptable in-memory cluster client.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::cluster::{ClusterClient, Workspace, WorkspaceSpec};
use crate::request::GitInit;

/// Cluster calls recorded by [`MockClusterClient`], in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    HasAppDefinition(String),
    GetWorkspace { user: String, name: String },
    CreateWorkspace(String),
    DeleteWorkspace(String),
    LaunchEphemeral { app_definition: String, user: String },
    LaunchWorkspace { workspace: String, git_init: bool },
}

#[derive(Default)]
struct MockState {
    app_definitions: Vec<String>,
    workspaces: Vec<Workspace>,
    calls: Vec<ClusterCall>,
    fail_create: Option<String>,
    erroneous_create: Option<String>,
    fail_launch: Option<String>,
    fail_delete: Option<String>,
    session_url: String,
}

/// In-memory [`ClusterClient`] that records every call and can be scripted
/// to fail specific operations.
pub struct MockClusterClient {
    inner: Mutex<MockState>,
}

impl Default for MockClusterClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClusterClient {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockState {
                session_url: "https://sessions.example.com/session/abc123".to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn register_app_definition(&self, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .app_definitions
            .push(name.to_string());
    }

    pub fn insert_workspace(&self, workspace: Workspace) {
        self.inner.lock().unwrap().workspaces.push(workspace);
    }

    pub fn set_session_url(&self, url: &str) {
        self.inner.lock().unwrap().session_url = url.to_string();
    }

    /// Make every create call fail outright.
    pub fn fail_creates(&self, detail: &str) {
        self.inner.lock().unwrap().fail_create = Some(detail.to_string());
    }

    /// Make create calls return a resource with its error field set.
    pub fn return_erroneous_workspace(&self, detail: &str) {
        self.inner.lock().unwrap().erroneous_create = Some(detail.to_string());
    }

    pub fn fail_launches(&self, detail: &str) {
        self.inner.lock().unwrap().fail_launch = Some(detail.to_string());
    }

    pub fn fail_deletes(&self, detail: &str) {
        self.inner.lock().unwrap().fail_delete = Some(detail.to_string());
    }

    /// Every recorded call, in invocation order.
    pub fn calls(&self) -> Vec<ClusterCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Names passed to delete calls, in invocation order.
    pub fn deleted_workspaces(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ClusterCall::DeleteWorkspace(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Names of workspaces currently stored in the mock cluster.
    pub fn workspace_names(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .workspaces
            .iter()
            .map(|w| w.name.clone())
            .collect()
    }
}

#[async_trait]
impl ClusterClient for MockClusterClient {
    async fn has_app_definition(&self, name: &str) -> anyhow::Result<bool> {
        let mut state = self.inner.lock().unwrap();
        state
            .calls
            .push(ClusterCall::HasAppDefinition(name.to_string()));
        Ok(state.app_definitions.iter().any(|d| d == name))
    }

    async fn get_workspace(&self, user: &str, name: &str) -> anyhow::Result<Option<Workspace>> {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(ClusterCall::GetWorkspace {
            user: user.to_string(),
            name: name.to_string(),
        });
        Ok(state
            .workspaces
            .iter()
            .find(|w| w.spec.user == user && w.name == name)
            .cloned())
    }

    async fn create_workspace(
        &self,
        _correlation_id: &str,
        spec: WorkspaceSpec,
    ) -> anyhow::Result<Workspace> {
        let mut state = self.inner.lock().unwrap();
        state
            .calls
            .push(ClusterCall::CreateWorkspace(spec.name.clone()));

        if let Some(detail) = &state.fail_create {
            return Err(anyhow!("{}", detail));
        }

        let mut spec = spec;
        if let Some(detail) = &state.erroneous_create {
            spec.error = Some(detail.clone());
        }

        let workspace = Workspace {
            name: spec.name.clone(),
            spec,
        };
        state.workspaces.push(workspace.clone());
        Ok(workspace)
    }

    async fn delete_workspace(&self, _correlation_id: &str, name: &str) -> anyhow::Result<()> {
        let mut state = self.inner.lock().unwrap();
        state
            .calls
            .push(ClusterCall::DeleteWorkspace(name.to_string()));

        if let Some(detail) = &state.fail_delete {
            return Err(anyhow!("{}", detail));
        }

        state.workspaces.retain(|w| w.name != name);
        Ok(())
    }

    async fn launch_ephemeral_session(
        &self,
        _correlation_id: &str,
        app_definition: &str,
        user: &str,
        _timeout: Option<u32>,
        _env: Option<&BTreeMap<String, String>>,
    ) -> anyhow::Result<String> {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(ClusterCall::LaunchEphemeral {
            app_definition: app_definition.to_string(),
            user: user.to_string(),
        });

        if let Some(detail) = &state.fail_launch {
            return Err(anyhow!("{}", detail));
        }
        Ok(state.session_url.clone())
    }

    async fn launch_workspace_session(
        &self,
        _correlation_id: &str,
        workspace: &WorkspaceSpec,
        _timeout: Option<u32>,
        _env: Option<&BTreeMap<String, String>>,
        git_init: Option<&GitInit>,
    ) -> anyhow::Result<String> {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(ClusterCall::LaunchWorkspace {
            workspace: workspace.name.clone(),
            git_init: git_init.is_some(),
        });

        if let Some(detail) = &state.fail_launch {
            return Err(anyhow!("{}", detail));
        }
        Ok(state.session_url.clone())
    }
}
