//! REST-backed cluster client.
//!
//! Talks to the cluster API server's custom-resource endpoints directly.
//! Workspace operations map to single resource calls; launching a session
//! creates a session resource and then polls it until the cluster reports
//! the session URL.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::interval;
use tracing::debug;

use session_orchestrator::{ClusterClient, GitInit, Workspace, WorkspaceSpec};

const API_PREFIX: &str = "apis/sessions.dev/v1/namespaces";
const CORRELATION_HEADER: &str = "x-correlation-id";

pub struct RestClusterClient {
    http: Client,
    base_url: String,
    namespace: String,
    token: Option<String>,
    poll_interval: Duration,
    poll_attempts: u32,
}

impl RestClusterClient {
    pub fn new(
        base_url: &str,
        namespace: &str,
        token: Option<String>,
        poll_interval_secs: u64,
        poll_attempts: u32,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace: namespace.to_string(),
            token,
            poll_interval: Duration::from_secs(poll_interval_secs),
            poll_attempts,
        }
    }

    fn url(&self, resource: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url, API_PREFIX, self.namespace, resource
        )
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn poll_session_url(&self, correlation_id: &str, name: &str) -> Result<String> {
        let url = format!("{}/{}", self.url("sessions"), name);
        let mut ticks = interval(self.poll_interval);

        for _ in 0..self.poll_attempts {
            ticks.tick().await;

            let response = self
                .authorize(self.http.get(&url))
                .header(CORRELATION_HEADER, correlation_id)
                .send()
                .await
                .context("Failed to poll session resource")?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                bail!("Failed to poll session '{name}': {status} - {error_text}");
            }

            let session: SessionResource = response
                .json()
                .await
                .context("Failed to parse session resource")?;

            if let Some(status) = session.status {
                if let Some(detail) = status.error {
                    bail!("Session '{name}' reported an error: {detail}");
                }
                if let Some(session_url) = status.url {
                    return Ok(session_url);
                }
            }
            debug!("Session '{}' has no URL yet, polling again", name);
        }

        bail!("Session '{name}' did not report a URL in time")
    }

    async fn launch_session(&self, correlation_id: &str, spec: SessionSpec) -> Result<String> {
        let name = format!("session-{correlation_id}");
        let resource = SessionResource {
            metadata: Metadata { name: name.clone() },
            spec: Some(spec),
            status: None,
        };

        let response = self
            .authorize(self.http.post(self.url("sessions")))
            .header(CORRELATION_HEADER, correlation_id)
            .json(&resource)
            .send()
            .await
            .context("Failed to create session resource")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Failed to create session '{name}': {status} - {error_text}");
        }

        self.poll_session_url(correlation_id, &name).await
    }
}

#[async_trait]
impl ClusterClient for RestClusterClient {
    async fn has_app_definition(&self, name: &str) -> Result<bool> {
        let url = format!("{}/{}", self.url("appdefinitions"), name);
        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .context("Failed to look up app definition")?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(anyhow!(
                    "Failed to look up app definition '{name}': {status} - {error_text}"
                ))
            }
        }
    }

    async fn get_workspace(&self, user: &str, name: &str) -> Result<Option<Workspace>> {
        let url = format!("{}/{}", self.url("workspaces"), name);
        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .context("Failed to look up workspace")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Failed to look up workspace '{name}': {status} - {error_text}");
        }

        let resource: WorkspaceResource = response
            .json()
            .await
            .context("Failed to parse workspace resource")?;

        // A name match for a different owner is not a reusable workspace.
        if resource.spec.user != user {
            return Ok(None);
        }

        Ok(Some(Workspace {
            name: resource.metadata.name,
            spec: resource.spec,
        }))
    }

    async fn create_workspace(
        &self,
        correlation_id: &str,
        spec: WorkspaceSpec,
    ) -> Result<Workspace> {
        let resource = WorkspaceResource {
            metadata: Metadata {
                name: spec.name.clone(),
            },
            spec,
        };

        let response = self
            .authorize(self.http.post(self.url("workspaces")))
            .header(CORRELATION_HEADER, correlation_id)
            .json(&resource)
            .send()
            .await
            .context("Failed to create workspace resource")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!(
                "Failed to create workspace '{}': {status} - {error_text}",
                resource.metadata.name
            );
        }

        let created: WorkspaceResource = response
            .json()
            .await
            .context("Failed to parse created workspace")?;

        Ok(Workspace {
            name: created.metadata.name,
            spec: created.spec,
        })
    }

    async fn delete_workspace(&self, correlation_id: &str, name: &str) -> Result<()> {
        let url = format!("{}/{}", self.url("workspaces"), name);
        let response = self
            .authorize(self.http.delete(&url))
            .header(CORRELATION_HEADER, correlation_id)
            .send()
            .await
            .context("Failed to delete workspace resource")?;

        // Already gone counts as deleted.
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        bail!("Failed to delete workspace '{name}': {status} - {error_text}")
    }

    async fn launch_ephemeral_session(
        &self,
        correlation_id: &str,
        app_definition: &str,
        user: &str,
        timeout: Option<u32>,
        env: Option<&BTreeMap<String, String>>,
    ) -> Result<String> {
        self.launch_session(
            correlation_id,
            SessionSpec {
                app_definition: app_definition.to_string(),
                user: user.to_string(),
                workspace: None,
                timeout,
                env: env.cloned(),
                git_init: None,
            },
        )
        .await
    }

    async fn launch_workspace_session(
        &self,
        correlation_id: &str,
        workspace: &WorkspaceSpec,
        timeout: Option<u32>,
        env: Option<&BTreeMap<String, String>>,
        git_init: Option<&GitInit>,
    ) -> Result<String> {
        self.launch_session(
            correlation_id,
            SessionSpec {
                app_definition: workspace.app_definition.clone(),
                user: workspace.user.clone(),
                workspace: Some(workspace.name.clone()),
                timeout,
                env: env.cloned(),
                git_init: git_init.cloned(),
            },
        )
        .await
    }
}

// Wire types for the cluster's custom resources.

#[derive(Debug, Serialize, Deserialize)]
struct Metadata {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WorkspaceResource {
    metadata: Metadata,
    spec: WorkspaceSpec,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionResource {
    metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    spec: Option<SessionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<SessionStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionSpec {
    app_definition: String,
    user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    env: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    git_init: Option<GitInit>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionStatus {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
