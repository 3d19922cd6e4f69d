use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Application id this service instance serves.
    #[serde(default = "default_app_id")]
    pub app_id: String,

    /// Base URL of the cluster API server.
    #[serde(default = "default_cluster_url")]
    pub cluster_url: String,

    /// Namespace holding the workspace and session resources.
    #[serde(default = "default_cluster_namespace")]
    pub cluster_namespace: String,

    /// File containing the bearer token for the cluster API, if any.
    #[serde(default = "default_cluster_token_file")]
    pub cluster_token_file: Option<PathBuf>,

    /// How often to poll a launched session for its URL.
    #[serde(default = "default_launch_poll_interval")]
    pub launch_poll_interval_secs: u64,

    /// How many polls before a launch is considered failed.
    #[serde(default = "default_launch_poll_attempts")]
    pub launch_poll_attempts: u32,
}

fn default_bind_addr() -> String {
    std::env::var("SESSION_API_BIND").unwrap_or_else(|_| "0.0.0.0:3131".to_string())
}

fn default_app_id() -> String {
    std::env::var("SESSION_API_APP_ID").unwrap_or_else(|_| "coding-sessions".to_string())
}

fn default_cluster_url() -> String {
    std::env::var("SESSION_CLUSTER_URL")
        .unwrap_or_else(|_| "https://kubernetes.default.svc".to_string())
}

fn default_cluster_namespace() -> String {
    std::env::var("SESSION_CLUSTER_NAMESPACE").unwrap_or_else(|_| "sessions".to_string())
}

fn default_cluster_token_file() -> Option<PathBuf> {
    std::env::var("SESSION_CLUSTER_TOKEN_FILE")
        .map(PathBuf::from)
        .ok()
}

fn default_launch_poll_interval() -> u64 {
    std::env::var("SESSION_LAUNCH_POLL_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2)
}

fn default_launch_poll_attempts() -> u32 {
    std::env::var("SESSION_LAUNCH_POLL_ATTEMPTS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(60) // 2 minutes at the default interval
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            app_id: default_app_id(),
            cluster_url: default_cluster_url(),
            cluster_namespace: default_cluster_namespace(),
            cluster_token_file: default_cluster_token_file(),
            launch_poll_interval_secs: default_launch_poll_interval(),
            launch_poll_attempts: default_launch_poll_attempts(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Read the cluster bearer token, if a token file is configured.
    pub fn read_cluster_token(&self) -> anyhow::Result<Option<String>> {
        match &self.cluster_token_file {
            Some(path) => {
                let token = std::fs::read_to_string(path)?;
                Ok(Some(token.trim().to_string()))
            }
            None => Ok(None),
        }
    }
}
