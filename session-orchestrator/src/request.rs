use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Git repository initialization for the volume of a persistent session.
///
/// Only valid for non-ephemeral launches: the repository is cloned into the
/// workspace's mounted storage, which an ephemeral session does not have.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GitInit {
    /// Repository URL to clone into the workspace volume.
    pub repository: String,

    /// Branch, tag, or commit to check out after cloning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_ref: Option<String>,
}

/// A request to launch a coding session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LaunchRequest {
    /// Service application id this request is addressed to. Checked
    /// advisorily at the boundary; a mismatch is logged, never rejected.
    #[serde(default)]
    pub app_id: Option<String>,

    /// Name of the registered application definition to run.
    pub app_definition: String,

    /// User the session is launched for. Must match the caller's identity.
    pub user: String,

    /// Human-chosen workspace name. When a workspace of this (normalized)
    /// name and owner exists it is reused instead of creating a new one.
    #[serde(default)]
    pub workspace_name: Option<String>,

    /// Display label, used only when a new workspace is created.
    #[serde(default)]
    pub label: Option<String>,

    /// Idle timeout in minutes, forwarded to the launcher unmodified.
    #[serde(default)]
    pub timeout: Option<u32>,

    /// Environment variable overrides forwarded to the launcher.
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,

    /// Repository initialization for the new or reused workspace volume.
    #[serde(default)]
    pub git_init: Option<GitInit>,

    /// Whether to launch without durable backing storage.
    #[serde(default)]
    pub ephemeral: bool,
}

impl LaunchRequest {
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Whether the request names a workspace that may already exist.
    pub fn names_workspace(&self) -> bool {
        self.workspace_name.is_some()
    }
}

impl fmt::Display for LaunchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "app_definition='{}' user='{}' workspace='{}' ephemeral={}",
            self.app_definition,
            self.user,
            self.workspace_name.as_deref().unwrap_or("-"),
            self.ephemeral
        )
    }
}

/// Normalize a user-chosen name into a valid cluster resource name.
///
/// Resource names must be DNS-1123 labels: lowercase alphanumerics and `-`,
/// at most 63 bytes, starting and ending with an alphanumeric.
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;

    for c in raw.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            out.push(c);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    out.truncate(63);
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Generate a workspace name for a request that did not choose one.
pub fn generate_workspace_name(user: &str, app_definition: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    normalize_name(&format!("ws-{}-{}-{}", user, app_definition, &suffix[..8]))
}
