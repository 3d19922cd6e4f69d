use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Outcome of the best-effort rollback performed when a launch fails after
/// a workspace was created within the same request.
///
/// Carried alongside the launch error instead of being an error of its own,
/// so a failed cleanup can never replace the error the caller must see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// No workspace was created by this request; nothing to undo.
    NotNeeded,
    /// The freshly created workspace was deleted.
    Deleted { workspace: String },
    /// The deletion itself failed; the workspace may be orphaned.
    DeleteFailed { workspace: String, detail: String },
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("app definition '{0}' does not exist")]
    InvalidAppDefinition(String),

    #[error("user '{caller}' is not allowed to launch sessions for user '{requested}'")]
    Forbidden { caller: String, requested: String },

    #[error("git initialization is not supported for ephemeral sessions")]
    InvalidGitInitConfiguration,

    #[error("workspace creation failed: {0}")]
    WorkspaceCreationFailed(String),

    #[error("session launch failed: {source}")]
    LaunchFailed {
        source: anyhow::Error,
        compensation: Compensation,
    },

    #[error("cluster request failed: {0}")]
    Cluster(#[from] anyhow::Error),
}
