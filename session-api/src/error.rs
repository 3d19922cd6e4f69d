use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use session_orchestrator::OrchestratorError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest { kind: &'static str, message: String },
    Forbidden(String),
    Internal { kind: &'static str, message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::BadRequest { kind, message } => (StatusCode::BAD_REQUEST, kind, message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, "forbidden", message),
            ApiError::Internal { kind, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, kind, message)
            }
        };

        (status, Json(json!({ "error": message, "kind": kind }))).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        let message = err.to_string();
        match err {
            OrchestratorError::InvalidAppDefinition(_) => ApiError::BadRequest {
                kind: "invalid_app_definition",
                message,
            },
            OrchestratorError::InvalidGitInitConfiguration => ApiError::BadRequest {
                kind: "invalid_git_init_configuration",
                message,
            },
            OrchestratorError::Forbidden { .. } => ApiError::Forbidden(message),
            OrchestratorError::WorkspaceCreationFailed(_) => ApiError::Internal {
                kind: "workspace_creation_failed",
                message,
            },
            OrchestratorError::LaunchFailed { .. } => ApiError::Internal {
                kind: "launch_failed",
                message,
            },
            OrchestratorError::Cluster(_) => ApiError::Internal {
                kind: "cluster",
                message,
            },
        }
    }
}
