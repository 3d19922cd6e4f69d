use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::warn;

use session_orchestrator::LaunchRequest;

use crate::{auth::AuthenticatedUser, error::ApiResult, state::AppState};

/// Routes reachable without authentication.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/service/{app_id}", get(ping))
}

/// Routes behind the identity middleware.
pub fn routes() -> Router<AppState> {
    Router::new().route("/service", post(launch))
}

#[utoipa::path(
    get,
    path = "/service/{app_id}",
    params(("app_id" = String, Path, description = "Service application id")),
    responses((status = 200, description = "Service is reachable", body = bool))
)]
pub async fn ping(State(state): State<AppState>, Path(app_id): Path<String>) -> Json<bool> {
    if app_id != state.app_id {
        warn!(
            "Ping for unexpected app id '{}' (serving '{}')",
            app_id, state.app_id
        );
    }
    Json(state.orchestrator.ping(&app_id))
}

#[utoipa::path(
    post,
    path = "/service",
    request_body = LaunchRequest,
    responses(
        (status = 200, description = "URL of the launched session", body = String),
        (status = 400, description = "Invalid app definition or git init configuration"),
        (status = 403, description = "Caller may not launch sessions for the requested user"),
        (status = 500, description = "Workspace creation or session launch failed")
    )
)]
pub async fn launch(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(request): Json<LaunchRequest>,
) -> ApiResult<Json<String>> {
    if let Some(app_id) = &request.app_id {
        if app_id != &state.app_id {
            warn!(
                "Launch request for unexpected app id '{}' (serving '{}')",
                app_id, state.app_id
            );
        }
    }

    let url = state.orchestrator.launch(&user.username, &request).await?;

    Ok(Json(url))
}
