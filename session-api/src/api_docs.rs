use utoipa::OpenApi;

use session_orchestrator::{GitInit, LaunchRequest, Workspace, WorkspaceSpec};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::service::ping,
        crate::routes::service::launch,
    ),
    components(
        schemas(
            LaunchRequest,
            GitInit,
            Workspace,
            WorkspaceSpec
        )
    ),
    tags(
        (name = "session-api", description = "Session Launch API")
    )
)]
pub struct ApiDoc;
