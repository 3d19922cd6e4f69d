pub mod health;
pub mod service;

use axum::{middleware, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{api_docs::ApiDoc, auth::auth_middleware, state::AppState};

pub fn create_app(state: AppState) -> Router {
    // Allow CORS for local development (frontend on a different port)
    let cors = CorsLayer::permissive();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(health::routes())
        .merge(service::public_routes()) // ping is open to unauthenticated callers
        .merge(service::routes().layer(middleware::from_fn(auth_middleware)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
