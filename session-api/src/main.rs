use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use session_api::{cluster_rest::RestClusterClient, create_app, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("session_api=debug,session_orchestrator=debug,tower_http=debug")
        .init();

    info!("Starting session-api service...");

    // Load configuration
    let config = Config::from_env();
    info!(
        "Configuration loaded: bind_addr={}, app_id={}, cluster_url={}, namespace={}",
        config.bind_addr, config.app_id, config.cluster_url, config.cluster_namespace
    );

    let token = config.read_cluster_token()?;
    let client = Arc::new(RestClusterClient::new(
        &config.cluster_url,
        &config.cluster_namespace,
        token,
        config.launch_poll_interval_secs,
        config.launch_poll_attempts,
    ));

    // Create app
    let state = AppState::new(client, config.app_id.clone());
    let app = create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
