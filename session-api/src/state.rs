use std::sync::Arc;

use session_orchestrator::{ClusterClient, SessionOrchestrator};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SessionOrchestrator>,
    /// Application id this service instance serves; ping requests for other
    /// ids are answered but logged as unexpected.
    pub app_id: String,
}

impl AppState {
    pub fn new(client: Arc<dyn ClusterClient>, app_id: impl Into<String>) -> Self {
        Self {
            orchestrator: Arc::new(SessionOrchestrator::new(client)),
            app_id: app_id.into(),
        }
    }
}
