use std::sync::Arc;

use shared_config::AppConfig;
use shared_store::Store;
use swarm_manager::SwarmManager;

/// Shared handles wired up once at startup and cloned into every handler.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<Store>,
    pub manager: Arc<SwarmManager>,
}
