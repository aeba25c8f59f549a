use std::sync::Arc;

use calendar_cell::CalendarService;
use provider_cell::ProviderDirectory;
use ranking_cell::DistanceService;
use shared_config::AppConfig;
use shared_store::Store;

/// Everything a tool handler needs, resolved once per call (not per tool
/// invocation) and handed down for the life of that call's conversation.
pub struct ToolContext {
    pub campaign_id: String,
    pub provider_id: String,
    pub config: Arc<AppConfig>,
    pub store: Arc<Store>,
    pub calendar: Arc<dyn CalendarService>,
    pub distance: Arc<dyn DistanceService>,
    pub directory: Arc<dyn ProviderDirectory>,
}
