use std::sync::Arc;

use shared_config::AppConfig;
use shared_store::Store;

use crate::mock::MockCalendarService;
use crate::oauth::UserOAuthCalendarService;
use crate::remote::RemoteCalendarService;
use crate::service::CalendarService;

/// Builds the calendar service for a campaign once, at campaign start, and
/// hands it down to every caller — never re-resolved per call.
///
/// Resolution order: a linked OAuth token for `user_id` (or, absent a
/// `user_id`, any single linked token as a documented single-tenant
/// convenience — see DESIGN.md) wins; otherwise the server-wide
/// service-account calendar if configured; otherwise the deterministic mock.
pub async fn build_calendar_service(
    user_id: &str,
    config: &AppConfig,
    store: &Arc<Store>,
) -> Arc<dyn CalendarService> {
    let token = if !user_id.is_empty() {
        store.get_oauth_token(user_id).await
    } else {
        store.any_oauth_token().await
    };

    if let Some(token) = token {
        tracing::info!("using linked Google Calendar for user_id={}", token.user_id);
        return Arc::new(UserOAuthCalendarService::new(
            store.clone(),
            token,
            config.google_oauth_client_id.clone(),
            config.google_oauth_client_secret.clone(),
        ));
    }

    if config.use_real_calendar && !config.google_credentials_json.is_empty() {
        tracing::info!(
            "using service-account Google Calendar (calendar_id={})",
            config.google_calendar_id
        );
        // Exchanging the service-account JSON for a bearer token is the
        // vendor SDK's job (out of scope per spec.md §1); the config value
        // stands in for an already-minted access token here.
        return Arc::new(RemoteCalendarService::new(
            config.google_credentials_json.clone(),
            config.google_calendar_id.clone(),
        ));
    }

    Arc::new(MockCalendarService::new(&config.default_timezone))
}
