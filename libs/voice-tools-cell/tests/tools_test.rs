use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::json;

use calendar_cell::{CalendarService, CalendarUnavailable, FreeWindow, MockCalendarService};
use provider_cell::{DemoProviderDirectory, ProviderCache, ProviderDirectory};
use ranking_cell::distance::MockDistanceService;
use shared_config::AppConfig;
use shared_store::Store;
use swarm_domain::{AppointmentRequest, CallMode};
use voice_tools_cell::{dispatch_tool, ToolContext};

struct AlwaysUnavailable;

#[async_trait]
impl CalendarService for AlwaysUnavailable {
    async fn is_free(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<bool, CalendarUnavailable> {
        Err(CalendarUnavailable::new("offline"))
    }

    async fn available_slots(
        &self,
        _day: NaiveDate,
        _business_start_hour: u32,
        _business_end_hour: u32,
        _min_slot_minutes: i64,
        _tz: Tz,
    ) -> Result<Vec<FreeWindow>, CalendarUnavailable> {
        Err(CalendarUnavailable::new("offline"))
    }
}

fn test_config() -> Arc<AppConfig> {
    Arc::new(AppConfig {
        simulated_calls: true,
        default_timezone: "UTC".to_string(),
        max_providers_per_search: 15,
        store_path: "./data/store".to_string(),
        public_base_url: "http://localhost:8000".to_string(),
        twilio_account_sid: String::new(),
        twilio_auth_token: String::new(),
        twilio_caller_id: String::new(),
        elevenlabs_api_key: String::new(),
        elevenlabs_agent_id: String::new(),
        use_real_calendar: false,
        google_credentials_json: String::new(),
        google_calendar_id: "primary".to_string(),
        google_oauth_client_id: String::new(),
        google_oauth_client_secret: String::new(),
        use_google_places: false,
        google_places_api_key: String::new(),
        use_google_distance: false,
        google_maps_api_key: String::new(),
    })
}

fn test_request() -> AppointmentRequest {
    AppointmentRequest {
        service: "dentist".to_string(),
        location: "San Francisco, CA".to_string(),
        date_range_start: Utc::now(),
        date_range_end: Utc::now() + Duration::days(14),
        duration_min: 30,
        preferences: HashMap::new(),
        max_providers: 15,
        max_parallel: 5,
        max_travel_minutes: 0,
        provider_ids: Vec::new(),
        user_id: String::new(),
        timezone: "UTC".to_string(),
        call_mode: CallMode::Simulated,
        auto_book: true,
        client_name: String::new(),
        client_phone: String::new(),
    }
}

async fn ctx_with_calendar(
    calendar: Arc<dyn CalendarService>,
    campaign_id: String,
    store: Arc<Store>,
) -> ToolContext {
    let cache = Arc::new(ProviderCache::new());
    ToolContext {
        campaign_id,
        provider_id: String::new(),
        config: test_config(),
        store,
        calendar,
        distance: Arc::new(MockDistanceService),
        directory: Arc::new(DemoProviderDirectory::new(cache)),
    }
}

#[tokio::test]
async fn calendar_check_never_reports_free_when_calendar_unavailable() {
    let store = Arc::new(Store::new());
    let campaign = store.create_campaign(test_request()).await;
    let ctx = ctx_with_calendar(Arc::new(AlwaysUnavailable), campaign.campaign_id.clone(), store).await;

    let start = Utc::now() + Duration::days(1);
    let params = json!({
        "start": start.to_rfc3339(),
        "end": (start + Duration::minutes(30)).to_rfc3339(),
    });

    let (result, is_error) = dispatch_tool("calendar_check", params, &ctx).await;
    assert!(!is_error);
    assert_eq!(result["free"], json!(false));
    assert!(result.get("error").is_some());
}

#[tokio::test]
async fn validate_slot_never_reports_ok_when_calendar_unavailable() {
    let store = Arc::new(Store::new());
    let campaign = store.create_campaign(test_request()).await;
    let ctx = ctx_with_calendar(Arc::new(AlwaysUnavailable), campaign.campaign_id.clone(), store).await;

    let start = Utc::now() + Duration::days(1);
    let params = json!({
        "start": start.to_rfc3339(),
        "end": (start + Duration::minutes(30)).to_rfc3339(),
    });

    let (result, is_error) = dispatch_tool("validate_slot", params, &ctx).await;
    assert!(!is_error);
    assert_eq!(result["ok"], json!(false));
}

#[tokio::test]
async fn validate_slot_rejects_dates_outside_campaign_range() {
    let store = Arc::new(Store::new());
    let mut request = test_request();
    request.date_range_start = Utc::now();
    request.date_range_end = Utc::now() + Duration::days(3);
    let campaign = store.create_campaign(request).await;
    let ctx = ctx_with_calendar(
        Arc::new(MockCalendarService::new("UTC")),
        campaign.campaign_id.clone(),
        store,
    )
    .await;

    let start = Utc::now() + Duration::days(30);
    let params = json!({
        "start": start.to_rfc3339(),
        "end": (start + Duration::minutes(30)).to_rfc3339(),
    });

    let (result, is_error) = dispatch_tool("validate_slot", params, &ctx).await;
    assert!(!is_error);
    assert_eq!(result["ok"], json!(false));
    assert_eq!(result["reason"], json!("Slot is outside the requested date range"));
}

#[tokio::test]
async fn provider_lookup_infers_service_and_location_from_campaign() {
    let store = Arc::new(Store::new());
    let campaign = store.create_campaign(test_request()).await;
    let ctx = ctx_with_calendar(
        Arc::new(MockCalendarService::new("UTC")),
        campaign.campaign_id.clone(),
        store,
    )
    .await;

    let (result, is_error) = dispatch_tool("provider_lookup", json!({}), &ctx).await;
    assert!(!is_error);
    let providers = result["providers"].as_array().unwrap();
    assert!(!providers.is_empty());
}

#[tokio::test]
async fn log_event_always_succeeds() {
    let store = Arc::new(Store::new());
    let campaign = store.create_campaign(test_request()).await;
    let ctx = ctx_with_calendar(
        Arc::new(MockCalendarService::new("UTC")),
        campaign.campaign_id.clone(),
        store,
    )
    .await;

    let (result, is_error) = dispatch_tool(
        "log_event",
        json!({"message": "driver reached confirm step", "data": {"slot": "found"}}),
        &ctx,
    )
    .await;
    assert!(!is_error);
    assert_eq!(result["ok"], json!(true));
}

#[tokio::test]
async fn unknown_tool_is_an_error_without_panicking() {
    let store = Arc::new(Store::new());
    let campaign = store.create_campaign(test_request()).await;
    let ctx = ctx_with_calendar(
        Arc::new(MockCalendarService::new("UTC")),
        campaign.campaign_id.clone(),
        store,
    )
    .await;

    let (result, is_error) = dispatch_tool("reboot_universe", json!({}), &ctx).await;
    assert!(is_error);
    assert!(result["error"].as_str().unwrap().contains("Unknown tool"));
}
