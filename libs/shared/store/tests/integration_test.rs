use std::sync::Arc;

use chrono::{Duration, Utc};
use shared_store::{JsonFileSink, Store};
use swarm_domain::{AppointmentRequest, CallMode, CallOutcome, CallResult, CampaignStatus};

fn sample_request() -> AppointmentRequest {
    AppointmentRequest {
        service: "dentist".to_string(),
        location: "Seattle, WA".to_string(),
        date_range_start: Utc::now(),
        date_range_end: Utc::now() + Duration::days(7),
        duration_min: 30,
        preferences: Default::default(),
        max_providers: 15,
        max_parallel: 5,
        max_travel_minutes: 0,
        provider_ids: Vec::new(),
        user_id: String::new(),
        timezone: String::new(),
        call_mode: CallMode::Simulated,
        auto_book: true,
        client_name: "Jamie".to_string(),
        client_phone: "+15551234567".to_string(),
    }
}

#[tokio::test]
async fn create_and_fetch_campaign_round_trips() {
    let store = Store::new();
    let campaign = store.create_campaign(sample_request()).await;

    let fetched = store.get_campaign(&campaign.campaign_id).await.unwrap();
    assert_eq!(fetched.status, CampaignStatus::Running);
    assert_eq!(fetched.request.service, "dentist");
}

#[tokio::test]
async fn illegal_status_transition_is_rejected() {
    let store = Store::new();
    let campaign = store.create_campaign(sample_request()).await;

    store
        .set_status(&campaign.campaign_id, CampaignStatus::Completed)
        .await
        .unwrap();

    let err = store
        .set_status(&campaign.campaign_id, CampaignStatus::Booking)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        shared_store::StoreError::InvalidTransition { .. }
    ));
}

#[tokio::test]
async fn call_signal_is_idempotent_and_wakes_waiter() {
    let store = Arc::new(Store::new());
    let campaign = store.create_campaign(sample_request()).await;
    let signal = store
        .register_call(
            "call-1".to_string(),
            campaign.campaign_id.clone(),
            "provider-1".to_string(),
        )
        .await;

    let waiter_store = store.clone();
    let waiter = tokio::spawn(async move {
        let signal = waiter_store.get_call_signal("call-1").await.unwrap();
        signal.wait().await
    });

    store
        .complete_call(
            "call-1",
            CallResult {
                provider_id: "provider-1".to_string(),
                outcome: CallOutcome::Success,
                ..Default::default()
            },
        )
        .await;

    // A second completion is a no-op; the first result must stick.
    store
        .complete_call(
            "call-1",
            CallResult {
                provider_id: "provider-1".to_string(),
                outcome: CallOutcome::Failed,
                ..Default::default()
            },
        )
        .await;

    let result = waiter.await.unwrap();
    assert_eq!(result.outcome, CallOutcome::Success);
    assert!(signal.is_fulfilled().await);
}

#[tokio::test]
async fn json_file_sink_persists_and_reloads_campaigns() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(JsonFileSink::new(dir.path()));
    let store = Store::with_sink(sink.clone());

    let campaign = store.create_campaign(sample_request()).await;
    store
        .set_status(&campaign.campaign_id, CampaignStatus::Booking)
        .await
        .unwrap();

    // Fresh store simulating a process restart.
    let reloaded_store = Store::with_sink(sink);
    reloaded_store.reload_from_sink().await.unwrap();

    let reloaded = reloaded_store
        .get_campaign(&campaign.campaign_id)
        .await
        .unwrap();
    // Mid-flight campaigns are not trusted after a restart.
    assert_eq!(reloaded.status, CampaignStatus::Failed);
}
