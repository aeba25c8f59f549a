use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};

use shared_config::AppConfig;
use shared_store::Store;
use swarm_domain::{AppointmentRequest, CallMode, CampaignStatus, ConfirmRequest, UserContact};
use swarm_manager::{ConfirmError, SwarmManager};

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

fn request(provider_ids: Vec<String>, call_mode: CallMode, auto_book: bool) -> AppointmentRequest {
    AppointmentRequest {
        service: "dentist".to_string(),
        location: "San Francisco, CA".to_string(),
        date_range_start: Utc::now(),
        date_range_end: Utc::now() + Duration::days(10),
        duration_min: 30,
        preferences: HashMap::new(),
        max_providers: 5,
        max_parallel: 5,
        max_travel_minutes: 0,
        provider_ids,
        user_id: String::new(),
        timezone: "UTC".to_string(),
        call_mode,
        auto_book,
        client_name: "Jamie Rivera".to_string(),
        client_phone: "+14155550199".to_string(),
    }
}

/// `^CONF-[0-9A-F]{8}$`, checked without pulling in a regex dependency.
fn looks_like_confirmation_ref(s: &str) -> bool {
    s.strip_prefix("CONF-")
        .map(|rest| rest.len() == 8 && rest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()))
        .unwrap_or(false)
}

fn provider(id: &str) -> swarm_domain::Provider {
    swarm_domain::Provider {
        id: id.to_string(),
        name: format!("{id} Dental"),
        phone: "+14155550000".to_string(),
        address: "1 Main St, San Francisco, CA".to_string(),
        rating: 4.5,
        lat: 37.77,
        lng: -122.42,
        services: vec!["dentist".to_string()],
    }
}

/// E5: priming the by-id cache with an allow-listed campaign's providers
/// must skip the directory search entirely — the campaign's provider
/// snapshot is exactly the cached set, not a fresh lookup.
#[tokio::test(start_paused = true)]
async fn allow_list_reuse_skips_directory_search() {
    let store = Arc::new(Store::new());
    let manager = SwarmManager::new(store.clone(), test_config());
    manager
        .provider_cache()
        .insert_all(&[provider("cached-a"), provider("cached-b")]);

    let req = request(
        vec!["cached-a".to_string(), "cached-b".to_string()],
        CallMode::Simulated,
        false,
    );
    let campaign = store.create_campaign(req).await;

    manager.run_campaign(&campaign.campaign_id).await;

    let finished = store.get_campaign(&campaign.campaign_id).await.unwrap();
    assert_eq!(finished.providers.len(), 2);
    let ids: Vec<&str> = finished.providers.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["cached-a", "cached-b"]);
}

/// E6: hybrid mode places exactly one discovery call through the real
/// driver (the first provider by index) and the rest through the
/// simulated driver. With no telephony collaborator configured, the real
/// driver fails immediately with a distinctive message we can key on.
#[tokio::test(start_paused = true)]
async fn hybrid_mode_sends_exactly_one_call_through_the_real_driver() {
    let store = Arc::new(Store::new());
    let manager = SwarmManager::new(store.clone(), test_config());
    let ids = vec!["hy-a".to_string(), "hy-b".to_string(), "hy-c".to_string()];
    manager.provider_cache().insert_all(
        &ids.iter().map(|id| provider(id)).collect::<Vec<_>>(),
    );

    let req = request(ids.clone(), CallMode::Hybrid, false);
    let campaign = store.create_campaign(req).await;

    manager.run_campaign(&campaign.campaign_id).await;

    let finished = store.get_campaign(&campaign.campaign_id).await.unwrap();
    assert_eq!(finished.call_results.len(), 3);

    let real_driver_failures: Vec<_> = finished
        .call_results
        .iter()
        .filter(|r| r.notes == "no telephony collaborator configured")
        .collect();
    assert_eq!(real_driver_failures.len(), 1, "exactly one call should have gone through the real driver");
    assert_eq!(real_driver_failures[0].provider_id, "hy-a");
}

/// Universal property 5: in_progress + completed <= total at every
/// publication, and a terminal campaign always settles at in_progress == 0
/// with completed == total.
#[tokio::test(start_paused = true)]
async fn progress_invariants_hold_after_a_completed_campaign() {
    let store = Arc::new(Store::new());
    let manager = SwarmManager::new(store.clone(), test_config());
    let ids = vec!["pg-a".to_string(), "pg-b".to_string(), "pg-c".to_string()];
    manager.provider_cache().insert_all(
        &ids.iter().map(|id| provider(id)).collect::<Vec<_>>(),
    );

    let req = request(ids, CallMode::Simulated, false);
    let campaign = store.create_campaign(req).await;
    manager.run_campaign(&campaign.campaign_id).await;

    let finished = store.get_campaign(&campaign.campaign_id).await.unwrap();
    let progress = finished.progress;
    assert_eq!(progress.calls_in_progress, 0);
    assert_eq!(progress.completed_calls, progress.total_providers);
    assert!(progress.successful_calls + progress.failed_calls <= progress.completed_calls);
    assert!(finished.status.is_terminal());
}

/// State machine legality (property 6) plus confirmation-ref shape
/// (property 8), exercised end to end through a full two-phase run.
#[tokio::test(start_paused = true)]
async fn full_campaign_with_auto_book_reaches_a_legal_terminal_state() {
    let store = Arc::new(Store::new());
    let manager = SwarmManager::new(store.clone(), test_config());

    let req = request(Vec::new(), CallMode::Simulated, true);
    let campaign = store.create_campaign(req).await;
    manager.run_campaign(&campaign.campaign_id).await;

    let finished = store.get_campaign(&campaign.campaign_id).await.unwrap();
    assert!(matches!(
        finished.status,
        CampaignStatus::Booked | CampaignStatus::Completed | CampaignStatus::Failed
    ));

    if finished.status == CampaignStatus::Booked {
        let booking = finished.booking.expect("booked campaign has a confirmation");
        assert!(looks_like_confirmation_ref(&booking.confirmation_ref));
        assert!(finished.ranked.iter().any(|o| o.provider_id == booking.provider_id));
    }
}

/// Confirm-slot re-validates the calendar and is strict about only
/// confirming offers the campaign itself ranked.
#[tokio::test(start_paused = true)]
async fn confirm_slot_rejects_an_offer_that_was_never_ranked() {
    let store = Arc::new(Store::new());
    let manager = SwarmManager::new(store.clone(), test_config());
    let req = request(Vec::new(), CallMode::Simulated, false);
    let campaign = store.create_campaign(req).await;

    let result = manager
        .confirm_slot(
            &campaign.campaign_id,
            ConfirmRequest {
                provider_id: "ghost".to_string(),
                start: Utc::now() + Duration::days(1),
                end: Utc::now() + Duration::days(1) + Duration::minutes(30),
                user_contact: UserContact {
                    name: "Jamie".to_string(),
                    phone: "+14155550199".to_string(),
                },
            },
        )
        .await;

    assert!(matches!(result, Err(ConfirmError::SlotNotRanked)));
}

#[tokio::test(start_paused = true)]
async fn confirm_slot_succeeds_for_a_still_free_ranked_offer() {
    let store = Arc::new(Store::new());
    let manager = SwarmManager::new(store.clone(), test_config());
    let req = request(Vec::new(), CallMode::Simulated, false);
    let campaign = store.create_campaign(req).await;

    // A window clearly outside the mock calendar's lunch/extra busy blocks.
    let start = Utc::now()
        .date_naive()
        .succ_opt()
        .unwrap()
        .and_hms_opt(6, 0, 0)
        .unwrap()
        .and_utc();
    let end = start + Duration::minutes(30);
    let offer = swarm_domain::SlotOffer {
        provider_id: "p1".to_string(),
        start,
        end,
        notes: String::new(),
        confidence: 0.9,
        score: Some(1.0),
    };
    store
        .set_ranking(&campaign.campaign_id, vec![offer.clone()], Some(offer.clone()), HashMap::new())
        .await
        .unwrap();

    let result = manager
        .confirm_slot(
            &campaign.campaign_id,
            ConfirmRequest {
                provider_id: "p1".to_string(),
                start,
                end,
                user_contact: UserContact {
                    name: "Jamie".to_string(),
                    phone: "+14155550199".to_string(),
                },
            },
        )
        .await
        .expect("slot should still be free");

    assert!(result.confirmed);
    assert!(looks_like_confirmation_ref(&result.confirmation_ref));

    // Confirming doesn't touch campaign status.
    let campaign_after = store.get_campaign(&campaign.campaign_id).await.unwrap();
    assert_eq!(campaign_after.status, CampaignStatus::Running);
}

#[tokio::test]
async fn confirm_slot_on_an_unknown_campaign_is_not_found() {
    let store = Arc::new(Store::new());
    let manager = SwarmManager::new(store, test_config());

    let result = manager
        .confirm_slot(
            "does-not-exist",
            ConfirmRequest {
                provider_id: "p1".to_string(),
                start: Utc::now(),
                end: Utc::now() + Duration::minutes(30),
                user_contact: UserContact {
                    name: "Jamie".to_string(),
                    phone: "+14155550199".to_string(),
                },
            },
        )
        .await;

    assert!(matches!(result, Err(ConfirmError::CampaignNotFound(_))));
}
