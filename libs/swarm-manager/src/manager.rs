use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::json;
use tokio::sync::Semaphore;

use calendar_cell::{build_calendar_service, CalendarService};
use call_cell::{
    BookingCallDriver, DiscoveryCallDriver, NullTelephonyClient, RealBookingDriver,
    RealDiscoveryDriver, SimulatedBookingDriver, SimulatedDiscoveryDriver, TelephonyClient,
};
use provider_cell::{
    DemoProviderDirectory, ProviderCache, ProviderDirectory, ProviderError, RemoteProviderDirectory,
};
use ranking_cell::{rank_offers, DistanceService, MockDistanceService, RemoteDistanceService, Weights};
use shared_config::AppConfig;
use shared_store::Store;
use swarm_domain::{
    AppointmentRequest, BookingConfirmation, CallMode, CallOutcome, CallResult, Campaign,
    CampaignProgress, CampaignStatus, ConfirmRequest, ConfirmResponse, Provider, SlotOffer,
};

use crate::call_mode::{generate_confirmation_ref, resolve_call_mode};
use crate::error::ConfirmError;
use crate::progress::ProgressTracker;

/// Runs campaigns end to end: provider resolution, the bounded-parallel
/// discovery fan-out, ranking, and the booking retry phase. One instance is
/// shared by every campaign in the process — it owns no per-campaign state
/// itself, only the collaborators (directory/distance/telephony) selected
/// once at construction.
pub struct SwarmManager {
    store: Arc<Store>,
    config: Arc<AppConfig>,
    directory: Arc<dyn ProviderDirectory>,
    provider_cache: Arc<ProviderCache>,
    distance: Arc<dyn DistanceService>,
    telephony: Arc<dyn TelephonyClient>,
}

impl SwarmManager {
    pub fn new(store: Arc<Store>, config: Arc<AppConfig>) -> Self {
        let provider_cache = Arc::new(ProviderCache::new());

        let directory: Arc<dyn ProviderDirectory> =
            if config.use_google_places && !config.google_places_api_key.is_empty() {
                Arc::new(RemoteProviderDirectory::new(
                    config.google_places_api_key.clone(),
                    provider_cache.clone(),
                ))
            } else {
                Arc::new(DemoProviderDirectory::new(provider_cache.clone()))
            };

        let distance: Arc<dyn DistanceService> =
            if config.use_google_distance && !config.google_maps_api_key.is_empty() {
                Arc::new(RemoteDistanceService::new(config.google_maps_api_key.clone()))
            } else {
                Arc::new(MockDistanceService)
            };

        // Placing the outbound call itself is the out-of-scope vendor SDK
        // (spec.md §1); this stand-in fails cleanly so a misconfigured
        // `real`/`hybrid` campaign degrades to FAILED rather than hanging.
        let telephony: Arc<dyn TelephonyClient> = Arc::new(NullTelephonyClient);

        Self {
            store,
            config,
            directory,
            provider_cache,
            distance,
            telephony,
        }
    }

    /// Runs both phases of one campaign to a terminal (or `booked`) status.
    /// Spawned as a detached task by the caller; never returns a result —
    /// every outcome is recorded on the campaign itself.
    pub async fn run_campaign(&self, campaign_id: &str) {
        let Some(campaign) = self.store.get_campaign(campaign_id).await else {
            tracing::error!(campaign_id, "run_campaign: campaign not found");
            return;
        };
        let req = campaign.request.clone();
        let effective_mode = resolve_call_mode(req.call_mode, &self.config);
        tracing::info!(
            campaign_id,
            requested_mode = req.call_mode.as_str(),
            effective_mode = effective_mode.as_str(),
            "starting campaign"
        );

        let providers = match self.resolve_providers(&req).await {
            Ok(providers) => providers,
            Err(e) => {
                tracing::error!(campaign_id, "provider resolution failed: {}", e);
                let _ = self.store.set_status(campaign_id, CampaignStatus::Failed).await;
                return;
            }
        };

        let total = providers.len();
        let _ = self
            .store
            .set_providers(
                campaign_id,
                providers.clone(),
                CampaignProgress {
                    total_providers: total,
                    ..Default::default()
                },
            )
            .await;

        if providers.is_empty() {
            tracing::warn!(campaign_id, "no providers found; completing with no offers");
            let mut debug = HashMap::new();
            debug.insert(
                "note".to_string(),
                json!("no providers found for this service/location"),
            );
            let _ = self
                .store
                .set_ranking(campaign_id, Vec::new(), None, debug)
                .await;
            let _ = self.store.set_status(campaign_id, CampaignStatus::Completed).await;
            return;
        }

        let calendar = build_calendar_service(&req.user_id, &self.config, &self.store).await;
        let call_results = self
            .fan_out_discovery_calls(campaign_id, &campaign, &providers, effective_mode, calendar)
            .await;

        let (ranked, best, debug) = self
            .score_and_rank(&req, &providers, &call_results, effective_mode)
            .await;

        let all_failed = !call_results.is_empty()
            && call_results.iter().all(|r| {
                matches!(
                    r.outcome,
                    CallOutcome::Failed
                        | CallOutcome::NoAnswer
                        | CallOutcome::Busy
                        | CallOutcome::NoSlots
                )
            });
        let status = if ranked.is_empty() && all_failed {
            CampaignStatus::Failed
        } else {
            CampaignStatus::Running
        };

        let _ = self
            .store
            .set_ranking(campaign_id, ranked.clone(), best.clone(), debug)
            .await;
        let _ = self.store.set_status(campaign_id, status).await;

        tracing::info!(
            campaign_id,
            offers = ranked.len(),
            best = ?best.as_ref().map(|b| b.provider_id.clone()),
            auto_book = req.auto_book,
            "discovery phase finished"
        );

        if status == CampaignStatus::Running {
            if !ranked.is_empty() && req.auto_book {
                self.run_booking_phase(campaign_id, &ranked).await;
            } else {
                let _ = self.store.set_status(campaign_id, CampaignStatus::Completed).await;
            }
        }
    }

    async fn resolve_providers(
        &self,
        req: &AppointmentRequest,
    ) -> Result<Vec<Provider>, ProviderError> {
        if !req.provider_ids.is_empty() {
            if let Some(cached) = self.provider_cache.get_cached(&req.provider_ids) {
                tracing::info!(
                    "reusing {} cached provider(s) for allow-listed campaign",
                    cached.len()
                );
                return Ok(self.apply_travel_filter(req, cached).await);
            }
        }

        let mut found = self
            .directory
            .search(&req.service, &req.location, None, None)
            .await?;
        found.truncate(req.max_providers.max(1));

        if !req.provider_ids.is_empty() {
            let allow: HashSet<&String> = req.provider_ids.iter().collect();
            found.retain(|p| allow.contains(&p.id));
        }

        Ok(self.apply_travel_filter(req, found).await)
    }

    async fn apply_travel_filter(&self, req: &AppointmentRequest, providers: Vec<Provider>) -> Vec<Provider> {
        if req.max_travel_minutes <= 0 {
            return providers;
        }
        let mut filtered = Vec::with_capacity(providers.len());
        for p in providers {
            let minutes = self.distance.estimate_travel_minutes(&req.location, &p).await;
            if minutes <= req.max_travel_minutes {
                filtered.push(p);
            }
        }
        filtered
    }

    async fn fan_out_discovery_calls(
        &self,
        campaign_id: &str,
        campaign: &Campaign,
        providers: &[Provider],
        effective_mode: CallMode,
        calendar: Arc<dyn CalendarService>,
    ) -> Vec<CallResult> {
        let semaphore = Arc::new(Semaphore::new(campaign.request.max_parallel.max(1)));
        let progress = Arc::new(ProgressTracker::new(
            self.store.clone(),
            campaign_id.to_string(),
            providers.len(),
        ));

        let mut tasks = FuturesUnordered::new();
        for (idx, provider) in providers.iter().cloned().enumerate() {
            let use_real = effective_mode == CallMode::Real
                || (effective_mode == CallMode::Hybrid && idx == 0);
            let semaphore = semaphore.clone();
            let progress = progress.clone();
            let campaign = campaign.clone();
            let config = self.config.clone();
            let store = self.store.clone();
            let telephony = self.telephony.clone();
            let calendar = calendar.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                progress.call_started().await;

                let driver: Box<dyn DiscoveryCallDriver> = if use_real {
                    Box::new(RealDiscoveryDriver { store, telephony })
                } else {
                    Box::new(SimulatedDiscoveryDriver { calendar, config })
                };
                let timeout = if use_real {
                    Duration::from_secs(300)
                } else {
                    Duration::from_secs(30)
                };

                let result = match tokio::time::timeout(timeout, driver.call(&provider, &campaign)).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(provider_id = %provider.id, "discovery call timed out");
                        CallResult {
                            provider_id: provider.id.clone(),
                            outcome: CallOutcome::Failed,
                            notes: "call timed out".to_string(),
                            ..Default::default()
                        }
                    }
                };

                progress.call_finished().await;
                result
            }));
        }

        let mut call_results = Vec::with_capacity(providers.len());
        let (mut completed, mut successful, mut failed) = (0usize, 0usize, 0usize);

        while let Some(joined) = tasks.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("discovery call task panicked: {}", e);
                    CallResult {
                        outcome: CallOutcome::Failed,
                        notes: "unexpected error during call".to_string(),
                        ..Default::default()
                    }
                }
            };

            completed += 1;
            match result.outcome {
                CallOutcome::Success => successful += 1,
                CallOutcome::Failed | CallOutcome::NoAnswer | CallOutcome::Busy | CallOutcome::NoSlots => {
                    failed += 1
                }
                _ => {}
            }
            call_results.push(result);

            let progress_snapshot = CampaignProgress {
                total_providers: providers.len(),
                calls_in_progress: progress.in_progress().await,
                completed_calls: completed,
                successful_calls: successful,
                failed_calls: failed,
            };
            let _ = self
                .store
                .set_progress_and_results(campaign_id, call_results.clone(), progress_snapshot)
                .await;
        }

        call_results
    }

    async fn score_and_rank(
        &self,
        req: &AppointmentRequest,
        providers: &[Provider],
        call_results: &[CallResult],
        effective_mode: CallMode,
    ) -> (Vec<SlotOffer>, Option<SlotOffer>, HashMap<String, serde_json::Value>) {
        let providers_by_id: HashMap<String, Provider> =
            providers.iter().map(|p| (p.id.clone(), p.clone())).collect();

        let mut travel_by_provider = HashMap::with_capacity(providers.len());
        for p in providers {
            let minutes = self.distance.estimate_travel_minutes(&req.location, p).await;
            travel_by_provider.insert(p.id.clone(), minutes);
        }

        let offers: Vec<SlotOffer> = call_results.iter().flat_map(|r| r.offers.clone()).collect();
        let weights = Weights::from_preferences(&req.preferences);
        let (ranked, scoring_debug) = rank_offers(
            offers,
            &providers_by_id,
            &travel_by_provider,
            weights,
            req.date_range_start,
            req.date_range_end,
        );
        let best = ranked.first().cloned();

        let outcomes: HashMap<String, String> = call_results
            .iter()
            .map(|r| (r.provider_id.clone(), r.outcome.as_str().to_string()))
            .collect();

        let mut debug = HashMap::new();
        debug.insert("call_mode".to_string(), json!(effective_mode.as_str()));
        debug.insert("provider_outcomes".to_string(), json!(outcomes));
        debug.insert("scoring".to_string(), json!(scoring_debug));

        (ranked, best, debug)
    }

    /// Retries the top-3 ranked offers in order, stopping at the first
    /// `BOOKING_CONFIRMED`. Matches `_run_booking_phase`: status flips to
    /// `booking` before the first attempt, and falls back to `completed`
    /// (never `failed`) if every candidate is exhausted.
    async fn run_booking_phase(&self, campaign_id: &str, ranked: &[SlotOffer]) {
        let Ok(campaign) = self.store.set_status(campaign_id, CampaignStatus::Booking).await else {
            return;
        };
        let attempts = ranked.len().min(3);
        tracing::info!(campaign_id, attempts, "entering booking phase");

        let effective_mode = resolve_call_mode(campaign.request.call_mode, &self.config);
        let provider_phone_by_id: HashMap<String, String> = campaign
            .providers
            .iter()
            .map(|p| (p.id.clone(), p.phone.clone()))
            .collect();

        for (idx, offer) in ranked.iter().take(attempts).enumerate() {
            tracing::info!(
                campaign_id,
                attempt = idx + 1,
                attempts,
                provider_id = %offer.provider_id,
                "booking attempt"
            );

            let driver: Box<dyn BookingCallDriver> = if effective_mode == CallMode::Real {
                Box::new(RealBookingDriver {
                    store: self.store.clone(),
                    telephony: self.telephony.clone(),
                    provider_phone_by_id: provider_phone_by_id.clone(),
                })
            } else {
                Box::new(SimulatedBookingDriver)
            };

            let result = match tokio::time::timeout(Duration::from_secs(30), driver.call(offer, &campaign)).await
            {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(campaign_id, provider_id = %offer.provider_id, "booking call timed out");
                    continue;
                }
            };

            if result.outcome == CallOutcome::BookingConfirmed {
                let confirmation = BookingConfirmation {
                    provider_id: offer.provider_id.clone(),
                    start: offer.start,
                    end: offer.end,
                    confirmation_ref: generate_confirmation_ref(),
                    confirmed_at: Utc::now(),
                    notes: result.notes.clone(),
                    client_name: campaign.request.client_name.clone(),
                    client_phone: campaign.request.client_phone.clone(),
                };
                let _ = self.store.set_booking(campaign_id, confirmation.clone()).await;
                let _ = self.store.set_status(campaign_id, CampaignStatus::Booked).await;
                tracing::info!(
                    campaign_id,
                    provider_id = %offer.provider_id,
                    confirmation_ref = %confirmation.confirmation_ref,
                    "booking confirmed"
                );
                return;
            }

            tracing::info!(
                campaign_id,
                provider_id = %offer.provider_id,
                "booking rejected, trying next candidate"
            );
        }

        tracing::warn!(campaign_id, "booking phase exhausted all candidates");
        let _ = self.store.set_status(campaign_id, CampaignStatus::Completed).await;
    }

    /// Re-validates the slot against the calendar (fail-closed) and, if
    /// still free, issues a fresh confirmation reference. Never mutates
    /// campaign status — this is a caller-driven confirmation, not part of
    /// the campaign's own state machine.
    pub async fn confirm_slot(
        &self,
        campaign_id: &str,
        req: ConfirmRequest,
    ) -> Result<ConfirmResponse, ConfirmError> {
        let campaign = self
            .store
            .get_campaign(campaign_id)
            .await
            .ok_or_else(|| ConfirmError::CampaignNotFound(campaign_id.to_string()))?;

        let slot_matches = campaign
            .ranked
            .iter()
            .any(|o| o.provider_id == req.provider_id && o.start == req.start && o.end == req.end);
        if !slot_matches {
            return Err(ConfirmError::SlotNotRanked);
        }

        let calendar = build_calendar_service(&campaign.request.user_id, &self.config, &self.store).await;
        match calendar.is_free(req.start, req.end).await {
            Ok(true) => {}
            Ok(false) => return Err(ConfirmError::SlotConflict),
            Err(_) => return Err(ConfirmError::CalendarUnavailable),
        }

        Ok(ConfirmResponse {
            campaign_id: campaign_id.to_string(),
            confirmed: true,
            confirmation_ref: generate_confirmation_ref(),
        })
    }

    pub fn provider_cache(&self) -> Arc<ProviderCache> {
        self.provider_cache.clone()
    }

    pub fn directory(&self) -> Arc<dyn ProviderDirectory> {
        self.directory.clone()
    }

    pub fn distance(&self) -> Arc<dyn DistanceService> {
        self.distance.clone()
    }
}
