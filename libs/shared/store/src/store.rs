use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use swarm_domain::{
    AppointmentRequest, Campaign, CallResult, CampaignProgress, CampaignStatus, OAuthToken,
    SlotOffer,
};

use crate::error::StoreError;
use crate::persistence::PersistenceSink;
use crate::signal::CallSignal;

/// Maps a telephony call id to its campaign/provider context and the
/// single-shot completion signal the media bridge fulfills.
pub struct CallMapping {
    pub call_id: String,
    pub campaign_id: String,
    pub provider_id: String,
    pub stream_sid: String,
    pub signal: Arc<CallSignal>,
}

/// Thread-safe in-memory store for campaign and call state, optionally
/// mirrored to a [`PersistenceSink`] for durability across restarts.
pub struct Store {
    campaigns: Mutex<HashMap<String, Campaign>>,
    calls: Mutex<HashMap<String, CallMapping>>,
    oauth_tokens: Mutex<HashMap<String, OAuthToken>>,
    oauth_refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    sink: Option<Arc<dyn PersistenceSink>>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            campaigns: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            oauth_tokens: Mutex::new(HashMap::new()),
            oauth_refresh_locks: Mutex::new(HashMap::new()),
            sink: None,
        }
    }

    pub fn with_sink(sink: Arc<dyn PersistenceSink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::new()
        }
    }

    /// Reloads persisted state at startup. Any campaign still `running` or
    /// `booking` could not have survived the restart of its driving task,
    /// so it is rewritten to `failed`.
    pub async fn reload_from_sink(&self) -> Result<(), StoreError> {
        let Some(sink) = &self.sink else {
            return Ok(());
        };

        let campaigns = sink.load_all_campaigns().await?;
        let mut guard = self.campaigns.lock().await;
        for mut campaign in campaigns {
            if matches!(
                campaign.status,
                CampaignStatus::Running | CampaignStatus::Booking
            ) {
                warn!(
                    "campaign {} was mid-flight at shutdown; marking failed",
                    campaign.campaign_id
                );
                campaign.status = CampaignStatus::Failed;
                campaign.updated_at = Utc::now();
                sink.save_campaign(&campaign).await?;
            }
            guard.insert(campaign.campaign_id.clone(), campaign);
        }
        drop(guard);

        let tokens = sink.load_all_oauth_tokens().await?;
        let mut oauth_guard = self.oauth_tokens.lock().await;
        for token in tokens {
            oauth_guard.insert(token.user_id.clone(), token);
        }
        info!(
            "reloaded {} campaign(s) and {} oauth token(s) from disk",
            self.campaigns.lock().await.len(),
            oauth_guard.len()
        );
        Ok(())
    }

    async fn persist(&self, campaign: &Campaign) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.save_campaign(campaign).await {
                warn!(
                    "failed to persist campaign {}: {}",
                    campaign.campaign_id, e
                );
            }
        }
    }

    // ----- Campaign helpers -------------------------------------------

    pub async fn create_campaign(&self, request: AppointmentRequest) -> Campaign {
        let campaign_id = Uuid::new_v4().simple().to_string()[..12].to_string();
        let campaign = Campaign::new(campaign_id.clone(), request);
        let mut guard = self.campaigns.lock().await;
        guard.insert(campaign_id, campaign.clone());
        drop(guard);
        self.persist(&campaign).await;
        campaign
    }

    pub async fn get_campaign(&self, campaign_id: &str) -> Option<Campaign> {
        self.campaigns.lock().await.get(campaign_id).cloned()
    }

    async fn mutate<F>(&self, campaign_id: &str, f: F) -> Result<Campaign, StoreError>
    where
        F: FnOnce(&mut Campaign),
    {
        let mut guard = self.campaigns.lock().await;
        let campaign = guard
            .get_mut(campaign_id)
            .ok_or_else(|| StoreError::CampaignNotFound(campaign_id.to_string()))?;
        f(campaign);
        campaign.updated_at = Utc::now();
        let snapshot = campaign.clone();
        drop(guard);
        self.persist(&snapshot).await;
        Ok(snapshot)
    }

    pub async fn set_status(
        &self,
        campaign_id: &str,
        status: CampaignStatus,
    ) -> Result<Campaign, StoreError> {
        let mut guard = self.campaigns.lock().await;
        let campaign = guard
            .get_mut(campaign_id)
            .ok_or_else(|| StoreError::CampaignNotFound(campaign_id.to_string()))?;
        if !campaign.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: campaign.status,
                to: status,
            });
        }
        campaign.status = status;
        campaign.updated_at = Utc::now();
        let snapshot = campaign.clone();
        drop(guard);
        self.persist(&snapshot).await;
        Ok(snapshot)
    }

    pub async fn set_providers(
        &self,
        campaign_id: &str,
        providers: Vec<swarm_domain::Provider>,
        progress: CampaignProgress,
    ) -> Result<Campaign, StoreError> {
        self.mutate(campaign_id, |c| {
            c.providers = providers;
            c.progress = progress;
        })
        .await
    }

    /// Updates just the progress counters, leaving `call_results` untouched.
    /// Used for the "call started" tick, which doesn't yet have a result.
    pub async fn set_progress(
        &self,
        campaign_id: &str,
        progress: CampaignProgress,
    ) -> Result<Campaign, StoreError> {
        self.mutate(campaign_id, |c| {
            c.progress = progress;
        })
        .await
    }

    pub async fn set_progress_and_results(
        &self,
        campaign_id: &str,
        call_results: Vec<CallResult>,
        progress: CampaignProgress,
    ) -> Result<Campaign, StoreError> {
        self.mutate(campaign_id, |c| {
            c.call_results = call_results;
            c.progress = progress;
        })
        .await
    }

    pub async fn set_ranking(
        &self,
        campaign_id: &str,
        ranked: Vec<SlotOffer>,
        best: Option<SlotOffer>,
        debug: HashMap<String, serde_json::Value>,
    ) -> Result<Campaign, StoreError> {
        self.mutate(campaign_id, |c| {
            c.ranked = ranked;
            c.best = best;
            c.debug = debug;
        })
        .await
    }

    pub async fn set_booking(
        &self,
        campaign_id: &str,
        booking: swarm_domain::BookingConfirmation,
    ) -> Result<Campaign, StoreError> {
        self.mutate(campaign_id, |c| {
            c.booking = Some(booking);
        })
        .await
    }

    // ----- Call helpers --------------------------------------------------

    pub async fn register_call(
        &self,
        call_id: String,
        campaign_id: String,
        provider_id: String,
    ) -> Arc<CallSignal> {
        let signal = Arc::new(CallSignal::new());
        let mapping = CallMapping {
            call_id: call_id.clone(),
            campaign_id,
            provider_id,
            stream_sid: String::new(),
            signal: signal.clone(),
        };
        self.calls.lock().await.insert(call_id, mapping);
        signal
    }

    pub async fn get_call_signal(&self, call_id: &str) -> Option<Arc<CallSignal>> {
        self.calls
            .lock()
            .await
            .get(call_id)
            .map(|m| m.signal.clone())
    }

    pub async fn complete_call(&self, call_id: &str, result: CallResult) {
        let signal = self.calls.lock().await.get(call_id).map(|m| m.signal.clone());
        match signal {
            Some(signal) => signal.fulfill(result).await,
            None => warn!("complete_call for unknown call id {}", call_id),
        }
    }

    // ----- OAuth token helpers --------------------------------------------

    pub async fn save_oauth_token(&self, token: OAuthToken) -> Result<(), StoreError> {
        if let Some(sink) = &self.sink {
            sink.save_oauth_token(&token).await?;
        }
        self.oauth_tokens
            .lock()
            .await
            .insert(token.user_id.clone(), token);
        Ok(())
    }

    pub async fn get_oauth_token(&self, user_id: &str) -> Option<OAuthToken> {
        self.oauth_tokens.lock().await.get(user_id).cloned()
    }

    /// Picks any linked account for single-user demo setups where the
    /// campaign didn't specify `user_id` explicitly.
    pub async fn any_oauth_token(&self) -> Option<OAuthToken> {
        self.oauth_tokens.lock().await.values().next().cloned()
    }

    pub async fn delete_oauth_token(&self, user_id: &str) -> Result<(), StoreError> {
        if let Some(sink) = &self.sink {
            sink.delete_oauth_token(user_id).await?;
        }
        self.oauth_tokens.lock().await.remove(user_id);
        Ok(())
    }

    /// Returns the per-user mutex that serialises concurrent token refresh
    /// attempts, so two 401s racing for the same user don't both refresh.
    pub async fn oauth_refresh_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut guard = self.oauth_refresh_locks.lock().await;
        guard
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
