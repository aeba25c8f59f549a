use std::sync::Arc;

use tokio::sync::Mutex;

use shared_store::Store;
use swarm_domain::CampaignProgress;

/// Tracks how many discovery calls are in flight for one campaign and keeps
/// the store's progress snapshot current as calls start and finish.
///
/// Mirrors the original's `_ProgressTracker`: `calls_in_progress` is owned
/// here; `completed_calls`/`successful_calls`/`failed_calls` are owned by the
/// fan-in loop in [`crate::manager::SwarmManager::run_campaign`] and passed
/// in on every tick, since only that loop knows an outcome as it lands.
pub struct ProgressTracker {
    store: Arc<Store>,
    campaign_id: String,
    total: usize,
    in_progress: Mutex<usize>,
}

impl ProgressTracker {
    pub fn new(store: Arc<Store>, campaign_id: String, total: usize) -> Self {
        Self {
            store,
            campaign_id,
            total,
            in_progress: Mutex::new(0),
        }
    }

    pub async fn in_progress(&self) -> usize {
        *self.in_progress.lock().await
    }

    pub async fn call_started(&self) {
        let count = {
            let mut guard = self.in_progress.lock().await;
            *guard += 1;
            *guard
        };
        let Some(campaign) = self.store.get_campaign(&self.campaign_id).await else {
            return;
        };
        let progress = CampaignProgress {
            total_providers: self.total,
            calls_in_progress: count,
            ..campaign.progress
        };
        let _ = self.store.set_progress(&self.campaign_id, progress).await;
    }

    pub async fn call_finished(&self) {
        let mut guard = self.in_progress.lock().await;
        *guard = guard.saturating_sub(1);
    }
}
