use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use swarm_domain::{Campaign, CallOutcome, CallResult, SlotOffer};

use crate::discovery::place_and_wait;
use crate::telephony::TelephonyClient;

fn digest_for(key: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.finalize().into()
}

/// `S mod modulus` over the full 256-bit digest, not just a 64-bit prefix —
/// see `call_cell::discovery::digest_mod_u64`.
fn digest_mod_u64(digest: &[u8; 32], modulus: u64) -> u64 {
    digest
        .iter()
        .fold(0u64, |acc, &b| (acc * 256 + b as u64) % modulus)
}

/// Calls a provider back to confirm or reject a previously offered slot.
#[async_trait]
pub trait BookingCallDriver: Send + Sync {
    async fn call(&self, offer: &SlotOffer, campaign: &Campaign) -> CallResult;
}

/// Deterministic simulated booking callback: ~90% confirm, ~10% reject.
pub struct SimulatedBookingDriver;

#[async_trait]
impl BookingCallDriver for SimulatedBookingDriver {
    async fn call(&self, offer: &SlotOffer, _campaign: &Campaign) -> CallResult {
        let key = format!("{}:{}:book", offer.provider_id, offer.start.to_rfc3339());
        let digest = digest_for(&key);

        tokio::time::sleep(StdDuration::from_secs_f64(
            4.0 + (digest_mod_u64(&digest, 3)) as f64 * 1.5,
        ))
        .await;

        if digest_mod_u64(&digest, 10) == 0 {
            CallResult {
                provider_id: offer.provider_id.clone(),
                outcome: CallOutcome::BookingRejected,
                notes: format!(
                    "Simulated: {} said the slot is no longer available",
                    offer.provider_id
                ),
                ..Default::default()
            }
        } else {
            CallResult {
                provider_id: offer.provider_id.clone(),
                outcome: CallOutcome::BookingConfirmed,
                notes: format!(
                    "Simulated: confirmed {} with {}",
                    offer.start.to_rfc3339(),
                    offer.provider_id
                ),
                ..Default::default()
            }
        }
    }
}

/// Real booking callback: same telephony/signal mechanism as discovery
/// calls, placed against the provider being confirmed.
pub struct RealBookingDriver {
    pub store: Arc<shared_store::Store>,
    pub telephony: Arc<dyn TelephonyClient>,
    pub provider_phone_by_id: std::collections::HashMap<String, String>,
}

#[async_trait]
impl BookingCallDriver for RealBookingDriver {
    async fn call(&self, offer: &SlotOffer, campaign: &Campaign) -> CallResult {
        let phone = self
            .provider_phone_by_id
            .get(&offer.provider_id)
            .cloned()
            .unwrap_or_default();

        match place_and_wait(
            &self.store,
            &self.telephony,
            &phone,
            &campaign.campaign_id,
            &offer.provider_id,
        )
        .await
        {
            Ok(result) => result,
            Err(e) => CallResult {
                provider_id: offer.provider_id.clone(),
                outcome: CallOutcome::Failed,
                notes: e.0,
                ..Default::default()
            },
        }
    }
}
