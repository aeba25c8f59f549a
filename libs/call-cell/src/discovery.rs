use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Timelike, Utc};
use sha2::{Digest, Sha256};

use calendar_cell::{resolve_tz, CalendarService};
use shared_config::AppConfig;
use swarm_domain::{Campaign, CallOutcome, CallResult, Provider, SlotOffer};

use crate::error::CallError;
use crate::telephony::TelephonyClient;

fn digest_for(id: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.finalize().into()
}

/// `S mod modulus` where `S` is the full 256-bit big-endian integer the
/// digest represents (`int(hexdigest(), 16) % modulus` in the original) —
/// folding over all 32 bytes, not just a 64-bit prefix, so the residue
/// matches the source for every modulus.
fn digest_mod_u64(digest: &[u8; 32], modulus: u64) -> u64 {
    digest
        .iter()
        .fold(0u64, |acc, &b| (acc * 256 + b as u64) % modulus)
}

/// Low 64 bits of `S`, i.e. its last 8 bytes read big-endian. `S >> shift`
/// for any `shift < 64` only ever touches these bits, so this is exact for
/// the bit-window extraction `offset_hours` below needs.
fn digest_low_u64(digest: &[u8; 32]) -> u64 {
    u64::from_be_bytes(digest[24..32].try_into().unwrap())
}

/// Runs one provider's discovery call and reports what it offered.
#[async_trait]
pub trait DiscoveryCallDriver: Send + Sync {
    async fn call(&self, provider: &Provider, campaign: &Campaign) -> CallResult;
}

/// Deterministic simulated receptionist: ~20% no-answer/no-slots, otherwise
/// 1-2 candidate slots checked against the resolved calendar.
pub struct SimulatedDiscoveryDriver {
    pub calendar: Arc<dyn CalendarService>,
    pub config: Arc<AppConfig>,
}

#[async_trait]
impl DiscoveryCallDriver for SimulatedDiscoveryDriver {
    async fn call(&self, provider: &Provider, campaign: &Campaign) -> CallResult {
        let req = &campaign.request;
        let digest = digest_for(&provider.id);
        let seed = digest_low_u64(&digest);

        let fate = digest_mod_u64(&digest, 10);
        if fate == 0 {
            tokio::time::sleep(StdDuration::from_secs_f64(8.0 + (seed % 5) as f64)).await;
            return CallResult {
                provider_id: provider.id.clone(),
                outcome: CallOutcome::NoAnswer,
                notes: "Simulated: no answer".to_string(),
                ..Default::default()
            };
        }
        if fate == 1 {
            tokio::time::sleep(StdDuration::from_secs_f64(6.0 + (seed % 4) as f64)).await;
            return CallResult {
                provider_id: provider.id.clone(),
                outcome: CallOutcome::NoSlots,
                notes: "Simulated: receptionist said no availability".to_string(),
                ..Default::default()
            };
        }

        let tz = resolve_tz(&self.config.default_timezone);
        let base_local = req
            .date_range_start
            .with_timezone(&tz)
            .with_hour(9)
            .and_then(|d| d.with_minute(0))
            .and_then(|d| d.with_second(0))
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or_else(|| req.date_range_start.with_timezone(&tz));

        let mut offers: Vec<SlotOffer> = Vec::new();
        for i in 0..3i64 {
            let offset_hours = (seed >> (i as u32 * 4)) % 8;
            let mut candidate_start = base_local + Duration::days(i) + Duration::hours(offset_hours as i64);
            let mut candidate_end = candidate_start + Duration::minutes(req.duration_min);

            if candidate_end.with_timezone(&Utc) > req.date_range_end {
                continue;
            }

            let mut free = match self
                .calendar
                .is_free(candidate_start.with_timezone(&Utc), candidate_end.with_timezone(&Utc))
                .await
            {
                Ok(free) => free,
                Err(_) => {
                    tracing::warn!("calendar unavailable; skipping slot for {}", provider.id);
                    continue;
                }
            };

            if !free {
                candidate_start += Duration::hours(1);
                candidate_end += Duration::hours(1);
                if candidate_end.with_timezone(&Utc) > req.date_range_end {
                    continue;
                }
                free = match self
                    .calendar
                    .is_free(candidate_start.with_timezone(&Utc), candidate_end.with_timezone(&Utc))
                    .await
                {
                    Ok(free) => free,
                    Err(_) => {
                        tracing::warn!("calendar unavailable; skipping shifted slot for {}", provider.id);
                        continue;
                    }
                };
                if !free {
                    continue;
                }
            }

            offers.push(SlotOffer {
                provider_id: provider.id.clone(),
                start: candidate_start.with_timezone(&Utc),
                end: candidate_end.with_timezone(&Utc),
                notes: format!("Simulated offer from {}", provider.name),
                confidence: 0.9 - (i as f64) * 0.1,
                score: None,
            });

            if offers.len() >= 2 {
                break;
            }
        }

        tokio::time::sleep(StdDuration::from_secs_f64(6.0 + (seed % 5) as f64 * 1.6)).await;

        if !offers.is_empty() {
            CallResult {
                provider_id: provider.id.clone(),
                outcome: CallOutcome::Success,
                transcript_snippet: format!(
                    "Simulated call with {}; offered {} slot(s).",
                    provider.name,
                    offers.len()
                ),
                offers,
                notes: "simulated".to_string(),
                ..Default::default()
            }
        } else {
            CallResult {
                provider_id: provider.id.clone(),
                outcome: CallOutcome::CompletedNoMatch,
                notes: "Simulated: all candidate slots conflicted with calendar".to_string(),
                ..Default::default()
            }
        }
    }
}

/// Places a real outbound call and blocks on the media bridge's completion
/// signal, matching the original's `real_call`.
pub struct RealDiscoveryDriver {
    pub store: Arc<shared_store::Store>,
    pub telephony: Arc<dyn TelephonyClient>,
}

#[async_trait]
impl DiscoveryCallDriver for RealDiscoveryDriver {
    async fn call(&self, provider: &Provider, campaign: &Campaign) -> CallResult {
        match place_and_wait(&self.store, &self.telephony, &provider.phone, &campaign.campaign_id, &provider.id).await {
            Ok(result) => result,
            Err(e) => CallResult {
                provider_id: provider.id.clone(),
                outcome: CallOutcome::Failed,
                notes: e.0,
                ..Default::default()
            },
        }
    }
}

pub(crate) async fn place_and_wait(
    store: &Arc<shared_store::Store>,
    telephony: &Arc<dyn TelephonyClient>,
    to_phone: &str,
    campaign_id: &str,
    provider_id: &str,
) -> Result<CallResult, CallError> {
    let call_sid = telephony
        .create_call(to_phone, campaign_id, provider_id)
        .await?;
    let signal = store
        .register_call(call_sid.clone(), campaign_id.to_string(), provider_id.to_string())
        .await;
    let mut result = signal.wait().await;
    result.call_sid = call_sid;
    Ok(result)
}
