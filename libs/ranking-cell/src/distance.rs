use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use swarm_domain::Provider;

const CACHE_TTL: Duration = Duration::from_secs(3600);

/// Estimates travel minutes to a provider. Always succeeds: even the
/// remote variant falls back to the deterministic hash estimate on any
/// failure, since travel time is a soft ranking input, not a correctness
/// constraint (unlike the calendar engine, which fails closed).
#[async_trait]
pub trait DistanceService: Send + Sync {
    async fn estimate_travel_minutes(&self, origin: &str, provider: &Provider) -> i64;
}

/// Deterministic 5-40 minute estimate derived from the provider id, so a
/// travel value is always available without any network dependency.
pub struct MockDistanceService;

impl MockDistanceService {
    fn estimate(provider_id: &str) -> i64 {
        let mut hasher = Sha256::new();
        hasher.update(provider_id.as_bytes());
        let digest = hasher.finalize();
        let h = u64::from_be_bytes(digest[0..8].try_into().unwrap());
        5 + (h % 36) as i64
    }
}

#[async_trait]
impl DistanceService for MockDistanceService {
    async fn estimate_travel_minutes(&self, _origin: &str, provider: &Provider) -> i64 {
        Self::estimate(&provider.id)
    }
}

/// Google Distance Matrix-backed estimate with a 1-hour TTL cache keyed by
/// `(origin, provider_id)`, falling back to the mock estimate on failure.
pub struct RemoteDistanceService {
    client: reqwest::Client,
    api_key: String,
    cache: Mutex<HashMap<(String, String), (Instant, i64)>>,
}

impl RemoteDistanceService {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, key: &(String, String)) -> Option<i64> {
        let guard = self.cache.lock().unwrap();
        guard.get(key).and_then(|&(at, minutes)| {
            if at.elapsed() < CACHE_TTL {
                Some(minutes)
            } else {
                None
            }
        })
    }

    fn store(&self, key: (String, String), minutes: i64) {
        self.cache
            .lock()
            .unwrap()
            .insert(key, (Instant::now(), minutes));
    }

    async fn query(&self, origin: &str, provider: &Provider) -> Option<i64> {
        let resp = self
            .client
            .get("https://maps.googleapis.com/maps/api/distancematrix/json")
            .query(&[
                ("origins", origin),
                ("destinations", &format!("{},{}", provider.lat, provider.lng)),
                ("mode", "driving"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .ok()?;

        if !resp.status().is_success() {
            return None;
        }

        let body: serde_json::Value = resp.json().await.ok()?;
        let element = body.get("rows")?.get(0)?.get("elements")?.get(0)?;
        if element.get("status")?.as_str()? != "OK" {
            return None;
        }
        let seconds = element.get("duration")?.get("value")?.as_i64()?;
        Some(seconds / 60)
    }
}

#[async_trait]
impl DistanceService for RemoteDistanceService {
    async fn estimate_travel_minutes(&self, origin: &str, provider: &Provider) -> i64 {
        let key = (origin.to_string(), provider.id.clone());
        if let Some(minutes) = self.cached(&key) {
            return minutes;
        }

        match self.query(origin, provider).await {
            Some(minutes) => {
                self.store(key, minutes);
                minutes
            }
            None => {
                tracing::warn!(
                    "Distance Matrix failed for {}; falling back to mock estimate",
                    provider.id
                );
                MockDistanceService::estimate(&provider.id)
            }
        }
    }
}
