use async_trait::async_trait;
use serde::Deserialize;
use std::sync::OnceLock;

use swarm_domain::Provider;

use crate::cache::ProviderCache;
use crate::error::ProviderError;

const DEMO_PROVIDERS_JSON: &str = include_str!("../data/providers_demo.json");

fn demo_providers() -> &'static [Provider] {
    static DEMO: OnceLock<Vec<Provider>> = OnceLock::new();
    DEMO.get_or_init(|| {
        serde_json::from_str(DEMO_PROVIDERS_JSON).expect("bundled demo providers are valid JSON")
    })
}

/// Searches for providers offering `service` near `location`. Implemented
/// by the bundled demo directory and, when configured, a remote directory
/// (Places-style text/nearby search).
#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    async fn search(
        &self,
        service: &str,
        location: &str,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> Result<Vec<Provider>, ProviderError>;
}

/// Matches demo providers whose services contain `service`, case-insensitive.
pub struct DemoProviderDirectory {
    cache: std::sync::Arc<ProviderCache>,
}

impl DemoProviderDirectory {
    pub fn new(cache: std::sync::Arc<ProviderCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ProviderDirectory for DemoProviderDirectory {
    async fn search(
        &self,
        service: &str,
        _location: &str,
        _lat: Option<f64>,
        _lng: Option<f64>,
    ) -> Result<Vec<Provider>, ProviderError> {
        let needle = service.to_lowercase();
        let results: Vec<Provider> = demo_providers()
            .iter()
            .filter(|p| p.services.iter().any(|s| s.to_lowercase().contains(&needle)))
            .cloned()
            .collect();
        self.cache.insert_all(&results);
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    #[serde(default)]
    place_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    rating: f64,
    geometry: Option<PlaceGeometry>,
}

#[derive(Debug, Deserialize)]
struct PlaceGeometry {
    location: PlaceLatLng,
}

#[derive(Debug, Deserialize)]
struct PlaceLatLng {
    lat: f64,
    lng: f64,
}

/// Remote directory over a Places-style text/nearby search API, with a
/// 1-hour per-query TTL cache.
pub struct RemoteProviderDirectory {
    client: reqwest::Client,
    api_key: String,
    cache: std::sync::Arc<ProviderCache>,
    query_cache: std::sync::Mutex<
        std::collections::HashMap<String, (std::time::Instant, Vec<Provider>)>,
    >,
}

const QUERY_TTL: std::time::Duration = std::time::Duration::from_secs(3600);

impl RemoteProviderDirectory {
    pub fn new(api_key: impl Into<String>, cache: std::sync::Arc<ProviderCache>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            cache,
            query_cache: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }
}

#[async_trait]
impl ProviderDirectory for RemoteProviderDirectory {
    async fn search(
        &self,
        service: &str,
        location: &str,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> Result<Vec<Provider>, ProviderError> {
        let cache_key = format!("{service}|{location}|{lat:?}|{lng:?}");
        if let Some((at, providers)) = self.query_cache.lock().unwrap().get(&cache_key) {
            if at.elapsed() < QUERY_TTL {
                return Ok(providers.clone());
            }
        }

        let resp = if let (Some(lat), Some(lng)) = (lat, lng) {
            self.client
                .get("https://maps.googleapis.com/maps/api/place/nearbysearch/json")
                .query(&[
                    ("location", format!("{lat},{lng}")),
                    ("radius", "10000".to_string()),
                    ("keyword", service.to_string()),
                    ("key", self.api_key.clone()),
                ])
                .send()
                .await
        } else {
            self.client
                .get("https://maps.googleapis.com/maps/api/place/textsearch/json")
                .query(&[
                    ("query", format!("{service} near {location}")),
                    ("key", self.api_key.clone()),
                ])
                .send()
                .await
        }
        .map_err(|e| ProviderError::SearchFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::SearchFailed(format!(
                "places API returned {}",
                resp.status()
            )));
        }

        let body: PlacesResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::SearchFailed(e.to_string()))?;

        let providers: Vec<Provider> = body
            .results
            .into_iter()
            .take(20)
            .map(|r| {
                let geom = r.geometry.unwrap_or(PlaceGeometry {
                    location: PlaceLatLng { lat: 0.0, lng: 0.0 },
                });
                Provider {
                    id: r.place_id,
                    name: if r.name.is_empty() {
                        "Unknown".to_string()
                    } else {
                        r.name
                    },
                    phone: String::new(),
                    address: r.formatted_address,
                    rating: r.rating,
                    lat: geom.location.lat,
                    lng: geom.location.lng,
                    services: vec![service.to_string()],
                }
            })
            .collect();

        self.query_cache
            .lock()
            .unwrap()
            .insert(cache_key, (std::time::Instant::now(), providers.clone()));
        self.cache.insert_all(&providers);
        Ok(providers)
    }
}
