use serde::{Deserialize, Serialize};

/// A callable provider, either loaded from the demo directory or returned by
/// a remote place-search collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub rating: f64,
    pub lat: f64,
    pub lng: f64,
    pub services: Vec<String>,
}

/// Provider enriched with an estimated travel time, returned to the caller
/// before any calls are placed so they can narrow the candidate list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPreview {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub rating: f64,
    pub lat: f64,
    pub lng: f64,
    pub services: Vec<String>,
    #[serde(default)]
    pub travel_minutes: i64,
}

impl ProviderPreview {
    pub fn from_provider(provider: Provider, travel_minutes: i64) -> Self {
        Self {
            id: provider.id,
            name: provider.name,
            phone: provider.phone,
            address: provider.address,
            rating: provider.rating,
            lat: provider.lat,
            lng: provider.lng,
            services: provider.services,
            travel_minutes,
        }
    }
}

/// Request to search providers before starting a campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSearchRequest {
    pub service: String,
    pub location: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default = "default_max_providers")]
    pub max_providers: usize,
    #[serde(default)]
    pub max_travel_minutes: i64,
}

fn default_max_providers() -> usize {
    15
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderSearchResponse {
    pub providers: Vec<ProviderPreview>,
}
