use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How calls are placed for a campaign.
///
/// - `Auto` uses the server-wide `simulated_calls` setting.
/// - `Real` places every call through the telephony collaborator.
/// - `Simulated` never touches the telephony collaborator.
/// - `Hybrid` places the first call for real and simulates the rest, so a
///   demo can show parallel calling on a single outbound number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallMode {
    Auto,
    Real,
    Simulated,
    Hybrid,
}

impl Default for CallMode {
    fn default() -> Self {
        CallMode::Auto
    }
}

impl CallMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallMode::Auto => "auto",
            CallMode::Real => "real",
            CallMode::Simulated => "simulated",
            CallMode::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentRequest {
    pub service: String,
    pub location: String,
    pub date_range_start: DateTime<Utc>,
    pub date_range_end: DateTime<Utc>,
    #[serde(default = "default_duration_min")]
    pub duration_min: i64,
    #[serde(default)]
    pub preferences: HashMap<String, f64>,
    #[serde(default = "default_max_providers")]
    pub max_providers: usize,
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
    #[serde(default)]
    pub max_travel_minutes: i64,
    #[serde(default)]
    pub provider_ids: Vec<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub call_mode: CallMode,
    #[serde(default = "default_true")]
    pub auto_book: bool,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_phone: String,
}

fn default_duration_min() -> i64 {
    30
}

fn default_max_providers() -> usize {
    15
}

fn default_max_parallel() -> usize {
    5
}

fn default_true() -> bool {
    true
}
