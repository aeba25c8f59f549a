use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate appointment slot offered by a provider during a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotOffer {
    pub provider_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub score: Option<f64>,
}

fn default_confidence() -> f64 {
    1.0
}
