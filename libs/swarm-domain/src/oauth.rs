use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A linked Google account's OAuth tokens, used by the calendar engine to
/// read the user's real calendar instead of the mock/service-account one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub user_id: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "Utc::now")]
    pub linked_at: DateTime<Utc>,
}

fn default_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/calendar.readonly".to_string(),
        "openid".to_string(),
        "email".to_string(),
    ]
}

impl OAuthToken {
    pub fn new(user_id: String, access_token: String, refresh_token: String) -> Self {
        Self {
            user_id,
            access_token,
            refresh_token,
            scopes: default_scopes(),
            linked_at: Utc::now(),
        }
    }
}
