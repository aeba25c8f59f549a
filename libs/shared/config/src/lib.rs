use std::env;
use tracing::warn;

/// All configuration is read from env vars (or a `.env` file loaded once by
/// `apps/api` at process start).
#[derive(Debug, Clone)]
pub struct AppConfig {
    // --- Core ---
    pub simulated_calls: bool,
    pub default_timezone: String,
    pub max_providers_per_search: usize,
    pub store_path: String,
    pub public_base_url: String,

    // --- Telephony / voice agent collaborators (transport, out of scope) ---
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_caller_id: String,
    pub elevenlabs_api_key: String,
    pub elevenlabs_agent_id: String,

    // --- Google Calendar ---
    pub use_real_calendar: bool,
    pub google_credentials_json: String,
    pub google_calendar_id: String,
    pub google_oauth_client_id: String,
    pub google_oauth_client_secret: String,

    // --- Google Places ---
    pub use_google_places: bool,
    pub google_places_api_key: String,

    // --- Google Distance ---
    pub use_google_distance: bool,
    pub google_maps_api_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            simulated_calls: env_bool("SIMULATED_CALLS", true),
            default_timezone: env::var("DEFAULT_TIMEZONE").unwrap_or_else(|_| {
                warn!("DEFAULT_TIMEZONE not set, defaulting to UTC");
                "UTC".to_string()
            }),
            max_providers_per_search: env::var("MAX_PROVIDERS_PER_SEARCH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            store_path: env::var("STORE_PATH").unwrap_or_else(|_| {
                warn!("STORE_PATH not set, defaulting to ./data/store");
                "./data/store".to_string()
            }),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),

            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            twilio_caller_id: env::var("TWILIO_CALLER_ID").unwrap_or_default(),
            elevenlabs_api_key: env::var("ELEVENLABS_API_KEY").unwrap_or_default(),
            elevenlabs_agent_id: env::var("ELEVENLABS_AGENT_ID").unwrap_or_default(),

            use_real_calendar: env_bool("USE_REAL_CALENDAR", false),
            google_credentials_json: env::var("GOOGLE_CREDENTIALS_JSON").unwrap_or_default(),
            google_calendar_id: env::var("GOOGLE_CALENDAR_ID")
                .unwrap_or_else(|_| "primary".to_string()),
            google_oauth_client_id: env::var("GOOGLE_OAUTH_CLIENT_ID").unwrap_or_default(),
            google_oauth_client_secret: env::var("GOOGLE_OAUTH_CLIENT_SECRET")
                .unwrap_or_default(),

            use_google_places: env_bool("USE_GOOGLE_PLACES", false),
            google_places_api_key: env::var("GOOGLE_PLACES_API_KEY").unwrap_or_default(),

            use_google_distance: env_bool("USE_GOOGLE_DISTANCE", false),
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY").unwrap_or_default(),
        };

        if !config.simulated_calls && !config.is_telephony_configured() {
            warn!("SIMULATED_CALLS=false but Twilio credentials are missing; calls will fail");
        }

        config
    }

    pub fn is_telephony_configured(&self) -> bool {
        !self.twilio_account_sid.is_empty()
            && !self.twilio_auth_token.is_empty()
            && !self.twilio_caller_id.is_empty()
    }

    pub fn is_calendar_oauth_configured(&self) -> bool {
        !self.google_oauth_client_id.is_empty() && !self.google_oauth_client_secret.is_empty()
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
