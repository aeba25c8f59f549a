use shared_config::AppConfig;
use swarm_domain::CallMode;
use uuid::Uuid;

/// Resolves `auto` against the server-wide simulated/real setting; every
/// other mode passes through unchanged. Mirrors `_resolve_call_mode`.
pub fn resolve_call_mode(requested: CallMode, config: &AppConfig) -> CallMode {
    match requested {
        CallMode::Auto => {
            if config.simulated_calls {
                CallMode::Simulated
            } else {
                CallMode::Real
            }
        }
        other => other,
    }
}

/// A human-readable booking reference, `CONF-` followed by 8 uppercase hex
/// characters — matches the original's `uuid4().hex[:8].upper()`.
pub fn generate_confirmation_ref() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("CONF-{}", hex[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(simulated: bool) -> AppConfig {
        AppConfig {
            simulated_calls: simulated,
            default_timezone: "UTC".to_string(),
            max_providers_per_search: 15,
            store_path: "./data/store".to_string(),
            public_base_url: "http://localhost:8000".to_string(),
            twilio_account_sid: String::new(),
            twilio_auth_token: String::new(),
            twilio_caller_id: String::new(),
            elevenlabs_api_key: String::new(),
            elevenlabs_agent_id: String::new(),
            use_real_calendar: false,
            google_credentials_json: String::new(),
            google_calendar_id: "primary".to_string(),
            google_oauth_client_id: String::new(),
            google_oauth_client_secret: String::new(),
            use_google_places: false,
            google_places_api_key: String::new(),
            use_google_distance: false,
            google_maps_api_key: String::new(),
        }
    }

    #[test]
    fn auto_resolves_against_server_setting() {
        assert_eq!(resolve_call_mode(CallMode::Auto, &config(true)), CallMode::Simulated);
        assert_eq!(resolve_call_mode(CallMode::Auto, &config(false)), CallMode::Real);
    }

    #[test]
    fn explicit_modes_pass_through() {
        assert_eq!(resolve_call_mode(CallMode::Hybrid, &config(true)), CallMode::Hybrid);
        assert_eq!(resolve_call_mode(CallMode::Real, &config(true)), CallMode::Real);
    }

    #[test]
    fn confirmation_ref_has_the_expected_shape() {
        let r = generate_confirmation_ref();
        assert!(r.starts_with("CONF-"));
        assert_eq!(r.len(), 13);
    }
}
