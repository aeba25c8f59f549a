use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use shared_store::Store;
use swarm_domain::OAuthToken;

use crate::error::CalendarUnavailable;
use crate::interval::{compute_free_windows, day_window, intervals_overlap, FreeWindow};
use crate::remote::freebusy_query;
use crate::service::CalendarService;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Deserialize)]
struct TokenRefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Google Calendar access through a linked user's OAuth tokens. Refreshes
/// the access token exactly once on a 401 before giving up.
pub struct UserOAuthCalendarService {
    client: reqwest::Client,
    store: Arc<Store>,
    token: RwLock<OAuthToken>,
    oauth_client_id: String,
    oauth_client_secret: String,
    calendar_id: String,
}

impl UserOAuthCalendarService {
    pub fn new(
        store: Arc<Store>,
        token: OAuthToken,
        oauth_client_id: String,
        oauth_client_secret: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            store,
            token: RwLock::new(token),
            oauth_client_id,
            oauth_client_secret,
            calendar_id: "primary".to_string(),
        }
    }

    async fn access_token(&self) -> String {
        self.token.read().await.access_token.clone()
    }

    /// Serialised per-user so two concurrent 401s don't both refresh.
    async fn refresh_access_token(&self) -> Result<String, CalendarUnavailable> {
        let user_id = self.token.read().await.user_id.clone();
        let lock = self.store.oauth_refresh_lock(&user_id).await;
        let _guard = lock.lock().await;

        // Another task may have refreshed while we waited for the lock.
        let refresh_token = self.token.read().await.refresh_token.clone();
        if refresh_token.is_empty() {
            return Err(CalendarUnavailable::new("no refresh token available"));
        }

        let resp = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("client_id", self.oauth_client_id.as_str()),
                ("client_secret", self.oauth_client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|_| CalendarUnavailable::new("token refresh request failed"))?;

        if !resp.status().is_success() {
            return Err(CalendarUnavailable::new(format!(
                "token refresh failed: {}",
                resp.status()
            )));
        }

        let body: TokenRefreshResponse = resp
            .json()
            .await
            .map_err(|_| CalendarUnavailable::new("malformed token refresh response"))?;

        let mut guard = self.token.write().await;
        guard.access_token = body.access_token.clone();
        if let Some(rt) = body.refresh_token {
            guard.refresh_token = rt;
        }
        let snapshot = guard.clone();
        drop(guard);

        if let Err(e) = self.store.save_oauth_token(snapshot).await {
            warn!("failed to persist refreshed oauth token: {}", e);
        }
        info!("refreshed OAuth token for user_id={}", user_id);

        Ok(body.access_token)
    }

    async fn query_with_retry(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>, CalendarUnavailable> {
        let token = self.access_token().await;
        match freebusy_query(&self.client, &token, &self.calendar_id, time_min, time_max).await {
            Ok(blocks) => Ok(blocks),
            Err(status) if status == reqwest::StatusCode::UNAUTHORIZED => {
                let fresh = self.refresh_access_token().await?;
                freebusy_query(&self.client, &fresh, &self.calendar_id, time_min, time_max)
                    .await
                    .map_err(|status| {
                        CalendarUnavailable::new(format!(
                            "FreeBusy API returned {status} after token refresh"
                        ))
                    })
            }
            Err(status) => Err(CalendarUnavailable::new(format!(
                "FreeBusy API returned {status}"
            ))),
        }
    }
}

#[async_trait]
impl CalendarService for UserOAuthCalendarService {
    async fn is_free(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, CalendarUnavailable> {
        let buffer = Duration::minutes(15);
        let blocks = self.query_with_retry(start - buffer, end + buffer).await?;
        Ok(!blocks
            .iter()
            .any(|&(b_start, b_end)| intervals_overlap(start, end, b_start, b_end)))
    }

    async fn available_slots(
        &self,
        day: NaiveDate,
        business_start_hour: u32,
        business_end_hour: u32,
        min_slot_minutes: i64,
        tz: Tz,
    ) -> Result<Vec<FreeWindow>, CalendarUnavailable> {
        let (day_start, day_end) = day_window(day, tz, business_start_hour, business_end_hour);
        let mut busy = self
            .query_with_retry(day_start.with_timezone(&Utc), day_end.with_timezone(&Utc))
            .await?
            .into_iter()
            .map(|(s, e)| (s.with_timezone(&tz), e.with_timezone(&tz)))
            .collect::<Vec<_>>();
        busy.sort_by_key(|b| b.0);

        Ok(compute_free_windows(day_start, day_end, &busy, min_slot_minutes))
    }
}
