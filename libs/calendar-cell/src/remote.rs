use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::error::CalendarUnavailable;
use crate::interval::{compute_free_windows, day_window, intervals_overlap, FreeWindow};
use crate::service::CalendarService;

const GCAL_FREEBUSY_URL: &str = "https://www.googleapis.com/calendar/v3/freeBusy";

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: std::collections::HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<BusyBlock>,
}

#[derive(Debug, Deserialize)]
struct BusyBlock {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Queries the Google Calendar FreeBusy API with a bearer token, mapping
/// any non-2xx response or malformed payload to [`CalendarUnavailable`].
pub(crate) async fn freebusy_query(
    client: &reqwest::Client,
    access_token: &str,
    calendar_id: &str,
    time_min: DateTime<Utc>,
    time_max: DateTime<Utc>,
) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>, reqwest::StatusCode> {
    let resp = client
        .post(GCAL_FREEBUSY_URL)
        .bearer_auth(access_token)
        .json(&json!({
            "timeMin": time_min.to_rfc3339(),
            "timeMax": time_max.to_rfc3339(),
            "items": [{"id": calendar_id}],
        }))
        .send()
        .await
        .map_err(|_| reqwest::StatusCode::SERVICE_UNAVAILABLE)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(status);
    }

    let body: FreeBusyResponse = resp
        .json()
        .await
        .map_err(|_| reqwest::StatusCode::UNPROCESSABLE_ENTITY)?;

    let cal = body
        .calendars
        .get(calendar_id)
        .or_else(|| body.calendars.values().next());

    Ok(cal
        .map(|c| c.busy.iter().map(|b| (b.start, b.end)).collect())
        .unwrap_or_default())
}

/// Service-account-authenticated calendar: a single bearer token fixed at
/// construction time, used when no per-user OAuth link exists.
pub struct RemoteCalendarService {
    client: reqwest::Client,
    access_token: String,
    calendar_id: String,
}

impl RemoteCalendarService {
    pub fn new(access_token: impl Into<String>, calendar_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.into(),
            calendar_id: calendar_id.into(),
        }
    }
}

#[async_trait]
impl CalendarService for RemoteCalendarService {
    async fn is_free(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, CalendarUnavailable> {
        let buffer = Duration::minutes(15);
        let blocks = freebusy_query(
            &self.client,
            &self.access_token,
            &self.calendar_id,
            start - buffer,
            end + buffer,
        )
        .await
        .map_err(|status| {
            warn!("Google FreeBusy query failed: {}", status);
            CalendarUnavailable::new(format!("FreeBusy API returned {status}"))
        })?;

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
        let mut busy = freebusy_query(
            &self.client,
            &self.access_token,
            &self.calendar_id,
            day_start.with_timezone(&Utc),
            day_end.with_timezone(&Utc),
        )
        .await
        .map_err(|status| {
            warn!("Google FreeBusy query failed: {}", status);
            CalendarUnavailable::new(format!("FreeBusy API returned {status}"))
        })?
        .into_iter()
        .map(|(s, e)| (s.with_timezone(&tz), e.with_timezone(&tz)))
        .collect::<Vec<_>>();
        busy.sort_by_key(|b| b.0);

        Ok(compute_free_windows(day_start, day_end, &busy, min_slot_minutes))
    }
}
