use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::CalendarUnavailable;
use crate::interval::{busy_blocks, compute_free_windows, day_window, intervals_overlap, resolve_tz, FreeWindow};
use crate::service::CalendarService;

/// Deterministic calendar used for demos and tests: a fixed lunch block plus
/// one date-hashed extra block per day, in a configured local timezone.
pub struct MockCalendarService {
    tz: Tz,
}

impl MockCalendarService {
    pub fn new(tz_name: &str) -> Self {
        Self {
            tz: resolve_tz(tz_name),
        }
    }
}

#[async_trait]
impl CalendarService for MockCalendarService {
    async fn is_free(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, CalendarUnavailable> {
        let buffer = Duration::minutes(15);
        let scan_start = (start - buffer).with_timezone(&self.tz);
        let scan_end = (end + buffer).with_timezone(&self.tz);

        let mut day = scan_start.date_naive();
        let last_day = scan_end.date_naive();
        while day <= last_day {
            for (b_start, b_end) in busy_blocks(day, self.tz) {
                if intervals_overlap(start, end, b_start, b_end) {
                    return Ok(false);
                }
            }
            day = day.succ_opt().unwrap();
        }
        Ok(true)
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
        let mut busy = busy_blocks(day, tz);
        busy.sort_by_key(|b| b.0);
        Ok(compute_free_windows(day_start, day_end, &busy, min_slot_minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn lunch_block_is_never_free() {
        let calendar = MockCalendarService::new("UTC");
        let day = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let start = chrono_tz::UTC
            .from_local_datetime(&day.and_hms_opt(12, 15, 0).unwrap())
            .single()
            .unwrap()
            .with_timezone(&Utc);
        let end = start + Duration::minutes(30);
        assert!(!calendar.is_free(start, end).await.unwrap());
    }

    #[tokio::test]
    async fn available_slots_are_at_least_minimum_length() {
        let calendar = MockCalendarService::new("UTC");
        let day = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let windows = calendar
            .available_slots(day, 9, 17, 30, chrono_tz::UTC)
            .await
            .unwrap();
        for w in windows {
            assert!(w.end - w.start >= Duration::minutes(30));
        }
    }
}
