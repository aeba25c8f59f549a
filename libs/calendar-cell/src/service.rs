use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::CalendarUnavailable;
use crate::interval::FreeWindow;

/// Answers the two questions the rest of the system needs from a calendar:
/// is a window free, and what free windows exist on a given day.
///
/// Every implementor must fail closed: if availability cannot be proven, an
/// `Err(CalendarUnavailable)` is returned rather than guessing `true`.
#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn is_free(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, CalendarUnavailable>;

    async fn available_slots(
        &self,
        day: NaiveDate,
        business_start_hour: u32,
        business_end_hour: u32,
        min_slot_minutes: i64,
        tz: Tz,
    ) -> Result<Vec<FreeWindow>, CalendarUnavailable>;
}
