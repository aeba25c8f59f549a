use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use swarm_domain::SlotOffer;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-ish datetime string the agent supplied. A string carrying
/// an explicit offset is taken as-is; a naive string ("10:00", no tzinfo)
/// is interpreted in `tz` so "10:00" means 10am local, not 10am UTC.
pub fn parse_datetime(raw: &str, tz: Tz) -> Result<DateTime<Utc>, ()> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return match tz.from_local_datetime(&naive).single() {
                Some(local) => Ok(local.with_timezone(&Utc)),
                None => Err(()),
            };
        }
    }

    Err(())
}

/// If the agent used a past year by mistake, bump both ends forward by the
/// same number of years so the slot lands in the future.
pub fn fix_past_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = Utc::now().date_naive();
    if start.date_naive() < today {
        let year_delta = today.year() - start.year();
        if year_delta > 0 {
            let bumped_start = start.with_year(start.year() + year_delta);
            let bumped_end = end.with_year(end.year() + year_delta);
            if let (Some(s), Some(e)) = (bumped_start, bumped_end) {
                tracing::warn!("auto-corrected past date by +{} year(s)", year_delta);
                return (s, e);
            }
        }
    }
    (start, end)
}

/// Same correction for a bare date (used by `available_slots`): bump to
/// this year, and if that's still in the past, to next year.
pub fn fix_past_date(day: NaiveDate) -> NaiveDate {
    let today = Utc::now().date_naive();
    if day >= today {
        return day;
    }
    let mut corrected = day.with_year(today.year()).unwrap_or(day);
    if corrected < today {
        corrected = corrected.with_year(today.year() + 1).unwrap_or(corrected);
    }
    if corrected != day {
        tracing::warn!("available_slots: corrected past date {} -> {}", day, corrected);
    }
    corrected
}

/// Pulls `SlotOffer`s out of a `log_event` tool call's `data.offers` array.
///
/// Shared between `dispatch_tool`'s own bookkeeping and the media bridge,
/// which watches for this same payload shape to decide whether a call
/// produced anything bookable. Malformed entries are skipped rather than
/// failing the whole call.
pub fn extract_offers(params: &Value, provider_id: &str, offers: &mut Vec<SlotOffer>) {
    let Some(data) = params.get("data") else {
        return;
    };
    let data = if let Value::String(raw) = data {
        match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => parsed,
            Err(_) => return,
        }
    } else {
        data.clone()
    };

    let Some(raw_offers) = data.get("offers").and_then(Value::as_array) else {
        return;
    };

    for raw in raw_offers {
        let (Some(start), Some(end)) = (
            raw.get("start").and_then(Value::as_str),
            raw.get("end").and_then(Value::as_str),
        ) else {
            continue;
        };
        let (Ok(start), Ok(end)) = (
            DateTime::parse_from_rfc3339(start),
            DateTime::parse_from_rfc3339(end),
        ) else {
            continue;
        };

        offers.push(SlotOffer {
            provider_id: provider_id.to_string(),
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
            notes: raw
                .get("notes")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            confidence: raw.get("confidence").and_then(Value::as_f64).unwrap_or(0.8),
            score: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_well_formed_offers_and_skips_malformed_ones() {
        let params = json!({
            "data": {
                "offers": [
                    {"start": "2026-03-15T09:00:00+00:00", "end": "2026-03-15T09:30:00+00:00", "confidence": 0.95},
                    {"start": "not-a-date", "end": "2026-03-15T10:00:00+00:00"},
                    {"end": "2026-03-15T10:00:00+00:00"},
                ]
            }
        });

        let mut offers = Vec::new();
        extract_offers(&params, "prov-1", &mut offers);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].provider_id, "prov-1");
        assert_eq!(offers[0].confidence, 0.95);
    }

    #[test]
    fn tolerates_a_json_encoded_string_data_field() {
        let params = json!({
            "data": "{\"offers\": [{\"start\": \"2026-03-15T09:00:00+00:00\", \"end\": \"2026-03-15T09:30:00+00:00\"}]}"
        });
        let mut offers = Vec::new();
        extract_offers(&params, "prov-1", &mut offers);
        assert_eq!(offers.len(), 1);
    }

    #[test]
    fn missing_data_is_a_silent_no_op() {
        let mut offers = Vec::new();
        extract_offers(&json!({}), "prov-1", &mut offers);
        assert!(offers.is_empty());
    }
}
