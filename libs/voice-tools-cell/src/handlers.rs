use chrono::NaiveDate;
use serde_json::{json, Value};

use calendar_cell::resolve_tz;

use crate::context::ToolContext;
use crate::util::{fix_past_date, fix_past_dates, parse_datetime};

fn local_label(dt: chrono::DateTime<chrono::Utc>, tz: chrono_tz::Tz) -> String {
    dt.with_timezone(&tz).format("%-I:%M %p").to_string()
}

/// Is the requested window free on the resolved calendar?
pub async fn calendar_check(params: &Value, ctx: &ToolContext) -> Value {
    let tz = resolve_tz(&ctx.config.default_timezone);
    let start_str = params.get("start").and_then(Value::as_str).unwrap_or("");
    let end_str = params.get("end").and_then(Value::as_str).unwrap_or("");

    let (start, end) = match (parse_datetime(start_str, tz), parse_datetime(end_str, tz)) {
        (Ok(s), Ok(e)) => fix_past_dates(s, e),
        _ => return json!({"free": false, "error": "Invalid datetime format"}),
    };

    match ctx.calendar.is_free(start, end).await {
        Ok(free) => json!({
            "free": free,
            "checked_start": local_label(start, tz),
            "checked_end": local_label(end, tz),
            "timezone": ctx.config.default_timezone,
        }),
        Err(_) => {
            tracing::warn!("calendar unavailable during calendar_check; reporting as not free");
            json!({"free": false, "error": "Calendar unavailable, cannot verify"})
        }
    }
}

/// Calendar-free AND inside the campaign's requested date range.
pub async fn validate_slot(params: &Value, ctx: &ToolContext) -> Value {
    let tz = resolve_tz(&ctx.config.default_timezone);
    let start_str = params.get("start").and_then(Value::as_str).unwrap_or("");
    let end_str = params.get("end").and_then(Value::as_str).unwrap_or("");

    let (start, end) = match (parse_datetime(start_str, tz), parse_datetime(end_str, tz)) {
        (Ok(s), Ok(e)) => fix_past_dates(s, e),
        _ => return json!({"ok": false, "reason": "Invalid datetime format"}),
    };

    if let Some(campaign) = ctx.store.get_campaign(&ctx.campaign_id).await {
        let range_start = campaign.request.date_range_start;
        let range_end = campaign.request.date_range_end;
        if start < range_start || end > range_end {
            return json!({"ok": false, "reason": "Slot is outside the requested date range"});
        }
    }

    match ctx.calendar.is_free(start, end).await {
        Ok(true) => json!({"ok": true, "reason": Value::Null}),
        Ok(false) => json!({"ok": false, "reason": "Conflicts with client calendar"}),
        Err(_) => {
            tracing::warn!("calendar unavailable during validate_slot; rejecting slot");
            json!({"ok": false, "reason": "Calendar unavailable, cannot verify availability"})
        }
    }
}

/// Estimated travel minutes to a provider already attached to the campaign.
pub async fn distance_check(params: &Value, ctx: &ToolContext) -> Value {
    let provider_id = params.get("provider_id").and_then(Value::as_str).unwrap_or("");

    if let Some(campaign) = ctx.store.get_campaign(&ctx.campaign_id).await {
        if let Some(provider) = campaign.providers.iter().find(|p| p.id == provider_id) {
            let minutes = ctx
                .distance
                .estimate_travel_minutes(&campaign.request.location, provider)
                .await;
            return json!({"minutes": minutes});
        }
    }

    json!({"minutes": -1, "error": "Provider not found"})
}

/// Logs an agent-reported event (call summaries, debugging breadcrumbs).
pub async fn log_event(params: &Value, ctx: &ToolContext) -> Value {
    let message = params.get("message").and_then(Value::as_str).unwrap_or("");
    let data = params.get("data").cloned().unwrap_or(Value::Null);
    tracing::info!(
        campaign_id = %ctx.campaign_id,
        provider_id = %ctx.provider_id,
        data = %data,
        "agent log_event: {message}"
    );
    json!({"ok": true})
}

/// Searches for alternative providers mid-conversation, inferring the
/// service/location from the campaign when the agent omits them.
pub async fn provider_lookup(params: &Value, ctx: &ToolContext) -> Value {
    let mut service = params
        .get("service")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let mut location = params
        .get("location")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let exclude_ids: Vec<String> = params
        .get("exclude_ids")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();

    if service.is_empty() || location.is_empty() {
        if let Some(campaign) = ctx.store.get_campaign(&ctx.campaign_id).await {
            if service.is_empty() {
                service = campaign.request.service.clone();
            }
            if location.is_empty() {
                location = campaign.request.location.clone();
            }
        }
    }

    let providers = ctx
        .directory
        .search(&service, &location, None, None)
        .await
        .unwrap_or_default();

    let filtered: Vec<Value> = providers
        .into_iter()
        .filter(|p| !exclude_ids.contains(&p.id))
        .take(5)
        .map(|p| json!({
            "id": p.id,
            "name": p.name,
            "rating": p.rating,
            "phone": p.phone,
            "address": p.address,
        }))
        .collect();

    json!({"providers": filtered})
}

/// The client's free windows on a given day, in business-hour buckets.
pub async fn available_slots(params: &Value, ctx: &ToolContext) -> Value {
    let date_str = params.get("date").and_then(Value::as_str).unwrap_or("");
    let day = match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        Ok(d) => fix_past_date(d),
        Err(_) => return json!({"slots": [], "error": "Invalid date format. Use YYYY-MM-DD."}),
    };

    let biz_start = params
        .get("business_start")
        .and_then(Value::as_u64)
        .unwrap_or(9) as u32;
    let biz_end = params
        .get("business_end")
        .and_then(Value::as_u64)
        .unwrap_or(17) as u32;
    let tz = resolve_tz(&ctx.config.default_timezone);

    let windows = match ctx.calendar.available_slots(day, biz_start, biz_end, 30, tz).await {
        Ok(w) => w,
        Err(_) => {
            tracing::warn!("calendar unavailable during available_slots lookup");
            return json!({"slots": [], "error": "Calendar unavailable, cannot fetch availability"});
        }
    };

    let slots: Vec<Value> = windows
        .into_iter()
        .map(|w| json!({
            "start": w.start.to_rfc3339(),
            "end": w.end.to_rfc3339(),
            "start_local": w.start.format("%-I:%M %p").to_string(),
            "end_local": w.end.format("%-I:%M %p").to_string(),
            "date": w.start.format("%A, %B %-d, %Y").to_string(),
        }))
        .collect();

    json!({"slots": slots, "timezone": ctx.config.default_timezone})
}

/// Up to three alternative providers when the current one has no slots.
pub async fn propose_alternatives(params: &Value, ctx: &ToolContext) -> Value {
    let constraints = params.get("constraints").cloned().unwrap_or(json!({}));
    let mut service = constraints
        .get("service")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let mut location = constraints
        .get("location")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let exclude_providers: Vec<String> = constraints
        .get("exclude_providers")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();

    if service.is_empty() || location.is_empty() {
        if let Some(campaign) = ctx.store.get_campaign(&ctx.campaign_id).await {
            if service.is_empty() {
                service = campaign.request.service.clone();
            }
            if location.is_empty() {
                location = campaign.request.location.clone();
            }
        }
    }

    let providers = ctx
        .directory
        .search(&service, &location, None, None)
        .await
        .unwrap_or_default();

    let suggestions: Vec<Value> = providers
        .into_iter()
        .filter(|p| !exclude_providers.contains(&p.id))
        .take(3)
        .map(|p| json!({
            "provider_name": p.name,
            "provider_id": p.id,
            "rating": p.rating,
            "estimated_availability": "Call to check",
        }))
        .collect();

    json!({"suggestions": suggestions})
}
