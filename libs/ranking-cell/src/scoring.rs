use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use swarm_domain::{Provider, SlotOffer};

pub const DEFAULT_EARLIEST_WEIGHT: f64 = 0.5;
pub const DEFAULT_RATING_WEIGHT: f64 = 0.25;
pub const DEFAULT_DISTANCE_WEIGHT: f64 = 0.2;
pub const DEFAULT_PREFERENCE_WEIGHT: f64 = 0.05;

/// Weighted criteria applied to every offer. Overridable per campaign via
/// `AppointmentRequest.preferences`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Weights {
    pub earliest: f64,
    pub rating: f64,
    pub distance: f64,
    pub preference: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            earliest: DEFAULT_EARLIEST_WEIGHT,
            rating: DEFAULT_RATING_WEIGHT,
            distance: DEFAULT_DISTANCE_WEIGHT,
            preference: DEFAULT_PREFERENCE_WEIGHT,
        }
    }
}

impl Weights {
    pub fn from_preferences(prefs: &HashMap<String, f64>) -> Self {
        let defaults = Self::default();
        Self {
            earliest: *prefs.get("earliest_weight").unwrap_or(&defaults.earliest),
            rating: *prefs.get("rating_weight").unwrap_or(&defaults.rating),
            distance: *prefs.get("distance_weight").unwrap_or(&defaults.distance),
            preference: *prefs
                .get("preference_weight")
                .unwrap_or(&defaults.preference),
        }
    }
}

/// Computes a single offer's raw (pre-normalisation) score in `[0, 1]` and
/// its per-dimension breakdown, for debugging/explainability.
pub fn score_offer(
    offer: &SlotOffer,
    provider: &Provider,
    travel_minutes: i64,
    weights: Weights,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> (f64, Value) {
    let window_seconds = (window_end - window_start).num_seconds().max(1) as f64;
    let elapsed = (offer.start - window_start).num_seconds() as f64;
    let earliest_score = (1.0 - elapsed / window_seconds).max(0.0);

    let rating_score = provider.rating / 5.0;
    let distance_score = 1.0 - (travel_minutes.min(60) as f64) / 60.0;
    let preference_score = offer.confidence;

    let total = weights.earliest * earliest_score
        + weights.rating * rating_score
        + weights.distance * distance_score
        + weights.preference * preference_score;

    let breakdown = json!({
        "earliest": round4(earliest_score),
        "rating": round4(rating_score),
        "distance": round4(distance_score),
        "preference": round4(preference_score),
        "weights": {
            "earliest": weights.earliest,
            "rating": weights.rating,
            "distance": weights.distance,
            "preference": weights.preference,
        },
    });

    (round4(total), breakdown)
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Scores, ranks, and relatively normalises a set of offers.
///
/// Offers whose provider is missing from `providers_by_id` are dropped.
/// Sort is descending by raw score and stable, so offers inserted earlier
/// win ties. The top offer's final `score` is always `1.0` (when its raw
/// score is `> 0`); every other offer's score is scaled relative to it.
pub fn rank_offers(
    offers: Vec<SlotOffer>,
    providers_by_id: &HashMap<String, Provider>,
    travel_by_provider: &HashMap<String, i64>,
    weights: Weights,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> (Vec<SlotOffer>, HashMap<String, Vec<Value>>) {
    let mut scored: Vec<(f64, SlotOffer, Value)> = Vec::new();

    for offer in offers {
        let Some(provider) = providers_by_id.get(&offer.provider_id) else {
            continue;
        };
        let travel = *travel_by_provider.get(&offer.provider_id).unwrap_or(&20);
        let (raw, breakdown) =
            score_offer(&offer, provider, travel, weights, window_start, window_end);
        let mut offer = offer;
        offer.score = Some(raw);
        scored.push((raw, offer, breakdown));
    }

    // Stable sort descending by raw score — ties keep insertion order.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let max_score = scored.first().map(|t| t.0).unwrap_or(1.0);
    if max_score > 0.0 {
        for (raw, offer, breakdown) in scored.iter_mut() {
            let relative = round4(*raw / max_score);
            offer.score = Some(relative);
            if let Value::Object(map) = breakdown {
                map.insert("raw_score".to_string(), json!(raw));
                map.insert("relative_score".to_string(), json!(relative));
            }
        }
    }

    let mut debug: HashMap<String, Vec<Value>> = HashMap::new();
    for (_, offer, breakdown) in &scored {
        debug
            .entry(offer.provider_id.clone())
            .or_default()
            .push(breakdown.clone());
    }

    let ranked = scored.into_iter().map(|t| t.1).collect();
    (ranked, debug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn provider(id: &str, rating: f64) -> Provider {
        Provider {
            id: id.to_string(),
            name: id.to_string(),
            phone: "+15550000000".to_string(),
            address: "123 Main St".to_string(),
            rating,
            lat: 0.0,
            lng: 0.0,
            services: vec!["dentist".to_string()],
        }
    }

    fn offer(provider_id: &str, start: DateTime<Utc>, confidence: f64) -> SlotOffer {
        SlotOffer {
            provider_id: provider_id.to_string(),
            start,
            end: start + Duration::minutes(30),
            notes: String::new(),
            confidence,
            score: None,
        }
    }

    #[test]
    fn top_offer_is_always_normalised_to_one() {
        let window_start = Utc::now();
        let window_end = window_start + Duration::days(5);
        let providers = HashMap::from([
            ("a".to_string(), provider("a", 4.5)),
            ("b".to_string(), provider("b", 3.0)),
        ]);
        let travel = HashMap::from([("a".to_string(), 10), ("b".to_string(), 30)]);
        let offers = vec![
            offer("a", window_start, 0.9),
            offer("b", window_start + Duration::days(2), 0.5),
        ];

        let (ranked, _) = rank_offers(
            offers,
            &providers,
            &travel,
            Weights::default(),
            window_start,
            window_end,
        );

        assert_eq!(ranked[0].score, Some(1.0));
        for o in &ranked {
            let s = o.score.unwrap();
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn earlier_start_scores_at_least_as_high_all_else_equal() {
        let window_start = Utc::now();
        let window_end = window_start + Duration::days(5);
        let providers = HashMap::from([("a".to_string(), provider("a", 4.0))]);
        let travel = HashMap::from([("a".to_string(), 10)]);

        let early = offer("a", window_start, 0.8);
        let late = offer("a", window_start + Duration::days(3), 0.8);

        let (early_score, _) = score_offer(
            &early,
            &providers["a"],
            10,
            Weights::default(),
            window_start,
            window_end,
        );
        let (late_score, _) = score_offer(
            &late,
            &providers["a"],
            10,
            Weights::default(),
            window_start,
            window_end,
        );
        assert!(early_score >= late_score);
    }

    #[test]
    fn higher_rating_and_lower_travel_score_at_least_as_high() {
        let window_start = Utc::now();
        let window_end = window_start + Duration::days(5);
        let good = provider("a", 5.0);
        let bad = provider("a", 2.0);
        let o = offer("a", window_start, 0.8);

        let (good_score, _) =
            score_offer(&o, &good, 5, Weights::default(), window_start, window_end);
        let (bad_score, _) =
            score_offer(&o, &bad, 45, Weights::default(), window_start, window_end);
        assert!(good_score >= bad_score);
    }

    #[test]
    fn missing_provider_is_dropped() {
        let window_start = Utc::now();
        let window_end = window_start + Duration::days(5);
        let providers = HashMap::from([("a".to_string(), provider("a", 4.0))]);
        let offers = vec![offer("a", window_start, 0.8), offer("ghost", window_start, 0.8)];
        let (ranked, _) = rank_offers(
            offers,
            &providers,
            &HashMap::new(),
            Weights::default(),
            window_start,
            window_end,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].provider_id, "a");
    }

    #[test]
    fn ties_preserve_insertion_order() {
        let window_start = Utc::now();
        let window_end = window_start + Duration::days(5);
        let providers = HashMap::from([
            ("a".to_string(), provider("a", 4.0)),
            ("b".to_string(), provider("b", 4.0)),
        ]);
        let travel = HashMap::from([("a".to_string(), 10), ("b".to_string(), 10)]);
        let offers = vec![
            offer("a", window_start, 0.8),
            offer("b", window_start, 0.8),
        ];
        let (ranked, _) = rank_offers(
            offers,
            &providers,
            &travel,
            Weights::default(),
            window_start,
            window_end,
        );
        assert_eq!(ranked[0].provider_id, "a");
        assert_eq!(ranked[1].provider_id, "b");
    }
}
