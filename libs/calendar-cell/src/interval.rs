use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use sha2::{Digest, Sha256};

/// A free window of at least the requested minimum length, local to the
/// timezone the caller asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

/// `SHA-256(date) mod modulus`, folded over the full 256-bit digest —
/// matching `int(hashlib.sha256(...).hexdigest(), 16) % modulus` in the
/// original. Reducing only a 64-bit prefix would yield a different residue
/// than the full-width integer for most moduli.
fn date_hash_mod(d: NaiveDate, modulus: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(d.format("%Y-%m-%d").to_string().as_bytes());
    let digest = hasher.finalize();
    digest
        .iter()
        .fold(0u64, |acc, &b| (acc * 256 + b as u64) % modulus)
}

const EXTRA_BLOCK_STARTS: [(u32, u32); 6] = [(8, 0), (9, 30), (10, 0), (14, 0), (15, 30), (16, 0)];

/// Deterministic busy blocks for a date: a fixed noon-1pm lunch block plus
/// one extra hour-long block chosen by `SHA-256(date) mod 6`.
pub fn busy_blocks(d: NaiveDate, tz: Tz) -> Vec<(DateTime<Tz>, DateTime<Tz>)> {
    let mut blocks = Vec::with_capacity(2);

    let lunch_start = tz
        .from_local_datetime(&d.and_hms_opt(12, 0, 0).unwrap())
        .single()
        .unwrap();
    blocks.push((lunch_start, lunch_start + Duration::hours(1)));

    let idx = date_hash_mod(d, 6) as usize;
    let (h, m) = EXTRA_BLOCK_STARTS[idx];
    let extra_start = tz
        .from_local_datetime(&d.and_hms_opt(h, m, 0).unwrap())
        .single()
        .unwrap();
    blocks.push((extra_start, extra_start + Duration::hours(1)));

    blocks
}

/// `[a_start, a_end) ∩ [b_start, b_end) ≠ ∅`
pub fn intervals_overlap<Tz1: TimeZone, Tz2: TimeZone>(
    a_start: DateTime<Tz1>,
    a_end: DateTime<Tz1>,
    b_start: DateTime<Tz2>,
    b_end: DateTime<Tz2>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Complement of `busy` (already sorted by start, already clamped to
/// `[day_start, day_end)`) within `[day_start, day_end)`, keeping only gaps
/// of at least `min_slot_minutes`.
pub fn compute_free_windows(
    day_start: DateTime<Tz>,
    day_end: DateTime<Tz>,
    busy: &[(DateTime<Tz>, DateTime<Tz>)],
    min_slot_minutes: i64,
) -> Vec<FreeWindow> {
    let min_gap = Duration::minutes(min_slot_minutes);
    let mut free = Vec::new();
    let mut cursor = day_start;

    for &(mut b_start, mut b_end) in busy {
        b_start = b_start.max(day_start);
        b_end = b_end.min(day_end);
        if b_start >= day_end || b_end <= day_start {
            continue;
        }
        if cursor < b_start {
            let gap = b_start - cursor;
            if gap >= min_gap {
                free.push(FreeWindow {
                    start: cursor,
                    end: b_start,
                });
            }
        }
        cursor = cursor.max(b_end);
    }

    if cursor < day_end {
        let gap = day_end - cursor;
        if gap >= min_gap {
            free.push(FreeWindow {
                start: cursor,
                end: day_end,
            });
        }
    }

    free
}

/// Resolve an IANA timezone name, falling back to UTC on an unknown zone.
pub fn resolve_tz(tz_name: &str) -> Tz {
    tz_name.parse().unwrap_or_else(|_| {
        tracing::warn!("unknown timezone {:?}; falling back to UTC", tz_name);
        chrono_tz::UTC
    })
}

pub fn day_window(day: NaiveDate, tz: Tz, business_start: u32, business_end: u32) -> (DateTime<Tz>, DateTime<Tz>) {
    let start_naive = NaiveTime::from_hms_opt(business_start, 0, 0).unwrap();
    let end_naive = NaiveTime::from_hms_opt(business_end, 0, 0).unwrap();
    let start = tz
        .from_local_datetime(&d_and_t(day, start_naive))
        .single()
        .unwrap();
    let end = tz
        .from_local_datetime(&d_and_t(day, end_naive))
        .single()
        .unwrap();
    (start, end)
}

fn d_and_t(d: NaiveDate, t: NaiveTime) -> chrono::NaiveDateTime {
    d.and_time(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn busy_blocks_are_deterministic() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let a = busy_blocks(d, chrono_tz::UTC);
        let b = busy_blocks(d, chrono_tz::UTC);
        assert_eq!(a, b);
        // lunch block is always present
        assert_eq!(a[0].0.time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn free_windows_cover_business_hours_minus_busy() {
        let tz = chrono_tz::UTC;
        let day = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let (start, end) = day_window(day, tz, 9, 17);
        let busy = vec![(
            tz.from_local_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
                .single()
                .unwrap(),
            tz.from_local_datetime(&day.and_hms_opt(13, 0, 0).unwrap())
                .single()
                .unwrap(),
        )];
        let free = compute_free_windows(start, end, &busy, 30);
        assert_eq!(free.len(), 2);
        assert_eq!(free[0].start, start);
        assert_eq!(free[0].end.time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(free[1].end, end);
    }

    #[test]
    fn sub_threshold_gaps_are_dropped() {
        let tz = chrono_tz::UTC;
        let day = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let (start, end) = day_window(day, tz, 9, 10);
        // busy 9:00-9:50, leaving a 10 minute gap < 30 min threshold
        let busy = vec![(
            tz.from_local_datetime(&day.and_hms_opt(9, 0, 0).unwrap())
                .single()
                .unwrap(),
            tz.from_local_datetime(&day.and_hms_opt(9, 50, 0).unwrap())
                .single()
                .unwrap(),
        )];
        let free = compute_free_windows(start, end, &busy, 30);
        assert!(free.is_empty());
    }
}
