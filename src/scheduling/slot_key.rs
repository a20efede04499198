//! Slot keys: canonical `YYYY-MM-DDTHH:MM:SS` strings used to match
//! blocks and bookings to calendar cells.
use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Timelike};

pub const SLOT_MINUTES: i64 = 15;
pub const KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

pub fn truncate_to_seconds(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0).unwrap_or(t)
}

/// Exact key for a single instant.
pub fn instant_key(t: NaiveDateTime) -> String {
    truncate_to_seconds(t).format(KEY_FORMAT).to_string()
}

pub fn floor_to_bucket(t: NaiveDateTime) -> NaiveDateTime {
    let t = truncate_to_seconds(t);
    let offset = (t.minute() as i64 % SLOT_MINUTES) * 60 + t.second() as i64;
    t - Duration::seconds(offset)
}

pub fn ceil_to_bucket(t: NaiveDateTime) -> NaiveDateTime {
    let floor = floor_to_bucket(t);
    if floor == t {
        t
    } else {
        floor + Duration::minutes(SLOT_MINUTES)
    }
}

/// Key of the 15-minute bucket containing `t`.
pub fn bucket_key(t: NaiveDateTime) -> String {
    instant_key(floor_to_bucket(t))
}

/// Every bucket key touched by `[start, end)`.
///
/// Walks from `start` in 15-minute steps, so the result has
/// `ceil((end - start) / 15min)` entries and never contains the key at
/// exactly `end`.
pub fn occupied_keys(start: NaiveDateTime, end: NaiveDateTime) -> BTreeSet<String> {
    let end = truncate_to_seconds(end);
    let mut cursor = truncate_to_seconds(start);
    let mut keys = BTreeSet::new();
    while cursor < end {
        keys.insert(bucket_key(cursor));
        cursor += Duration::minutes(SLOT_MINUTES);
    }
    keys
}

/// Bucket boundaries inside `[start, end)`, with `start` rounded up to
/// the next boundary.
pub fn iterate_slot_starts(start: NaiveDateTime, end: NaiveDateTime) -> BTreeSet<NaiveDateTime> {
    let mut cursor = ceil_to_bucket(start);
    let mut starts = BTreeSet::new();
    while cursor < end {
        starts.insert(cursor);
        cursor += Duration::minutes(SLOT_MINUTES);
    }
    starts
}

/// Parse a timestamp into the wall clock of `tz`.
///
/// Timestamps carrying an offset (`Z`, `+02:00`) are converted; naive
/// ones are taken as already local. The result is truncated to whole
/// seconds.
pub fn parse_instant<Tz: TimeZone>(text: &str, tz: &Tz) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(truncate_to_seconds(dt.with_timezone(tz).naive_local()));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(truncate_to_seconds)
}
