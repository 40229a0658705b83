//! Wall-clock timestamp parsing.
//!
//! Calendar events are laid out in the calendar's display timezone, so every
//! timestamp is reduced to a timezone-naive [`NaiveDateTime`]. When a record
//! carries an explicit offset (RFC 3339), the wall clock *in that offset* is
//! kept and the offset is discarded.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Parse an event timestamp into wall-clock time.
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM[:SS[.fff]]` (with `T` or a
/// space), and a bare `YYYY-MM-DD` which resolves to midnight.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(day_start)
}

/// Parse a `YYYY-MM-DD` calendar date.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Midnight at the start of `date`.
#[must_use]
pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Whole minutes from `from` to `to`, negative when `to` is earlier.
#[must_use]
pub fn minutes_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_minutes()
}
