//! Time slots: the restaurant's bookable hours and the `HH:MM` format.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::model::Ms;

/// Bookable slots: every hour from 08:00 to 22:00 inclusive.
pub const ALLOWED_SLOTS: [&str; 15] = [
    "08:00", "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00",
    "18:00", "19:00", "20:00", "21:00", "22:00",
];

pub fn is_allowed_slot(time: &str) -> bool {
    ALLOWED_SLOTS.contains(&time)
}

/// Parse a 24-hour time of the form `H:MM` or `HH:MM`.
///
/// Accepts exactly what `^([01]?\d|2[0-3]):([0-5]\d)$` accepts.
pub fn parse_time(time: &str) -> Option<NaiveTime> {
    let (h, m) = time.split_once(':')?;
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if h.is_empty() || h.len() > 2 || m.len() != 2 || !all_digits(h) || !all_digits(m) {
        return None;
    }
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

pub fn is_valid_time(time: &str) -> bool {
    parse_time(time).is_some()
}

/// Parse a calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp.
/// Timestamps are reduced to their UTC calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

/// Combine a calendar date with an `HH:MM` time; seconds and millis are zero.
pub fn slot_instant(date: NaiveDate, time: &str) -> Option<Ms> {
    let t = parse_time(time)?;
    Some(date.and_time(t).and_utc().timestamp_millis())
}
