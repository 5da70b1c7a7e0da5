//! Coercion of loosely-typed request fields into the values stored with an
//! exercise. Form and query fields all arrive as text; these helpers decide
//! what that text means.

use crate::{TrackerError, TrackerResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const DISPLAY_DATE_FORMAT: &str = "%a %b %d %Y";

const NAIVE_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Treats a missing or blank field as not supplied.
pub fn optional_text(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses the leading integer of `text`, ignoring anything after the digits.
///
/// `"30"` gives 30, `" 42min"` gives 42 and `"3.9"` gives 3. Text without a
/// leading integer, or one that does not fit in an `i64`, gives `None`.
pub fn parse_duration(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }

    let magnitude: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Parses a log limit. Only a strictly positive count restricts the log.
pub fn parse_limit(text: &str) -> Option<u32> {
    parse_duration(text)
        .filter(|n| *n > 0)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Parses a calendar date or timestamp. Values without an offset are UTC.
pub fn parse_date(text: &str) -> TrackerResult<DateTime<Utc>> {
    let trimmed = text.trim();

    if let Some(date) = parse_calendar_date(trimmed) {
        return Ok(midnight(date));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DISPLAY_DATE_FORMAT) {
        return Ok(midnight(date));
    }

    Err(TrackerError::InvalidDate(text.to_string()))
}

/// Parses an optional date field; a blank value counts as not supplied.
pub fn parse_optional_date(text: Option<&str>) -> TrackerResult<Option<DateTime<Utc>>> {
    optional_text(text).map(parse_date).transpose()
}

/// Renders a date the way it is reported back to clients, e.g. `Sun Jan 15 2023`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

// YYYY-MM-DD, YYYY-MM or YYYY
fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split('-');
    let year = parts.next().filter(|p| p.len() == 4)?;
    let month = parts.next();
    let day = parts.next();
    if parts.next().is_some() {
        return None;
    }

    let numeric = |p: &str, len: usize| -> Option<u32> {
        if p.len() == len && p.chars().all(|c| c.is_ascii_digit()) {
            p.parse().ok()
        } else {
            None
        }
    };

    let year = numeric(year, 4)? as i32;
    let month = match month {
        Some(m) => numeric(m, 2)?,
        None => 1,
    };
    let day = match day {
        Some(d) => numeric(d, 2)?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
