//! iCalendar date/time parsing.
//!
//! Accepts the basic and extended forms of RFC 5545 date and date-time
//! values, with or without a UTC designator or numeric offset. When a
//! `TZID` names a loadable zone, local values are interpreted in that
//! zone; otherwise the value is parsed directly, with a trailing `Z`
//! stripped for one retry. All results are UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const OFFSET_FORMATS: &[&str] = &[
    "%Y%m%dT%H%M%S%z",
    "%Y%m%dT%H%M%S%:z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%:z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y%m%dT%H%M%S", "%Y-%m-%dT%H:%M:%S"];

const DATE_FORMATS: &[&str] = &["%Y%m%d", "%Y-%m-%d"];

/// Parses an iCalendar date or date-time value to UTC.
///
/// `tzid` is the `TZID` property parameter, if any. Returns `None` when no
/// accepted format matches.
#[must_use]
pub fn parse_datetime(value: &str, tzid: Option<&str>) -> Option<DateTime<Utc>> {
    parse_classified(value, tzid).map(|(dt, _)| dt)
}

/// Like [`parse_datetime`], also reporting whether the value was a bare
/// date (all-day semantics).
#[must_use]
pub fn parse_classified(value: &str, tzid: Option<&str>) -> Option<(DateTime<Utc>, bool)> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let zone: Option<Tz> = tzid.and_then(|id| id.parse().ok());

    // UTC designator. This branch also serves as the strip-`Z`-and-retry
    // path for values whose TZID did not load.
    if let Some(stripped) = value.strip_suffix('Z') {
        for fmt in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(stripped, fmt) {
                return Some((Utc.from_utc_datetime(&naive), false));
            }
        }
    }

    // Numeric offsets (`±HHMM` and `±HH:MM`).
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some((dt.with_timezone(&Utc), false));
        }
    }

    // Local date-times: interpret in the TZID zone when it loads, else UTC.
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some((localize(naive, zone), false));
        }
    }

    // Bare dates are all-day values at local midnight.
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some((localize(naive, zone), true));
        }
    }

    None
}

fn localize(naive: NaiveDateTime, zone: Option<Tz>) -> DateTime<Utc> {
    match zone {
        Some(tz) => tz
            .from_local_datetime(&naive)
            .earliest()
            .map_or_else(|| Utc.from_utc_datetime(&naive), |dt| dt.with_timezone(&Utc)),
        None => Utc.from_utc_datetime(&naive),
    }
}

/// Formats a UTC instant as an iCalendar UTC date-time (`...Z`).
#[must_use]
pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Formats a UTC instant as an iCalendar date value.
#[must_use]
pub fn format_date(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%d").to_string()
}
