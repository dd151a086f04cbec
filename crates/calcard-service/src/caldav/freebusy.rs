//! `free-busy-query` execution (RFC 4791 §7.10).
//!
//! Builds a single VFREEBUSY component from the busy periods of every
//! event overlapping the requested range, recurrence-expanded under the
//! same bounds as the filter evaluator. The reply is a `text/calendar`
//! body, not a multistatus.

use chrono::{DateTime, Utc};

use calcard_rfc::dav::core::FreeBusyQuery;
use calcard_rfc::filter::occurrences_in_range;
use calcard_rfc::ical::datetime::{format_utc, parse_datetime};
use calcard_store::{CalendarAccess, Store, User};

use crate::caldav::report::list_events;
use crate::error::ServiceResult;

/// Executes a free-busy query over one calendar.
///
/// Free-busy-only access is sufficient here; that is the grant's whole
/// point.
///
/// ## Errors
/// Storage failures while listing events.
#[tracing::instrument(skip_all, fields(calendar_id = access.calendar.id))]
pub async fn execute_free_busy(
    store: &Store,
    user: &User,
    access: &CalendarAccess,
    query: &FreeBusyQuery,
) -> ServiceResult<String> {
    let (range_start, range_end) = match &query.time_range {
        Some(range) => (
            range.start.as_deref().and_then(|v| parse_datetime(v, None)),
            range.end.as_deref().and_then(|v| parse_datetime(v, None)),
        ),
        None => (None, None),
    };

    let events = list_events(store, user, access).await?;

    let mut periods: Vec<(DateTime<Utc>, DateTime<Utc>)> = events
        .iter()
        .flat_map(|event| occurrences_in_range(&event.raw_ical, range_start, range_end))
        .collect();
    periods.sort_unstable();

    Ok(render_vfreebusy(range_start, range_end, &periods))
}

fn render_vfreebusy(
    range_start: Option<DateTime<Utc>>,
    range_end: Option<DateTime<Utc>>,
    periods: &[(DateTime<Utc>, DateTime<Utc>)],
) -> String {
    let mut body = String::from(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//calcard//freebusy//EN\r\nBEGIN:VFREEBUSY\r\n",
    );

    body.push_str(&format!("DTSTAMP:{}\r\n", format_utc(Utc::now())));
    if let Some(start) = range_start {
        body.push_str(&format!("DTSTART:{}\r\n", format_utc(start)));
    }
    if let Some(end) = range_end {
        body.push_str(&format!("DTEND:{}\r\n", format_utc(end)));
    }
    for (start, end) in periods {
        body.push_str(&format!(
            "FREEBUSY:{}/{}\r\n",
            format_utc(*start),
            format_utc(*end)
        ));
    }

    body.push_str("END:VFREEBUSY\r\nEND:VCALENDAR\r\n");
    body
}
