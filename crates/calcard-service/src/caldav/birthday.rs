//! The virtual birthday calendar.
//!
//! A read-only calendar with the fixed id `-1`, synthesized on demand
//! from the principal's contacts. Its `updated_at` is pinned to the Unix
//! epoch so sync tokens stay stable and clients do not re-poll it.

use chrono::{DateTime, Datelike, TimeZone, Utc};

use calcard_core::constants::{
    BIRTHDAY_CALENDAR_ID, BIRTHDAY_CALENDAR_NAME, BIRTHDAY_UID_DOMAIN,
};
use calcard_rfc::ical::datetime::format_date;
use calcard_store::{Calendar, CalendarAccess, Contact, Event};

use crate::etag;

/// The synthesized collection, shaped like any other accessible calendar
/// but carrying no editor rights.
#[must_use]
pub fn virtual_calendar(owner_id: i64) -> CalendarAccess {
    CalendarAccess {
        calendar: Calendar {
            id: BIRTHDAY_CALENDAR_ID,
            owner_id,
            name: BIRTHDAY_CALENDAR_NAME.to_string(),
            slug: None,
            description: Some("Birthdays of your contacts".to_string()),
            timezone: None,
            ctag: 1,
            updated_at: DateTime::UNIX_EPOCH,
        },
        editor: false,
        shared: false,
        read_free_busy_only: false,
    }
}

/// Whether a calendar id addresses the virtual collection.
#[must_use]
pub fn is_birthday_calendar(calendar_id: i64) -> bool {
    calendar_id == BIRTHDAY_CALENDAR_ID
}

/// Synthesizes one yearly-recurring VEVENT per contact that has both a
/// birthday and a display name.
#[must_use]
pub fn birthday_events(contacts: &[Contact], today: DateTime<Utc>) -> Vec<Event> {
    contacts
        .iter()
        .filter_map(|contact| birthday_event(contact, today))
        .collect()
}

fn birthday_event(contact: &Contact, today: DateTime<Utc>) -> Option<Event> {
    let birthday = contact.birthday?;
    let display_name = contact.display_name.as_deref()?;

    let next = next_occurrence(birthday, today);
    let summary = if birthday.year() >= 1900 {
        let age = next.year() - birthday.year();
        format!("{display_name}'s birthday ({age})")
    } else {
        format!("{display_name}'s birthday")
    };

    let uid = format!("birthday-{}@{BIRTHDAY_UID_DOMAIN}", contact.uid);
    let date = format_date(next);
    let raw_ical = format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//calcard//birthdays//EN\r\nBEGIN:VEVENT\r\nUID:{uid}\r\nDTSTART;VALUE=DATE:{date}\r\nRRULE:FREQ=YEARLY\r\nTRANSP:TRANSPARENT\r\nSUMMARY:{summary}\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n"
    );

    Some(Event {
        id: contact.id,
        calendar_id: BIRTHDAY_CALENDAR_ID,
        uid,
        resource_name: format!("birthday-{}", contact.uid),
        etag: etag::content_etag(raw_ical.as_bytes()),
        raw_ical,
        dt_start: Some(next),
        dt_end: None,
        all_day: true,
        summary: Some(summary),
        last_modified: DateTime::UNIX_EPOCH,
    })
}

/// The next calendar date (UTC midnight) the birthday falls on, starting
/// from `today`. February 29 shifts to March 1 in common years.
fn next_occurrence(birthday: DateTime<Utc>, today: DateTime<Utc>) -> DateTime<Utc> {
    let (month, day) = (birthday.month(), birthday.day());

    for year in [today.year(), today.year() + 1] {
        let candidate = Utc
            .with_ymd_and_hms(year, month, day, 0, 0, 0)
            .earliest()
            .or_else(|| {
                // Feb 29 in a common year.
                Utc.with_ymd_and_hms(year, 3, 1, 0, 0, 0).earliest()
            });
        if let Some(candidate) = candidate
            && candidate.date_naive() >= today.date_naive()
        {
            return candidate;
        }
    }

    // Unreachable in practice; fall back to the birthday itself.
    birthday
}
