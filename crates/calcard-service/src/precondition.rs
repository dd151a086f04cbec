//! Precondition enforcement for PUT and DELETE.
//!
//! Two layers: HTTP conditional headers (`If-Match`/`If-None-Match`,
//! RFC 7232), and the ordered CalDAV precondition pipeline of RFC 4791
//! §5.3.2. The first failing step wins and determines both the HTTP
//! status and the condition name carried in the `<D:error>` body.

use chrono::{DateTime, Utc};

use calcard_core::config::DavConfig;
use calcard_rfc::dav::core::ErrorCondition;
use calcard_rfc::ical::{self, CalendarScan, datetime, lexer, validate};

use crate::error::{ServiceError, ServiceResult};
use crate::etag;

/// Parsed and advertised protocol limits.
#[derive(Debug, Clone)]
pub struct DavLimits {
    pub max_resource_size: usize,
    pub min_date_time: DateTime<Utc>,
    pub max_date_time: DateTime<Utc>,
    /// The advertised iCalendar forms of the date bounds.
    pub min_date_raw: String,
    pub max_date_raw: String,
    pub max_instances: u32,
    pub max_attendees: u32,
}

impl DavLimits {
    /// Parses the configured bounds once at startup.
    ///
    /// ## Errors
    /// `ServiceError::InvalidRequest` when a configured date bound is not
    /// a valid iCalendar date-time.
    pub fn from_config(config: &DavConfig) -> ServiceResult<Self> {
        let min_date_time = datetime::parse_datetime(&config.min_date_time, None).ok_or_else(
            || ServiceError::InvalidRequest(format!("bad min_date_time: {}", config.min_date_time)),
        )?;
        let max_date_time = datetime::parse_datetime(&config.max_date_time, None).ok_or_else(
            || ServiceError::InvalidRequest(format!("bad max_date_time: {}", config.max_date_time)),
        )?;

        Ok(Self {
            max_resource_size: config.max_resource_size,
            min_date_time,
            max_date_time,
            min_date_raw: config.min_date_time.clone(),
            max_date_raw: config.max_date_time.clone(),
            max_instances: config.max_instances,
            max_attendees: config.max_attendees_per_instance,
        })
    }
}

/// A failed CalDAV precondition: HTTP status plus the condition element
/// for the error body.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub status: u16,
    pub condition: ErrorCondition,
    pub message: String,
}

impl Rejection {
    fn new(status: u16, condition: ErrorCondition, message: impl Into<String>) -> Self {
        Self {
            status,
            condition,
            message: message.into(),
        }
    }

    fn caldav(status: u16, name: &str, message: impl Into<String>) -> Self {
        Self::new(status, ErrorCondition::caldav(name), message)
    }
}

/// Evaluates `If-Match`/`If-None-Match` against the stored ETag.
///
/// Returns `true` when the request may proceed. Comparison strips quotes
/// on the header side; `existing` is the stored (unquoted) tag, `None`
/// when no resource exists at the target.
#[must_use]
pub fn conditional_headers_allow(
    if_match: Option<&str>,
    if_none_match: Option<&str>,
    existing: Option<&str>,
) -> bool {
    if let Some(value) = if_none_match {
        let value = value.trim();
        if value == "*" {
            if existing.is_some() {
                return false;
            }
        } else if let Some(stored) = existing
            && stored == etag::normalize(value)
        {
            return false;
        }
    }

    if let Some(value) = if_match {
        let value = value.trim();
        match existing {
            None => return false,
            Some(stored) => {
                if value != "*" && stored != etag::normalize(value) {
                    return false;
                }
            }
        }
    }

    true
}

/// A validated event payload ready to store.
#[derive(Debug)]
pub struct EventPayload {
    pub text: String,
    pub scan: CalendarScan,
}

const CALENDAR_CONTENT_TYPES: &[&str] = &["text/calendar", "application/ical", "application/ics"];

/// Runs the ordered CalDAV PUT pipeline, steps 1–11 (UID uniqueness is
/// checked against the store by the object service).
///
/// ## Errors
/// The first failing precondition, with its status and condition name.
pub fn validate_event_put(
    body: &[u8],
    content_type: Option<&str>,
    limits: &DavLimits,
) -> Result<EventPayload, Box<Rejection>> {
    // 1. Size cap (also enforced by the body reader).
    if body.len() > limits.max_resource_size {
        return Err(Box::new(Rejection::caldav(
            413,
            "max-resource-size",
            format!("body exceeds {} bytes", limits.max_resource_size),
        )));
    }

    // 2. A present content type must be a calendar media type.
    if let Some(content_type) = content_type
        && !CALENDAR_CONTENT_TYPES
            .iter()
            .any(|allowed| content_type.trim().starts_with(allowed))
    {
        return Err(Box::new(Rejection::caldav(
            415,
            "supported-calendar-data",
            format!("unsupported media type {content_type}"),
        )));
    }

    // 3. Structural validity.
    let text = match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => {
            return Err(Box::new(Rejection::caldav(
                400,
                "valid-calendar-data",
                "body is not valid UTF-8",
            )));
        }
    };
    let scan = match ical::scan(&text) {
        Ok(scan) => scan,
        Err(err) => {
            return Err(Box::new(Rejection::caldav(
                400,
                "valid-calendar-data",
                err.to_string(),
            )));
        }
    };

    // 4. Component whitelist.
    if let Some(unknown) = validate::unsupported_component(&scan) {
        return Err(Box::new(Rejection::caldav(
            403,
            "supported-calendar-component",
            format!("unsupported component {unknown}"),
        )));
    }

    // 5. At least one concrete component.
    if !scan.has_concrete_component() {
        return Err(Box::new(Rejection::caldav(
            403,
            "valid-calendar-component",
            "no VEVENT, VTODO, VJOURNAL, or VFREEBUSY",
        )));
    }

    // 6. Scheduling messages are not storable resources.
    if scan.has_method {
        return Err(Box::new(Rejection::caldav(
            409,
            "valid-calendar-object-resource",
            "METHOD present",
        )));
    }

    // 7. Object-resource validity.
    if let Err(invalidity) = validate::validate_calendar_object_resource(&scan) {
        let status = match invalidity {
            validate::ObjectInvalidity::MixedUids | validate::ObjectInvalidity::MethodPresent => {
                409
            }
            validate::ObjectInvalidity::BadUidCount { .. }
            | validate::ObjectInvalidity::MultipleMasters => 400,
        };
        return Err(Box::new(Rejection::caldav(
            status,
            "valid-calendar-object-resource",
            invalidity.to_string(),
        )));
    }

    // 8. Every DTSTART/DTEND inside the advertised window.
    if let Some(rejection) = check_date_window(&text, limits) {
        return Err(Box::new(rejection));
    }

    // 9. Attendee cap, per top-level component.
    let attendees = scan.max_attendees();
    if attendees > limits.max_attendees as usize {
        return Err(Box::new(Rejection::caldav(
            403,
            "max-attendees-per-instance",
            format!("{attendees} attendees exceeds limit"),
        )));
    }

    // 10. RRULE COUNT cap.
    if let Some(parts) = &scan.rrule
        && let Some(count) = lexer::rule_part(parts, "COUNT").and_then(|v| v.parse::<u32>().ok())
        && count > limits.max_instances
    {
        return Err(Box::new(Rejection::caldav(
            403,
            "max-instances",
            format!("COUNT={count} exceeds limit"),
        )));
    }

    // 11. The content type must actually be present.
    if content_type.is_none() {
        return Err(Box::new(Rejection::caldav(
            415,
            "supported-calendar-data",
            "missing Content-Type",
        )));
    }

    Ok(EventPayload { text, scan })
}

fn check_date_window(text: &str, limits: &DavLimits) -> Option<Rejection> {
    for line in lexer::unfold(text) {
        let name = lexer::property_name(&line);
        if name != "DTSTART" && name != "DTEND" {
            continue;
        }
        let Some(value) = lexer::property_value(&line) else {
            continue;
        };
        let Some(parsed) = datetime::parse_datetime(value, lexer::property_param(&line, "TZID"))
        else {
            continue;
        };

        if parsed < limits.min_date_time {
            return Some(Rejection::caldav(
                403,
                "min-date-time",
                format!("{value} is before {}", limits.min_date_raw),
            ));
        }
        if parsed > limits.max_date_time {
            return Some(Rejection::caldav(
                403,
                "max-date-time",
                format!("{value} is after {}", limits.max_date_raw),
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> DavLimits {
        DavLimits::from_config(&DavConfig::default()).unwrap()
    }

    fn event(body_extra: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:ev1\r\nDTSTART:20240601T100000Z\r\nDTEND:20240601T110000Z\r\n{body_extra}END:VEVENT\r\nEND:VCALENDAR\r\n"
        )
    }

    #[test]
    fn conditional_header_semantics() {
        // If-None-Match: * is create-only.
        assert!(conditional_headers_allow(None, Some("*"), None));
        assert!(!conditional_headers_allow(None, Some("*"), Some("x")));

        // If-Match updates only when tags agree.
        assert!(conditional_headers_allow(Some("\"x\""), None, Some("x")));
        assert!(!conditional_headers_allow(Some("\"y\""), None, Some("x")));
        assert!(!conditional_headers_allow(Some("\"x\""), None, None));
        assert!(conditional_headers_allow(Some("*"), None, Some("x")));

        // If-None-Match with a tag proceeds unless it matches.
        assert!(conditional_headers_allow(None, Some("\"y\""), Some("x")));
        assert!(!conditional_headers_allow(None, Some("\"x\""), Some("x")));
        assert!(conditional_headers_allow(None, Some("\"x\""), None));
    }

    #[test]
    fn accepts_valid_event() {
        let body = event("");
        let payload =
            validate_event_put(body.as_bytes(), Some("text/calendar"), &limits()).unwrap();
        assert_eq!(payload.scan.uid(), Some("ev1"));
    }

    #[test]
    fn oversized_body_is_rejected_first() {
        let mut custom = limits();
        custom.max_resource_size = 10;
        let body = event("");
        let rejection =
            validate_event_put(body.as_bytes(), Some("text/plain"), &custom).unwrap_err();
        assert_eq!(rejection.status, 413);
        assert_eq!(rejection.condition.name, "max-resource-size");
    }

    #[test]
    fn wrong_content_type() {
        let body = event("");
        let rejection =
            validate_event_put(body.as_bytes(), Some("text/plain"), &limits()).unwrap_err();
        assert_eq!(rejection.status, 415);
        assert_eq!(rejection.condition.name, "supported-calendar-data");
    }

    #[test]
    fn missing_content_type_fails_late() {
        let body = event("");
        let rejection = validate_event_put(body.as_bytes(), None, &limits()).unwrap_err();
        assert_eq!(rejection.status, 415);
    }

    #[test]
    fn structural_garbage() {
        let rejection =
            validate_event_put(b"hello world", Some("text/calendar"), &limits()).unwrap_err();
        assert_eq!(rejection.status, 400);
        assert_eq!(rejection.condition.name, "valid-calendar-data");
    }

    #[test]
    fn unknown_component() {
        let body = event("BEGIN:X-WEIRD\r\nEND:X-WEIRD\r\n");
        let rejection =
            validate_event_put(body.as_bytes(), Some("text/calendar"), &limits()).unwrap_err();
        assert_eq!(rejection.status, 403);
        assert_eq!(rejection.condition.name, "supported-calendar-component");
    }

    #[test]
    fn timezone_only_calendar() {
        let body = "BEGIN:VCALENDAR\r\nBEGIN:VTIMEZONE\r\nTZID:UTC\r\nEND:VTIMEZONE\r\nEND:VCALENDAR\r\n";
        let rejection =
            validate_event_put(body.as_bytes(), Some("text/calendar"), &limits()).unwrap_err();
        assert_eq!(rejection.status, 403);
        assert_eq!(rejection.condition.name, "valid-calendar-component");
    }

    #[test]
    fn method_is_conflict() {
        let body = "BEGIN:VCALENDAR\r\nMETHOD:REQUEST\r\nBEGIN:VEVENT\r\nUID:a\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let rejection =
            validate_event_put(body.as_bytes(), Some("text/calendar"), &limits()).unwrap_err();
        assert_eq!(rejection.status, 409);
        assert_eq!(rejection.condition.name, "valid-calendar-object-resource");
    }

    #[test]
    fn date_window_bounds() {
        let early = event("").replace("DTSTART:20240601T100000Z", "DTSTART:18991231T000000Z");
        let rejection =
            validate_event_put(early.as_bytes(), Some("text/calendar"), &limits()).unwrap_err();
        assert_eq!(rejection.status, 403);
        assert_eq!(rejection.condition.name, "min-date-time");

        let late = event("").replace("DTEND:20240601T110000Z", "DTEND:21010101T000000Z");
        let rejection =
            validate_event_put(late.as_bytes(), Some("text/calendar"), &limits()).unwrap_err();
        assert_eq!(rejection.condition.name, "max-date-time");
    }

    #[test]
    fn attendee_cap() {
        let attendees: String = (0..101)
            .map(|i| format!("ATTENDEE:mailto:a{i}@example.com\r\n"))
            .collect();
        let body = event(&attendees);
        let rejection =
            validate_event_put(body.as_bytes(), Some("text/calendar"), &limits()).unwrap_err();
        assert_eq!(rejection.status, 403);
        assert_eq!(rejection.condition.name, "max-attendees-per-instance");
    }

    #[test]
    fn instance_count_cap() {
        let body = event("RRULE:FREQ=DAILY;COUNT=1001\r\n");
        let rejection =
            validate_event_put(body.as_bytes(), Some("text/calendar"), &limits()).unwrap_err();
        assert_eq!(rejection.status, 403);
        assert_eq!(rejection.condition.name, "max-instances");
    }
}
