//! MKCALENDAR request XML parsing.

use super::dom::Element;
use super::error::{ParseError, ParseResult};
use crate::dav::core::{CALDAV_NS, DAV_NS, MkCalendarRequest};

/// Parses an optional MKCALENDAR body (RFC 4791 §5.3.1).
///
/// An empty body is valid and sets nothing. When a body is present, the
/// `displayname`, `calendar-description`, and `calendar-timezone`
/// properties inside `<set><prop>` are honored; everything else is
/// ignored.
///
/// ## Errors
/// Returns an error if a non-empty body is malformed or rooted in the
/// wrong element.
pub fn parse_mkcalendar(xml: &[u8]) -> ParseResult<MkCalendarRequest> {
    if xml.is_empty() {
        return Ok(MkCalendarRequest::default());
    }

    let root = Element::parse(xml)?;
    if !root.is(CALDAV_NS, "mkcalendar") {
        return Err(ParseError::unexpected_element(&root.name));
    }

    let mut request = MkCalendarRequest::default();

    for set in root.children_named(DAV_NS, "set") {
        let Some(prop) = set.child(DAV_NS, "prop") else {
            continue;
        };
        if let Some(name) = prop.child(DAV_NS, "displayname") {
            request.display_name = Some(name.text_trimmed().to_string());
        }
        if let Some(description) = prop.child(CALDAV_NS, "calendar-description") {
            request.description = Some(description.text_trimmed().to_string());
        }
        if let Some(timezone) = prop.child(CALDAV_NS, "calendar-timezone") {
            request.timezone = Some(timezone.text.trim().to_string());
        }
    }

    Ok(request)
}
