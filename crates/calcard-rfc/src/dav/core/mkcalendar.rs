//! MKCALENDAR request model (RFC 4791 §5.3.1).

/// Properties a client may set at calendar creation. All optional; an
/// empty body is a valid MKCALENDAR.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MkCalendarRequest {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub timezone: Option<String>,
}
