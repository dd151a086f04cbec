//! iCalendar (RFC 5545) line-level scanning and validation.
//!
//! This is deliberately not a full iCalendar object model: stored payloads
//! are kept as raw text, and the server only extracts what the protocol
//! needs: component structure, UIDs, date-times, recurrence parameters,
//! attendee counts, and METHOD presence.

pub mod datetime;
pub mod lexer;
pub mod scan;
pub mod validate;

use thiserror::Error;

pub use scan::{CalendarScan, ComponentScan, scan};

/// Structural errors raised while scanning iCalendar data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IcalError {
    #[error("data does not begin with BEGIN:VCALENDAR")]
    NotCalendar,

    #[error("unbalanced component: END:{found} does not close {expected}")]
    MismatchedEnd { expected: String, found: String },

    #[error("unbalanced component: {0} is never closed")]
    UnclosedComponent(String),

    #[error("END without matching BEGIN: {0}")]
    UnexpectedEnd(String),

    #[error("calendar contains no VEVENT, VTODO, VJOURNAL, or VFREEBUSY")]
    NoConcreteComponent,
}

pub type IcalResult<T> = std::result::Result<T, IcalError>;
