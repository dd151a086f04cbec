//! vCard (RFC 6350) line-level scanning.
//!
//! Contacts are stored as raw vCard text; the scanner checks the framing
//! and pulls out the properties the server indexes: `UID`, `FN`, and
//! `BDAY`.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::ical::{datetime, lexer};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VcardError {
    #[error("data does not begin with BEGIN:VCARD")]
    NotVcard,

    #[error("data does not end with END:VCARD")]
    MissingEnd,

    #[error("unbalanced BEGIN:VCARD/END:VCARD pairs")]
    Unbalanced,
}

pub type VcardResult<T> = std::result::Result<T, VcardError>;

/// Extracted facts from a vCard payload.
#[derive(Debug, Clone, Default)]
pub struct VcardScan {
    pub uid: Option<String>,
    pub display_name: Option<String>,
    /// `BDAY`, parsed as a date or date-time; year 1604 or earlier means
    /// "year unknown" by common vCard convention and is kept as-is.
    pub birthday: Option<DateTime<Utc>>,
}

/// Scans a vCard payload: the data must open with `BEGIN:VCARD`, close
/// with `END:VCARD`, and carry balanced BEGIN/END counts.
///
/// ## Errors
/// A [`VcardError`] describing the framing violation.
pub fn scan(vcard: &str) -> VcardResult<VcardScan> {
    let lines = lexer::unfold(vcard);

    let first = lines.first().ok_or(VcardError::NotVcard)?;
    if !first.trim().eq_ignore_ascii_case("BEGIN:VCARD") {
        return Err(VcardError::NotVcard);
    }

    let last = lines.last().ok_or(VcardError::NotVcard)?;
    if !last.trim().eq_ignore_ascii_case("END:VCARD") {
        return Err(VcardError::MissingEnd);
    }

    let mut depth = 0_i32;
    let mut result = VcardScan::default();

    for line in &lines {
        match lexer::property_name(line).as_str() {
            "BEGIN" => depth += 1,
            "END" => {
                depth -= 1;
                if depth < 0 {
                    return Err(VcardError::Unbalanced);
                }
            }
            "UID" if result.uid.is_none() => {
                result.uid = lexer::property_value(line).map(|v| v.trim().to_string());
            }
            "FN" if result.display_name.is_none() => {
                result.display_name = lexer::property_value(line).map(|v| v.trim().to_string());
            }
            "BDAY" if result.birthday.is_none() => {
                result.birthday = lexer::property_value(line)
                    .and_then(|v| datetime::parse_datetime(v, None));
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(VcardError::Unbalanced);
    }

    Ok(result)
}
