//! Structural scan of an iCalendar payload.
//!
//! Walks unfolded content lines once, validating BEGIN/END balance and
//! collecting the protocol-relevant facts: top-level component records
//! (UID occurrences, RECURRENCE-ID, ATTENDEE counts), every component
//! name seen, METHOD presence, and the first DTSTART/DTEND/RRULE.

use chrono::{DateTime, Utc};

use super::{IcalError, IcalResult, datetime, lexer};

/// Component types that make a calendar object a storable resource.
pub const CONCRETE_COMPONENTS: &[&str] = &["VEVENT", "VTODO", "VJOURNAL", "VFREEBUSY"];

/// One immediate child component of VCALENDAR.
#[derive(Debug, Clone, Default)]
pub struct ComponentScan {
    /// Component type (`VEVENT`, `VTODO`, ...).
    pub name: String,
    /// Number of `UID` properties seen directly in this component.
    pub uid_count: usize,
    /// First `UID` value, if any.
    pub uid: Option<String>,
    /// Whether the component carries a `RECURRENCE-ID`.
    pub has_recurrence_id: bool,
    /// `ATTENDEE` properties directly in this component.
    pub attendee_count: usize,
}

/// Result of scanning a whole payload.
#[derive(Debug, Clone, Default)]
pub struct CalendarScan {
    /// Top-level concrete components in document order.
    pub components: Vec<ComponentScan>,
    /// Every distinct component name opened anywhere, uppercased.
    pub component_names: Vec<String>,
    /// Whether a `METHOD` property appears at the VCALENDAR level.
    pub has_method: bool,
    /// First `DTSTART`, parsed to UTC, with all-day flag.
    pub dt_start: Option<(DateTime<Utc>, bool)>,
    /// First `DTEND`, parsed to UTC, with all-day flag.
    pub dt_end: Option<(DateTime<Utc>, bool)>,
    /// First `SUMMARY` value.
    pub summary: Option<String>,
    /// First `RRULE` value, split into uppercase key/value parts.
    pub rrule: Option<Vec<(String, String)>>,
}

impl CalendarScan {
    /// First UID across components.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.components.iter().find_map(|c| c.uid.as_deref())
    }

    /// The largest per-component attendee count.
    #[must_use]
    pub fn max_attendees(&self) -> usize {
        self.components
            .iter()
            .map(|c| c.attendee_count)
            .max()
            .unwrap_or(0)
    }

    /// Whether at least one concrete component is present.
    #[must_use]
    pub fn has_concrete_component(&self) -> bool {
        self.component_names
            .iter()
            .any(|n| CONCRETE_COMPONENTS.contains(&n.as_str()))
    }
}

/// Scans an iCalendar payload.
///
/// ## Errors
/// Structural errors: the data must open with `BEGIN:VCALENDAR`, every
/// `END` must close the innermost open component, and nothing may remain
/// open at the end of input. Content errors (missing UID and the like) are
/// left to [`super::validate`].
pub fn scan(ical: &str) -> IcalResult<CalendarScan> {
    let lines = lexer::unfold(ical);

    let mut result = CalendarScan::default();
    let mut stack: Vec<String> = Vec::new();
    let mut current_top: Option<ComponentScan> = None;

    for line in &lines {
        let name = lexer::property_name(line);

        match name.as_str() {
            "BEGIN" => {
                let comp = lexer::property_value(line)
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_uppercase();

                if stack.is_empty() && comp != "VCALENDAR" {
                    return Err(IcalError::NotCalendar);
                }

                if !result.component_names.contains(&comp) {
                    result.component_names.push(comp.clone());
                }

                // An immediate child of VCALENDAR opens a top-level record.
                if stack.len() == 1 && CONCRETE_COMPONENTS.contains(&comp.as_str()) {
                    current_top = Some(ComponentScan {
                        name: comp.clone(),
                        ..ComponentScan::default()
                    });
                }

                stack.push(comp);
            }
            "END" => {
                let comp = lexer::property_value(line)
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_uppercase();

                match stack.pop() {
                    Some(open) if open == comp => {}
                    Some(open) => {
                        return Err(IcalError::MismatchedEnd {
                            expected: open,
                            found: comp,
                        });
                    }
                    None => return Err(IcalError::UnexpectedEnd(comp)),
                }

                if stack.len() == 1
                    && let Some(top) = current_top.take()
                {
                    result.components.push(top);
                }
            }
            _ if stack.is_empty() => return Err(IcalError::NotCalendar),
            prop => scan_property(&mut result, current_top.as_mut(), &stack, prop, line),
        }
    }

    if let Some(open) = stack.pop() {
        return Err(IcalError::UnclosedComponent(open));
    }

    if !result
        .component_names
        .first()
        .is_some_and(|n| n == "VCALENDAR")
    {
        return Err(IcalError::NotCalendar);
    }

    Ok(result)
}

fn scan_property(
    result: &mut CalendarScan,
    current_top: Option<&mut ComponentScan>,
    stack: &[String],
    prop: &str,
    line: &str,
) {
    // Properties inside the top-level component (depth 2).
    if stack.len() == 2
        && let Some(top) = current_top
    {
        match prop {
            "UID" => {
                top.uid_count += 1;
                if top.uid.is_none() {
                    top.uid = lexer::property_value(line).map(|v| v.trim().to_string());
                }
            }
            "RECURRENCE-ID" => top.has_recurrence_id = true,
            "ATTENDEE" => top.attendee_count += 1,
            "DTSTART" if result.dt_start.is_none() => {
                result.dt_start = parse_dt(line);
            }
            "DTEND" if result.dt_end.is_none() => {
                result.dt_end = parse_dt(line);
            }
            "SUMMARY" if result.summary.is_none() => {
                result.summary = lexer::property_value(line).map(|v| v.trim().to_string());
            }
            "RRULE" if result.rrule.is_none() => {
                result.rrule = lexer::property_value(line).map(lexer::rule_parts);
            }
            _ => {}
        }
    }

    if stack.len() == 1 && prop == "METHOD" {
        result.has_method = true;
    }
}

fn parse_dt(line: &str) -> Option<(DateTime<Utc>, bool)> {
    let value = lexer::property_value(line)?;
    let tzid = lexer::property_param(line, "TZID");
    datetime::parse_classified(value, tzid)
}
