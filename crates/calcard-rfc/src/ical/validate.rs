//! Calendar-object-resource validity (RFC 4791 §4.1).

use super::CalendarScan;

/// Component types a calendar collection stores.
pub const SUPPORTED_COMPONENTS: &[&str] = &[
    "VCALENDAR", "VEVENT", "VTODO", "VJOURNAL", "VFREEBUSY", "VTIMEZONE", "STANDARD", "DAYLIGHT",
    "VALARM",
];

/// Why a structurally well-formed payload is still not a storable
/// calendar object resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectInvalidity {
    /// A component has zero or more than one UID property.
    BadUidCount { component: String, count: usize },
    /// Components carry differing UIDs.
    MixedUids,
    /// More than one component without a RECURRENCE-ID (several "masters").
    MultipleMasters,
    /// A METHOD property is present; scheduling messages are not resources.
    MethodPresent,
}

impl std::fmt::Display for ObjectInvalidity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadUidCount { component, count } => {
                write!(f, "{component} has {count} UID properties, expected exactly one")
            }
            Self::MixedUids => write!(f, "components carry differing UIDs"),
            Self::MultipleMasters => {
                write!(f, "multiple components without RECURRENCE-ID share a UID")
            }
            Self::MethodPresent => write!(f, "METHOD is not allowed in a stored resource"),
        }
    }
}

/// Validates the scanned payload as a calendar object resource: exactly
/// one UID per component, a single UID across components, at most one
/// master occurrence, and no METHOD.
///
/// ## Errors
/// The first violated rule, in the order above.
pub fn validate_calendar_object_resource(scan: &CalendarScan) -> Result<(), ObjectInvalidity> {
    for component in &scan.components {
        if component.uid_count != 1 {
            return Err(ObjectInvalidity::BadUidCount {
                component: component.name.clone(),
                count: component.uid_count,
            });
        }
    }

    let mut uids = scan.components.iter().filter_map(|c| c.uid.as_deref());
    if let Some(first) = uids.next()
        && uids.any(|uid| uid != first)
    {
        return Err(ObjectInvalidity::MixedUids);
    }

    if scan.components.len() > 1 {
        let masters = scan
            .components
            .iter()
            .filter(|c| !c.has_recurrence_id)
            .count();
        if masters > 1 {
            return Err(ObjectInvalidity::MultipleMasters);
        }
    }

    if scan.has_method {
        return Err(ObjectInvalidity::MethodPresent);
    }

    Ok(())
}

/// The first component name outside the supported set, if any.
#[must_use]
pub fn unsupported_component(scan: &CalendarScan) -> Option<&str> {
    scan.component_names
        .iter()
        .map(String::as_str)
        .find(|name| !SUPPORTED_COMPONENTS.contains(name))
}
