//! `calendar-query` filter evaluation (RFC 4791 §9.7).
//!
//! A stored object is matched against the `comp-filter` tree using the
//! unfolded payload text. Matching is deliberately permissive where the
//! request is broken: unparsable filter date-times and unknown `FREQ`
//! values degrade to "matches" so a defective client sees too much rather
//! than silently too little.

use chrono::{DateTime, Duration, Months, Utc};

use crate::dav::core::{CompFilter, ParamFilter, PropFilter, TextMatch, TimeRange};
use crate::ical::{datetime, lexer};

/// Default instance cap when `RRULE` carries no `COUNT`.
const DEFAULT_EXPANSION_COUNT: u32 = 500;

/// Hard expansion bounds: iteration stops once past both DTSTART + 3
/// years and this many steps, whatever the rule says.
const EXPANSION_SAFETY_STEPS: u32 = 100;
const EXPANSION_SAFETY_YEARS: i64 = 3;

/// Default event duration when DTEND is absent.
const DEFAULT_DURATION_HOURS: i64 = 1;

/// Matches a stored object against a `comp-filter` tree.
#[must_use]
pub fn matches(payload: &str, filter: &CompFilter) -> bool {
    let lines = lexer::unfold(payload);
    let upper: Vec<String> = lines.iter().map(|l| l.to_ascii_uppercase()).collect();
    comp_matches(&lines, &upper, filter)
}

fn comp_matches(lines: &[String], upper: &[String], filter: &CompFilter) -> bool {
    if !filter.name.is_empty() {
        let begin = format!("BEGIN:{}", filter.name);
        let present = upper.iter().any(|l| l.starts_with(&begin));
        if filter.is_not_defined {
            return !present;
        }
        if !present {
            return false;
        }
    }

    if let Some(range) = &filter.time_range
        && !time_range_matches(lines, range)
    {
        return false;
    }

    for child in &filter.comp_filters {
        if !comp_matches(lines, upper, child) {
            return false;
        }
    }

    for prop_filter in &filter.prop_filters {
        if !prop_matches(lines, upper, prop_filter) {
            return false;
        }
    }

    if let Some(text_match) = &filter.text_match {
        let whole = upper.join("\n");
        if !text_matches(&whole, text_match) {
            return false;
        }
    }

    true
}

fn prop_matches(lines: &[String], upper: &[String], filter: &PropFilter) -> bool {
    let needle = format!("{}:", filter.name);
    let defined = upper.iter().any(|l| l.contains(&needle));

    if filter.is_not_defined {
        return !defined;
    }
    if !defined {
        return false;
    }

    // Lines carrying this property, in original casing for value matching.
    let prop_lines: Vec<&String> = lines
        .iter()
        .zip(upper)
        .filter(|(_, u)| {
            u.starts_with(&filter.name)
                && matches!(
                    u.as_bytes().get(filter.name.len()),
                    Some(&b':' | &b';')
                )
        })
        .map(|(line, _)| line)
        .collect();

    for param_filter in &filter.param_filters {
        if !param_matches(&prop_lines, param_filter) {
            return false;
        }
    }

    if let Some(text_match) = &filter.text_match {
        let hit = prop_lines
            .iter()
            .filter_map(|line| lexer::property_value(line))
            .any(|value| substring_ci(value, &text_match.value));
        let mut result = hit || text_match.value.is_empty();
        if text_match.negate {
            result = !result;
        }
        return result;
    }

    true
}

fn param_matches(prop_lines: &[&String], filter: &ParamFilter) -> bool {
    let values: Vec<&str> = prop_lines
        .iter()
        .filter_map(|line| lexer::property_param(line, &filter.name))
        .collect();

    if filter.is_not_defined {
        return values.is_empty();
    }
    if values.is_empty() {
        return false;
    }

    filter.text_match.as_ref().is_none_or(|text_match| {
        let hit = values
            .iter()
            .any(|value| substring_ci(value, &text_match.value));
        let result = hit || text_match.value.is_empty();
        if text_match.negate { !result } else { result }
    })
}

fn text_matches(haystack_upper: &str, text_match: &TextMatch) -> bool {
    let result =
        text_match.value.is_empty() || haystack_upper.contains(&text_match.value.to_ascii_uppercase());
    if text_match.negate { !result } else { result }
}

/// Case-insensitive ASCII substring test; an empty needle matches.
fn substring_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty()
        || haystack
            .to_ascii_uppercase()
            .contains(&needle.to_ascii_uppercase())
}

/// Evaluates a `time-range` against the object, expanding `RRULE`
/// recurrences when present.
fn time_range_matches(lines: &[String], range: &TimeRange) -> bool {
    // A present-but-unparsable bound degrades to "matches".
    let range_start = match parse_bound(range.start.as_deref()) {
        Ok(bound) => bound,
        Err(()) => return true,
    };
    let range_end = match parse_bound(range.end.as_deref()) {
        Ok(bound) => bound,
        Err(()) => return true,
    };

    let Some(event_start) = first_datetime(lines, "DTSTART") else {
        // No start to compare against; include rather than hide.
        return true;
    };

    let duration = first_datetime(lines, "DTEND")
        .map_or(Duration::hours(DEFAULT_DURATION_HOURS), |end| {
            (end - event_start).max(Duration::zero())
        });

    if let Some(rule) = first_value(lines, "RRULE") {
        return recurrence_overlaps(event_start, duration, &rule, range_start, range_end);
    }

    overlaps(event_start, event_start + duration, range_start, range_end)
}

/// Overlap of `[start, end)` ranges; unbounded sides are `None`.
fn overlaps(
    event_start: DateTime<Utc>,
    event_end: DateTime<Utc>,
    range_start: Option<DateTime<Utc>>,
    range_end: Option<DateTime<Utc>>,
) -> bool {
    let after_start = range_start.is_none_or(|start| event_end > start);
    let before_end = range_end.is_none_or(|end| event_start < end);
    after_start && before_end
}

/// Expands FREQ/INTERVAL/COUNT/UNTIL and reports whether any instance
/// overlaps the range. BYxxx rules are not interpreted; an unknown FREQ
/// conservatively matches.
fn recurrence_overlaps(
    event_start: DateTime<Utc>,
    duration: Duration,
    rule: &str,
    range_start: Option<DateTime<Utc>>,
    range_end: Option<DateTime<Utc>>,
) -> bool {
    let parts = lexer::rule_parts(rule);

    let freq = lexer::rule_part(&parts, "FREQ")
        .unwrap_or_default()
        .to_ascii_uppercase();

    let interval: u32 = lexer::rule_part(&parts, "INTERVAL")
        .and_then(|v| v.parse().ok())
        .filter(|&i| i > 0)
        .unwrap_or(1);

    let count: u32 = lexer::rule_part(&parts, "COUNT")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_EXPANSION_COUNT);

    let until = lexer::rule_part(&parts, "UNTIL")
        .and_then(|v| datetime::parse_datetime(v, None))
        .or_else(|| range_end.map(|end| end + Duration::days(1)));

    let safety_horizon = event_start
        .checked_add_months(Months::new(12 * u32::try_from(EXPANSION_SAFETY_YEARS).unwrap_or(3)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let mut occurrence = event_start;
    for step in 0..count {
        if let Some(limit) = until
            && occurrence > limit
        {
            break;
        }
        if occurrence > safety_horizon && step > EXPANSION_SAFETY_STEPS {
            break;
        }

        if overlaps(occurrence, occurrence + duration, range_start, range_end) {
            return true;
        }

        occurrence = match advance(occurrence, &freq, interval) {
            Some(next) => next,
            // Unknown FREQ: do not guess, include the event.
            None => return true,
        };
    }

    false
}

/// Concrete instances of an object inside `[range_start, range_end)`,
/// recurrence-expanded under the same bounds as matching. Used by
/// free-busy assembly.
#[must_use]
pub fn occurrences_in_range(
    payload: &str,
    range_start: Option<DateTime<Utc>>,
    range_end: Option<DateTime<Utc>>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let lines = lexer::unfold(payload);

    let Some(event_start) = first_datetime(&lines, "DTSTART") else {
        return Vec::new();
    };
    let duration = first_datetime(&lines, "DTEND")
        .map_or(Duration::hours(DEFAULT_DURATION_HOURS), |end| {
            (end - event_start).max(Duration::zero())
        });

    let mut result = Vec::new();

    let Some(rule) = first_value(&lines, "RRULE") else {
        if overlaps(event_start, event_start + duration, range_start, range_end) {
            result.push((event_start, event_start + duration));
        }
        return result;
    };

    let parts = lexer::rule_parts(&rule);
    let freq = lexer::rule_part(&parts, "FREQ")
        .unwrap_or_default()
        .to_ascii_uppercase();
    let interval: u32 = lexer::rule_part(&parts, "INTERVAL")
        .and_then(|v| v.parse().ok())
        .filter(|&i| i > 0)
        .unwrap_or(1);
    let count: u32 = lexer::rule_part(&parts, "COUNT")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_EXPANSION_COUNT);
    let until = lexer::rule_part(&parts, "UNTIL")
        .and_then(|v| datetime::parse_datetime(v, None))
        .or_else(|| range_end.map(|end| end + Duration::days(1)));
    let safety_horizon = event_start
        .checked_add_months(Months::new(12 * u32::try_from(EXPANSION_SAFETY_YEARS).unwrap_or(3)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let mut occurrence = event_start;
    for step in 0..count {
        if let Some(limit) = until
            && occurrence > limit
        {
            break;
        }
        if occurrence > safety_horizon && step > EXPANSION_SAFETY_STEPS {
            break;
        }

        if overlaps(occurrence, occurrence + duration, range_start, range_end) {
            result.push((occurrence, occurrence + duration));
        }

        let Some(next) = advance(occurrence, &freq, interval) else {
            break;
        };
        occurrence = next;
    }

    result
}

fn advance(from: DateTime<Utc>, freq: &str, interval: u32) -> Option<DateTime<Utc>> {
    match freq {
        "DAILY" => from.checked_add_signed(Duration::days(i64::from(interval))),
        "WEEKLY" => from.checked_add_signed(Duration::weeks(i64::from(interval))),
        "MONTHLY" => from.checked_add_months(Months::new(interval)),
        "YEARLY" => from.checked_add_months(Months::new(12 * interval)),
        _ => None,
    }
}

/// `Ok(None)` for an absent bound, `Ok(Some)` for a parsed one, `Err` for
/// a present-but-unparsable one.
fn parse_bound(value: Option<&str>) -> Result<Option<DateTime<Utc>>, ()> {
    match value {
        None => Ok(None),
        Some(raw) => datetime::parse_datetime(raw, None).map(Some).ok_or(()),
    }
}

fn first_value(lines: &[String], property: &str) -> Option<String> {
    lines
        .iter()
        .find(|line| lexer::property_name(line) == property)
        .and_then(|line| lexer::property_value(line))
        .map(|v| v.trim().to_string())
}

fn first_datetime(lines: &[String], property: &str) -> Option<DateTime<Utc>> {
    let line = lines
        .iter()
        .find(|line| lexer::property_name(line) == property)?;
    let value = lexer::property_value(line)?;
    datetime::parse_datetime(value, lexer::property_param(line, "TZID"))
}
