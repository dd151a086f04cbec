//! Content line lexer for iCalendar and vCard (RFC 5545 §3.1 folding).

/// Unfolds content lines: CRLF is normalized to LF, and any line whose
/// first character is SPACE or TAB is merged into the preceding line with
/// the leading whitespace stripped.
#[must_use]
pub fn unfold(input: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for raw_line in input.split('\n') {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.is_empty() {
            continue;
        }

        if let Some(continuation) = line.strip_prefix([' ', '\t']) {
            if let Some(prev) = lines.last_mut() {
                prev.push_str(continuation);
            } else {
                lines.push(continuation.to_string());
            }
        } else {
            lines.push(line.to_string());
        }
    }

    lines
}

/// Unfolded content joined back with LF. Used where matching runs over the
/// whole blob rather than line by line.
#[must_use]
pub fn unfold_to_string(input: &str) -> String {
    unfold(input).join("\n")
}

/// The property name of a content line: everything before the first `:`
/// or `;`, uppercased. Returns an empty string for degenerate lines.
#[must_use]
pub fn property_name(line: &str) -> String {
    let end = line.find([':', ';']).unwrap_or(line.len());
    line[..end].trim().to_ascii_uppercase()
}

/// The value of a content line: everything after the first `:`.
#[must_use]
pub fn property_value(line: &str) -> Option<&str> {
    line.split_once(':').map(|(_, value)| value)
}

/// Looks up a parameter in the `;PARAM=value` list between the property
/// name and the value `:`. Parameter names are case-insensitive; quoted
/// values are unquoted.
#[must_use]
pub fn property_param<'a>(line: &'a str, param: &str) -> Option<&'a str> {
    let colon = line.find(':')?;
    let head = &line[..colon];
    let mut parts = head.split(';');
    parts.next(); // property name

    for part in parts {
        let (key, value) = part.split_once('=')?;
        if key.trim().eq_ignore_ascii_case(param) {
            return Some(value.trim().trim_matches('"'));
        }
    }
    None
}

/// Splits an `RRULE` value (`FREQ=DAILY;INTERVAL=2;...`) into uppercase
/// key / raw value pairs. Malformed parts are skipped.
#[must_use]
pub fn rule_parts(value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .filter_map(|part| {
            let (key, val) = part.split_once('=')?;
            let key = key.trim().to_ascii_uppercase();
            if key.is_empty() {
                None
            } else {
                Some((key, val.trim().to_string()))
            }
        })
        .collect()
}

/// Looks up a single rule part by uppercase key.
#[must_use]
pub fn rule_part<'a>(parts: &'a [(String, String)], key: &str) -> Option<&'a str> {
    parts
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
