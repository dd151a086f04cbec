//! `<D:error>` body emission (RFC 4918 §16, RFC 4791 §1.3).
//!
//! Condition names can originate from caller-supplied strings, so they
//! are validated against `[a-z][a-z0-9-]*` before being used as element
//! names. A lone malformed condition is replaced with
//! `invalid-condition`; in a multi-condition body, malformed entries are
//! dropped. Either way no caller-controlled `<` ever reaches the output.

use crate::dav::core::{CALDAV_NS, CARDDAV_NS, DAV_NS, ErrorCondition};

/// Serializes an error body carrying the given precondition names.
#[must_use]
pub fn serialize_error(conditions: &[ErrorCondition]) -> String {
    let mut xml = String::from(concat!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>",
        "<D:error xmlns:D=\"DAV:\"",
        " xmlns:C=\"urn:ietf:params:xml:ns:caldav\"",
        " xmlns:CR=\"urn:ietf:params:xml:ns:carddav\">",
    ));

    if let [single] = conditions {
        push_condition(&mut xml, single, true);
    } else {
        for condition in conditions {
            push_condition(&mut xml, condition, false);
        }
    }

    xml.push_str("</D:error>");
    xml
}

/// Convenience for the common single-condition body.
#[must_use]
pub fn serialize_single(condition: &ErrorCondition) -> String {
    serialize_error(std::slice::from_ref(condition))
}

fn push_condition(xml: &mut String, condition: &ErrorCondition, replace_invalid: bool) {
    let name = if condition.is_well_formed() {
        condition.name.as_str()
    } else if replace_invalid {
        "invalid-condition"
    } else {
        return;
    };

    let prefix = match condition.namespace.as_str() {
        CALDAV_NS => "C",
        CARDDAV_NS => "CR",
        DAV_NS => "D",
        // Foreign namespaces are not part of the vocabulary this server
        // emits; collapse them into the DAV namespace.
        _ => "D",
    };

    xml.push('<');
    xml.push_str(prefix);
    xml.push(':');
    xml.push_str(name);
    xml.push_str("/>");
}
