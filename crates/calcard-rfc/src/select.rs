//! `calendar-data` component/property sub-selection (RFC 4791 §9.6.5).
//!
//! Projects a stored iCalendar payload through the `<comp>/<prop>` tree a
//! report requested. The payload is streamed line by line in its original
//! (folded) form: folded continuations inherit the inclusion decision of
//! the property line they continue, so long lines survive untouched.

use crate::dav::core::{CalendarDataRequest, CompSelection};
use crate::ical::lexer;

/// One open component during the streaming walk.
struct Frame<'a> {
    /// Sub-selector governing this component's children; `None` means
    /// everything below is allowed.
    selector: Option<&'a CompSelection>,
    /// Whether this component (and its BEGIN/END lines) is emitted.
    keep: bool,
}

/// Projects `payload` through the request's selection. Without a
/// selection the payload is returned unchanged.
#[must_use]
pub fn project(payload: &str, request: &CalendarDataRequest) -> String {
    let Some(selection) = &request.selection else {
        return payload.to_string();
    };

    // The walk is anchored at VCALENDAR. A selector rooted below it is
    // wrapped in an implicit all-properties VCALENDAR node so the output
    // keeps a valid outer component with its header lines.
    let implicit_root;
    let root: &CompSelection = if selection.name == "VCALENDAR" {
        selection
    } else {
        implicit_root = CompSelection {
            name: "VCALENDAR".to_string(),
            props: None,
            comps: vec![selection.clone()],
        };
        &implicit_root
    };

    let mut output = String::with_capacity(payload.len());
    let mut stack: Vec<Frame<'_>> = Vec::new();
    let mut last_property_kept = false;

    for raw_line in payload.split('\n') {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.is_empty() {
            continue;
        }

        // Folded continuation: inherit the previous property's decision.
        if line.starts_with([' ', '\t']) {
            if last_property_kept {
                push_line(&mut output, line);
            }
            continue;
        }

        let name = lexer::property_name(line);
        match name.as_str() {
            "BEGIN" => {
                let component = lexer::property_value(line)
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_uppercase();
                let frame = open_frame(&stack, root, &component);
                if frame.keep {
                    push_line(&mut output, line);
                }
                stack.push(frame);
                last_property_kept = false;
            }
            "END" => {
                if let Some(frame) = stack.pop()
                    && frame.keep
                {
                    push_line(&mut output, line);
                }
                last_property_kept = false;
            }
            property => {
                let kept = stack.last().is_some_and(|frame| {
                    frame.keep && property_allowed(frame.selector, property)
                });
                if kept {
                    push_line(&mut output, line);
                }
                last_property_kept = kept;
            }
        }
    }

    output
}

fn open_frame<'a>(stack: &[Frame<'a>], root: &'a CompSelection, component: &str) -> Frame<'a> {
    let Some(parent) = stack.last() else {
        // Document root: VCALENDAR is implicitly allowed.
        return Frame {
            selector: Some(root),
            keep: component == root.name,
        };
    };

    if !parent.keep {
        return Frame {
            selector: None,
            keep: false,
        };
    }

    match parent.selector {
        // Parent has no constraints below it.
        None => Frame {
            selector: None,
            keep: true,
        },
        Some(selector) => {
            // An empty comp list allows all descendants.
            if selector.comps.is_empty() {
                return Frame {
                    selector: None,
                    keep: true,
                };
            }
            selector
                .comps
                .iter()
                .find(|comp| comp.name == component)
                .map_or(
                    Frame {
                        selector: None,
                        keep: false,
                    },
                    |sub| Frame {
                        selector: Some(sub),
                        keep: true,
                    },
                )
        }
    }
}

fn property_allowed(selector: Option<&CompSelection>, property: &str) -> bool {
    match selector.and_then(|s| s.props.as_ref()) {
        None => true,
        Some(props) => props.iter().any(|p| p == property),
    }
}

fn push_line(output: &mut String, line: &str) {
    output.push_str(line);
    output.push_str("\r\n");
}
