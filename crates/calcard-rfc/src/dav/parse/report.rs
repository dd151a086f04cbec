//! REPORT request XML parsing.

use super::dom::Element;
use super::error::{ParseError, ParseResult};
use crate::dav::core::{
    CALDAV_NS, CARDDAV_NS, CalendarDataRequest, CalendarQuery, CompFilter, CompSelection, DAV_NS,
    ExpandProperty, ExpandPropertyItem, FreeBusyQuery, Multiget, ParamFilter, PropFilter,
    PropertyName, QName, ReportRequest, ReportType, SyncCollection, TextMatch, TimeRange,
};

/// Parses a REPORT request body and dispatches on the root element's
/// local name.
///
/// ## Errors
/// Returns an error if the XML is malformed or the report type is
/// unknown.
#[tracing::instrument(skip(xml), fields(xml_len = xml.len()))]
pub fn parse_report(xml: &[u8]) -> ParseResult<ReportRequest> {
    let root = Element::parse(xml)?;

    let report_type = match root.name.as_str() {
        "calendar-query" => ReportType::CalendarQuery(parse_query(&root)),
        "calendar-multiget" => ReportType::CalendarMultiget(parse_multiget(&root)),
        "free-busy-query" => ReportType::FreeBusyQuery(parse_free_busy(&root)),
        "sync-collection" => ReportType::SyncCollection(parse_sync_collection(&root)),
        "expand-property" => ReportType::ExpandProperty(parse_expand_property(&root)),
        "addressbook-query" => ReportType::AddressbookQuery(parse_query(&root)),
        "addressbook-multiget" => ReportType::AddressbookMultiget(parse_multiget(&root)),
        other => return Err(ParseError::unexpected_element(other)),
    };

    Ok(ReportRequest {
        report_type,
        properties: requested_properties(&root),
    })
}

/// The `<D:prop>` names a report carried, if any.
fn requested_properties(root: &Element) -> Vec<PropertyName> {
    root.child(DAV_NS, "prop")
        .map(|prop| {
            prop.children
                .iter()
                .map(|c| PropertyName::new(QName::new(c.namespace.clone(), c.name.clone())))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_query(root: &Element) -> CalendarQuery {
    let filter = root
        .child(CALDAV_NS, "filter")
        .or_else(|| root.child(CARDDAV_NS, "filter"))
        .map(|f| {
            if let Some(comp) = f
                .child(CALDAV_NS, "comp-filter")
                .or_else(|| f.child(CARDDAV_NS, "comp-filter"))
            {
                parse_comp_filter(comp)
            } else {
                // CardDAV puts prop-filters directly under <filter>.
                let mut comp = CompFilter::default();
                for child in &f.children {
                    if child.name == "prop-filter" {
                        comp.prop_filters.push(parse_prop_filter(child));
                    }
                }
                comp
            }
        });

    CalendarQuery {
        filter,
        calendar_data: payload_request(root),
    }
}

fn parse_multiget(root: &Element) -> Multiget {
    let hrefs = root
        .children_named(DAV_NS, "href")
        .map(|h| h.text_trimmed().to_string())
        .filter(|h| !h.is_empty())
        .collect();

    Multiget {
        hrefs,
        calendar_data: payload_request(root),
    }
}

fn parse_free_busy(root: &Element) -> FreeBusyQuery {
    FreeBusyQuery {
        time_range: root.child(CALDAV_NS, "time-range").map(parse_time_range),
    }
}

fn parse_sync_collection(root: &Element) -> SyncCollection {
    let sync_token = root
        .child(DAV_NS, "sync-token")
        .map(|t| t.text_trimmed().to_string())
        .filter(|t| !t.is_empty());

    SyncCollection { sync_token }
}

fn parse_expand_property(root: &Element) -> ExpandProperty {
    ExpandProperty {
        items: expand_items(root),
    }
}

fn expand_items(parent: &Element) -> Vec<ExpandPropertyItem> {
    parent
        .children_named(DAV_NS, "property")
        .map(|p| ExpandPropertyItem {
            name: p.attr("name").unwrap_or_default().to_string(),
            namespace: p.attr("namespace").map(ToString::to_string),
            children: expand_items(p),
        })
        .collect()
}

/// The `<calendar-data>`/`<address-data>` request element inside
/// `<D:prop>`, with its optional `<comp>` selection tree.
fn payload_request(root: &Element) -> Option<CalendarDataRequest> {
    let prop = root.child(DAV_NS, "prop")?;
    let data = prop
        .child(CALDAV_NS, "calendar-data")
        .or_else(|| prop.child(CARDDAV_NS, "address-data"))?;

    let selection = data.child(CALDAV_NS, "comp").map(parse_comp_selection);
    Some(CalendarDataRequest { selection })
}

fn parse_comp_selection(comp: &Element) -> CompSelection {
    let mut selection = CompSelection::new(
        comp.attr("name")
            .unwrap_or_default()
            .to_ascii_uppercase(),
    );

    for child in &comp.children {
        if !child.namespace.as_str().eq(CALDAV_NS) {
            continue;
        }
        match child.name.as_str() {
            "prop" => {
                if let Some(name) = child.attr("name") {
                    selection = selection.with_prop(name);
                }
            }
            // An explicit allprop keeps `props` at None (all properties).
            "allprop" => selection.props = None,
            "comp" => {
                selection.comps.push(parse_comp_selection(child));
            }
            // allcomp keeps `comps` empty (all components allowed).
            _ => {}
        }
    }

    selection
}

fn parse_comp_filter(element: &Element) -> CompFilter {
    let mut filter = CompFilter {
        name: element
            .attr("name")
            .unwrap_or_default()
            .to_ascii_uppercase(),
        ..CompFilter::default()
    };

    for child in &element.children {
        match child.name.as_str() {
            "is-not-defined" => filter.is_not_defined = true,
            "time-range" => filter.time_range = Some(parse_time_range(child)),
            "text-match" => filter.text_match = Some(parse_text_match(child)),
            "prop-filter" => filter.prop_filters.push(parse_prop_filter(child)),
            "comp-filter" => filter.comp_filters.push(parse_comp_filter(child)),
            _ => {}
        }
    }

    filter
}

fn parse_prop_filter(element: &Element) -> PropFilter {
    let mut filter = PropFilter {
        name: element
            .attr("name")
            .unwrap_or_default()
            .to_ascii_uppercase(),
        ..PropFilter::default()
    };

    for child in &element.children {
        match child.name.as_str() {
            "is-not-defined" => filter.is_not_defined = true,
            "text-match" => filter.text_match = Some(parse_text_match(child)),
            "param-filter" => filter.param_filters.push(parse_param_filter(child)),
            _ => {}
        }
    }

    filter
}

fn parse_param_filter(element: &Element) -> ParamFilter {
    let mut filter = ParamFilter {
        name: element
            .attr("name")
            .unwrap_or_default()
            .to_ascii_uppercase(),
        ..ParamFilter::default()
    };

    for child in &element.children {
        match child.name.as_str() {
            "is-not-defined" => filter.is_not_defined = true,
            "text-match" => filter.text_match = Some(parse_text_match(child)),
            _ => {}
        }
    }

    filter
}

fn parse_text_match(element: &Element) -> TextMatch {
    TextMatch {
        value: element.text.clone(),
        negate: element
            .attr("negate-condition")
            .is_some_and(|v| v.eq_ignore_ascii_case("yes")),
    }
}

fn parse_time_range(element: &Element) -> TimeRange {
    TimeRange {
        start: element.attr("start").map(ToString::to_string),
        end: element.attr("end").map(ToString::to_string),
    }
}
