//! PROPFIND request XML parsing.

use super::dom::Element;
use super::error::{ParseError, ParseResult};
use crate::dav::core::{DAV_NS, PropertyName, PropfindRequest, QName};

/// Parses a PROPFIND request body.
///
/// An empty body is `allprop` (RFC 4918 §9.1). A body that fails to parse
/// is the caller's decision; the dispatcher also treats that as `allprop`.
///
/// ## Errors
/// Returns an error if the XML is malformed or the root element is not
/// `DAV:propfind`.
#[tracing::instrument(skip(xml), fields(xml_len = xml.len()))]
pub fn parse_propfind(xml: &[u8]) -> ParseResult<PropfindRequest> {
    if xml.is_empty() {
        tracing::debug!("Empty PROPFIND body, returning allprop");
        return Ok(PropfindRequest::allprop());
    }

    let root = Element::parse(xml)?;
    if !root.is(DAV_NS, "propfind") {
        return Err(ParseError::unexpected_element(&root.name));
    }

    if root.child(DAV_NS, "propname").is_some() {
        return Ok(PropfindRequest::propname());
    }

    if root.child(DAV_NS, "allprop").is_some() {
        let include = root
            .child(DAV_NS, "include")
            .map(property_names)
            .unwrap_or_default();
        return Ok(PropfindRequest::allprop_with_include(include));
    }

    if let Some(prop) = root.child(DAV_NS, "prop") {
        return Ok(PropfindRequest::prop(property_names(prop)));
    }

    // A propfind with none of the three children: treat as allprop.
    Ok(PropfindRequest::allprop())
}

fn property_names(prop: &Element) -> Vec<PropertyName> {
    prop.children
        .iter()
        .map(|child| {
            PropertyName::new(QName::new(child.namespace.clone(), child.name.clone()))
        })
        .collect()
}
