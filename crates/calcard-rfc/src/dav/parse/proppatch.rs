//! PROPPATCH request XML parsing.

use super::dom::Element;
use super::error::{ParseError, ParseResult};
use crate::dav::core::{DAV_NS, ProppatchRequest, QName};

/// Parses a PROPPATCH request body (`DAV:propertyupdate`).
///
/// Property values are taken as the element's text content; nested markup
/// inside a property value is not preserved (the writable properties on
/// this server are all text-valued).
///
/// ## Errors
/// Returns an error if the XML is malformed or the root element is not
/// `DAV:propertyupdate`.
#[tracing::instrument(skip(xml), fields(xml_len = xml.len()))]
pub fn parse_proppatch(xml: &[u8]) -> ParseResult<ProppatchRequest> {
    let root = Element::parse(xml)?;
    if !root.is(DAV_NS, "propertyupdate") {
        return Err(ParseError::unexpected_element(&root.name));
    }

    let mut request = ProppatchRequest::default();

    for set in root.children_named(DAV_NS, "set") {
        if let Some(prop) = set.child(DAV_NS, "prop") {
            for child in &prop.children {
                request.set.push((
                    QName::new(child.namespace.clone(), child.name.clone()),
                    child.text_trimmed().to_string(),
                ));
            }
        }
    }

    for remove in root.children_named(DAV_NS, "remove") {
        if let Some(prop) = remove.child(DAV_NS, "prop") {
            for child in &prop.children {
                request
                    .remove
                    .push(QName::new(child.namespace.clone(), child.name.clone()));
            }
        }
    }

    Ok(request)
}
