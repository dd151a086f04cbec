//! A small namespace-resolving DOM for request bodies.
//!
//! quick-xml's pull events are folded into a tree once per request; every
//! later question ("does this propfind contain `<allprop/>`?", "what is
//! the filter tree?") becomes a tree walk keyed on (namespace, local
//! name). Unprefixed elements with no default namespace in scope resolve
//! to `DAV:`, matching what permissive clients expect.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::error::{ParseError, ParseResult};
use crate::dav::core::DAV_NS;

/// A parsed element: resolved namespace, local name, attributes (local
/// names only), direct text content, and child elements in order.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub namespace: String,
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Parses a request body into its root element.
    ///
    /// ## Errors
    /// Malformed XML, or a body with no root element.
    pub fn parse(xml: &[u8]) -> ParseResult<Self> {
        let mut reader = Reader::from_reader(xml);

        let mut buf = Vec::new();
        // Namespace scopes: one frame of (prefix, uri) declarations per
        // open element.
        let mut scopes: Vec<Vec<(String, String)>> = Vec::new();
        let mut stack: Vec<Element> = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    scopes.push(declarations(e)?);
                    stack.push(element_from_start(e, &scopes)?);
                }
                Ok(Event::Empty(ref e)) => {
                    scopes.push(declarations(e)?);
                    let element = element_from_start(e, &scopes)?;
                    scopes.pop();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Ok(Event::End(_)) => {
                    scopes.pop();
                    let Some(done) = stack.pop() else {
                        return Err(ParseError::xml("unbalanced end tag"));
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => return Ok(done),
                    }
                }
                Ok(Event::Text(ref t)) => {
                    if let Some(current) = stack.last_mut() {
                        let decoded = reader.decoder().decode(t.as_ref())?;
                        current.text.push_str(&decoded);
                    }
                }
                Ok(Event::CData(ref t)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(std::str::from_utf8(t.as_ref())?);
                    }
                }
                Ok(Event::Eof) => {
                    return Err(ParseError::missing_element("document root"));
                }
                Err(e) => return Err(ParseError::xml(e.to_string())),
                _ => {}
            }
            buf.clear();
        }
    }

    /// Tests identity against a (namespace URI, local name) pair.
    #[must_use]
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.namespace == namespace && self.name == name
    }

    /// First child with the given identity.
    #[must_use]
    pub fn child(&self, namespace: &str, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    /// All children with the given identity.
    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }

    /// First child with the given local name, in any namespace. Used where
    /// clients disagree on the namespace of well-known elements.
    #[must_use]
    pub fn child_local(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Attribute value by local name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed text content.
    #[must_use]
    pub fn text_trimmed(&self) -> &str {
        self.text.trim()
    }
}

/// Collects the xmlns declarations on an element.
fn declarations(e: &BytesStart<'_>) -> ParseResult<Vec<(String, String)>> {
    let mut decls = Vec::new();
    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = std::str::from_utf8(&attr.value)?;
        if let Some(prefix) = key.strip_prefix("xmlns:") {
            decls.push((prefix.to_string(), value.to_string()));
        } else if key == "xmlns" {
            decls.push((String::new(), value.to_string()));
        }
    }
    Ok(decls)
}

/// Builds an element shell (no children yet) from a start tag, resolving
/// its prefix against the scope stack.
fn element_from_start(e: &BytesStart<'_>, scopes: &[Vec<(String, String)>]) -> ParseResult<Element> {
    let raw = std::str::from_utf8(e.name().as_ref())?.to_owned();
    let (prefix, local) = raw
        .split_once(':')
        .map_or((String::new(), raw.clone()), |(p, l)| {
            (p.to_string(), l.to_string())
        });

    let namespace = scopes
        .iter()
        .rev()
        .flat_map(|frame| frame.iter().rev())
        .find(|(p, _)| *p == prefix)
        .map_or_else(|| DAV_NS.to_string(), |(_, uri)| uri.clone());

    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let local_key = key.rsplit(':').next().unwrap_or(key);
        let value = std::str::from_utf8(&attr.value)?;
        attrs.push((local_key.to_string(), value.to_string()));
    }

    Ok(Element {
        namespace,
        name: local,
        attrs,
        text: String::new(),
        children: Vec::new(),
    })
}
