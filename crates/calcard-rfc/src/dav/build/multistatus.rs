//! Multistatus serialization.
//!
//! Emits `<D:multistatus>` documents with the `D:`/`cal:`/`card:`/`cs:`
//! namespaces declared on the root. `calendar-data` and `address-data`
//! payloads are CDATA-wrapped so CRLF line endings survive verbatim;
//! entity-escaping them would corrupt the payload for strict clients.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::dav::core::{
    CALDAV_NS, CARDDAV_NS, CS_NS, DAV_NS, DavProperty, Multistatus, PropValue, Propstat, QName,
    status_line,
};
use crate::error::RfcError;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Serializes a multistatus document.
///
/// ## Errors
/// Returns an error if the XML writer fails (practically: never for an
/// in-memory cursor, but surfaced rather than swallowed).
pub fn serialize_multistatus(multistatus: &Multistatus) -> Result<String, RfcError> {
    let mut writer = Writer::new(Cursor::new(Vec::with_capacity(1024)));

    write_event(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
    )?;

    let mut root = BytesStart::new("D:multistatus");
    root.push_attribute(("xmlns:D", DAV_NS));
    root.push_attribute(("xmlns:cal", CALDAV_NS));
    root.push_attribute(("xmlns:card", CARDDAV_NS));
    root.push_attribute(("xmlns:cs", CS_NS));
    write_event(&mut writer, Event::Start(root))?;

    for response in &multistatus.responses {
        write_response(&mut writer, response)?;
    }

    if let Some(token) = &multistatus.sync_token {
        write_text_element(&mut writer, "D:sync-token", token)?;
    }

    write_event(&mut writer, Event::End(BytesEnd::new("D:multistatus")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| RfcError::XmlBuild(e.to_string()))
}

fn write_response(
    writer: &mut XmlWriter,
    response: &crate::dav::core::DavResponse,
) -> Result<(), RfcError> {
    write_event(writer, Event::Start(BytesStart::new("D:response")))?;
    write_text_element(writer, "D:href", &response.href)?;

    if let Some(status) = response.status {
        write_text_element(writer, "D:status", &status_line(status))?;
    }

    for propstat in &response.propstats {
        write_propstat(writer, propstat)?;
    }

    write_event(writer, Event::End(BytesEnd::new("D:response")))
}

fn write_propstat(writer: &mut XmlWriter, propstat: &Propstat) -> Result<(), RfcError> {
    if propstat.props.is_empty() {
        return Ok(());
    }

    write_event(writer, Event::Start(BytesStart::new("D:propstat")))?;
    write_event(writer, Event::Start(BytesStart::new("D:prop")))?;

    for prop in &propstat.props {
        write_property(writer, prop)?;
    }

    write_event(writer, Event::End(BytesEnd::new("D:prop")))?;
    write_text_element(writer, "D:status", &status_line(propstat.status))?;
    write_event(writer, Event::End(BytesEnd::new("D:propstat")))?;
    Ok(())
}

fn write_property(writer: &mut XmlWriter, prop: &DavProperty) -> Result<(), RfcError> {
    let (tag, extra_ns) = qualified_tag(&prop.name);
    let mut start = BytesStart::new(tag.clone());
    if let Some(uri) = extra_ns {
        start.push_attribute(("xmlns", uri));
    }

    match &prop.value {
        PropValue::Empty => {
            write_event(writer, Event::Empty(start))?;
        }
        PropValue::Text(text) => {
            write_event(writer, Event::Start(start))?;
            write_event(writer, Event::Text(BytesText::new(text)))?;
            write_event(writer, Event::End(BytesEnd::new(tag)))?;
        }
        PropValue::Href(href) => {
            write_event(writer, Event::Start(start))?;
            write_text_element(writer, "D:href", href)?;
            write_event(writer, Event::End(BytesEnd::new(tag)))?;
        }
        PropValue::HrefList(hrefs) => {
            write_event(writer, Event::Start(start))?;
            for href in hrefs {
                write_text_element(writer, "D:href", href)?;
            }
            write_event(writer, Event::End(BytesEnd::new(tag)))?;
        }
        PropValue::CData(payload) => {
            write_event(writer, Event::Start(start))?;
            write_event(writer, Event::CData(BytesCData::new(payload.as_str())))?;
            write_event(writer, Event::End(BytesEnd::new(tag)))?;
        }
        PropValue::ResourceType(types) => {
            if types.is_empty() {
                write_event(writer, Event::Empty(start))?;
            } else {
                write_event(writer, Event::Start(start))?;
                for qname in types {
                    write_empty_qualified(writer, qname)?;
                }
                write_event(writer, Event::End(BytesEnd::new(tag)))?;
            }
        }
        PropValue::ComponentSet(components) => {
            write_event(writer, Event::Start(start))?;
            for component in components {
                let mut comp = BytesStart::new("cal:comp");
                comp.push_attribute(("name", component.as_str()));
                write_event(writer, Event::Empty(comp))?;
            }
            write_event(writer, Event::End(BytesEnd::new(tag)))?;
        }
        PropValue::ReportSet(reports) => {
            write_event(writer, Event::Start(start))?;
            for report in reports {
                write_event(writer, Event::Start(BytesStart::new("D:supported-report")))?;
                write_event(writer, Event::Start(BytesStart::new("D:report")))?;
                write_empty_qualified(writer, report)?;
                write_event(writer, Event::End(BytesEnd::new("D:report")))?;
                write_event(writer, Event::End(BytesEnd::new("D:supported-report")))?;
            }
            write_event(writer, Event::End(BytesEnd::new(tag)))?;
        }
        PropValue::PrivilegeSet(privileges) => {
            write_event(writer, Event::Start(start))?;
            for privilege in privileges {
                write_event(writer, Event::Start(BytesStart::new("D:privilege")))?;
                write_empty_qualified(writer, privilege)?;
                write_event(writer, Event::End(BytesEnd::new("D:privilege")))?;
            }
            write_event(writer, Event::End(BytesEnd::new(tag)))?;
        }
        PropValue::Expanded(responses) => {
            write_event(writer, Event::Start(start))?;
            for response in responses {
                write_response(writer, response)?;
            }
            write_event(writer, Event::End(BytesEnd::new(tag)))?;
        }
        PropValue::SupportedMediaType {
            element,
            content_type,
            version,
        } => {
            write_event(writer, Event::Start(start))?;
            let (child_tag, child_ns) = qualified_tag(element);
            let mut child = BytesStart::new(child_tag);
            if let Some(uri) = child_ns {
                child.push_attribute(("xmlns", uri));
            }
            child.push_attribute(("content-type", content_type.as_str()));
            child.push_attribute(("version", version.as_str()));
            write_event(writer, Event::Empty(child))?;
            write_event(writer, Event::End(BytesEnd::new(tag)))?;
        }
    }

    Ok(())
}

/// Tag name for a `QName` using the root-declared prefixes; foreign
/// namespaces fall back to an inline default declaration.
fn qualified_tag(qname: &QName) -> (String, Option<&str>) {
    qname.namespace.default_prefix().map_or_else(
        || (qname.local_name().to_string(), Some(qname.namespace.as_str())),
        |prefix| (format!("{prefix}:{}", qname.local_name()), None),
    )
}

fn write_empty_qualified(writer: &mut XmlWriter, qname: &QName) -> Result<(), RfcError> {
    let (tag, extra_ns) = qualified_tag(qname);
    let mut start = BytesStart::new(tag);
    if let Some(uri) = extra_ns {
        start.push_attribute(("xmlns", uri));
    }
    write_event(writer, Event::Empty(start))
}

fn write_text_element(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<(), RfcError> {
    write_event(writer, Event::Start(BytesStart::new(tag)))?;
    write_event(writer, Event::Text(BytesText::new(text)))?;
    write_event(writer, Event::End(BytesEnd::new(tag)))
}

fn write_event(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), RfcError> {
    writer
        .write_event(event)
        .map_err(|e| RfcError::XmlBuild(e.to_string()))
}
