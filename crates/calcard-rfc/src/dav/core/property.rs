//! Property name and value models for multistatus emission.

use super::multistatus::DavResponse;
use super::namespace::QName;

/// A property named in a request (`<prop>` child).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyName(pub QName);

impl PropertyName {
    #[must_use]
    pub fn new(qname: QName) -> Self {
        Self(qname)
    }

    #[must_use]
    pub fn qname(&self) -> &QName {
        &self.0
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        self.0.local_name()
    }
}

/// A produced property value, shaped for XML emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropValue {
    /// `<name/>`
    Empty,
    /// Escaped text content.
    Text(String),
    /// A single `<D:href>` child.
    Href(String),
    /// Multiple `<D:href>` children.
    HrefList(Vec<String>),
    /// CDATA-wrapped payload (calendar-data / address-data); CRLF kept
    /// verbatim, never entity-escaped.
    CData(String),
    /// `<D:resourcetype>` children (`collection`, `calendar`, ...).
    ResourceType(Vec<QName>),
    /// `<cal:comp name="..."/>` children for
    /// `supported-calendar-component-set`.
    ComponentSet(Vec<String>),
    /// `<D:supported-report><D:report><name/>...` children.
    ReportSet(Vec<QName>),
    /// `<D:privilege>` children for `current-user-privilege-set`.
    PrivilegeSet(Vec<QName>),
    /// Nested `<D:response>` children (RFC 3253 expand-property).
    Expanded(Vec<DavResponse>),
    /// A `supported-calendar-data` / `supported-address-data` child
    /// element with content-type and version attributes.
    SupportedMediaType {
        element: QName,
        content_type: String,
        version: String,
    },
}

/// A property paired with its produced value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavProperty {
    pub name: QName,
    pub value: PropValue,
}

impl DavProperty {
    #[must_use]
    pub fn new(name: QName, value: PropValue) -> Self {
        Self { name, value }
    }

    #[must_use]
    pub fn text(name: QName, value: impl Into<String>) -> Self {
        Self::new(name, PropValue::Text(value.into()))
    }

    #[must_use]
    pub fn href(name: QName, href: impl Into<String>) -> Self {
        Self::new(name, PropValue::Href(href.into()))
    }

    #[must_use]
    pub fn empty(name: QName) -> Self {
        Self::new(name, PropValue::Empty)
    }
}
