//! DAV path normalization and classification.
//!
//! Maps request hrefs onto the `/dav` hierarchy: root, principals,
//! calendar-home, calendar collections, address-book collections, and the
//! object resources inside them. Collection segments are either a decimal
//! id or a slug; slugs are case-normalized to lowercase at parse time and
//! resolved against the principal's accessible set later.

use crate::constants::{
    ADDRESSBOOKS_ROUTE_COMPONENT, CALENDARS_ROUTE_COMPONENT, DAV_ROUTE_PREFIX,
    PRINCIPALS_ROUTE_COMPONENT,
};
use crate::error::{CoreError, CoreResult};

/// A collection segment: a decimal id or a (lowercased) slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionRef {
    Id(i64),
    Slug(String),
}

impl CollectionRef {
    /// Classifies a raw path segment.
    ///
    /// Decimal segments (optionally negative, for the virtual calendar)
    /// become ids; anything else is treated as a slug and lowercased.
    #[must_use]
    pub fn parse(segment: &str) -> Self {
        segment.parse::<i64>().map_or_else(
            |_| Self::Slug(segment.to_ascii_lowercase()),
            Self::Id,
        )
    }

    #[must_use]
    pub fn as_segment(&self) -> String {
        match self {
            Self::Id(id) => id.to_string(),
            Self::Slug(slug) => slug.clone(),
        }
    }
}

impl std::fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_segment())
    }
}

/// A classified DAV path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DavPath {
    /// `/dav/`
    Root,
    /// `/dav/principals/`
    PrincipalHome,
    /// `/dav/principals/<seg>`, kept as the raw segment; only the authenticated
    /// user's own principal resolves.
    Principal { user: String },
    /// `/dav/calendars/`
    CalendarHome,
    /// `/dav/calendars/<id-or-slug>/`
    Calendar { calendar: CollectionRef },
    /// `/dav/calendars/<id-or-slug>/<name>[.ext]`, extension stripped.
    CalendarObject {
        calendar: CollectionRef,
        resource_name: String,
    },
    /// `/dav/addressbooks/`
    AddressbookHome,
    /// `/dav/addressbooks/<id-or-name>/`
    Addressbook { addressbook: CollectionRef },
    /// `/dav/addressbooks/<id>/<name>[.ext]`
    AddressbookObject {
        addressbook: CollectionRef,
        resource_name: String,
    },
}

impl DavPath {
    /// Classifies an href into a `DavPath`.
    ///
    /// Accepts absolute URLs, absolute paths, and relative paths; the href
    /// is normalized first (see [`normalize_href`]).
    ///
    /// ## Errors
    /// `CoreError::InvalidPath` when the path lies outside `/dav` or nests
    /// deeper than the hierarchy allows.
    pub fn parse(href: &str) -> CoreResult<Self> {
        let path = normalize_href(href);

        let rest = if path == DAV_ROUTE_PREFIX {
            ""
        } else if let Some(rest) = path.strip_prefix(const_str::concat!(DAV_ROUTE_PREFIX, "/")) {
            rest
        } else {
            return Err(CoreError::InvalidPath(path));
        };

        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Ok(Self::Root),
            [c] if *c == PRINCIPALS_ROUTE_COMPONENT => Ok(Self::PrincipalHome),
            [c, user] if *c == PRINCIPALS_ROUTE_COMPONENT => Ok(Self::Principal {
                user: (*user).to_string(),
            }),
            [c] if *c == CALENDARS_ROUTE_COMPONENT => Ok(Self::CalendarHome),
            [c, seg] if *c == CALENDARS_ROUTE_COMPONENT => Ok(Self::Calendar {
                calendar: CollectionRef::parse(seg),
            }),
            [c, seg, name] if *c == CALENDARS_ROUTE_COMPONENT => Ok(Self::CalendarObject {
                calendar: CollectionRef::parse(seg),
                resource_name: strip_extension(name).to_string(),
            }),
            [c] if *c == ADDRESSBOOKS_ROUTE_COMPONENT => Ok(Self::AddressbookHome),
            [c, seg] if *c == ADDRESSBOOKS_ROUTE_COMPONENT => Ok(Self::Addressbook {
                addressbook: CollectionRef::parse(seg),
            }),
            [c, seg, name] if *c == ADDRESSBOOKS_ROUTE_COMPONENT => Ok(Self::AddressbookObject {
                addressbook: CollectionRef::parse(seg),
                resource_name: strip_extension(name).to_string(),
            }),
            _ => Err(CoreError::InvalidPath(path)),
        }
    }

    /// True for paths addressing a collection (root, homes, principals,
    /// calendars, address books) rather than a single object resource.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        !matches!(
            self,
            Self::CalendarObject { .. } | Self::AddressbookObject { .. }
        )
    }

    /// Canonical href for this path. Collection hrefs carry a trailing `/`.
    #[must_use]
    pub fn to_href(&self) -> String {
        match self {
            Self::Root => format!("{DAV_ROUTE_PREFIX}/"),
            Self::PrincipalHome => format!("{DAV_ROUTE_PREFIX}/{PRINCIPALS_ROUTE_COMPONENT}/"),
            Self::Principal { user } => {
                format!("{DAV_ROUTE_PREFIX}/{PRINCIPALS_ROUTE_COMPONENT}/{user}/")
            }
            Self::CalendarHome => format!("{DAV_ROUTE_PREFIX}/{CALENDARS_ROUTE_COMPONENT}/"),
            Self::Calendar { calendar } => {
                format!("{DAV_ROUTE_PREFIX}/{CALENDARS_ROUTE_COMPONENT}/{calendar}/")
            }
            Self::CalendarObject {
                calendar,
                resource_name,
            } => format!(
                "{DAV_ROUTE_PREFIX}/{CALENDARS_ROUTE_COMPONENT}/{calendar}/{resource_name}.ics"
            ),
            Self::AddressbookHome => {
                format!("{DAV_ROUTE_PREFIX}/{ADDRESSBOOKS_ROUTE_COMPONENT}/")
            }
            Self::Addressbook { addressbook } => {
                format!("{DAV_ROUTE_PREFIX}/{ADDRESSBOOKS_ROUTE_COMPONENT}/{addressbook}/")
            }
            Self::AddressbookObject {
                addressbook,
                resource_name,
            } => format!(
                "{DAV_ROUTE_PREFIX}/{ADDRESSBOOKS_ROUTE_COMPONENT}/{addressbook}/{resource_name}.vcf"
            ),
        }
    }
}

/// Canonical principal URL for a user id.
#[must_use]
pub fn principal_href(user_id: i64) -> String {
    format!("{DAV_ROUTE_PREFIX}/{PRINCIPALS_ROUTE_COMPONENT}/{user_id}/")
}

/// Canonical id-based calendar collection URL.
#[must_use]
pub fn calendar_href(calendar_id: i64) -> String {
    format!("{DAV_ROUTE_PREFIX}/{CALENDARS_ROUTE_COMPONENT}/{calendar_id}/")
}

/// Canonical event resource URL inside an id-addressed calendar.
#[must_use]
pub fn event_href(calendar_id: i64, resource_name: &str) -> String {
    format!("{DAV_ROUTE_PREFIX}/{CALENDARS_ROUTE_COMPONENT}/{calendar_id}/{resource_name}.ics")
}

/// Canonical id-based address-book collection URL.
#[must_use]
pub fn addressbook_href(addressbook_id: i64) -> String {
    format!("{DAV_ROUTE_PREFIX}/{ADDRESSBOOKS_ROUTE_COMPONENT}/{addressbook_id}/")
}

/// Canonical contact resource URL inside an id-addressed address book.
#[must_use]
pub fn contact_href(addressbook_id: i64, resource_name: &str) -> String {
    format!("{DAV_ROUTE_PREFIX}/{ADDRESSBOOKS_ROUTE_COMPONENT}/{addressbook_id}/{resource_name}.vcf")
}

/// Normalizes any href into an absolute, lexically clean server path.
///
/// Accepts absolute URLs (`http://host/dav/x`), absolute paths, and
/// relative paths. The result always starts with `/` and contains no `.`
/// or `..` segments.
#[must_use]
pub fn normalize_href(href: &str) -> String {
    let trimmed = href.trim();

    // Strip scheme and authority from absolute URLs.
    let path = if let Some(idx) = trimmed.find("://") {
        let after_scheme = &trimmed[idx + 3..];
        after_scheme
            .find('/')
            .map_or("/", |slash| &after_scheme[slash..])
    } else {
        trimmed
    };

    // Drop query and fragment.
    let path = path.split(['?', '#']).next().unwrap_or("");

    clean_path(path)
}

/// Lexical path cleaning: resolves `.` and `..`, collapses `//`, and
/// guarantees a leading `/`. Mirrors Go's `path.Clean` for rooted paths.
fn clean_path(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            seg => out.push(seg),
        }
    }

    if out.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", out.join("/"))
    }
}

/// Strips a single trailing extension from a resource segment.
fn strip_extension(name: &str) -> &str {
    name.rfind('.').map_or(name, |idx| &name[..idx])
}
