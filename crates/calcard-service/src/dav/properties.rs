//! The property catalog (RFC 4918 §15, RFC 4791 §5, RFC 6352 §6).
//!
//! For each path class this module produces the full set of live
//! properties with their values, tagged with allprop membership. A
//! PROPFIND/report then renders the set against what was asked:
//! `allprop` filters on membership, a named `<prop>` partitions into
//! found and 404 propstats, `propname` strips values.
//!
//! Per RFC 4791 §5.2.2, `calendar-timezone` and
//! `supported-calendar-data` stay out of allprop, as do the principal's
//! home sets.

use chrono::{DateTime, Utc};

use calcard_core::dav_path::principal_href;
use calcard_core::token::{SyncKind, SyncToken};
use calcard_rfc::dav::core::{
    DavProperty, PropValue, PropertyName, PropfindRequest, PropfindType, Propstat, QName,
};
use calcard_store::{AddressBook, CalendarAccess, Contact, Event, User};

use crate::precondition::DavLimits;

/// A produced property set: values plus allprop membership.
#[derive(Debug, Default)]
pub struct PropertySet {
    entries: Vec<(DavProperty, bool)>,
}

impl PropertySet {
    fn push(&mut self, property: DavProperty, in_allprop: bool) {
        self.entries.push((property, in_allprop));
    }

    /// Looks up a single produced property by qualified name.
    #[must_use]
    pub fn get(&self, name: &QName) -> Option<&DavProperty> {
        self.entries
            .iter()
            .find(|(p, _)| &p.name == name)
            .map(|(p, _)| p)
    }

    /// Replaces the value of an existing entry (e.g. a projected
    /// `calendar-data` payload).
    pub fn replace(&mut self, name: &QName, value: PropValue) {
        if let Some((property, _)) = self.entries.iter_mut().find(|(p, _)| &p.name == name) {
            property.value = value;
        }
    }

    /// Renders the set against a PROPFIND request shape.
    #[must_use]
    pub fn render(&self, request: &PropfindRequest) -> Vec<Propstat> {
        match &request.propfind_type {
            PropfindType::AllProp { include } => {
                let mut found: Vec<DavProperty> = self
                    .entries
                    .iter()
                    .filter(|(_, in_allprop)| *in_allprop)
                    .map(|(p, _)| p.clone())
                    .collect();

                for name in include {
                    if found.iter().any(|p| &p.name == name.qname()) {
                        continue;
                    }
                    if let Some(extra) = self.get(name.qname()) {
                        found.push(extra.clone());
                    }
                }

                vec![Propstat::ok(found)]
            }
            PropfindType::PropName => {
                let names = self
                    .entries
                    .iter()
                    .map(|(p, _)| DavProperty::empty(p.name.clone()))
                    .collect();
                vec![Propstat::ok(names)]
            }
            PropfindType::Prop(names) => self.render_named(names),
        }
    }

    /// Renders an explicit name list into found / 404 propstats.
    #[must_use]
    pub fn render_named(&self, names: &[PropertyName]) -> Vec<Propstat> {
        let mut found = Vec::new();
        let mut missing = Vec::new();

        for name in names {
            match self.get(name.qname()) {
                Some(property) => found.push(property.clone()),
                None => missing.push(DavProperty::empty(name.qname().clone())),
            }
        }

        let mut propstats = Vec::new();
        if !found.is_empty() {
            propstats.push(Propstat::ok(found));
        }
        if !missing.is_empty() {
            propstats.push(Propstat::not_found(missing));
        }
        if propstats.is_empty() {
            propstats.push(Propstat::ok(Vec::new()));
        }
        propstats
    }
}

/// Formats a timestamp the way `getlastmodified` carries it.
#[must_use]
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Properties of the `/dav/` root collection.
#[must_use]
pub fn root(user: &User) -> PropertySet {
    let mut set = PropertySet::default();
    set.push(
        DavProperty::new(
            QName::dav("resourcetype"),
            PropValue::ResourceType(vec![QName::dav("collection")]),
        ),
        true,
    );
    set.push(
        DavProperty::href(QName::dav("current-user-principal"), principal_href(user.id)),
        true,
    );
    set.push(DavProperty::text(QName::dav("displayname"), "calcard DAV"), true);
    set
}

/// Properties of a principal resource.
#[must_use]
pub fn principal(user: &User) -> PropertySet {
    let mut set = PropertySet::default();
    let href = principal_href(user.id);

    set.push(
        DavProperty::new(
            QName::dav("resourcetype"),
            PropValue::ResourceType(vec![QName::dav("collection"), QName::dav("principal")]),
        ),
        true,
    );
    set.push(
        DavProperty::text(QName::dav("displayname"), user.primary_email.clone()),
        true,
    );
    set.push(
        DavProperty::href(QName::dav("current-user-principal"), href.clone()),
        true,
    );
    set.push(DavProperty::href(QName::dav("principal-URL"), href), true);
    // RFC 4791 §6.2.1 / RFC 6352 §7.1.1: home sets are not in allprop.
    set.push(
        DavProperty::href(
            QName::caldav("calendar-home-set"),
            "/dav/calendars/".to_string(),
        ),
        false,
    );
    set.push(
        DavProperty::href(
            QName::carddav("addressbook-home-set"),
            "/dav/addressbooks/".to_string(),
        ),
        false,
    );
    set.push(
        DavProperty::new(
            QName::dav("supported-report-set"),
            PropValue::ReportSet(vec![QName::dav("expand-property")]),
        ),
        true,
    );
    set
}

/// Properties of the calendar-home collection.
#[must_use]
pub fn calendar_home(user: &User) -> PropertySet {
    let mut set = PropertySet::default();
    set.push(
        DavProperty::new(
            QName::dav("resourcetype"),
            PropValue::ResourceType(vec![QName::dav("collection")]),
        ),
        true,
    );
    set.push(DavProperty::text(QName::dav("displayname"), "Calendars"), true);
    set.push(
        DavProperty::href(QName::dav("current-user-principal"), principal_href(user.id)),
        true,
    );
    set
}

/// Properties of the addressbook-home collection.
#[must_use]
pub fn addressbook_home(user: &User) -> PropertySet {
    let mut set = PropertySet::default();
    set.push(
        DavProperty::new(
            QName::dav("resourcetype"),
            PropValue::ResourceType(vec![QName::dav("collection")]),
        ),
        true,
    );
    set.push(
        DavProperty::text(QName::dav("displayname"), "Address books"),
        true,
    );
    set.push(
        DavProperty::href(QName::dav("current-user-principal"), principal_href(user.id)),
        true,
    );
    set
}

/// Properties of a calendar collection.
#[must_use]
pub fn calendar(access: &CalendarAccess, limits: &DavLimits) -> PropertySet {
    let calendar = &access.calendar;
    let mut set = PropertySet::default();

    set.push(
        DavProperty::text(QName::dav("displayname"), calendar.name.clone()),
        true,
    );
    set.push(
        DavProperty::new(
            QName::dav("resourcetype"),
            PropValue::ResourceType(vec![QName::dav("collection"), QName::caldav("calendar")]),
        ),
        true,
    );
    set.push(
        DavProperty::text(QName::cs("getctag"), calendar.ctag.to_string()),
        true,
    );
    set.push(
        DavProperty::text(
            QName::dav("sync-token"),
            SyncToken::new(SyncKind::Calendar, calendar.id, calendar.updated_at).to_string(),
        ),
        true,
    );
    set.push(
        DavProperty::text(QName::dav("getlastmodified"), http_date(calendar.updated_at)),
        true,
    );
    if let Some(description) = &calendar.description {
        set.push(
            DavProperty::text(QName::caldav("calendar-description"), description.clone()),
            true,
        );
    }
    // RFC 4791 §5.2.2: not returned by allprop.
    if let Some(timezone) = &calendar.timezone {
        set.push(
            DavProperty::text(QName::caldav("calendar-timezone"), timezone.clone()),
            false,
        );
    }
    set.push(
        DavProperty::new(
            QName::caldav("supported-calendar-data"),
            PropValue::SupportedMediaType {
                element: QName::caldav("calendar-data"),
                content_type: "text/calendar".to_string(),
                version: "2.0".to_string(),
            },
        ),
        false,
    );
    set.push(
        DavProperty::new(
            QName::caldav("supported-calendar-component-set"),
            PropValue::ComponentSet(vec![
                "VEVENT".to_string(),
                "VTODO".to_string(),
                "VJOURNAL".to_string(),
                "VFREEBUSY".to_string(),
            ]),
        ),
        true,
    );
    set.push(
        DavProperty::new(
            QName::dav("supported-report-set"),
            PropValue::ReportSet(vec![
                QName::caldav("calendar-query"),
                QName::caldav("calendar-multiget"),
                QName::caldav("free-busy-query"),
                QName::dav("sync-collection"),
                QName::dav("expand-property"),
            ]),
        ),
        true,
    );
    set.push(
        DavProperty::text(
            QName::caldav("max-resource-size"),
            limits.max_resource_size.to_string(),
        ),
        true,
    );
    set.push(
        DavProperty::text(QName::caldav("min-date-time"), limits.min_date_raw.clone()),
        true,
    );
    set.push(
        DavProperty::text(QName::caldav("max-date-time"), limits.max_date_raw.clone()),
        true,
    );
    set.push(
        DavProperty::text(
            QName::caldav("max-instances"),
            limits.max_instances.to_string(),
        ),
        true,
    );
    set.push(
        DavProperty::text(
            QName::caldav("max-attendees-per-instance"),
            limits.max_attendees.to_string(),
        ),
        true,
    );
    set.push(
        DavProperty::new(
            QName::dav("current-user-privilege-set"),
            PropValue::PrivilegeSet(privileges(access)),
        ),
        true,
    );
    set
}

/// Privileges implied by the access flags. `read` aggregates
/// `read-free-busy`; a free-busy-only grant surfaces alone.
fn privileges(access: &CalendarAccess) -> Vec<QName> {
    if access.read_free_busy_only {
        return vec![QName::caldav("read-free-busy")];
    }

    let mut privileges = vec![QName::dav("read"), QName::caldav("read-free-busy")];
    if access.editor {
        privileges.extend([
            QName::dav("write"),
            QName::dav("write-content"),
            QName::dav("bind"),
            QName::dav("unbind"),
        ]);
    }
    privileges
}

/// Properties of an event resource.
#[must_use]
pub fn event(event: &Event) -> PropertySet {
    let mut set = PropertySet::default();
    set.push(
        DavProperty::text(QName::dav("getetag"), format!("\"{}\"", event.etag)),
        true,
    );
    set.push(
        DavProperty::text(
            QName::dav("getcontenttype"),
            "text/calendar; charset=utf-8",
        ),
        true,
    );
    set.push(
        DavProperty::text(QName::dav("getlastmodified"), http_date(event.last_modified)),
        true,
    );
    set.push(
        DavProperty::new(QName::dav("resourcetype"), PropValue::ResourceType(Vec::new())),
        true,
    );
    // Payload data is never part of allprop.
    set.push(
        DavProperty::new(
            QName::caldav("calendar-data"),
            PropValue::CData(event.raw_ical.clone()),
        ),
        false,
    );
    set
}

/// Properties of an address-book collection.
#[must_use]
pub fn addressbook(book: &AddressBook) -> PropertySet {
    let mut set = PropertySet::default();
    set.push(
        DavProperty::text(QName::dav("displayname"), book.name.clone()),
        true,
    );
    set.push(
        DavProperty::new(
            QName::dav("resourcetype"),
            PropValue::ResourceType(vec![
                QName::dav("collection"),
                QName::carddav("addressbook"),
            ]),
        ),
        true,
    );
    set.push(
        DavProperty::text(QName::cs("getctag"), book.ctag.to_string()),
        true,
    );
    set.push(
        DavProperty::text(
            QName::dav("sync-token"),
            SyncToken::new(SyncKind::Addressbook, book.id, book.updated_at).to_string(),
        ),
        true,
    );
    set.push(
        DavProperty::text(QName::dav("getlastmodified"), http_date(book.updated_at)),
        true,
    );
    if let Some(description) = &book.description {
        set.push(
            DavProperty::text(
                QName::carddav("addressbook-description"),
                description.clone(),
            ),
            true,
        );
    }
    set.push(
        DavProperty::new(
            QName::carddav("supported-address-data"),
            PropValue::SupportedMediaType {
                element: QName::carddav("address-data"),
                content_type: "text/vcard".to_string(),
                version: "4.0".to_string(),
            },
        ),
        false,
    );
    set.push(
        DavProperty::new(
            QName::dav("supported-report-set"),
            PropValue::ReportSet(vec![
                QName::carddav("addressbook-query"),
                QName::carddav("addressbook-multiget"),
                QName::dav("sync-collection"),
            ]),
        ),
        true,
    );
    set
}

/// Properties of a contact resource.
#[must_use]
pub fn contact(contact: &Contact) -> PropertySet {
    let mut set = PropertySet::default();
    set.push(
        DavProperty::text(QName::dav("getetag"), format!("\"{}\"", contact.etag)),
        true,
    );
    set.push(
        DavProperty::text(QName::dav("getcontenttype"), "text/vcard; charset=utf-8"),
        true,
    );
    set.push(
        DavProperty::text(
            QName::dav("getlastmodified"),
            http_date(contact.last_modified),
        ),
        true,
    );
    set.push(
        DavProperty::new(QName::dav("resourcetype"), PropValue::ResourceType(Vec::new())),
        true,
    );
    set.push(
        DavProperty::new(
            QName::carddav("address-data"),
            PropValue::CData(contact.raw_vcard.clone()),
        ),
        false,
    );
    set
}

/// Whether PROPPATCH may write a property.
#[must_use]
pub fn is_writable(name: &QName) -> bool {
    name.is("DAV:", "displayname")
        || name.is(calcard_rfc::dav::core::CALDAV_NS, "calendar-description")
        || name.is(calcard_rfc::dav::core::CALDAV_NS, "calendar-timezone")
        || name.is(calcard_rfc::dav::core::CARDDAV_NS, "addressbook-description")
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcard_core::config::DavConfig;
    use calcard_store::Calendar;

    fn sample_access() -> CalendarAccess {
        CalendarAccess::owner(Calendar {
            id: 3,
            owner_id: 1,
            name: "Work".to_string(),
            slug: Some("work".to_string()),
            description: None,
            timezone: Some("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n".to_string()),
            ctag: 7,
            updated_at: DateTime::UNIX_EPOCH,
        })
    }

    fn limits() -> DavLimits {
        DavLimits::from_config(&DavConfig::default()).unwrap()
    }

    #[test]
    fn allprop_omits_timezone_and_supported_data() {
        let set = calendar(&sample_access(), &limits());
        let propstats = set.render(&PropfindRequest::allprop());
        let names: Vec<&str> = propstats[0]
            .props
            .iter()
            .map(|p| p.name.local_name())
            .collect();

        assert!(names.contains(&"displayname"));
        assert!(names.contains(&"getctag"));
        assert!(names.contains(&"supported-calendar-component-set"));
        assert!(names.contains(&"min-date-time"));
        assert!(!names.contains(&"calendar-timezone"));
        assert!(!names.contains(&"supported-calendar-data"));
    }

    #[test]
    fn named_request_returns_not_in_allprop_properties() {
        let set = calendar(&sample_access(), &limits());
        let propstats = set.render(&PropfindRequest::prop(vec![
            PropertyName::new(QName::caldav("calendar-timezone")),
            PropertyName::new(QName::dav("no-such-thing")),
        ]));

        assert_eq!(propstats.len(), 2);
        assert_eq!(propstats[0].status, 200);
        assert_eq!(propstats[0].props[0].name.local_name(), "calendar-timezone");
        assert_eq!(propstats[1].status, 404);
        assert_eq!(propstats[1].props[0].name.local_name(), "no-such-thing");
    }

    #[test]
    fn principal_allprop_omits_home_sets() {
        let user = User {
            id: 1,
            primary_email: "a@example.com".to_string(),
        };
        let propstats = principal(&user).render(&PropfindRequest::allprop());
        let names: Vec<&str> = propstats[0]
            .props
            .iter()
            .map(|p| p.name.local_name())
            .collect();
        assert!(!names.contains(&"calendar-home-set"));
        assert!(!names.contains(&"addressbook-home-set"));

        let named = principal(&user).render(&PropfindRequest::prop(vec![PropertyName::new(
            QName::caldav("calendar-home-set"),
        )]));
        assert_eq!(named[0].status, 200);
    }

    #[test]
    fn free_busy_only_privileges() {
        let mut access = sample_access();
        access.read_free_busy_only = true;
        access.editor = false;
        let set = calendar(&access, &limits());
        let Some(DavProperty {
            value: PropValue::PrivilegeSet(privileges),
            ..
        }) = set.get(&QName::dav("current-user-privilege-set"))
        else {
            panic!("missing privilege set");
        };
        assert_eq!(privileges, &vec![QName::caldav("read-free-busy")]);
    }

    #[test]
    fn propname_strips_values() {
        let set = calendar(&sample_access(), &limits());
        let propstats = set.render(&PropfindRequest::propname());
        assert!(propstats[0]
            .props
            .iter()
            .all(|p| p.value == PropValue::Empty));
    }
}
