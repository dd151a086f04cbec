//! `expand-property` REPORT execution (RFC 3253 §3.8).
//!
//! Returns the requested properties of the target resource; href-valued
//! properties with nested `<property>` children are expanded one level
//! into the referenced resource's properties. One level is all the
//! discovery flows (principal → home set → displayname) need.

use calcard_core::dav_path::DavPath;
use calcard_rfc::dav::core::{
    DavProperty, DavResponse, ExpandProperty, ExpandPropertyItem, Multistatus, PropValue,
    PropertyName, Propstat, QName,
};
use calcard_store::User;

use crate::dav::properties::{self, PropertySet};
use crate::error::ServiceResult;

/// Executes an expand-property report against the property set of the
/// resource at `target_href`.
///
/// ## Errors
/// None today; the signature matches its async siblings.
pub fn execute_expand_property(
    user: &User,
    target_href: &str,
    target_set: &PropertySet,
    expand: &ExpandProperty,
) -> ServiceResult<Multistatus> {
    let mut found = Vec::new();
    let mut missing = Vec::new();

    for item in &expand.items {
        let name = item_qname(item);
        match target_set.get(&name) {
            None => missing.push(DavProperty::empty(name)),
            Some(property) => found.push(expand_item(user, property, item)),
        }
    }

    let mut propstats = Vec::new();
    if !found.is_empty() {
        propstats.push(Propstat::ok(found));
    }
    if !missing.is_empty() {
        propstats.push(Propstat::not_found(missing));
    }

    let mut multistatus = Multistatus::new();
    multistatus.push(DavResponse::with_propstats(target_href, propstats));
    Ok(multistatus)
}

fn item_qname(item: &ExpandPropertyItem) -> QName {
    let namespace = item
        .namespace
        .clone()
        .unwrap_or_else(|| "DAV:".to_string());
    QName::new(namespace, item.name.clone())
}

/// Expands one property: href values with requested children become
/// nested responses carrying the referenced resource's properties.
fn expand_item(user: &User, property: &DavProperty, item: &ExpandPropertyItem) -> DavProperty {
    if item.children.is_empty() {
        return property.clone();
    }

    let hrefs: Vec<String> = match &property.value {
        PropValue::Href(href) => vec![href.clone()],
        PropValue::HrefList(hrefs) => hrefs.clone(),
        _ => return property.clone(),
    };

    let names: Vec<PropertyName> = item
        .children
        .iter()
        .map(|child| PropertyName::new(item_qname(child)))
        .collect();

    let responses: Vec<DavResponse> = hrefs
        .into_iter()
        .map(|href| {
            let propstats = referenced_set(user, &href).map_or_else(
                || vec![Propstat::not_found(
                    names
                        .iter()
                        .map(|n| DavProperty::empty(n.qname().clone()))
                        .collect(),
                )],
                |set| set.render_named(&names),
            );
            DavResponse::with_propstats(href, propstats)
        })
        .collect();

    DavProperty::new(property.name.clone(), PropValue::Expanded(responses))
}

/// Property set of a referenced collection. Only the storage-free
/// classes expand; a calendar href would need its own repository round
/// trip and stays unexpanded.
fn referenced_set(user: &User, href: &str) -> Option<PropertySet> {
    match DavPath::parse(href).ok()? {
        DavPath::Root => Some(properties::root(user)),
        DavPath::Principal { .. } | DavPath::PrincipalHome => Some(properties::principal(user)),
        DavPath::CalendarHome => Some(properties::calendar_home(user)),
        DavPath::AddressbookHome => Some(properties::addressbook_home(user)),
        _ => None,
    }
}
