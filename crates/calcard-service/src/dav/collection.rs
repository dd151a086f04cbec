//! Collection administration: MKCALENDAR, MKCOL, and PROPPATCH.

use calcard_core::util::slug::{generate_slug, is_valid_slug};
use calcard_rfc::dav::core::{MkCalendarRequest, ProppatchRequest, QName};
use calcard_store::{AddressBook, Calendar, CalendarAccess, NewCalendar, Store, User};

use crate::caldav::birthday;
use crate::dav::properties;
use crate::error::{ServiceError, ServiceResult};

/// Creates a calendar under `/dav/calendars/<segment>`.
///
/// The segment has already been classified as non-numeric by the path
/// parser; it becomes the slug (lowercased and normalized), and the
/// display name unless the body set one.
///
/// ## Errors
/// - `InvalidRequest` when the segment cannot be a slug;
/// - `Conflict` for a duplicate name or slug under the same owner.
#[tracing::instrument(skip(store, request), fields(user_id = user.id, segment))]
pub async fn create_calendar(
    store: &Store,
    user: &User,
    segment: &str,
    request: &MkCalendarRequest,
) -> ServiceResult<Calendar> {
    let slug = generate_slug(segment);
    if !is_valid_slug(&slug) {
        return Err(ServiceError::InvalidRequest(format!(
            "{segment} is not usable as a calendar name"
        )));
    }

    let name = request
        .display_name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| segment.to_string());

    let created = store
        .calendars
        .create(NewCalendar {
            owner_id: user.id,
            name,
            slug: Some(slug),
            description: request.description.clone(),
            timezone: request.timezone.clone(),
        })
        .await?;

    tracing::info!(calendar_id = created.id, "calendar created");
    Ok(created)
}

/// Creates an address book under `/dav/addressbooks/<name>`.
///
/// ## Errors
/// `Conflict` for a duplicate name under the same owner.
pub async fn create_addressbook(
    store: &Store,
    user: &User,
    name: &str,
) -> ServiceResult<AddressBook> {
    if name.is_empty() || name.parse::<i64>().is_ok() {
        return Err(ServiceError::InvalidRequest(format!(
            "{name} is not usable as an address book name"
        )));
    }

    let created = store.addressbooks.create(user.id, name.to_string()).await?;
    tracing::info!(addressbook_id = created.id, "address book created");
    Ok(created)
}

/// Outcome of one PROPPATCH property, in document order.
pub type PropOutcome = (QName, u16);

/// Applies a PROPPATCH to a calendar collection.
///
/// Owner or editor only. Each property gets its own status: 200 for an
/// applied write, 403 for read-only or unknown properties. Failing
/// properties never abort the rest.
///
/// ## Errors
/// - `Forbidden` when the caller lacks editor rights or the target is
///   the virtual birthday calendar;
/// - storage failures from the final update.
pub async fn apply_calendar_proppatch(
    store: &Store,
    access: &CalendarAccess,
    request: &ProppatchRequest,
) -> ServiceResult<Vec<PropOutcome>> {
    if birthday::is_birthday_calendar(access.calendar.id) || !access.editor {
        return Err(ServiceError::Forbidden);
    }

    let mut outcomes = Vec::new();
    let mut name = None;
    let mut description = None;
    let mut timezone = None;

    for (qname, value) in &request.set {
        if qname.is("DAV:", "displayname") {
            name = Some(value.clone());
            outcomes.push((qname.clone(), 200));
        } else if qname.is(calcard_rfc::dav::core::CALDAV_NS, "calendar-description") {
            description = Some(value.clone());
            outcomes.push((qname.clone(), 200));
        } else if qname.is(calcard_rfc::dav::core::CALDAV_NS, "calendar-timezone") {
            timezone = Some(value.clone());
            outcomes.push((qname.clone(), 200));
        } else {
            outcomes.push((qname.clone(), 403));
        }
    }

    for qname in &request.remove {
        if properties::is_writable(qname) && !qname.is("DAV:", "displayname") {
            if qname.is(calcard_rfc::dav::core::CALDAV_NS, "calendar-description") {
                description = Some(String::new());
            } else {
                timezone = Some(String::new());
            }
            outcomes.push((qname.clone(), 200));
        } else {
            outcomes.push((qname.clone(), 403));
        }
    }

    if name.is_some() || description.is_some() || timezone.is_some() {
        store
            .calendars
            .update(access.calendar.id, name, description, timezone)
            .await?;
    }

    Ok(outcomes)
}

/// Applies a PROPPATCH to an address-book collection.
///
/// ## Errors
/// Storage failures from the update; the book is already owner-checked
/// by resolution.
pub async fn apply_addressbook_proppatch(
    store: &Store,
    book: &AddressBook,
    request: &ProppatchRequest,
) -> ServiceResult<Vec<PropOutcome>> {
    let mut outcomes = Vec::new();
    let mut name = None;
    let mut description = None;

    for (qname, value) in &request.set {
        if qname.is("DAV:", "displayname") {
            name = Some(value.clone());
            outcomes.push((qname.clone(), 200));
        } else if qname.is(calcard_rfc::dav::core::CARDDAV_NS, "addressbook-description") {
            description = Some(value.clone());
            outcomes.push((qname.clone(), 200));
        } else {
            outcomes.push((qname.clone(), 403));
        }
    }

    for qname in &request.remove {
        if qname.is(calcard_rfc::dav::core::CARDDAV_NS, "addressbook-description") {
            description = Some(String::new());
            outcomes.push((qname.clone(), 200));
        } else {
            outcomes.push((qname.clone(), 403));
        }
    }

    if name.is_some() || description.is_some() {
        store.addressbooks.update(book.id, name, description).await?;
    }

    Ok(outcomes)
}
