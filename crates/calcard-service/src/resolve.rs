//! Path → entity resolution.
//!
//! Turns a classified [`DavPath`] into loaded entities for the
//! authenticated principal. Collection misses are hard failures (there is
//! nothing to serve), while a missing object resource resolves to `None`
//! so PUT can create it.

use calcard_core::dav_path::{CollectionRef, DavPath};
use calcard_store::{AddressBook, CalendarAccess, Contact, Event, Store, StoreError, User};

use crate::caldav::birthday;
use crate::error::{ServiceError, ServiceResult};

/// The entities a request path addresses.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPath {
    /// Calendar collection, for calendar and calendar-object paths.
    pub calendar: Option<CalendarAccess>,
    /// The addressed event, when it exists.
    pub event: Option<Event>,
    /// Address-book collection, for addressbook paths.
    pub addressbook: Option<AddressBook>,
    /// The addressed contact, when it exists.
    pub contact: Option<Contact>,
}

/// Resolves the entities a path addresses for `user`.
///
/// ## Errors
/// - `NotFound` for a missing collection, a foreign principal, or an
///   unknown slug;
/// - `AmbiguousSlug` when a slug matches more than one accessible
///   calendar.
#[tracing::instrument(skip(store, user), fields(user_id = user.id))]
pub async fn resolve(store: &Store, user: &User, path: &DavPath) -> ServiceResult<ResolvedPath> {
    let mut resolved = ResolvedPath::default();

    match path {
        DavPath::Root | DavPath::PrincipalHome | DavPath::CalendarHome | DavPath::AddressbookHome => {}

        DavPath::Principal { user: segment } => {
            // Only the authenticated principal resolves; everyone else is
            // invisible rather than forbidden.
            let requested: Option<i64> = segment.parse().ok();
            if requested != Some(user.id) {
                return Err(ServiceError::NotFound);
            }
        }

        DavPath::Calendar { calendar } => {
            resolved.calendar = Some(resolve_calendar(store, user, calendar).await?);
        }

        DavPath::CalendarObject {
            calendar,
            resource_name,
        } => {
            let access = resolve_calendar(store, user, calendar).await?;
            resolved.event = resolve_event(store, user, &access, resource_name).await?;
            resolved.calendar = Some(access);
        }

        DavPath::Addressbook { addressbook } => {
            resolved.addressbook = Some(resolve_addressbook(store, user, addressbook).await?);
        }

        DavPath::AddressbookObject {
            addressbook,
            resource_name,
        } => {
            let book = resolve_addressbook(store, user, addressbook).await?;
            resolved.contact =
                optional(store.contacts.get_by_resource_name(book.id, resource_name).await)?;
            resolved.addressbook = Some(book);
        }
    }

    Ok(resolved)
}

/// Resolves a calendar segment: decimal id (including the virtual
/// birthday id) or slug over the accessible set.
pub async fn resolve_calendar(
    store: &Store,
    user: &User,
    reference: &CollectionRef,
) -> ServiceResult<CalendarAccess> {
    match reference {
        CollectionRef::Id(id) if birthday::is_birthday_calendar(*id) => {
            Ok(birthday::virtual_calendar(user.id))
        }
        CollectionRef::Id(id) => Ok(store.calendars.get_accessible(*id, user.id).await?),
        CollectionRef::Slug(slug) => {
            let accessible = store.calendars.list_accessible(user.id).await?;
            let mut matches = accessible.into_iter().filter(|access| {
                access
                    .calendar
                    .slug
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case(slug))
            });

            let first = matches.next().ok_or(ServiceError::NotFound)?;
            if matches.next().is_some() {
                tracing::debug!(slug = %slug, "slug resolves to multiple calendars");
                return Err(ServiceError::AmbiguousSlug(slug.clone()));
            }
            Ok(first)
        }
    }
}

async fn resolve_event(
    store: &Store,
    user: &User,
    access: &CalendarAccess,
    resource_name: &str,
) -> ServiceResult<Option<Event>> {
    if birthday::is_birthday_calendar(access.calendar.id) {
        let contacts = store.contacts.list_with_birthdays(user.id).await?;
        let events = birthday::birthday_events(&contacts, chrono::Utc::now());
        return Ok(events
            .into_iter()
            .find(|event| event.resource_name == resource_name));
    }

    optional(
        store
            .events
            .get_by_resource_name(access.calendar.id, resource_name)
            .await,
    )
}

async fn resolve_addressbook(
    store: &Store,
    user: &User,
    reference: &CollectionRef,
) -> ServiceResult<AddressBook> {
    match reference {
        CollectionRef::Id(id) => Ok(store.addressbooks.get_owned(*id, user.id).await?),
        // Address books are id-addressed; slugs are a calendar affordance.
        CollectionRef::Slug(_) => Err(ServiceError::NotFound),
    }
}

/// Lifts `NotFound` into `None`, keeping real failures.
fn optional<T>(result: Result<T, StoreError>) -> ServiceResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::NotFound) => Ok(None),
        Err(other) => Err(other.into()),
    }
}
