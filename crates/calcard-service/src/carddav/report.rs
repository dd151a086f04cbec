//! CardDAV REPORT execution: `addressbook-query`,
//! `addressbook-multiget`, and `sync-collection` on address books.

use calcard_core::dav_path::{DavPath, addressbook_href, contact_href};
use calcard_core::token::{SyncKind, SyncToken};
use calcard_rfc::dav::core::{
    CalendarDataRequest, CalendarQuery, DavResponse, Multiget, Multistatus, PropertyName, QName,
    SyncCollection,
};
use calcard_rfc::filter;
use calcard_store::{AddressBook, Contact, ResourceKind, Store, StoreError, User};

use crate::dav::properties;
use crate::error::{ServiceError, ServiceResult};

/// Executes an `addressbook-query`. The filter tree is evaluated with
/// the same engine as calendars; prop-filters hit vCard property lines.
#[tracing::instrument(skip_all, fields(addressbook_id = book.id))]
pub async fn execute_addressbook_query(
    store: &Store,
    book: &AddressBook,
    query: &CalendarQuery,
    props: &[PropertyName],
) -> ServiceResult<Multistatus> {
    let contacts = store.contacts.list_for_addressbook(book.id).await?;
    let mut multistatus = Multistatus::new();

    for contact in &contacts {
        if let Some(comp_filter) = &query.filter
            && !filter::matches(&contact.raw_vcard, comp_filter)
        {
            continue;
        }
        multistatus.push(contact_response(contact, book.id, props));
    }

    Ok(multistatus)
}

/// Executes an `addressbook-multiget`: one `<response>` per href in
/// input order, misses as 404 entries.
#[tracing::instrument(skip_all, fields(hrefs = multiget.hrefs.len()))]
pub async fn execute_addressbook_multiget(
    store: &Store,
    user: &User,
    multiget: &Multiget,
    props: &[PropertyName],
) -> ServiceResult<Multistatus> {
    let mut multistatus = Multistatus::new();

    for href in &multiget.hrefs {
        let response = match lookup_contact(store, user, href).await? {
            Some(contact) => contact_response(&contact, contact.addressbook_id, props),
            None => DavResponse::with_status(href.clone(), 404),
        };
        multistatus.push(response);
    }

    Ok(multistatus)
}

async fn lookup_contact(
    store: &Store,
    user: &User,
    href: &str,
) -> ServiceResult<Option<Contact>> {
    let Ok(DavPath::AddressbookObject {
        addressbook,
        resource_name,
    }) = DavPath::parse(href)
    else {
        return Ok(None);
    };
    let calcard_core::dav_path::CollectionRef::Id(book_id) = addressbook else {
        return Ok(None);
    };

    match store.addressbooks.get_owned(book_id, user.id).await {
        Ok(_) => {}
        Err(StoreError::NotFound) => return Ok(None),
        Err(other) => return Err(other.into()),
    }

    match store
        .contacts
        .get_by_resource_name(book_id, &resource_name)
        .await
    {
        Ok(contact) => Ok(Some(contact)),
        Err(StoreError::NotFound) => Ok(None),
        Err(other) => Err(other.into()),
    }
}

/// Executes a `sync-collection` report over an address book.
///
/// ## Errors
/// `InvalidSyncToken` for malformed or foreign tokens.
#[tracing::instrument(skip_all, fields(addressbook_id = book.id))]
pub async fn execute_sync_collection(
    store: &Store,
    book: &AddressBook,
    sync: &SyncCollection,
    props: &[PropertyName],
) -> ServiceResult<Multistatus> {
    let since = match &sync.sync_token {
        None => None,
        Some(raw) => {
            let token = SyncToken::parse(raw)?;
            if token.kind != SyncKind::Addressbook || token.collection_id != book.id {
                return Err(ServiceError::InvalidSyncToken);
            }
            Some(token.since())
        }
    };

    let mut multistatus = Multistatus::new();
    multistatus.push(DavResponse::with_propstats(
        addressbook_href(book.id),
        properties::addressbook(book).render_named(props),
    ));

    let contacts = match since {
        None => store.contacts.list_for_addressbook(book.id).await?,
        Some(since) => store.contacts.list_modified_since(book.id, since).await?,
    };
    for contact in &contacts {
        multistatus.push(contact_response(contact, book.id, props));
    }

    if let Some(since) = since {
        let tombstones = store
            .deleted
            .list_deleted_since(ResourceKind::Contact, book.id, since)
            .await?;
        for tombstone in tombstones {
            let name = tombstone
                .resource_name
                .unwrap_or_else(|| tombstone.uid.clone());
            multistatus.push(DavResponse::with_status(contact_href(book.id, &name), 404));
        }
    }

    multistatus.sync_token =
        Some(SyncToken::new(SyncKind::Addressbook, book.id, book.updated_at).to_string());
    Ok(multistatus)
}

fn contact_response(contact: &Contact, book_id: i64, props: &[PropertyName]) -> DavResponse {
    let set = properties::contact(contact);
    let href = contact_href(book_id, &contact.resource_name);

    let propstats = if props.is_empty() {
        let defaults = [
            PropertyName::new(QName::dav("getetag")),
            PropertyName::new(QName::carddav("address-data")),
        ];
        set.render_named(&defaults)
    } else {
        set.render_named(props)
    };

    DavResponse::with_propstats(href, propstats)
}

// The `address-data` projection shares the calendar-data request shape;
// both are line-filtering selections over a text payload.
pub type AddressDataRequest = CalendarDataRequest;
