//! Contact writes: the vCard PUT and DELETE flows.
//!
//! The pipeline is deliberately lighter than the calendar one: framing
//! validation, conditional headers, and the UID rules. A vCard without a
//! UID inherits the URL resource name as its identity.

use calcard_rfc::dav::core::ErrorCondition;
use calcard_rfc::vcard;
use calcard_store::{AddressBook, Contact, NewContact, Store, StoreError};

use crate::error::ServiceError;
use crate::etag;
use crate::precondition::{self, Rejection};

#[derive(Debug)]
pub struct PutOutcome {
    pub contact: Contact,
    pub created: bool,
}

#[derive(Debug)]
pub enum PutError {
    PreconditionFailed,
    Rejected(Box<Rejection>),
    Service(ServiceError),
}

impl From<StoreError> for PutError {
    fn from(err: StoreError) -> Self {
        Self::Service(err.into())
    }
}

/// Stores a contact at `<addressbook>/<resource_name>`.
///
/// ## Errors
/// See [`PutError`].
#[tracing::instrument(skip_all, fields(addressbook_id = book.id, resource_name))]
pub async fn put_contact(
    store: &Store,
    book: &AddressBook,
    resource_name: &str,
    body: &[u8],
    if_match: Option<&str>,
    if_none_match: Option<&str>,
) -> Result<PutOutcome, PutError> {
    let text = std::str::from_utf8(body).map_err(|_| invalid("body is not valid UTF-8"))?;
    let scan = vcard::scan(text).map_err(|err| invalid(err.to_string()))?;

    let uid = scan
        .uid
        .clone()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| resource_name.to_string());

    let existing = optional(
        store
            .contacts
            .get_by_resource_name(book.id, resource_name)
            .await,
    )?;

    if !precondition::conditional_headers_allow(
        if_match,
        if_none_match,
        existing.as_ref().map(|c| c.etag.as_str()),
    ) {
        return Err(PutError::PreconditionFailed);
    }

    if let Some(existing) = &existing
        && existing.uid != uid
    {
        return Err(uid_conflict(format!(
            "resource {resource_name} already carries UID {}",
            existing.uid
        )));
    }

    if let Some(other) = optional(store.contacts.get_by_uid(book.id, &uid).await)?
        && other.resource_name != resource_name
    {
        return Err(uid_conflict(format!(
            "UID {uid} already stored as {}",
            other.resource_name
        )));
    }

    let created = existing.is_none();
    let stored = store
        .contacts
        .upsert(NewContact {
            addressbook_id: book.id,
            uid,
            resource_name: resource_name.to_string(),
            etag: etag::content_etag(body),
            raw_vcard: text.to_string(),
            display_name: scan.display_name,
            birthday: scan.birthday,
        })
        .await?;

    tracing::info!(etag = %stored.etag, created, "contact stored");
    Ok(PutOutcome {
        contact: stored,
        created,
    })
}

#[derive(Debug)]
pub enum DeleteError {
    NotFound,
    PreconditionFailed,
    Service(ServiceError),
}

/// Deletes the contact at `<addressbook>/<resource_name>`.
///
/// ## Errors
/// See [`DeleteError`].
#[tracing::instrument(skip_all, fields(addressbook_id = book.id, resource_name))]
pub async fn delete_contact(
    store: &Store,
    book: &AddressBook,
    resource_name: &str,
    if_match: Option<&str>,
    if_none_match: Option<&str>,
) -> Result<(), DeleteError> {
    let existing = store
        .contacts
        .get_by_resource_name(book.id, resource_name)
        .await
        .map_err(|err| match err {
            StoreError::NotFound => DeleteError::NotFound,
            other => DeleteError::Service(other.into()),
        })?;

    if !precondition::conditional_headers_allow(if_match, if_none_match, Some(&existing.etag)) {
        return Err(DeleteError::PreconditionFailed);
    }

    store
        .contacts
        .delete_by_uid(book.id, &existing.uid)
        .await
        .map_err(|err| DeleteError::Service(err.into()))?;

    tracing::info!(uid = %existing.uid, "contact deleted");
    Ok(())
}

fn invalid(message: impl Into<String>) -> PutError {
    PutError::Rejected(Box::new(Rejection {
        status: 400,
        condition: ErrorCondition::carddav("valid-address-data"),
        message: message.into(),
    }))
}

fn uid_conflict(message: String) -> PutError {
    PutError::Rejected(Box::new(Rejection {
        status: 409,
        condition: ErrorCondition::carddav("no-uid-conflict"),
        message,
    }))
}

fn optional<T>(result: Result<T, StoreError>) -> Result<Option<T>, PutError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::NotFound) => Ok(None),
        Err(other) => Err(other.into()),
    }
}
