//! Calendar object writes: the PUT and DELETE flows.

use calcard_rfc::dav::core::ErrorCondition;
use calcard_store::{CalendarAccess, Event, NewEvent, Store, StoreError};

use crate::caldav::birthday;
use crate::error::ServiceError;
use crate::etag;
use crate::precondition::{self, DavLimits, Rejection};

/// Outcome of a successful PUT.
#[derive(Debug)]
pub struct PutOutcome {
    pub event: Event,
    pub created: bool,
}

/// PUT failure modes, ordered the way handlers branch on them.
#[derive(Debug)]
pub enum PutError {
    /// Read-only collection or missing editor rights.
    Forbidden,
    /// `If-Match`/`If-None-Match` did not hold (412, empty body).
    PreconditionFailed,
    /// A CalDAV precondition failed (status + error body).
    Rejected(Box<Rejection>),
    /// Everything else.
    Service(ServiceError),
}

impl From<ServiceError> for PutError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err)
    }
}

impl From<StoreError> for PutError {
    fn from(err: StoreError) -> Self {
        Self::Service(err.into())
    }
}

/// Stores an event at `<calendar>/<resource_name>`.
///
/// Runs the full §5.3.2 pipeline: payload validation, conditional
/// headers against the existing resource, and the two no-uid-conflict
/// rules (UID may not change under a resource name, and a UID may not
/// appear under two resource names).
///
/// ## Errors
/// See [`PutError`].
#[tracing::instrument(skip_all, fields(calendar_id = access.calendar.id, resource_name))]
pub async fn put_event(
    store: &Store,
    access: &CalendarAccess,
    resource_name: &str,
    body: &[u8],
    content_type: Option<&str>,
    if_match: Option<&str>,
    if_none_match: Option<&str>,
    limits: &DavLimits,
) -> Result<PutOutcome, PutError> {
    if birthday::is_birthday_calendar(access.calendar.id) || !access.editor {
        return Err(PutError::Forbidden);
    }

    let payload = precondition::validate_event_put(body, content_type, limits)
        .map_err(PutError::Rejected)?;

    // Validation guarantees exactly one UID per component and a single
    // UID across components.
    let uid = payload
        .scan
        .uid()
        .ok_or_else(|| {
            PutError::Service(ServiceError::InvalidRequest("no UID after validation".into()))
        })?
        .to_string();

    let existing = optional(
        store
            .events
            .get_by_resource_name(access.calendar.id, resource_name)
            .await,
    )?;

    if !precondition::conditional_headers_allow(
        if_match,
        if_none_match,
        existing.as_ref().map(|e| e.etag.as_str()),
    ) {
        return Err(PutError::PreconditionFailed);
    }

    // A stored resource keeps its UID for life.
    if let Some(existing) = &existing
        && existing.uid != uid
    {
        return Err(uid_conflict(format!(
            "resource {resource_name} already carries UID {}",
            existing.uid
        )));
    }

    // The same UID may not live at a second path in this calendar.
    if let Some(other) = optional(store.events.get_by_uid(access.calendar.id, &uid).await)?
        && other.resource_name != resource_name
    {
        return Err(uid_conflict(format!(
            "UID {uid} already stored as {}",
            other.resource_name
        )));
    }

    let created = existing.is_none();
    let stored = store
        .events
        .upsert(NewEvent {
            calendar_id: access.calendar.id,
            uid,
            resource_name: resource_name.to_string(),
            etag: etag::content_etag(body),
            raw_ical: payload.text,
            dt_start: payload.scan.dt_start.map(|(dt, _)| dt),
            dt_end: payload.scan.dt_end.map(|(dt, _)| dt),
            all_day: payload.scan.dt_start.is_some_and(|(_, all_day)| all_day),
            summary: payload.scan.summary.clone(),
        })
        .await?;

    tracing::info!(etag = %stored.etag, created, "event stored");
    Ok(PutOutcome {
        event: stored,
        created,
    })
}

/// DELETE failure modes.
#[derive(Debug)]
pub enum DeleteError {
    Forbidden,
    NotFound,
    PreconditionFailed,
    Service(ServiceError),
}

/// Deletes the event at `<calendar>/<resource_name>`, leaving a
/// tombstone for incremental sync.
///
/// ## Errors
/// See [`DeleteError`].
#[tracing::instrument(skip_all, fields(calendar_id = access.calendar.id, resource_name))]
pub async fn delete_event(
    store: &Store,
    access: &CalendarAccess,
    resource_name: &str,
    if_match: Option<&str>,
    if_none_match: Option<&str>,
) -> Result<(), DeleteError> {
    if birthday::is_birthday_calendar(access.calendar.id) || !access.editor {
        return Err(DeleteError::Forbidden);
    }

    let existing = store
        .events
        .get_by_resource_name(access.calendar.id, resource_name)
        .await
        .map_err(|err| match err {
            StoreError::NotFound => DeleteError::NotFound,
            other => DeleteError::Service(other.into()),
        })?;

    if !precondition::conditional_headers_allow(if_match, if_none_match, Some(&existing.etag)) {
        return Err(DeleteError::PreconditionFailed);
    }

    store
        .events
        .delete_by_uid(access.calendar.id, &existing.uid)
        .await
        .map_err(|err| DeleteError::Service(err.into()))?;

    tracing::info!(uid = %existing.uid, "event deleted");
    Ok(())
}

fn uid_conflict(message: String) -> PutError {
    PutError::Rejected(Box::new(Rejection {
        status: 409,
        condition: ErrorCondition::caldav("no-uid-conflict"),
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
