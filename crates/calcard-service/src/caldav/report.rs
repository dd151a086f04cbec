//! CalDAV REPORT execution: `calendar-query`, `calendar-multiget`, and
//! `sync-collection`.

use calcard_core::dav_path::{DavPath, event_href};
use calcard_core::token::{SyncKind, SyncToken};
use calcard_rfc::dav::core::{
    CalendarDataRequest, CalendarQuery, DavResponse, Multiget, Multistatus, PropValue,
    PropertyName, QName, SyncCollection,
};
use calcard_rfc::{filter, select};
use calcard_store::{CalendarAccess, Event, ResourceKind, Store, User};

use crate::caldav::birthday;
use crate::dav::properties;
use crate::error::{ServiceError, ServiceResult};
use crate::precondition::DavLimits;
use crate::resolve;

/// All events of a calendar, synthesizing the virtual birthday set.
pub async fn list_events(
    store: &Store,
    user: &User,
    access: &CalendarAccess,
) -> ServiceResult<Vec<Event>> {
    if birthday::is_birthday_calendar(access.calendar.id) {
        let contacts = store.contacts.list_with_birthdays(user.id).await?;
        return Ok(birthday::birthday_events(&contacts, chrono::Utc::now()));
    }
    Ok(store.events.list_for_calendar(access.calendar.id).await?)
}

/// Executes a `calendar-query` over one calendar collection.
///
/// ## Errors
/// `Forbidden` for free-busy-only access; storage failures otherwise.
#[tracing::instrument(skip_all, fields(calendar_id = access.calendar.id))]
pub async fn execute_calendar_query(
    store: &Store,
    user: &User,
    access: &CalendarAccess,
    query: &CalendarQuery,
    props: &[PropertyName],
) -> ServiceResult<Multistatus> {
    if access.read_free_busy_only {
        return Err(ServiceError::Forbidden);
    }

    let events = list_events(store, user, access).await?;
    let mut multistatus = Multistatus::new();

    for event in &events {
        if let Some(comp_filter) = &query.filter
            && !filter::matches(&event.raw_ical, comp_filter)
        {
            continue;
        }
        multistatus.push(event_response(
            event,
            access.calendar.id,
            props,
            query.calendar_data.as_ref(),
        ));
    }

    tracing::debug!(matched = multistatus.responses.len(), "calendar-query evaluated");
    Ok(multistatus)
}

/// Executes a `calendar-multiget`: one `<response>` per requested href,
/// in input order; unresolvable hrefs carry a 404 status.
#[tracing::instrument(skip_all, fields(hrefs = multiget.hrefs.len()))]
pub async fn execute_calendar_multiget(
    store: &Store,
    user: &User,
    multiget: &Multiget,
    props: &[PropertyName],
) -> ServiceResult<Multistatus> {
    let mut multistatus = Multistatus::new();

    for href in &multiget.hrefs {
        let response = match lookup_event(store, user, href).await? {
            Some((event, calendar_id)) => event_response(
                &event,
                calendar_id,
                props,
                multiget.calendar_data.as_ref(),
            ),
            None => DavResponse::with_status(href.clone(), 404),
        };
        multistatus.push(response);
    }

    Ok(multistatus)
}

/// Resolves a multiget href to an event, treating every failure mode
/// (bad path, foreign calendar, missing resource) as "not found" so the
/// miss stays inside the multistatus.
async fn lookup_event(
    store: &Store,
    user: &User,
    href: &str,
) -> ServiceResult<Option<(Event, i64)>> {
    let Ok(path) = DavPath::parse(href) else {
        return Ok(None);
    };
    if !matches!(path, DavPath::CalendarObject { .. }) {
        return Ok(None);
    }

    match resolve::resolve(store, user, &path).await {
        Ok(resolved) => {
            let Some(access) = &resolved.calendar else {
                return Ok(None);
            };
            // Free-busy-only grants never expose event payloads.
            if access.read_free_busy_only {
                return Ok(None);
            }
            let calendar_id = access.calendar.id;
            Ok(resolved.event.map(|event| (event, calendar_id)))
        }
        Err(ServiceError::NotFound | ServiceError::AmbiguousSlug(_)) => Ok(None),
        Err(other) => Err(other),
    }
}

/// Executes a `sync-collection` report for a calendar.
///
/// Initial sync (no token) returns every event; an incremental sync
/// returns events modified after the token plus 404 entries for
/// tombstones. The reply always carries a fresh token built from the
/// collection's `updated_at`.
///
/// ## Errors
/// `InvalidSyncToken` for a malformed token or one minted for another
/// collection.
#[tracing::instrument(skip_all, fields(calendar_id = access.calendar.id))]
pub async fn execute_sync_collection(
    store: &Store,
    user: &User,
    access: &CalendarAccess,
    sync: &SyncCollection,
    props: &[PropertyName],
    limits: &DavLimits,
) -> ServiceResult<Multistatus> {
    if access.read_free_busy_only {
        return Err(ServiceError::Forbidden);
    }

    let calendar_id = access.calendar.id;
    let since = match &sync.sync_token {
        None => None,
        Some(raw) => {
            let token = SyncToken::parse(raw)?;
            if token.kind != SyncKind::Calendar || token.collection_id != calendar_id {
                return Err(ServiceError::InvalidSyncToken);
            }
            Some(token.since())
        }
    };

    let mut multistatus = Multistatus::new();

    // Collection self-entry.
    let collection_href = calcard_core::dav_path::calendar_href(calendar_id);
    let collection_set = properties::calendar(access, limits);
    multistatus.push(DavResponse::with_propstats(
        collection_href,
        collection_set.render_named(props),
    ));

    let events = match since {
        None => list_events(store, user, access).await?,
        // The virtual calendar never changes after the epoch token.
        Some(_) if birthday::is_birthday_calendar(calendar_id) => Vec::new(),
        Some(since) => store.events.list_modified_since(calendar_id, since).await?,
    };

    for event in &events {
        multistatus.push(event_response(event, calendar_id, props, None));
    }

    if let Some(since) = since
        && !birthday::is_birthday_calendar(calendar_id)
    {
        let tombstones = store
            .deleted
            .list_deleted_since(ResourceKind::Event, calendar_id, since)
            .await?;
        for tombstone in tombstones {
            let name = tombstone
                .resource_name
                .unwrap_or_else(|| tombstone.uid.clone());
            multistatus.push(DavResponse::with_status(event_href(calendar_id, &name), 404));
        }
    }

    multistatus.sync_token = Some(
        SyncToken::new(SyncKind::Calendar, calendar_id, access.calendar.updated_at).to_string(),
    );

    tracing::debug!(
        responses = multistatus.responses.len(),
        initial = since.is_none(),
        "sync-collection evaluated"
    );
    Ok(multistatus)
}

/// Builds the `<response>` for one event, rendering the requested
/// properties and projecting `calendar-data` through any sub-selection.
fn event_response(
    event: &Event,
    calendar_id: i64,
    props: &[PropertyName],
    data_request: Option<&CalendarDataRequest>,
) -> DavResponse {
    let mut set = properties::event(event);

    if let Some(request) = data_request
        && request.selection.is_some()
    {
        set.replace(
            &QName::caldav("calendar-data"),
            PropValue::CData(select::project(&event.raw_ical, request)),
        );
    }

    let href = event_href(calendar_id, &event.resource_name);
    let propstats = if props.is_empty() {
        // No <prop> in the report: return the common pair.
        let defaults = [
            PropertyName::new(QName::dav("getetag")),
            PropertyName::new(QName::caldav("calendar-data")),
        ];
        set.render_named(&defaults)
    } else {
        set.render_named(props)
    };

    DavResponse::with_propstats(href, propstats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcard_core::config::DavConfig;
    use calcard_rfc::dav::core::CompFilter;
    use calcard_store::NewCalendar;

    const BODY: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:ev1\r\nDTSTART:20240601T100000Z\r\nDTEND:20240601T110000Z\r\nSUMMARY:Hi\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

    fn limits() -> DavLimits {
        DavLimits::from_config(&DavConfig::default()).unwrap()
    }

    async fn fixture() -> (Store, User, CalendarAccess) {
        let (store, memory) = Store::in_memory();
        let user = memory.add_user("a@example.com");
        let calendar = store
            .calendars
            .create(NewCalendar {
                owner_id: user.id,
                name: "work".to_string(),
                slug: Some("work".to_string()),
                description: None,
                timezone: None,
            })
            .await
            .unwrap();
        let access = store
            .calendars
            .get_accessible(calendar.id, user.id)
            .await
            .unwrap();

        crate::caldav::object::put_event(
            &store,
            &access,
            "ev1",
            BODY.as_bytes(),
            Some("text/calendar"),
            None,
            None,
            &limits(),
        )
        .await
        .unwrap();

        // Re-read for the post-write ctag/updated_at.
        let access = store
            .calendars
            .get_accessible(calendar.id, user.id)
            .await
            .unwrap();
        (store, user, access)
    }

    #[tokio::test]
    async fn query_without_filter_lists_everything() {
        let (store, user, access) = fixture().await;
        let result =
            execute_calendar_query(&store, &user, &access, &CalendarQuery::default(), &[])
                .await
                .unwrap();
        assert_eq!(result.responses.len(), 1);
        assert!(result.responses[0].href.ends_with("/ev1.ics"));
    }

    #[tokio::test]
    async fn query_filter_excludes_non_matching() {
        let (store, user, access) = fixture().await;
        let query = CalendarQuery {
            filter: Some(CompFilter {
                name: "VCALENDAR".to_string(),
                comp_filters: vec![CompFilter {
                    name: "VTODO".to_string(),
                    ..CompFilter::default()
                }],
                ..CompFilter::default()
            }),
            calendar_data: None,
        };
        let result = execute_calendar_query(&store, &user, &access, &query, &[])
            .await
            .unwrap();
        assert!(result.responses.is_empty());
    }

    #[tokio::test]
    async fn multiget_preserves_order_and_reports_missing() {
        let (store, user, access) = fixture().await;
        let present = event_href(access.calendar.id, "ev1");
        let missing = event_href(access.calendar.id, "nope");
        let multiget = Multiget {
            hrefs: vec![missing.clone(), present.clone()],
            calendar_data: None,
        };

        let result = execute_calendar_multiget(&store, &user, &multiget, &[])
            .await
            .unwrap();
        assert_eq!(result.responses.len(), 2);
        assert_eq!(result.responses[0].href, missing);
        assert_eq!(result.responses[0].status, Some(404));
        assert_eq!(result.responses[1].href, present);
        assert!(result.responses[1].status.is_none());
    }

    #[tokio::test]
    async fn sync_initial_then_incremental_with_tombstone() {
        let (store, user, access) = fixture().await;

        let initial = execute_sync_collection(
            &store,
            &user,
            &access,
            &SyncCollection { sync_token: None },
            &[PropertyName::new(QName::dav("getetag"))],
            &limits(),
        )
        .await
        .unwrap();
        let token = initial.sync_token.clone().unwrap();
        // Self entry + one event.
        assert_eq!(initial.responses.len(), 2);

        crate::caldav::object::delete_event(&store, &access, "ev1", None, None)
            .await
            .unwrap();
        let access = store
            .calendars
            .get_accessible(access.calendar.id, user.id)
            .await
            .unwrap();

        let incremental = execute_sync_collection(
            &store,
            &user,
            &access,
            &SyncCollection {
                sync_token: Some(token),
            },
            &[PropertyName::new(QName::dav("getetag"))],
            &limits(),
        )
        .await
        .unwrap();

        let tombstones: Vec<_> = incremental
            .responses
            .iter()
            .filter(|r| r.status == Some(404))
            .collect();
        assert_eq!(tombstones.len(), 1);
        assert!(tombstones[0].href.ends_with("/ev1.ics"));
        assert_ne!(incremental.sync_token, initial.sync_token);
    }

    #[tokio::test]
    async fn sync_rejects_foreign_token() {
        let (store, user, access) = fixture().await;
        let wrong = SyncToken::new(SyncKind::Calendar, access.calendar.id + 1, chrono::Utc::now());
        let err = execute_sync_collection(
            &store,
            &user,
            &access,
            &SyncCollection {
                sync_token: Some(wrong.to_string()),
            },
            &[],
            &limits(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidSyncToken));

        let err = execute_sync_collection(
            &store,
            &user,
            &access,
            &SyncCollection {
                sync_token: Some("garbage".to_string()),
            },
            &[],
            &limits(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidSyncToken));
    }

    #[tokio::test]
    async fn free_busy_only_cannot_query() {
        let (store, user, mut access) = fixture().await;
        access.read_free_busy_only = true;
        let err = execute_calendar_query(&store, &user, &access, &CalendarQuery::default(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));
    }
}
