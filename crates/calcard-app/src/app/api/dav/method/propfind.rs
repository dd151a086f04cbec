//! PROPFIND method handler (RFC 4918 §9.1).
//!
//! Dispatches on the path class and renders the property catalog for
//! the target and, at depth 1, its children. Collection hrefs always
//! end in `/`.

use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use calcard_core::dav_path::{
    DavPath, addressbook_href, calendar_href, contact_href, event_href, principal_href,
};
use calcard_rfc::dav::core::{Depth, Multistatus, DavResponse, PropfindRequest};
use calcard_rfc::dav::parse::propfind::parse_propfind;
use calcard_service::caldav::{birthday, report};
use calcard_service::dav::properties;

use crate::app::api::dav::response::{write_multistatus, write_service_error};
use crate::app::api::dav::util::{RequestContext, context, read_body, resolve_entities};

#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn propfind(req: &mut Request, res: &mut Response, depot: &Depot) {
    let Some(ctx) = context(depot, res) else {
        return;
    };

    let depth = Depth::parse(
        req.headers()
            .get("depth")
            .and_then(|v| v.to_str().ok()),
    );

    let Some(body) = read_body(req, res, &ctx).await else {
        return;
    };
    // An unparseable body degrades to allprop, like an empty one.
    let request = parse_propfind(&body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "unparseable PROPFIND body, using allprop");
        PropfindRequest::allprop()
    });

    let Some(resolved) = resolve_entities(&ctx, res).await else {
        return;
    };

    let mut multistatus = Multistatus::new();

    match &ctx.path {
        DavPath::Root => {
            push(&mut multistatus, "/dav/", &properties::root(&ctx.user), &request);
            if depth != Depth::Zero {
                push(
                    &mut multistatus,
                    principal_href(ctx.user.id),
                    &properties::principal(&ctx.user),
                    &request,
                );
                push(
                    &mut multistatus,
                    "/dav/calendars/",
                    &properties::calendar_home(&ctx.user),
                    &request,
                );
                push(
                    &mut multistatus,
                    "/dav/addressbooks/",
                    &properties::addressbook_home(&ctx.user),
                    &request,
                );
            }
        }

        DavPath::PrincipalHome => {
            push(
                &mut multistatus,
                "/dav/principals/",
                &properties::root(&ctx.user),
                &request,
            );
            if depth != Depth::Zero {
                push(
                    &mut multistatus,
                    principal_href(ctx.user.id),
                    &properties::principal(&ctx.user),
                    &request,
                );
            }
        }

        DavPath::Principal { .. } => {
            push(
                &mut multistatus,
                principal_href(ctx.user.id),
                &properties::principal(&ctx.user),
                &request,
            );
        }

        DavPath::CalendarHome => {
            push(
                &mut multistatus,
                "/dav/calendars/",
                &properties::calendar_home(&ctx.user),
                &request,
            );
            if depth != Depth::Zero && !list_calendars(&ctx, &request, &mut multistatus, res).await
            {
                return;
            }
        }

        DavPath::Calendar { .. } => {
            let Some(access) = resolved.calendar else {
                res.status_code(StatusCode::NOT_FOUND);
                return;
            };
            push(
                &mut multistatus,
                calendar_href(access.calendar.id),
                &properties::calendar(&access, &ctx.state.limits),
                &request,
            );

            // Free-busy-only access sees the collection, never its
            // members.
            if depth != Depth::Zero && !access.read_free_busy_only {
                match report::list_events(&ctx.state.store, &ctx.user, &access).await {
                    Ok(events) => {
                        for event in &events {
                            push(
                                &mut multistatus,
                                event_href(access.calendar.id, &event.resource_name),
                                &properties::event(event),
                                &request,
                            );
                        }
                    }
                    Err(err) => {
                        write_service_error(res, &err);
                        return;
                    }
                }
            }
        }

        DavPath::CalendarObject { .. } => {
            let (Some(access), Some(event)) = (&resolved.calendar, &resolved.event) else {
                res.status_code(StatusCode::NOT_FOUND);
                return;
            };
            push(
                &mut multistatus,
                event_href(access.calendar.id, &event.resource_name),
                &properties::event(event),
                &request,
            );
        }

        DavPath::AddressbookHome => {
            push(
                &mut multistatus,
                "/dav/addressbooks/",
                &properties::addressbook_home(&ctx.user),
                &request,
            );
            if depth != Depth::Zero {
                match ctx.state.store.addressbooks.list_by_user(ctx.user.id).await {
                    Ok(books) => {
                        for book in &books {
                            push(
                                &mut multistatus,
                                addressbook_href(book.id),
                                &properties::addressbook(book),
                                &request,
                            );
                        }
                    }
                    Err(err) => {
                        write_service_error(res, &err.into());
                        return;
                    }
                }
            }
        }

        DavPath::Addressbook { .. } => {
            let Some(book) = &resolved.addressbook else {
                res.status_code(StatusCode::NOT_FOUND);
                return;
            };
            push(
                &mut multistatus,
                addressbook_href(book.id),
                &properties::addressbook(book),
                &request,
            );

            if depth != Depth::Zero {
                match ctx.state.store.contacts.list_for_addressbook(book.id).await {
                    Ok(contacts) => {
                        for contact in &contacts {
                            push(
                                &mut multistatus,
                                contact_href(book.id, &contact.resource_name),
                                &properties::contact(contact),
                                &request,
                            );
                        }
                    }
                    Err(err) => {
                        write_service_error(res, &err.into());
                        return;
                    }
                }
            }
        }

        DavPath::AddressbookObject { .. } => {
            let (Some(book), Some(contact)) = (&resolved.addressbook, &resolved.contact) else {
                res.status_code(StatusCode::NOT_FOUND);
                return;
            };
            push(
                &mut multistatus,
                contact_href(book.id, &contact.resource_name),
                &properties::contact(contact),
                &request,
            );
        }
    }

    write_multistatus(res, &multistatus);
}

/// Lists the accessible calendars plus the virtual birthday calendar
/// under the home. Returns `false` when an error was already written.
async fn list_calendars(
    ctx: &RequestContext,
    request: &PropfindRequest,
    multistatus: &mut Multistatus,
    res: &mut Response,
) -> bool {
    let accessible = match ctx.state.store.calendars.list_accessible(ctx.user.id).await {
        Ok(accessible) => accessible,
        Err(err) => {
            write_service_error(res, &err.into());
            return false;
        }
    };

    for access in &accessible {
        push(
            multistatus,
            calendar_href(access.calendar.id),
            &properties::calendar(access, &ctx.state.limits),
            request,
        );
    }

    let virtual_access = birthday::virtual_calendar(ctx.user.id);
    push(
        multistatus,
        calendar_href(virtual_access.calendar.id),
        &properties::calendar(&virtual_access, &ctx.state.limits),
        request,
    );

    true
}

fn push(
    multistatus: &mut Multistatus,
    href: impl Into<String>,
    set: &properties::PropertySet,
    request: &PropfindRequest,
) {
    multistatus.push(DavResponse::with_propstats(href, set.render(request)));
}
