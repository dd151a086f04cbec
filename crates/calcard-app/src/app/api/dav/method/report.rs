//! REPORT method dispatcher (RFC 3253, RFC 4791 §7, RFC 6352 §8,
//! RFC 6578).

use salvo::http::{HeaderValue, StatusCode};
use salvo::{Depot, Request, Response, handler};

use calcard_core::dav_path::{DavPath, addressbook_href, calendar_href, principal_href};
use calcard_rfc::dav::core::ReportType;
use calcard_rfc::dav::parse::report::parse_report;
use calcard_service::dav::{expand, properties};
use calcard_service::{caldav, carddav};

use crate::app::api::dav::response::{write_multistatus, write_service_error};
use crate::app::api::dav::util::{RequestContext, context, read_body, resolve_entities};

#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn report(req: &mut Request, res: &mut Response, depot: &Depot) {
    let Some(ctx) = context(depot, res) else {
        return;
    };

    // Reports address collections and principals, never object URLs.
    if !ctx.path.is_collection() {
        res.status_code(StatusCode::FORBIDDEN);
        return;
    }

    let Some(body) = read_body(req, res, &ctx).await else {
        return;
    };
    let request = match parse_report(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "bad REPORT body");
            res.status_code(StatusCode::BAD_REQUEST);
            return;
        }
    };

    let Some(resolved) = resolve_entities(&ctx, res).await else {
        return;
    };

    match &request.report_type {
        ReportType::CalendarQuery(query) => {
            let Some(access) = &resolved.calendar else {
                res.status_code(StatusCode::FORBIDDEN);
                return;
            };
            let result = caldav::report::execute_calendar_query(
                &ctx.state.store,
                &ctx.user,
                access,
                query,
                &request.properties,
            )
            .await;
            finish_multistatus(res, result);
        }

        ReportType::CalendarMultiget(multiget) => {
            let result = caldav::report::execute_calendar_multiget(
                &ctx.state.store,
                &ctx.user,
                multiget,
                &request.properties,
            )
            .await;
            finish_multistatus(res, result);
        }

        ReportType::FreeBusyQuery(query) => {
            let Some(access) = &resolved.calendar else {
                res.status_code(StatusCode::FORBIDDEN);
                return;
            };
            match caldav::freebusy::execute_free_busy(&ctx.state.store, &ctx.user, access, query)
                .await
            {
                Ok(body) => {
                    #[expect(
                        clippy::let_underscore_must_use,
                        reason = "Header addition failure is non-fatal"
                    )]
                    let _ = res.add_header(
                        "Content-Type",
                        HeaderValue::from_static("text/calendar; charset=utf-8"),
                        true,
                    );
                    res.status_code(StatusCode::OK);
                    #[expect(
                        clippy::let_underscore_must_use,
                        reason = "Write body failure is non-fatal"
                    )]
                    let _ = res.write_body(body);
                }
                Err(err) => write_service_error(res, &err),
            }
        }

        ReportType::SyncCollection(sync) => {
            if let Some(access) = &resolved.calendar {
                let result = caldav::report::execute_sync_collection(
                    &ctx.state.store,
                    &ctx.user,
                    access,
                    sync,
                    &request.properties,
                    &ctx.state.limits,
                )
                .await;
                finish_multistatus(res, result);
            } else if let Some(book) = &resolved.addressbook {
                let result = carddav::report::execute_sync_collection(
                    &ctx.state.store,
                    book,
                    sync,
                    &request.properties,
                )
                .await;
                finish_multistatus(res, result);
            } else {
                res.status_code(StatusCode::FORBIDDEN);
            }
        }

        ReportType::ExpandProperty(expand_request) => {
            expand_property(&ctx, &resolved, expand_request, res);
        }

        ReportType::AddressbookQuery(query) => {
            let Some(book) = &resolved.addressbook else {
                res.status_code(StatusCode::FORBIDDEN);
                return;
            };
            let result = carddav::report::execute_addressbook_query(
                &ctx.state.store,
                book,
                query,
                &request.properties,
            )
            .await;
            finish_multistatus(res, result);
        }

        ReportType::AddressbookMultiget(multiget) => {
            let result = carddav::report::execute_addressbook_multiget(
                &ctx.state.store,
                &ctx.user,
                multiget,
                &request.properties,
            )
            .await;
            finish_multistatus(res, result);
        }
    }
}

fn expand_property(
    ctx: &RequestContext,
    resolved: &calcard_service::resolve::ResolvedPath,
    request: &calcard_rfc::dav::core::ExpandProperty,
    res: &mut Response,
) {
    let (href, set) = match &ctx.path {
        DavPath::Root => ("/dav/".to_string(), properties::root(&ctx.user)),
        DavPath::PrincipalHome | DavPath::Principal { .. } => (
            principal_href(ctx.user.id),
            properties::principal(&ctx.user),
        ),
        DavPath::CalendarHome => (
            "/dav/calendars/".to_string(),
            properties::calendar_home(&ctx.user),
        ),
        DavPath::AddressbookHome => (
            "/dav/addressbooks/".to_string(),
            properties::addressbook_home(&ctx.user),
        ),
        DavPath::Calendar { .. } => match &resolved.calendar {
            Some(access) => (
                calendar_href(access.calendar.id),
                properties::calendar(access, &ctx.state.limits),
            ),
            None => {
                res.status_code(StatusCode::NOT_FOUND);
                return;
            }
        },
        DavPath::Addressbook { .. } => match &resolved.addressbook {
            Some(book) => (addressbook_href(book.id), properties::addressbook(book)),
            None => {
                res.status_code(StatusCode::NOT_FOUND);
                return;
            }
        },
        DavPath::CalendarObject { .. } | DavPath::AddressbookObject { .. } => {
            res.status_code(StatusCode::FORBIDDEN);
            return;
        }
    };

    match expand::execute_expand_property(&ctx.user, &href, &set, request) {
        Ok(multistatus) => write_multistatus(res, &multistatus),
        Err(err) => write_service_error(res, &err),
    }
}

fn finish_multistatus(
    res: &mut Response,
    result: Result<calcard_rfc::dav::core::Multistatus, calcard_service::ServiceError>,
) {
    match result {
        Ok(multistatus) => write_multistatus(res, &multistatus),
        Err(err) => write_service_error(res, &err),
    }
}
