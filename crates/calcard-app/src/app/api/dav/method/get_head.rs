//! GET and HEAD method handlers for object resources.

use chrono::DateTime;
use salvo::http::{HeaderValue, StatusCode};
use salvo::{Depot, Request, Response, handler};

use calcard_core::dav_path::DavPath;
use calcard_service::dav::properties::http_date;

use crate::app::api::dav::util::{context, resolve_entities};

#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn get(req: &mut Request, res: &mut Response, depot: &Depot) {
    serve(res, depot, true).await;
}

#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn head(req: &mut Request, res: &mut Response, depot: &Depot) {
    serve(res, depot, false).await;
}

async fn serve(res: &mut Response, depot: &Depot, include_body: bool) {
    let Some(ctx) = context(depot, res) else {
        return;
    };
    let Some(resolved) = resolve_entities(&ctx, res).await else {
        return;
    };

    // Free-busy-only grants never expose event payloads.
    if resolved
        .calendar
        .as_ref()
        .is_some_and(|access| access.read_free_busy_only)
    {
        res.status_code(StatusCode::FORBIDDEN);
        return;
    }

    let (content_type, etag, last_modified, body) = match &ctx.path {
        DavPath::CalendarObject { .. } => match resolved.event {
            Some(event) => (
                "text/calendar; charset=utf-8",
                event.etag.clone(),
                event.last_modified,
                event.raw_ical,
            ),
            None => {
                res.status_code(StatusCode::NOT_FOUND);
                return;
            }
        },
        DavPath::AddressbookObject { .. } => match resolved.contact {
            Some(contact) => (
                "text/vcard; charset=utf-8",
                contact.etag.clone(),
                contact.last_modified,
                contact.raw_vcard,
            ),
            None => {
                res.status_code(StatusCode::NOT_FOUND);
                return;
            }
        },
        // Collections have no body representation here.
        _ => {
            res.status_code(StatusCode::NOT_FOUND);
            return;
        }
    };

    set_header(res, "Content-Type", content_type.to_string());
    set_header(res, "ETag", format!("\"{etag}\""));
    if last_modified != DateTime::UNIX_EPOCH {
        set_header(res, "Last-Modified", http_date(last_modified));
    }

    res.status_code(StatusCode::OK);
    if include_body {
        #[expect(
            clippy::let_underscore_must_use,
            reason = "Write body failure is non-fatal"
        )]
        let _ = res.write_body(body);
    }
}

fn set_header(res: &mut Response, name: &'static str, value: String) {
    if let Ok(value) = HeaderValue::from_str(&value)
        && res.add_header(name, value, true).is_err()
    {
        tracing::warn!(header = name, "failed to add response header");
    }
}
