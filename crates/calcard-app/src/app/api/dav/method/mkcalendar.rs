//! MKCALENDAR method handler (RFC 4791 §5.3.1).

use salvo::http::{HeaderValue, StatusCode};
use salvo::{Depot, Request, Response, handler};

use calcard_core::dav_path::{CollectionRef, DavPath, calendar_href};
use calcard_rfc::dav::parse::mkcalendar::parse_mkcalendar;
use calcard_service::dav::collection;

use crate::app::api::dav::response::write_service_error;
use crate::app::api::dav::util::{context, read_body};

#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn mkcalendar(req: &mut Request, res: &mut Response, depot: &Depot) {
    let Some(ctx) = context(depot, res) else {
        return;
    };

    // Only directly under the calendar home, and only with a name
    // segment: nested calendars and id-shaped names are both refused.
    let segment = match &ctx.path {
        DavPath::Calendar {
            calendar: CollectionRef::Slug(segment),
        } => segment.clone(),
        DavPath::Calendar {
            calendar: CollectionRef::Id(_),
        } => {
            res.status_code(StatusCode::BAD_REQUEST);
            res.render(salvo::writing::Text::Plain(
                "calendar names must not be numeric",
            ));
            return;
        }
        DavPath::CalendarObject { .. } => {
            res.status_code(StatusCode::METHOD_NOT_ALLOWED);
            return;
        }
        _ => {
            res.status_code(StatusCode::FORBIDDEN);
            return;
        }
    };

    let Some(body) = read_body(req, res, &ctx).await else {
        return;
    };
    let request = match parse_mkcalendar(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "bad MKCALENDAR body");
            res.status_code(StatusCode::BAD_REQUEST);
            return;
        }
    };

    match collection::create_calendar(&ctx.state.store, &ctx.user, &segment, &request).await {
        Ok(created) => {
            if let Ok(value) = HeaderValue::from_str(&calendar_href(created.id))
                && res.add_header("Location", value, true).is_err()
            {
                tracing::warn!("failed to add Location header");
            }
            res.status_code(StatusCode::CREATED);
        }
        Err(err) => write_service_error(res, &err),
    }
}
