//! OPTIONS method handler.

use salvo::http::{HeaderValue, StatusCode};
use salvo::{Depot, Request, Response, handler};

use crate::app::api::dav::util::context;

/// Advertises the DAV compliance classes and the verbs the path class
/// accepts. Object resources do not take collection-creation verbs or
/// REPORT.
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn options(req: &mut Request, res: &mut Response, depot: &Depot) {
    let Some(ctx) = context(depot, res) else {
        return;
    };

    let allow = if ctx.path.is_collection() {
        "OPTIONS, HEAD, GET, PROPFIND, PROPPATCH, MKCOL, MKCALENDAR, PUT, DELETE, REPORT"
    } else {
        "OPTIONS, HEAD, GET, PROPFIND, PUT, DELETE"
    };

    #[expect(
        clippy::let_underscore_must_use,
        reason = "Header addition failure is non-fatal"
    )]
    let _ = res.add_header(
        "DAV",
        HeaderValue::from_static("1, 2, calendar-access, addressbook"),
        true,
    );
    #[expect(
        clippy::let_underscore_must_use,
        reason = "Header addition failure is non-fatal"
    )]
    let _ = res.add_header("Allow", HeaderValue::from_static(allow), true);

    res.status_code(StatusCode::NO_CONTENT);
}
