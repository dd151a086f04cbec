//! Router assembly.

pub mod app_specific;
pub mod dav;

use salvo::http::Method;
use salvo::routing::MethodFilter;
use salvo::{Router, handler};

use calcard_core::constants::DAV_ROUTE_COMPONENT;

use crate::middleware::auth::AuthMiddleware;
use crate::middleware::dav_path::DavPathMiddleware;

/// Builds the API router: health and well-known redirects outside the
/// DAV tree, everything else behind authentication and path
/// classification.
///
/// ## Errors
/// Returns an error if an extension method name fails to register.
pub fn routes() -> anyhow::Result<Router> {
    Ok(Router::new()
        .push(Router::with_path("healthz").get(app_specific::healthcheck::healthcheck))
        .push(Router::with_path(".well-known/caldav").goal(well_known))
        .push(Router::with_path(".well-known/carddav").goal(well_known))
        .push(
            Router::with_path(DAV_ROUTE_COMPONENT)
                .hoop(AuthMiddleware)
                .hoop(DavPathMiddleware)
                .push(dav_verbs()?),
        ))
}

fn dav_verbs() -> anyhow::Result<Router> {
    Ok(Router::with_path("{**rest}")
        .options(dav::method::options::options)
        .get(dav::method::get_head::get)
        .head(dav::method::get_head::head)
        .put(dav::method::put::put)
        .delete(dav::method::delete::delete)
        .push(extension_method("PROPFIND", dav::method::propfind::propfind)?)
        .push(extension_method("PROPPATCH", dav::method::proppatch::proppatch)?)
        .push(extension_method("REPORT", dav::method::report::report)?)
        .push(extension_method("MKCALENDAR", dav::method::mkcalendar::mkcalendar)?)
        .push(extension_method("MKCOL", dav::method::mkcol::mkcol)?))
}

/// Registers a handler under a non-standard HTTP method.
fn extension_method<H: salvo::Handler>(name: &str, handler: H) -> anyhow::Result<Router> {
    Ok(Router::new()
        .filter(MethodFilter(Method::from_bytes(name.as_bytes())?))
        .goal(handler))
}

/// RFC 6764 bootstrap: both well-known entry points point at the DAV
/// root.
#[handler]
async fn well_known(res: &mut salvo::Response) {
    res.render(salvo::writing::Redirect::permanent("/dav/"));
}
