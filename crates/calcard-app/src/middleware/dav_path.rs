//! Path classification middleware.
//!
//! Parses the request path into a [`DavPath`] once per request and
//! deposits it; paths outside the hierarchy answer 400 before any
//! handler runs. Entity resolution stays with the handlers because its
//! failure semantics are verb-specific (a PUT may target a resource that
//! does not exist yet, MKCALENDAR targets a collection that must not).

use salvo::Depot;
use salvo::http::StatusCode;

use calcard_core::dav_path::DavPath;

use crate::state::DAV_PATH_KEY;

pub struct DavPathMiddleware;

#[salvo::async_trait]
impl salvo::Handler for DavPathMiddleware {
    #[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        match DavPath::parse(req.uri().path()) {
            Ok(path) => {
                tracing::trace!(?path, "path classified");
                depot.insert(DAV_PATH_KEY, path);
            }
            Err(err) => {
                tracing::debug!(error = %err, "unparseable DAV path");
                res.status_code(StatusCode::BAD_REQUEST);
                ctrl.skip_rest();
            }
        }
    }
}
