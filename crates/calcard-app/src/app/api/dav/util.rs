//! Request-context extraction and capped body reads.

use std::sync::Arc;

use salvo::http::StatusCode;
use salvo::{Depot, Request, Response};

use calcard_core::dav_path::DavPath;
use calcard_rfc::dav::core::ErrorCondition;
use calcard_service::resolve::{self, ResolvedPath};
use calcard_store::User;

use crate::app::api::dav::response::{write_condition, write_service_error};
use crate::middleware::auth::require_principal;
use crate::state::{AppState, get_dav_path, get_state};

/// Everything the middleware chain established for this request.
pub struct RequestContext {
    pub state: Arc<AppState>,
    pub user: User,
    pub path: DavPath,
}

/// Pulls state, principal, and classified path from the depot, writing
/// the failure status when any is missing.
pub fn context(depot: &Depot, res: &mut Response) -> Option<RequestContext> {
    let state = match get_state(depot) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "state missing in depot");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            return None;
        }
    };

    let user = require_principal(depot, res)?;

    let Some(path) = get_dav_path(depot) else {
        tracing::error!("path middleware did not run");
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        return None;
    };

    Some(RequestContext { state, user, path })
}

/// Resolves the request path's entities, mapping failures onto the wire
/// (404 missing collection, 409 ambiguous slug).
pub async fn resolve_entities(
    ctx: &RequestContext,
    res: &mut Response,
) -> Option<ResolvedPath> {
    match resolve::resolve(&ctx.state.store, &ctx.user, &ctx.path).await {
        Ok(resolved) => Some(resolved),
        Err(err) => {
            write_service_error(res, &err);
            None
        }
    }
}

/// Reads the request body under the configured cap.
///
/// An oversized body answers 413; on calendar paths the reply carries
/// the `max-resource-size` precondition body.
pub async fn read_body(
    req: &mut Request,
    res: &mut Response,
    ctx: &RequestContext,
) -> Option<Vec<u8>> {
    let limit = ctx.state.limits.max_resource_size;

    let declared = req
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        write_too_large(res, &ctx.path);
        return None;
    }

    match req.payload().await {
        Ok(bytes) if bytes.len() > limit => {
            write_too_large(res, &ctx.path);
            None
        }
        Ok(bytes) => Some(bytes.to_vec()),
        Err(e) => {
            tracing::debug!(error = %e, "failed to read request body");
            res.status_code(StatusCode::BAD_REQUEST);
            None
        }
    }
}

fn write_too_large(res: &mut Response, path: &DavPath) {
    let on_calendar = matches!(
        path,
        DavPath::CalendarHome | DavPath::Calendar { .. } | DavPath::CalendarObject { .. }
    );
    if on_calendar {
        write_condition(res, 413, &ErrorCondition::caldav("max-resource-size"));
    } else {
        res.status_code(StatusCode::PAYLOAD_TOO_LARGE);
    }
}
