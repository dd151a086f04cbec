//! PROPPATCH method handler (RFC 4918 §9.2).

use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use calcard_core::dav_path::{DavPath, addressbook_href, calendar_href};
use calcard_rfc::dav::core::{DavProperty, DavResponse, Multistatus, Propstat};
use calcard_rfc::dav::parse::proppatch::parse_proppatch;
use calcard_service::dav::collection;

use crate::app::api::dav::response::{write_multistatus, write_service_error};
use crate::app::api::dav::util::{context, read_body, resolve_entities};

#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn proppatch(req: &mut Request, res: &mut Response, depot: &Depot) {
    let Some(ctx) = context(depot, res) else {
        return;
    };

    let Some(body) = read_body(req, res, &ctx).await else {
        return;
    };
    let request = match parse_proppatch(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "bad PROPPATCH body");
            res.status_code(StatusCode::BAD_REQUEST);
            return;
        }
    };

    let Some(resolved) = resolve_entities(&ctx, res).await else {
        return;
    };

    let (href, outcomes) = match &ctx.path {
        DavPath::Calendar { .. } => {
            let Some(access) = &resolved.calendar else {
                res.status_code(StatusCode::NOT_FOUND);
                return;
            };
            match collection::apply_calendar_proppatch(&ctx.state.store, access, &request).await {
                Ok(outcomes) => (calendar_href(access.calendar.id), outcomes),
                Err(err) => {
                    write_service_error(res, &err);
                    return;
                }
            }
        }
        DavPath::Addressbook { .. } => {
            let Some(book) = &resolved.addressbook else {
                res.status_code(StatusCode::NOT_FOUND);
                return;
            };
            match collection::apply_addressbook_proppatch(&ctx.state.store, book, &request).await {
                Ok(outcomes) => (addressbook_href(book.id), outcomes),
                Err(err) => {
                    write_service_error(res, &err);
                    return;
                }
            }
        }
        // Properties elsewhere are read-only.
        _ => {
            res.status_code(StatusCode::FORBIDDEN);
            return;
        }
    };

    // One propstat per distinct status, properties value-less.
    let mut propstats: Vec<Propstat> = Vec::new();
    for (qname, status) in outcomes {
        let property = DavProperty::empty(qname);
        if let Some(group) = propstats.iter_mut().find(|p| p.status == status) {
            group.props.push(property);
        } else {
            propstats.push(Propstat {
                status,
                props: vec![property],
            });
        }
    }

    let mut multistatus = Multistatus::new();
    multistatus.push(DavResponse::with_propstats(href, propstats));
    write_multistatus(res, &multistatus);
}
