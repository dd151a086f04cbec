//! PUT method handler for calendar objects and vCards.

use salvo::http::{HeaderValue, StatusCode};
use salvo::{Depot, Request, Response, handler};

use calcard_core::dav_path::DavPath;
use calcard_service::resolve;
use calcard_service::{caldav, carddav};

use crate::app::api::dav::response::{write_rejection, write_service_error};
use crate::app::api::dav::util::{context, read_body};

#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn put(req: &mut Request, res: &mut Response, depot: &Depot) {
    let Some(ctx) = context(depot, res) else {
        return;
    };

    let if_match = header(req, "if-match");
    let if_none_match = header(req, "if-none-match");
    let content_type = header(req, "content-type");

    let Some(body) = read_body(req, res, &ctx).await else {
        return;
    };

    match ctx.path.clone() {
        DavPath::CalendarObject {
            calendar,
            resource_name,
        } => {
            let access =
                match resolve::resolve_calendar(&ctx.state.store, &ctx.user, &calendar).await {
                    Ok(access) => access,
                    Err(err) => {
                        write_service_error(res, &err);
                        return;
                    }
                };

            let outcome = caldav::object::put_event(
                &ctx.state.store,
                &access,
                &resource_name,
                &body,
                content_type.as_deref(),
                if_match.as_deref(),
                if_none_match.as_deref(),
                &ctx.state.limits,
            )
            .await;

            match outcome {
                Ok(outcome) => {
                    written(res, &outcome.event.etag, outcome.created);
                }
                Err(caldav::object::PutError::Forbidden) => {
                    res.status_code(StatusCode::FORBIDDEN);
                }
                Err(caldav::object::PutError::PreconditionFailed) => {
                    res.status_code(StatusCode::PRECONDITION_FAILED);
                }
                Err(caldav::object::PutError::Rejected(rejection)) => {
                    write_rejection(res, &rejection);
                }
                Err(caldav::object::PutError::Service(err)) => {
                    write_service_error(res, &err);
                }
            }
        }

        DavPath::AddressbookObject {
            addressbook,
            resource_name,
        } => {
            let book = match resolve_book(&ctx, &addressbook).await {
                Ok(book) => book,
                Err(err) => {
                    write_service_error(res, &err);
                    return;
                }
            };

            let outcome = carddav::object::put_contact(
                &ctx.state.store,
                &book,
                &resource_name,
                &body,
                if_match.as_deref(),
                if_none_match.as_deref(),
            )
            .await;

            match outcome {
                Ok(outcome) => {
                    written(res, &outcome.contact.etag, outcome.created);
                }
                Err(carddav::object::PutError::PreconditionFailed) => {
                    res.status_code(StatusCode::PRECONDITION_FAILED);
                }
                Err(carddav::object::PutError::Rejected(rejection)) => {
                    write_rejection(res, &rejection);
                }
                Err(carddav::object::PutError::Service(err)) => {
                    write_service_error(res, &err);
                }
            }
        }

        _ => {
            res.status_code(StatusCode::METHOD_NOT_ALLOWED);
        }
    }
}

async fn resolve_book(
    ctx: &crate::app::api::dav::util::RequestContext,
    reference: &calcard_core::dav_path::CollectionRef,
) -> Result<calcard_store::AddressBook, calcard_service::ServiceError> {
    match reference {
        calcard_core::dav_path::CollectionRef::Id(id) => Ok(ctx
            .state
            .store
            .addressbooks
            .get_owned(*id, ctx.user.id)
            .await?),
        calcard_core::dav_path::CollectionRef::Slug(_) => {
            Err(calcard_service::ServiceError::NotFound)
        }
    }
}

fn written(res: &mut Response, etag: &str, created: bool) {
    if let Ok(value) = HeaderValue::from_str(&format!("\"{etag}\""))
        && res.add_header("ETag", value, true).is_err()
    {
        tracing::warn!("failed to add ETag header");
    }
    res.status_code(if created {
        StatusCode::CREATED
    } else {
        StatusCode::NO_CONTENT
    });
}

fn header(req: &Request, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
