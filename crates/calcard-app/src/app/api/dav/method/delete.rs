//! DELETE method handler for object resources.

use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use calcard_core::dav_path::DavPath;
use calcard_service::resolve;
use calcard_service::{caldav, carddav};

use crate::app::api::dav::response::write_service_error;
use crate::app::api::dav::util::context;

#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn delete(req: &mut Request, res: &mut Response, depot: &Depot) {
    let Some(ctx) = context(depot, res) else {
        return;
    };

    let if_match = header(req, "if-match");
    let if_none_match = header(req, "if-none-match");

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

            match caldav::object::delete_event(
                &ctx.state.store,
                &access,
                &resource_name,
                if_match.as_deref(),
                if_none_match.as_deref(),
            )
            .await
            {
                Ok(()) => {
                    res.status_code(StatusCode::NO_CONTENT);
                }
                Err(caldav::object::DeleteError::Forbidden) => {
                    res.status_code(StatusCode::FORBIDDEN);
                }
                Err(caldav::object::DeleteError::NotFound) => {
                    res.status_code(StatusCode::NOT_FOUND);
                }
                Err(caldav::object::DeleteError::PreconditionFailed) => {
                    res.status_code(StatusCode::PRECONDITION_FAILED);
                }
                Err(caldav::object::DeleteError::Service(err)) => {
                    write_service_error(res, &err);
                }
            }
        }

        DavPath::AddressbookObject {
            addressbook,
            resource_name,
        } => {
            let calcard_core::dav_path::CollectionRef::Id(book_id) = addressbook else {
                res.status_code(StatusCode::NOT_FOUND);
                return;
            };
            let book = match ctx
                .state
                .store
                .addressbooks
                .get_owned(book_id, ctx.user.id)
                .await
            {
                Ok(book) => book,
                Err(err) => {
                    write_service_error(res, &err.into());
                    return;
                }
            };

            match carddav::object::delete_contact(
                &ctx.state.store,
                &book,
                &resource_name,
                if_match.as_deref(),
                if_none_match.as_deref(),
            )
            .await
            {
                Ok(()) => {
                    res.status_code(StatusCode::NO_CONTENT);
                }
                Err(carddav::object::DeleteError::NotFound) => {
                    res.status_code(StatusCode::NOT_FOUND);
                }
                Err(carddav::object::DeleteError::PreconditionFailed) => {
                    res.status_code(StatusCode::PRECONDITION_FAILED);
                }
                Err(carddav::object::DeleteError::Service(err)) => {
                    write_service_error(res, &err);
                }
            }
        }

        _ => {
            res.status_code(StatusCode::METHOD_NOT_ALLOWED);
        }
    }
}

fn header(req: &Request, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
