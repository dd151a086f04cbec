//! MKCOL method handler (address-book collections only).

use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use calcard_core::dav_path::{CollectionRef, DavPath};
use calcard_service::dav::collection;

use crate::app::api::dav::response::write_service_error;
use crate::app::api::dav::util::context;

#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn mkcol(req: &mut Request, res: &mut Response, depot: &Depot) {
    let Some(ctx) = context(depot, res) else {
        return;
    };

    let name = match &ctx.path {
        DavPath::Addressbook {
            addressbook: CollectionRef::Slug(name),
        } => name.clone(),
        DavPath::Addressbook {
            addressbook: CollectionRef::Id(_),
        } => {
            res.status_code(StatusCode::BAD_REQUEST);
            res.render(salvo::writing::Text::Plain(
                "address book names must not be numeric",
            ));
            return;
        }
        _ => {
            // Plain collections elsewhere in the tree are not supported.
            res.status_code(StatusCode::FORBIDDEN);
            return;
        }
    };

    match collection::create_addressbook(&ctx.state.store, &ctx.user, &name).await {
        Ok(_) => {
            res.status_code(StatusCode::CREATED);
        }
        Err(err) => write_service_error(res, &err),
    }
}
