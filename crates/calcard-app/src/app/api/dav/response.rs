//! Response writers shared by the verb handlers.

use salvo::Response;
use salvo::http::{HeaderValue, StatusCode};

use calcard_rfc::dav::build::error::serialize_single;
use calcard_rfc::dav::build::multistatus::serialize_multistatus;
use calcard_rfc::dav::core::{ErrorCondition, Multistatus};
use calcard_service::ServiceError;
use calcard_service::precondition::Rejection;

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Writes a 207 multistatus document.
pub fn write_multistatus(res: &mut Response, multistatus: &Multistatus) {
    let xml = match serialize_multistatus(multistatus) {
        Ok(xml) => xml,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize multistatus");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            return;
        }
    };

    res.status_code(StatusCode::MULTI_STATUS);
    set_xml_content_type(res);
    #[expect(
        clippy::let_underscore_must_use,
        reason = "Write body failure is non-fatal"
    )]
    let _ = res.write_body(xml);
}

/// Writes a failed precondition: its status plus the `<D:error>` body.
pub fn write_rejection(res: &mut Response, rejection: &Rejection) {
    tracing::debug!(
        status = rejection.status,
        condition = %rejection.condition.name,
        message = %rejection.message,
        "precondition failed"
    );
    write_condition(res, rejection.status, &rejection.condition);
}

/// Writes a status with a single-condition error body.
pub fn write_condition(res: &mut Response, status: u16, condition: &ErrorCondition) {
    res.status_code(StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR));
    set_xml_content_type(res);
    #[expect(
        clippy::let_underscore_must_use,
        reason = "Write body failure is non-fatal"
    )]
    let _ = res.write_body(serialize_single(condition));
}

/// Maps a service error onto the wire per the error taxonomy.
pub fn write_service_error(res: &mut Response, error: &ServiceError) {
    match error {
        ServiceError::NotFound => {
            res.status_code(StatusCode::NOT_FOUND);
        }
        ServiceError::AmbiguousSlug(slug) => {
            tracing::debug!(slug = %slug, "ambiguous slug");
            res.status_code(StatusCode::CONFLICT);
            res.render(salvo::writing::Text::Plain(format!(
                "calendar reference {slug} is ambiguous"
            )));
        }
        ServiceError::Forbidden => {
            res.status_code(StatusCode::FORBIDDEN);
        }
        ServiceError::InvalidSyncToken => {
            write_condition(res, 403, &ErrorCondition::dav("valid-sync-token"));
        }
        ServiceError::Conflict(message) => {
            res.status_code(StatusCode::CONFLICT);
            res.render(salvo::writing::Text::Plain(message.clone()));
        }
        ServiceError::InvalidRequest(message) => {
            res.status_code(StatusCode::BAD_REQUEST);
            res.render(salvo::writing::Text::Plain(message.clone()));
        }
        ServiceError::Rfc(e) => {
            tracing::debug!(error = %e, "bad request body");
            res.status_code(StatusCode::BAD_REQUEST);
        }
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "storage failure");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

fn set_xml_content_type(res: &mut Response) {
    #[expect(
        clippy::let_underscore_must_use,
        reason = "Header addition failure is non-fatal"
    )]
    let _ = res.add_header(
        "Content-Type",
        HeaderValue::from_static(XML_CONTENT_TYPE),
        true,
    );
}
