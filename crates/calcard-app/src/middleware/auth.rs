//! Authentication middleware.
//!
//! Deposits the authenticated principal into the depot for every DAV
//! request, or answers 401 with a Basic challenge. Three modes:
//!
//! - `single_user`: the configured principal, unconditionally;
//! - `basic_auth`: `Authorization: Basic`; the username is the
//!   principal's primary email (credential verification belongs to a
//!   fronting layer or future work, matching the surrounding deployment
//!   model where this server sits behind TLS termination and auth);
//! - `trusted_header`: `X-Authenticated-User` from a fronting proxy.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use salvo::Depot;
use salvo::http::StatusCode;

use calcard_core::config::AuthMethod;
use calcard_store::User;

use crate::state::{PRINCIPAL_KEY, get_state};

/// Header consulted in `trusted_header` mode.
const TRUSTED_HEADER: &str = "x-authenticated-user";

pub struct AuthMiddleware;

#[salvo::async_trait]
impl salvo::Handler for AuthMiddleware {
    #[tracing::instrument(skip_all, fields(method = %req.method(), path = %req.uri().path()))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        let Ok(state) = get_state(depot) else {
            tracing::error!("application state missing in depot");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            ctrl.skip_rest();
            return;
        };

        let email = match &state.settings.auth.method {
            AuthMethod::SingleUser => state
                .settings
                .auth
                .single_user
                .as_ref()
                .map(|single| single.email.clone()),
            AuthMethod::BasicAuth => basic_username(req),
            AuthMethod::TrustedHeader => req
                .headers()
                .get(TRUSTED_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        };

        let user = match email {
            Some(email) => state.store.users.get_by_email(&email).await.ok(),
            None => None,
        };

        match user {
            Some(user) => {
                tracing::debug!(user_id = user.id, "principal resolved");
                depot.insert(PRINCIPAL_KEY, user);
            }
            None => {
                tracing::debug!("no principal; challenging");
                challenge(res);
                ctrl.skip_rest();
            }
        }
    }
}

/// Extracts the username from a Basic Authorization header.
fn basic_username(req: &salvo::Request) -> Option<String> {
    let header = req.headers().get("authorization")?.to_str().ok()?;
    let encoded = header.strip_prefix("Basic ").or_else(|| header.strip_prefix("basic "))?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, _password) = credentials.split_once(':')?;
    if username.is_empty() {
        None
    } else {
        Some(username.to_string())
    }
}

fn challenge(res: &mut salvo::Response) {
    res.status_code(StatusCode::UNAUTHORIZED);
    #[expect(
        clippy::let_underscore_must_use,
        reason = "Header addition failure is non-fatal"
    )]
    let _ = res.add_header(
        "WWW-Authenticate",
        salvo::http::HeaderValue::from_static("Basic realm=\"calcard\""),
        true,
    );
}

/// Retrieves the principal or writes a 401 challenge.
pub fn require_principal(depot: &Depot, res: &mut salvo::Response) -> Option<User> {
    let user = crate::state::get_principal(depot);
    if user.is_none() {
        challenge(res);
    }
    user
}
