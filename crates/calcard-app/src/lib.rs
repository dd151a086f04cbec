//! The HTTP application: routing, middleware, and the per-verb DAV
//! handlers wiring the parser, codec, precondition, and storage layers
//! together.

pub mod app;
pub mod middleware;
pub mod state;

use salvo::Router;

use crate::state::AppState;

/// Builds the full router for an application state. Used by `main` and
/// by the integration tests.
///
/// ## Errors
/// Returns an error if a route fails to initialize (extension-method
/// registration).
pub fn router(state: AppState) -> anyhow::Result<Router> {
    Ok(Router::new()
        .hoop(state::StateHandler {
            state: std::sync::Arc::new(state),
        })
        .push(app::api::routes()?))
}
