//! Shared application state and its Depot plumbing.

use std::sync::Arc;

use salvo::Depot;

use calcard_core::config::Settings;
use calcard_service::precondition::DavLimits;
use calcard_store::{Store, User};

/// Everything handlers need besides the request itself.
pub struct AppState {
    pub store: Store,
    pub settings: Settings,
    pub limits: DavLimits,
}

impl AppState {
    /// Builds state from loaded settings and a store.
    ///
    /// ## Errors
    /// Returns an error when the configured DAV limits do not parse.
    pub fn new(settings: Settings, store: Store) -> anyhow::Result<Self> {
        let limits = DavLimits::from_config(&settings.dav)
            .map_err(|e| anyhow::anyhow!("invalid dav limits: {e}"))?;
        Ok(Self {
            store,
            settings,
            limits,
        })
    }
}

/// Hoop that injects the shared state into every request's depot.
pub struct StateHandler {
    pub state: Arc<AppState>,
}

#[salvo::async_trait]
impl salvo::Handler for StateHandler {
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.state.clone());
    }
}

/// Depot key the authenticated principal lives under.
pub const PRINCIPAL_KEY: &str = "calcard::principal";

/// Depot key the classified request path lives under.
pub const DAV_PATH_KEY: &str = "calcard::dav_path";

/// Retrieves the shared state from the depot.
///
/// ## Errors
/// Returns an error if the state hoop did not run.
pub fn get_state(depot: &Depot) -> anyhow::Result<Arc<AppState>> {
    depot
        .obtain::<Arc<AppState>>()
        .cloned()
        .map_err(|_| anyhow::anyhow!("application state not found in depot"))
}

/// Retrieves the authenticated principal from the depot.
#[must_use]
pub fn get_principal(depot: &Depot) -> Option<User> {
    depot.get::<User>(PRINCIPAL_KEY).ok().cloned()
}

/// Retrieves the classified DAV path from the depot.
#[must_use]
pub fn get_dav_path(depot: &Depot) -> Option<calcard_core::dav_path::DavPath> {
    depot
        .get::<calcard_core::dav_path::DavPath>(DAV_PATH_KEY)
        .ok()
        .cloned()
}
