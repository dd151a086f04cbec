use salvo::conn::TcpListener;
use salvo::Listener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use calcard_app::state::AppState;
use calcard_core::config::{AuthMethod, load_config};
use calcard_store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting calcard CalDAV/CardDAV server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let (store, memory) = Store::in_memory();

    // Single-user deployments need their principal to exist before the
    // first request.
    if matches!(config.auth.method, AuthMethod::SingleUser)
        && let Some(single) = &config.auth.single_user
    {
        let user = memory.add_user(&single.email);
        tracing::info!(user_id = user.id, email = %single.email, "Seeded single-user principal");
    }

    let retention_days = config.dav.tombstone_retention_days;
    spawn_tombstone_sweep(store.clone(), retention_days);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let state = AppState::new(config, store)?;
    let router = calcard_app::router(state)?;

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}

/// Drops expired deletion tombstones at startup and once a day after.
fn spawn_tombstone_sweep(store: Store, retention_days: u32) {
    tokio::spawn(async move {
        let period = std::time::Duration::from_secs(24 * 60 * 60);
        loop {
            let cutoff = chrono::Utc::now() - chrono::Duration::days(i64::from(retention_days));
            match store.deleted.cleanup(cutoff).await {
                Ok(0) => tracing::debug!("tombstone sweep found nothing to drop"),
                Ok(removed) => tracing::info!(removed, "tombstone sweep"),
                Err(e) => tracing::warn!(error = %e, "tombstone sweep failed"),
            }
            tokio::time::sleep(period).await;
        }
    });
}
