//! Digital FTE dashboard service.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dashboard::{build_router, AppState, Config};
use notify::{Notifier, SubscriptionRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .with(
            EnvFilter::from_default_env()
                .add_directive("fte_server=info".parse()?)
                .add_directive("dashboard=info".parse()?)
                .add_directive("vault=info".parse()?)
                .add_directive("notify=info".parse()?),
        )
        .init();

    info!("Starting Digital FTE API...");

    let config = Config::default();
    let registry = Arc::new(SubscriptionRegistry::load(&config.subscriptions_file).await);
    let notifier = Notifier::from_env(registry);

    let state = AppState::new(config.clone(), notifier);
    if let Err(e) = state.store.initialize().await {
        warn!(error = %e, vault = %config.vault_path.display(), "Could not initialize vault folders");
    }
    info!(vault = %config.vault_path.display(), "Vault ready");

    let app = build_router(state);

    let addr = config.addr();
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(%addr, "Digital FTE API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
