use std::{sync::Arc, time::Duration};

use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
mod session;
mod views;

use api::build_router;
use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let addr = settings.bind_addr()?;
    let storage = Storage::new(settings.session_ttl_seconds);
    spawn_session_sweeper(storage.clone(), settings.sweep_interval_seconds);

    let state = AppState {
        storage,
        cookie_name: settings.session_cookie.clone(),
        max_body_bytes: settings.max_body_bytes,
    };
    let app = build_router(Arc::new(state));

    info!(%addr, ttl_seconds = settings.session_ttl_seconds, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

fn spawn_session_sweeper(storage: Storage, interval_seconds: u64) {
    let period = Duration::from_secs(interval_seconds.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            storage.purge_expired().await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
