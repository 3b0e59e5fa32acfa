use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

mod batch;
mod conferencing;
mod config;
mod meeting;
mod payments;
mod server;
mod store;
mod types;

use crate::config::AppConfig;
use crate::types::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            env::var("RUST_LOG").unwrap_or_else(|_| "tutordesk=info,axum=info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let store = store::RecordStore::open(&config.store_path)?;
    let conferencing =
        conferencing::ConferencingClient::new(conferencing::ConferencingConfig::from_env()?)?;
    let payments = payments::PaymentsClient::new(payments::PaymentsConfig::from_env()?)?;

    let port = config.port;
    let state = Arc::new(AppState {
        config,
        store,
        conferencing,
        payments,
    });

    let app = server::create_router(state);

    let listener = TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("listening on http://0.0.0.0:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
