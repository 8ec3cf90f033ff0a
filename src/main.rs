use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod middleware;
mod modules;
mod routes;
mod state;
mod vision;
mod workers;

use config::settings::AppConfig;
use infrastructure::db::pool;
use infrastructure::storage::media::MediaStorage;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::new().context("DATABASE_URL must be set")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("App startup: {}", common::time::now_utc());

    if !config.model_path.is_file() {
        warn!(
            "Model file {} not found; uploads will be marked as errored",
            config.model_path.display()
        );
    }

    let db = pool::connect_to_db(&config.database_url).await?;
    pool::run_migrations(&db).await?;
    let media = MediaStorage::new(config.media_root.clone()).await?;

    let port = config.server_port;
    let state = AppState::new(config, db, media);
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("App shutdown: {}", common::time::now_utc());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
