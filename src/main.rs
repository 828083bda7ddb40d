mod config;
mod error;
mod models;
mod routes;
mod services;

use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::models::License;
use crate::services::{
    account_store::AccountStore, playlist_assembler::PlaylistAssembler, storage,
};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub store: AccountStore,
    pub assembler: PlaylistAssembler,
    /// Loaded once at startup; the window never moves while running
    pub license: License,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xtream_reseller_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting Xtream Reseller Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Playlists directory: {}", config.playlists_dir.display());

    // Account store (local files, optionally mirrored)
    let backend = storage::from_config(&config)?;
    let store = AccountStore::new(backend, &config.master_username);

    // A corrupt license aborts startup instead of resetting the window
    let license = store
        .load_or_create_license(Utc::now(), config.license_days)
        .await?;
    tracing::info!("License valid until {}", license.expires_at.to_rfc3339());
    if license.is_expired(Utc::now()) {
        tracing::warn!("License expired; player requests will be refused");
    }

    let assembler = PlaylistAssembler::new(&config.playlists_dir);
    let sources = assembler.list_sources().await;
    tracing::info!("{} playlist sources available", sources.len());

    // Build application state
    let state = Arc::new(AppState {
        config,
        store,
        assembler,
        license,
        start_time: Instant::now(),
    });

    let app = routes::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
