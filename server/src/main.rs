//! BanHammer Server - Main Entry Point

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use bh_server::api;
use bh_server::backend::{ActionBackend, RedditBackend};
use bh_server::config::{Config, StoreBackend};
use bh_server::db::{self, MemoryStore, RedisStore};
use bh_server::policy::{ConfigStore, PolicyService};
use bh_server::session::SessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bh_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        app_username = %config.app_username,
        "Starting BanHammer Server"
    );

    // Settings and session storage
    let (settings, sessions): (Arc<dyn ConfigStore>, Arc<dyn SessionStore>) =
        match config.store_backend {
            StoreBackend::Redis => {
                let redis = db::create_redis_client(&config.redis_url).await?;
                let store = Arc::new(RedisStore::new(
                    redis,
                    config.settings_key_prefix.clone(),
                    config.session_ttl_secs,
                ));
                let settings: Arc<dyn ConfigStore> = store.clone();
                (settings, store as Arc<dyn SessionStore>)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; settings are lost on restart");
                let ttl = std::time::Duration::from_secs(config.session_ttl_secs.unsigned_abs());
                let store = Arc::new(MemoryStore::with_session_ttl(ttl));
                let settings: Arc<dyn ConfigStore> = store.clone();
                (settings, store as Arc<dyn SessionStore>)
            }
        };

    // Platform backend
    let backend: Arc<dyn ActionBackend> = Arc::new(RedditBackend::new(&config)?);
    info!(api_base = %config.reddit_api_base, "Reddit backend initialized");

    // Build application state
    let state = api::AppState::new(config.clone(), PolicyService::new(settings), sessions, backend);

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install CTRL+C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
