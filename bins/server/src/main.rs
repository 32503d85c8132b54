//! Docvault API Server
//!
//! Main entry point for the Docvault file storage service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docvault_api::{AppState, create_router};
use docvault_core::files::FileService;
use docvault_core::storage::StorageService;
use docvault_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docvault=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Build the object store once; it is shared by every request
    let store = StorageService::from_config(config.storage.clone())?;
    info!(
        provider = store.provider_name(),
        bucket = store.bucket(),
        max_file_size = config.storage.max_file_size,
        "Object storage configured"
    );

    // Create application state
    let state = AppState::new(
        Arc::new(FileService::new(Arc::new(store))),
        config.files.empty_search,
    );

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
