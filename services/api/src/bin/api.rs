//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, LocalAssetAdapter},
    config::{Config, StorageBackend},
    error::ApiError,
    web::{app_router, AppState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storefront_core::memory::InMemoryDatabase;
use storefront_core::ports::DatabaseService;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Storage & Run Migrations ---
    let db: Arc<dyn DatabaseService> = match &config.storage {
        StorageBackend::Postgres { database_url } => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on shutdown.");
            Arc::new(InMemoryDatabase::new())
        }
    };

    // --- 3. Prepare the Asset Store ---
    tokio::fs::create_dir_all(&config.asset_dir).await?;
    let assets = Arc::new(LocalAssetAdapter::new(
        config.asset_dir.clone(),
        config.asset_public_url.clone(),
    ));

    // --- 4. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState::new(db, assets, config.clone()));
    let app = app_router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
