//! Unimarket application composition root
//!
//! Selects the storage backend, wires the messaging service and composes the
//! domain router with shared infrastructure routes.

use std::sync::Arc;

use axum::Router;
use unimarket_auth::{AuthBackend, AuthConfig};
use unimarket_common::{create_pool, Config, StorageBackend};
use unimarket_messaging::{
    InMemoryMessagingStore, MessagingService, MessagingState, MessagingStore, PgMessagingStore,
};

/// Create the main application router from configuration
pub async fn create_app(config: &Config) -> Result<Router, anyhow::Error> {
    let store = create_store(config).await?;
    let service = MessagingService::new(store, config.store_timeout());

    let auth = AuthBackend::new(AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    });

    Ok(build_router(service, auth))
}

/// Build the router around an already-wired service
pub fn build_router(service: MessagingService, auth: AuthBackend) -> Router {
    let messaging_state = MessagingState::new(service, auth);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { concat!("Unimarket Messaging API v", env!("CARGO_PKG_VERSION")) }),
        )
        .merge(unimarket_messaging::routes().with_state(messaging_state))
}

async fn create_store(config: &Config) -> Result<Arc<dyn MessagingStore>, anyhow::Error> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory message store; data is lost on restart");
            Ok(Arc::new(InMemoryMessagingStore::new()))
        }
        StorageBackend::Postgres => {
            let database_url = config.database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("DATABASE_URL is required for the postgres storage backend")
            })?;

            let pool = create_pool(
                database_url,
                config.database_max_connections,
                config.store_timeout(),
            )
            .await
            .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;

            sqlx::migrate!("../../migrations").run(&pool).await?;
            tracing::info!("Database connection established and migrations applied");

            Ok(Arc::new(PgMessagingStore::new(pool)))
        }
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
