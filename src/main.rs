//! CamGate - camera access gateway for care facilities
//!
//! Main entry point for the gateway service.

use camgate_server::{
    auth::{AuthGateway, HttpKeyFetcher, TokenValidator},
    cache::{MemoryCache, RedisCache, UsageCache},
    camera_usage::UsageCoordinator,
    facility_registry::SqlDirectoryStore,
    realtime_hub::RealtimeHub,
    state::{AppConfig, AppState},
    user_registry::{PrincipalRegistry, SqlPrincipalStore},
    web_api,
};
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camgate_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CamGate v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        database_url = %config.database_url,
        redis = config.redis_url.is_some(),
        hcx_url = %config.hcx_url,
        camera_lease_secs = config.camera_lease_secs,
        "Configuration loaded"
    );

    // Create database pool
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await?;

    tracing::info!("Database connected");

    // Shared lock-state cache
    let cache: Arc<dyn UsageCache> = match &config.redis_url {
        Some(url) => Arc::new(RedisCache::connect(url).await?),
        None => {
            tracing::warn!("REDIS_URL not set - using in-process cache (single instance only)");
            Arc::new(MemoryCache::new())
        }
    };

    // Directory and principals
    let directory = Arc::new(SqlDirectoryStore::new(pool.clone()));
    let principals = Arc::new(PrincipalRegistry::new(Arc::new(SqlPrincipalStore::new(
        pool.clone(),
    ))));
    tracing::info!("Registries initialized");

    // Authentication gateway
    let validator = TokenValidator::new(
        &config.jwt_secret,
        config.jwt_lifetime_secs,
        Arc::new(HttpKeyFetcher::new()),
        &config.hcx_url,
    );
    let auth = Arc::new(AuthGateway::new(
        validator,
        directory.clone(),
        principals.clone(),
        config.hcx_username.clone(),
    ));
    tracing::info!("AuthGateway initialized");

    // Realtime hub + usage coordinator
    let realtime = Arc::new(RealtimeHub::new());
    let usage = Arc::new(UsageCoordinator::new(
        cache.clone(),
        principals.clone(),
        realtime.clone(),
        config.camera_lease_secs,
    ));
    tracing::info!("UsageCoordinator initialized");

    // Create application state
    let state = AppState {
        pool,
        config,
        cache,
        directory,
        principals,
        auth,
        usage,
        realtime,
    };

    let app = web_api::create_router(state.clone())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
