//! WebAPI - REST API Endpoints
//!
//! ## Responsibilities
//!
//! - HTTP API routes
//! - Request authentication at the handler boundary
//! - Response formatting

mod camera_usage_routes;
mod routes;

pub use camera_usage_routes::camera_usage_routes;
pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::cache::UsageCache;
use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok();
    let cache_ok = state.cache.get("health:probe").await.is_ok();

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        db_connected: db_ok,
        cache_connected: cache_ok,
    };

    Json(response)
}

/// Status endpoint
pub async fn device_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": "camgate",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "realtime_connections": state.realtime.connection_count()
    }))
}
